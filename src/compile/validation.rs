//! Post-parse validation.
//!
//! Two independent passes, both gated on the compile having reached the
//! succeeded state: replay accumulated soft errors (aggregated to one fatal
//! error under strict mode), then report registered targets nothing
//! references.

use std::collections::HashSet;
use std::mem;

use crate::error::{ConfigError, ConfigResult};
use crate::rules::LoggingRule;
use crate::targets::{Target, TargetTable};

use super::{CompileStatus, ConfigCompiler};

impl ConfigCompiler {
    pub(crate) fn validate(&mut self) -> ConfigResult<()> {
        if self.status != CompileStatus::Succeeded {
            tracing::debug!(
                status = self.status.name(),
                "compile did not succeed, skipping validation passes"
            );
            return Ok(());
        }

        if !self.soft_errors.is_empty() {
            if self.options.strict() {
                let errors = mem::take(&mut self.soft_errors);
                return Err(ConfigError::aggregate(errors));
            }
            for error in &self.soft_errors {
                tracing::warn!(%error, "configuration warning");
            }
        }

        for name in unused_targets(&self.targets, &self.rules) {
            tracing::warn!(target_name = %name, "target is registered but never referenced");
        }
        Ok(())
    }
}

/// Registered targets outside the referenced set: not written to by any
/// rule (including nested rules) and not wrapped or contained by another
/// target. Returned in registration order.
pub(crate) fn unused_targets(table: &TargetTable, rules: &[LoggingRule]) -> Vec<String> {
    let mut referenced: HashSet<String> = HashSet::new();

    fn mark(name: Option<&str>, referenced: &mut HashSet<String>) {
        if let Some(name) = name {
            referenced.insert(name.to_lowercase());
        }
    }

    fn collect_rule(rule: &LoggingRule, referenced: &mut HashSet<String>) {
        for target in rule.targets() {
            mark(target.name(), referenced);
        }
        for child in rule.children() {
            collect_rule(child, referenced);
        }
    }

    fn collect_contained(target: &dyn Target, referenced: &mut HashSet<String>) {
        if let Some(child) = target.wrapped() {
            mark(child.name(), referenced);
            collect_contained(child.as_ref(), referenced);
        }
        for child in target.child_targets() {
            mark(child.name(), referenced);
            collect_contained(child.as_ref(), referenced);
        }
    }

    for rule in rules {
        collect_rule(rule, &mut referenced);
    }
    for target in table.iter() {
        collect_contained(target.as_ref(), &mut referenced);
    }

    table
        .iter()
        .filter_map(|target| target.name())
        .filter(|name| !referenced.contains(&name.to_lowercase()))
        .map(str::to_string)
        .collect()
}
