//! Serializable description of a compiled configuration.
//!
//! Backs the CLI's `inspect` output; the runtime-facing API stays on
//! [`crate::compile::LoggingConfiguration`] itself.

use serde::Serialize;

use crate::compile::LoggingConfiguration;
use crate::properties::Configurable;
use crate::rules::LoggingRule;
use crate::targets::Target;

#[derive(Debug, Serialize)]
pub struct ConfigSummary {
    pub status: String,
    pub global_threshold: String,
    pub sources: Vec<SourceSummary>,
    pub targets: Vec<TargetSummary>,
    pub rules: Vec<RuleSummary>,
}

#[derive(Debug, Serialize)]
pub struct SourceSummary {
    pub path: String,
    pub auto_reload: bool,
}

#[derive(Debug, Serialize)]
pub struct TargetSummary {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub type_name: String,
    pub shape: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TargetSummary>,
}

#[derive(Debug, Serialize)]
pub struct RuleSummary {
    pub pattern: String,
    pub levels: Vec<String>,
    #[serde(rename = "final")]
    pub is_final: bool,
    pub targets: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RuleSummary>,
}

impl ConfigSummary {
    pub fn of(config: &LoggingConfiguration) -> ConfigSummary {
        ConfigSummary {
            status: config.status().name().to_string(),
            global_threshold: config.options().global_threshold.to_string(),
            sources: config
                .sources()
                .map(|source| SourceSummary {
                    path: source.path.display().to_string(),
                    auto_reload: source.auto_reload,
                })
                .collect(),
            targets: config.targets().iter().map(|t| target_summary(t.as_ref())).collect(),
            rules: config.rules().iter().map(rule_summary).collect(),
        }
    }
}

fn target_summary(target: &dyn Target) -> TargetSummary {
    let mut children = Vec::new();
    if let Some(child) = target.wrapped() {
        children.push(target_summary(child.as_ref()));
    }
    for child in target.child_targets() {
        children.push(target_summary(child.as_ref()));
    }
    TargetSummary {
        name: target.name().map(str::to_string),
        type_name: target.type_name().to_string(),
        shape: target.shape().name().to_string(),
        children,
    }
}

fn rule_summary(rule: &LoggingRule) -> RuleSummary {
    RuleSummary {
        pattern: rule.pattern().to_string(),
        levels: rule
            .levels()
            .levels()
            .into_iter()
            .map(|l| l.to_string())
            .collect(),
        is_final: rule.is_final(),
        targets: rule
            .targets()
            .iter()
            .map(|t| {
                t.name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("<unnamed {}>", t.type_name()))
            })
            .collect(),
        filters: rule
            .filters()
            .iter()
            .map(|f| f.type_name().to_string())
            .collect(),
        children: rule.children().iter().map(rule_summary).collect(),
    }
}
