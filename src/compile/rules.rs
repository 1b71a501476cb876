//! Rule composer: `rules` sections into the compiled forest.
//!
//! Rule sections are deferred during dispatch and applied here once every
//! document (including includes) has registered its targets, so a rule may
//! reference a target declared later in the text or in another file.

use std::mem;

use crate::error::{ConfigError, ConfigResult};
use crate::filters::Filter;
use crate::levels::{Level, LevelMask};
use crate::reader::ConfigElement;
use crate::rules::LoggingRule;

use super::ConfigCompiler;

impl ConfigCompiler {
    /// Parse every deferred `rules` section, in document order.
    pub(crate) fn apply_deferred_rules(&mut self) -> ConfigResult<()> {
        let pending = mem::take(&mut self.pending_rules);
        let mut rules = mem::take(&mut self.rules);
        let mut outcome = Ok(());
        for section in &pending {
            if let Err(error) = self.parse_rules_section(section, &mut rules) {
                outcome = Err(error);
                break;
            }
        }
        self.rules = rules;
        outcome
    }

    fn parse_rules_section(
        &mut self,
        elem: &ConfigElement,
        collection: &mut Vec<LoggingRule>,
    ) -> ConfigResult<()> {
        for child in elem.children() {
            if child.name().eq_ignore_ascii_case("logger") {
                self.parse_rule(child, collection)?;
            } else {
                self.soft_error(ConfigError::UnknownElement {
                    parent: "rules".to_string(),
                    element: child.name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// One `logger` element: pattern, level selection, target references,
    /// filters and nested child rules. The finished rule appends to
    /// `collection`, preserving forest order.
    fn parse_rule(
        &mut self,
        node: &ConfigElement,
        collection: &mut Vec<LoggingRule>,
    ) -> ConfigResult<()> {
        if let Some(false) = node.bool_attribute("enabled")? {
            tracing::debug!(
                pattern = node.attribute("name").unwrap_or("*"),
                "rule disabled, skipped"
            );
            return Ok(());
        }

        let pattern = self
            .variables
            .expand(node.attribute("name").unwrap_or("*"));
        let final_rule = node.bool_attribute("final")?.unwrap_or(false);

        let mut targets = Vec::new();
        let target_list = node
            .attribute("write_to")
            .or_else(|| node.attribute("append_to"));
        if let Some(raw) = target_list {
            let list = self.variables.expand(raw);
            for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                let target = self
                    .targets
                    .get(name)
                    .ok_or_else(|| ConfigError::TargetNotFound {
                        name: name.to_string(),
                    })?;
                targets.push(target);
            }
        }

        let levels = self.parse_rule_levels(node)?;
        let mut rule = LoggingRule::new(&pattern, levels, final_rule, targets);

        for child in node.children() {
            let name = child.name();
            if name.eq_ignore_ascii_case("logger") {
                self.parse_rule(child, rule.children_mut())?;
            } else if name.eq_ignore_ascii_case("filters") {
                self.parse_filters(child, rule.filters_mut())?;
            } else {
                self.soft_error(ConfigError::UnknownElement {
                    parent: "logger".to_string(),
                    element: name.to_string(),
                });
            }
        }

        collection.push(rule);
        Ok(())
    }

    /// Level selection, mutually exclusive by precedence: exact `level`,
    /// then `levels` (comma list), then the `min_level`/`max_level` range
    /// defaulting to the ends of the scale.
    fn parse_rule_levels(&self, node: &ConfigElement) -> ConfigResult<LevelMask> {
        if let Some(raw) = node.attribute("level") {
            let level = self.parse_level(node, "level", raw)?;
            return Ok(LevelMask::from_level(level));
        }
        if let Some(raw) = node.attribute("levels") {
            let list = self.variables.expand(raw);
            let mut mask = LevelMask::empty();
            for token in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                mask |= LevelMask::from_level(self.parse_level(node, "levels", token)?);
            }
            return Ok(mask);
        }
        let min = match node.attribute("min_level") {
            Some(raw) => self.parse_level(node, "min_level", raw)?,
            None => Level::Trace,
        };
        let max = match node.attribute("max_level") {
            Some(raw) => self.parse_level(node, "max_level", raw)?,
            None => Level::Fatal,
        };
        Ok(LevelMask::from_range(min, max))
    }

    fn parse_level(&self, node: &ConfigElement, attribute: &str, raw: &str) -> ConfigResult<Level> {
        let expanded = self.variables.expand(raw);
        expanded
            .parse::<Level>()
            .map_err(|reason| ConfigError::InvalidAttribute {
                element: node.name().to_string(),
                attribute: attribute.to_string(),
                value: raw.to_string(),
                reason,
            })
    }

    /// `filters` child: each filter is constructed by its element's local
    /// name and configured from attributes only.
    fn parse_filters(
        &mut self,
        elem: &ConfigElement,
        list: &mut Vec<Box<dyn Filter>>,
    ) -> ConfigResult<()> {
        for child in elem.children() {
            let mut filter = self.registry.filters.create(child.name())?;
            self.apply_attributes(&mut *filter, child)?;
            list.push(filter);
        }
        Ok(())
    }
}
