//! Logging rules: the routing forest.
//!
//! # Responsibilities
//! - The compiled rule node: pattern, enabled levels, `final` flag, target
//!   list, filter list, nested child rules
//! - Logger-name matching against wildcard patterns
//!
//! # Design Decisions
//! - Rules form an ordered forest, not a lookup table: the runtime walks
//!   them in document order and stops at the first matching `final` rule.
//! - Name matching is case-insensitive; common pattern shapes (prefix,
//!   suffix, substring) are classified up front so the general wildcard
//!   matcher only runs for mixed patterns.

use crate::filters::Filter;
use crate::levels::{Level, LevelMask};
use crate::targets::SharedTarget;
use crate::wildcard::wildcard_match;

/// Pre-classified logger-name matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
enum MatchKind {
    All,
    Literal(String),
    StartsWith(String),
    EndsWith(String),
    Contains(String),
    Pattern(String),
}

/// Wildcard matcher over logger names (`*` and `?`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerMatcher {
    pattern: String,
    kind: MatchKind,
}

impl LoggerMatcher {
    pub fn new(pattern: &str) -> LoggerMatcher {
        let lowered = pattern.to_lowercase();
        let kind = classify(&lowered);
        LoggerMatcher {
            pattern: pattern.to_string(),
            kind,
        }
    }

    /// Original pattern text, as written in the document.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, logger: &str) -> bool {
        let name = logger.to_lowercase();
        match &self.kind {
            MatchKind::All => true,
            MatchKind::Literal(p) => name == *p,
            MatchKind::StartsWith(p) => name.starts_with(p),
            MatchKind::EndsWith(p) => name.ends_with(p),
            MatchKind::Contains(p) => name.contains(p),
            MatchKind::Pattern(p) => wildcard_match(p, &name),
        }
    }
}

fn classify(pattern: &str) -> MatchKind {
    if pattern == "*" {
        return MatchKind::All;
    }
    let inner_wildcards = |s: &str| s.contains(['*', '?']);
    if !inner_wildcards(pattern) {
        return MatchKind::Literal(pattern.to_string());
    }
    if let Some(prefix) = pattern.strip_suffix('*') {
        if !inner_wildcards(prefix) {
            return MatchKind::StartsWith(prefix.to_string());
        }
    }
    if let Some(suffix) = pattern.strip_prefix('*') {
        if !inner_wildcards(suffix) {
            return MatchKind::EndsWith(suffix.to_string());
        }
    }
    if let Some(inner) = pattern
        .strip_prefix('*')
        .and_then(|p| p.strip_suffix('*'))
    {
        if !inner_wildcards(inner) {
            return MatchKind::Contains(inner.to_string());
        }
    }
    MatchKind::Pattern(pattern.to_string())
}

/// One compiled routing rule.
#[derive(Debug)]
pub struct LoggingRule {
    matcher: LoggerMatcher,
    levels: LevelMask,
    final_rule: bool,
    targets: Vec<SharedTarget>,
    filters: Vec<Box<dyn Filter>>,
    children: Vec<LoggingRule>,
}

impl LoggingRule {
    pub fn new(
        pattern: &str,
        levels: LevelMask,
        final_rule: bool,
        targets: Vec<SharedTarget>,
    ) -> LoggingRule {
        LoggingRule {
            matcher: LoggerMatcher::new(pattern),
            levels,
            final_rule,
            targets,
            filters: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn pattern(&self) -> &str {
        self.matcher.pattern()
    }

    pub fn levels(&self) -> LevelMask {
        self.levels
    }

    /// Stop rule evaluation for a matching event after this rule.
    pub fn is_final(&self) -> bool {
        self.final_rule
    }

    pub fn targets(&self) -> &[SharedTarget] {
        &self.targets
    }

    pub fn filters(&self) -> &[Box<dyn Filter>] {
        &self.filters
    }

    pub fn children(&self) -> &[LoggingRule] {
        &self.children
    }

    pub(crate) fn filters_mut(&mut self) -> &mut Vec<Box<dyn Filter>> {
        &mut self.filters
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<LoggingRule> {
        &mut self.children
    }

    pub fn matches_logger(&self, logger: &str) -> bool {
        self.matcher.matches(logger)
    }

    pub fn is_enabled_for(&self, level: Level) -> bool {
        self.levels.contains_level(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matcher_classification_shapes() {
        assert!(LoggerMatcher::new("*").matches("anything.at.all"));
        assert!(LoggerMatcher::new("App.Db").matches("app.db"));
        assert!(!LoggerMatcher::new("App.Db").matches("app.db.query"));
        assert!(LoggerMatcher::new("App.*").matches("app.db.query"));
        assert!(LoggerMatcher::new("*.Query").matches("app.db.query"));
        assert!(LoggerMatcher::new("*db*").matches("app.DB.query"));
        assert!(LoggerMatcher::new("App.*.Query").matches("app.db.query"));
        assert!(!LoggerMatcher::new("App.*.Query").matches("app.db.write"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let matcher = LoggerMatcher::new("APP.*");
        assert!(matcher.matches("app.server"));
        assert!(matcher.matches("App.Server"));
    }

    #[test]
    fn pattern_text_is_preserved_verbatim() {
        let rule = LoggingRule::new(
            "App.*",
            LevelMask::from_range(Level::Info, Level::Fatal),
            true,
            Vec::new(),
        );
        assert_eq!(rule.pattern(), "App.*");
        assert!(rule.is_final());
    }

    #[test]
    fn level_gate_follows_mask() {
        let rule = LoggingRule::new(
            "*",
            LevelMask::from_level(Level::Error),
            false,
            Vec::new(),
        );
        assert!(rule.is_enabled_for(Level::Error));
        assert!(!rule.is_enabled_for(Level::Warn));
    }
}
