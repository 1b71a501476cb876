//! Declarative tree reader.
//!
//! # Responsibilities
//! - The element abstraction the compiler walks: local name, ordered
//!   attributes, ordered children, optional leaf text
//! - Attribute lookup with type-coercion helpers
//! - Name assertion raising a naming-mismatch failure
//!
//! # Design Decisions
//! - Attribute lookup is case-insensitive; document order of attributes and
//!   children is preserved because section and rule order is significant.
//! - The tree is format-agnostic; the TOML front end in [`self::toml`] is
//!   just one producer, and tests build elements directly.

pub mod toml;

use crate::error::{ConfigError, ConfigResult};

/// One node of the declarative configuration tree.
#[derive(Debug, Clone, Default)]
pub struct ConfigElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<ConfigElement>,
    text: Option<String>,
}

impl ConfigElement {
    pub fn new(name: impl Into<String>) -> ConfigElement {
        ConfigElement {
            name: name.into(),
            ..ConfigElement::default()
        }
    }

    /// Element local name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attributes in document order.
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Child elements in document order.
    pub fn children(&self) -> &[ConfigElement] {
        &self.children
    }

    /// Text value, when this is a leaf element carrying one.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Case-insensitive attribute lookup.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Attribute lookup that fails with a fatal error when absent.
    pub fn required_attribute(&self, name: &str) -> ConfigResult<&str> {
        self.attribute(name).ok_or_else(|| ConfigError::MissingAttribute {
            element: self.name.clone(),
            attribute: name.to_string(),
        })
    }

    /// Optional boolean attribute. Accepts `true`/`false`/`1`/`0`, case-insensitive.
    pub fn bool_attribute(&self, name: &str) -> ConfigResult<Option<bool>> {
        match self.attribute(name) {
            None => Ok(None),
            Some(raw) => parse_bool_text(raw)
                .map(Some)
                .ok_or_else(|| ConfigError::InvalidAttribute {
                    element: self.name.clone(),
                    attribute: name.to_string(),
                    value: raw.to_string(),
                    reason: "expected a boolean".to_string(),
                }),
        }
    }

    /// Raise a naming-mismatch failure unless the local name is in `expected`.
    pub fn assert_name(&self, expected: &[&str]) -> ConfigResult<()> {
        if expected.iter().any(|e| self.name.eq_ignore_ascii_case(e)) {
            return Ok(());
        }
        Err(ConfigError::NameMismatch {
            found: self.name.clone(),
            expected: expected.join(", "),
        })
    }

    // Builder methods, used by the TOML adapter and by tests.

    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> ConfigElement {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: ConfigElement) -> ConfigElement {
        self.children.push(child);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> ConfigElement {
        self.text = Some(text.into());
        self
    }

    pub fn push_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.push((name.into(), value.into()));
    }

    pub fn push_child(&mut self, child: ConfigElement) {
        self.children.push(child);
    }
}

pub(crate) fn parse_bool_text(raw: &str) -> Option<bool> {
    let v = raw.trim();
    if v.eq_ignore_ascii_case("true") || v == "1" {
        Some(true)
    } else if v.eq_ignore_ascii_case("false") || v == "0" {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_lookup_ignores_case() {
        let elem = ConfigElement::new("logger").with_attribute("minLevel", "Info");
        assert_eq!(elem.attribute("minlevel"), Some("Info"));
        assert_eq!(elem.attribute("MINLEVEL"), Some("Info"));
        assert_eq!(elem.attribute("maxlevel"), None);
    }

    #[test]
    fn required_attribute_is_fatal_when_missing() {
        let elem = ConfigElement::new("target");
        let err = elem.required_attribute("type").unwrap_err();
        assert!(matches!(err, ConfigError::MissingAttribute { .. }));
    }

    #[test]
    fn bool_attribute_coercion() {
        let elem = ConfigElement::new("include")
            .with_attribute("ignore_errors", "TRUE")
            .with_attribute("bad", "maybe");
        assert_eq!(elem.bool_attribute("ignore_errors").unwrap(), Some(true));
        assert_eq!(elem.bool_attribute("missing").unwrap(), None);
        assert!(elem.bool_attribute("bad").is_err());
    }

    #[test]
    fn assert_name_reports_mismatch() {
        let elem = ConfigElement::new("settings");
        assert!(elem.assert_name(&["logging", "configuration"]).is_err());
        assert!(elem.assert_name(&["settings"]).is_ok());
    }

    #[test]
    fn children_preserve_order() {
        let elem = ConfigElement::new("targets")
            .with_child(ConfigElement::new("target").with_attribute("name", "a"))
            .with_child(ConfigElement::new("target").with_attribute("name", "b"));
        let names: Vec<_> = elem
            .children()
            .iter()
            .map(|c| c.attribute("name").unwrap())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
