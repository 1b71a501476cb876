//! Layout values: deferred text-producing expressions.
//!
//! The compiler never evaluates layout expressions — the mini-language inside
//! them belongs to the execution runtime. A layout here is a configured
//! value object: it keeps its original source text (or, for structured
//! layouts, its configured parts) for the runtime to interpret later.

use std::any::Any;
use std::fmt;

use crate::error::PropertyError;
use crate::properties::{coerce_bool, find_kind, is_member, Configurable, PropertyKind};

/// A deferred text expression bound to a property at configure time.
pub trait Layout: Configurable + fmt::Debug {
    /// Original, unevaluated source text, where the layout has one.
    fn source(&self) -> Option<&str> {
        None
    }
}

/// Plain layout: the raw expression text, kept verbatim.
#[derive(Debug, Clone, Default)]
pub struct SimpleLayout {
    text: String,
}

impl SimpleLayout {
    pub fn new(text: impl Into<String>) -> SimpleLayout {
        SimpleLayout { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Configurable for SimpleLayout {
    fn type_name(&self) -> &'static str {
        "simple"
    }

    fn property_kind(&self, name: &str) -> Option<PropertyKind> {
        find_kind(name, &[("text", PropertyKind::Text)])
    }

    fn set_text(&mut self, name: &str, value: &str) -> Result<(), PropertyError> {
        if is_member(name, "text") {
            self.text = value.to_string();
            return Ok(());
        }
        Err(PropertyError::unknown(name))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl Layout for SimpleLayout {
    fn source(&self) -> Option<&str> {
        Some(&self.text)
    }
}

/// One field of a [`JsonLayout`]: output name plus the layout producing it.
#[derive(Debug)]
pub struct JsonAttribute {
    name: String,
    layout: Option<Box<dyn Layout>>,
    encode: bool,
}

impl Default for JsonAttribute {
    fn default() -> Self {
        JsonAttribute {
            name: String::new(),
            layout: None,
            encode: true,
        }
    }
}

impl JsonAttribute {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layout(&self) -> Option<&dyn Layout> {
        self.layout.as_deref()
    }

    pub fn encode(&self) -> bool {
        self.encode
    }
}

impl Configurable for JsonAttribute {
    fn type_name(&self) -> &'static str {
        "attribute"
    }

    fn property_kind(&self, name: &str) -> Option<PropertyKind> {
        find_kind(
            name,
            &[
                ("name", PropertyKind::Text),
                ("layout", PropertyKind::Layout),
                ("encode", PropertyKind::Text),
            ],
        )
    }

    fn set_text(&mut self, name: &str, value: &str) -> Result<(), PropertyError> {
        if is_member(name, "name") {
            self.name = value.to_string();
        } else if is_member(name, "layout") {
            self.layout = Some(Box::new(SimpleLayout::new(value)));
        } else if is_member(name, "encode") {
            self.encode = coerce_bool(name, value)?;
        } else {
            return Err(PropertyError::unknown(name));
        }
        Ok(())
    }

    fn set_layout(&mut self, name: &str, layout: Box<dyn Layout>) -> Result<(), PropertyError> {
        if is_member(name, "layout") {
            self.layout = Some(layout);
            return Ok(());
        }
        Err(PropertyError::NotALayout {
            name: name.to_string(),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Structured layout assembling an ordered list of named attributes.
///
/// Exists mainly to exercise the sequence-item construction path; the
/// runtime serializes the configured attributes per event.
#[derive(Debug, Default)]
pub struct JsonLayout {
    attributes: Vec<JsonAttribute>,
    indent: bool,
}

impl JsonLayout {
    pub fn attributes(&self) -> &[JsonAttribute] {
        &self.attributes
    }

    pub fn indent(&self) -> bool {
        self.indent
    }
}

impl Configurable for JsonLayout {
    fn type_name(&self) -> &'static str {
        "json"
    }

    fn property_kind(&self, name: &str) -> Option<PropertyKind> {
        find_kind(
            name,
            &[
                ("indent", PropertyKind::Text),
                ("attribute", PropertyKind::ItemList),
            ],
        )
    }

    fn set_text(&mut self, name: &str, value: &str) -> Result<(), PropertyError> {
        if is_member(name, "indent") {
            self.indent = coerce_bool(name, value)?;
            return Ok(());
        }
        Err(PropertyError::unknown(name))
    }

    fn new_item(&self, name: &str) -> Result<Box<dyn Configurable>, PropertyError> {
        if is_member(name, "attribute") {
            return Ok(Box::new(JsonAttribute::default()));
        }
        Err(PropertyError::NotAList {
            name: name.to_string(),
        })
    }

    fn push_item(&mut self, name: &str, item: Box<dyn Configurable>) -> Result<(), PropertyError> {
        if !is_member(name, "attribute") {
            return Err(PropertyError::NotAList {
                name: name.to_string(),
            });
        }
        match item.into_any().downcast::<JsonAttribute>() {
            Ok(attribute) => {
                self.attributes.push(*attribute);
                Ok(())
            }
            Err(_) => Err(PropertyError::invalid(
                name,
                "<item>",
                "unexpected item type",
            )),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl Layout for JsonLayout {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_layout_keeps_source_verbatim() {
        let layout = SimpleLayout::new("${level}|${message}");
        assert_eq!(layout.source(), Some("${level}|${message}"));
    }

    #[test]
    fn json_layout_accumulates_attributes_in_order() {
        let mut layout = JsonLayout::default();
        for name in ["time", "message"] {
            let mut item = layout.new_item("attribute").unwrap();
            item.set_text("name", name).unwrap();
            item.set_text("layout", &format!("${{{name}}}")).unwrap();
            layout.push_item("attribute", item).unwrap();
        }
        let names: Vec<_> = layout.attributes().iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["time", "message"]);
    }

    #[test]
    fn unknown_member_is_rejected() {
        let mut layout = JsonLayout::default();
        assert!(layout.set_text("color", "red").is_err());
        assert!(layout.new_item("field").is_err());
    }
}
