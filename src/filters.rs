//! Event filters attached to logging rules.
//!
//! Filters are configured from attributes only and evaluated by the
//! execution runtime in document order. The compiler's job ends at
//! constructing them by registered type name and assigning their members.

use std::any::Any;
use std::fmt;
use std::str::FromStr;

use crate::error::PropertyError;
use crate::layouts::{Layout, SimpleLayout};
use crate::properties::{coerce, coerce_bool, find_kind, is_member, Configurable, PropertyKind};

/// What the runtime does with an event once a filter matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterAction {
    /// Drop the event.
    #[default]
    Ignore,
    /// Keep the event.
    Log,
    /// Drop the event and stop evaluating further filters.
    IgnoreFinal,
    /// Keep the event and stop evaluating further filters.
    LogFinal,
}

impl FromStr for FilterAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.eq_ignore_ascii_case("ignore") {
            Ok(FilterAction::Ignore)
        } else if name.eq_ignore_ascii_case("log") {
            Ok(FilterAction::Log)
        } else if name.eq_ignore_ascii_case("ignore_final") {
            Ok(FilterAction::IgnoreFinal)
        } else if name.eq_ignore_ascii_case("log_final") {
            Ok(FilterAction::LogFinal)
        } else {
            Err(format!(
                "unknown action '{name}', expected ignore, log, ignore_final or log_final"
            ))
        }
    }
}

/// A configured filter predicate.
pub trait Filter: Configurable + fmt::Debug {
    /// Action taken when the condition matches.
    fn action(&self) -> FilterAction;
}

/// How a text condition compares the evaluated layout against its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextCondition {
    Contains,
    NotContains,
    Equals,
}

/// Filter comparing a layout-produced value against a fixed operand.
///
/// Backs the registered types `when_contains`, `when_not_contains` and
/// `when_equals`; they differ only in the comparison applied.
#[derive(Debug)]
pub struct WhenTextFilter {
    type_name: &'static str,
    condition: TextCondition,
    layout: Option<Box<dyn Layout>>,
    value: String,
    ignore_case: bool,
    action: FilterAction,
}

impl WhenTextFilter {
    pub fn contains() -> WhenTextFilter {
        WhenTextFilter::new("when_contains", TextCondition::Contains)
    }

    pub fn not_contains() -> WhenTextFilter {
        WhenTextFilter::new("when_not_contains", TextCondition::NotContains)
    }

    pub fn equals() -> WhenTextFilter {
        WhenTextFilter::new("when_equals", TextCondition::Equals)
    }

    fn new(type_name: &'static str, condition: TextCondition) -> WhenTextFilter {
        WhenTextFilter {
            type_name,
            condition,
            layout: None,
            value: String::new(),
            ignore_case: false,
            action: FilterAction::Ignore,
        }
    }

    pub fn layout(&self) -> Option<&dyn Layout> {
        self.layout.as_deref()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    /// Evaluate the condition against the text the layout produced for an
    /// event. The runtime calls this; the compiler only configures it.
    pub fn matches_text(&self, produced: &str) -> bool {
        let (haystack, needle) = if self.ignore_case {
            (produced.to_lowercase(), self.value.to_lowercase())
        } else {
            (produced.to_string(), self.value.clone())
        };
        match self.condition {
            TextCondition::Contains => haystack.contains(&needle),
            TextCondition::NotContains => !haystack.contains(&needle),
            TextCondition::Equals => haystack == needle,
        }
    }
}

impl Configurable for WhenTextFilter {
    fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn property_kind(&self, name: &str) -> Option<PropertyKind> {
        find_kind(
            name,
            &[
                ("layout", PropertyKind::Layout),
                ("value", PropertyKind::Text),
                ("ignore_case", PropertyKind::Text),
                ("action", PropertyKind::Text),
            ],
        )
    }

    fn set_text(&mut self, name: &str, value: &str) -> Result<(), PropertyError> {
        if is_member(name, "layout") {
            self.layout = Some(Box::new(SimpleLayout::new(value)));
        } else if is_member(name, "value") {
            self.value = value.to_string();
        } else if is_member(name, "ignore_case") {
            self.ignore_case = coerce_bool(name, value)?;
        } else if is_member(name, "action") {
            self.action = coerce(name, value)?;
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

impl Filter for WhenTextFilter {
    fn action(&self) -> FilterAction {
        self.action
    }
}
