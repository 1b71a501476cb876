//! Generic property assignment for configurable objects.
//!
//! # Responsibilities
//! - The [`Configurable`] trait: set-by-declared-name, coerce-from-text
//! - Per-type property descriptors (name → kind), looked up case-insensitively
//! - Text coercion helpers shared by every implementation
//!
//! # Design Decisions
//! - No reflection: each configurable type answers for its own members
//!   through a small descriptor table and typed setters. The composer stays
//!   ignorant of concrete types.
//! - Coercion failures are fatal and carry the member name plus the raw
//!   value, so a bad document points at the exact offending assignment.

use std::any::Any;
use std::str::FromStr;

use crate::error::PropertyError;
use crate::layouts::Layout;

/// How a declarative child or attribute maps onto a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// Scalar member coerced from text.
    Text,
    /// Member holding a deferred layout expression; settable from plain text
    /// or from a typed layout child element.
    Layout,
    /// Ordered sequence of nested configurable items.
    ItemList,
}

/// An object whose members can be assigned by declared name from text.
pub trait Configurable: Any + Send + Sync {
    /// Registered type name, used in diagnostics.
    fn type_name(&self) -> &'static str;

    /// Descriptor lookup: the kind of the named member, if it exists.
    fn property_kind(&self, name: &str) -> Option<PropertyKind>;

    /// Assign a member from expanded text, coercing to its type.
    fn set_text(&mut self, name: &str, value: &str) -> Result<(), PropertyError>;

    /// Assign a pre-built layout to a layout-typed member.
    fn set_layout(&mut self, name: &str, layout: Box<dyn Layout>) -> Result<(), PropertyError> {
        let _ = layout;
        Err(PropertyError::NotALayout {
            name: name.to_string(),
        })
    }

    /// Construct a fresh, default item for a sequence member.
    fn new_item(&self, name: &str) -> Result<Box<dyn Configurable>, PropertyError> {
        Err(PropertyError::NotAList {
            name: name.to_string(),
        })
    }

    /// Append a configured item to a sequence member.
    fn push_item(&mut self, name: &str, item: Box<dyn Configurable>) -> Result<(), PropertyError> {
        let _ = item;
        Err(PropertyError::NotAList {
            name: name.to_string(),
        })
    }

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// Case-insensitive lookup in a static descriptor table.
pub fn find_kind(name: &str, table: &[(&str, PropertyKind)]) -> Option<PropertyKind> {
    table
        .iter()
        .find(|(member, _)| member.eq_ignore_ascii_case(name))
        .map(|(_, kind)| *kind)
}

/// True when `name` names the member `canonical`, ignoring ASCII case.
pub fn is_member(name: &str, canonical: &str) -> bool {
    name.eq_ignore_ascii_case(canonical)
}

/// Coerce text into a boolean member value.
pub fn coerce_bool(name: &str, value: &str) -> Result<bool, PropertyError> {
    crate::reader::parse_bool_text(value)
        .ok_or_else(|| PropertyError::invalid(name, value, "expected a boolean"))
}

/// Coerce text into any `FromStr` member value (numbers, enums, levels).
pub fn coerce<T>(name: &str, value: &str) -> Result<T, PropertyError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| PropertyError::invalid(name, value, e.to_string()))
}
