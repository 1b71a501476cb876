//! Target model: configured output sinks.
//!
//! # Responsibilities
//! - The [`Target`] trait and its three structural shapes
//! - The flat, case-insensitive name → target registry
//!
//! # Design Decisions
//! - Shape is a closed set ([`TargetShape`]); the composer matches on it
//!   exhaustively instead of probing concrete types.
//! - Targets are mutable only while being composed. Registration freezes
//!   them behind `Arc`, which is what makes the finished configuration safe
//!   for many concurrent readers.
//! - Duplicate names silently overwrite the previous entry.

pub mod builtin;
pub mod compound;
pub mod wrappers;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::properties::Configurable;

/// A finished target, shared between the registry, wrappers and rules.
pub type SharedTarget = Arc<dyn Target>;

/// Structural variant of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetShape {
    /// No children; scalar, layout and sequence properties only.
    Leaf,
    /// Decorates exactly one child target.
    Wrapper,
    /// Fans out to an ordered list of child targets.
    Compound,
}

impl TargetShape {
    pub fn name(self) -> &'static str {
        match self {
            TargetShape::Leaf => "leaf",
            TargetShape::Wrapper => "wrapper",
            TargetShape::Compound => "compound",
        }
    }
}

/// A configured output sink for log events.
///
/// The execution runtime is the consumer of these objects; during a compile
/// they only receive properties and child references.
pub trait Target: Configurable + fmt::Debug {
    fn name(&self) -> Option<&str>;

    fn set_name(&mut self, name: &str);

    fn shape(&self) -> TargetShape;

    /// Wrapped child, for [`TargetShape::Wrapper`] targets.
    fn wrapped(&self) -> Option<&SharedTarget> {
        None
    }

    /// Install the wrapped child. Only called after a shape check; a no-op
    /// on non-wrapper shapes.
    fn set_wrapped(&mut self, child: SharedTarget) {
        let _ = child;
    }

    /// Ordered children, for [`TargetShape::Compound`] targets.
    fn child_targets(&self) -> &[SharedTarget] {
        &[]
    }

    /// Append a child. Only called after a shape check; a no-op on
    /// non-compound shapes.
    fn add_child_target(&mut self, child: SharedTarget) {
        let _ = child;
    }
}

/// Display label for diagnostics: the name when present, else the type.
pub(crate) fn display_name(target: &dyn Target) -> String {
    match target.name() {
        Some(name) => name.to_string(),
        None => format!("<unnamed {}>", target.type_name()),
    }
}

/// Flat name → target registry. One namespace for the whole configuration.
#[derive(Debug, Default)]
pub struct TargetTable {
    by_name: HashMap<String, SharedTarget>,
    order: Vec<String>,
}

impl TargetTable {
    /// Register a target under its name. Unnamed targets are skipped;
    /// an existing entry with the same name is silently replaced.
    pub fn insert(&mut self, target: SharedTarget) {
        let Some(name) = target.name() else {
            return;
        };
        let key = name.to_lowercase();
        if self.by_name.insert(key.clone(), target).is_some() {
            tracing::debug!(target_name = %key, "target overwrote an existing registration");
        } else {
            self.order.push(key);
        }
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<SharedTarget> {
        self.by_name.get(&name.to_lowercase()).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Registered targets in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &SharedTarget> {
        self.order.iter().filter_map(|key| self.by_name.get(key))
    }
}
