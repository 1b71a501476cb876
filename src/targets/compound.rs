//! Compound targets: fan out to an ordered list of children.

use std::any::Any;

use crate::error::PropertyError;
use crate::properties::{coerce_bool, find_kind, is_member, Configurable, PropertyKind};
use crate::targets::{SharedTarget, Target, TargetShape};

/// Writes every event to all children, in order.
#[derive(Debug, Default)]
pub struct SplitGroup {
    name: Option<String>,
    targets: Vec<SharedTarget>,
}

impl Configurable for SplitGroup {
    fn type_name(&self) -> &'static str {
        "split"
    }

    fn property_kind(&self, name: &str) -> Option<PropertyKind> {
        find_kind(name, &[("name", PropertyKind::Text)])
    }

    fn set_text(&mut self, name: &str, value: &str) -> Result<(), PropertyError> {
        if is_member(name, "name") {
            self.name = Some(value.to_string());
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

impl Target for SplitGroup {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    fn shape(&self) -> TargetShape {
        TargetShape::Compound
    }

    fn child_targets(&self) -> &[SharedTarget] {
        &self.targets
    }

    fn add_child_target(&mut self, child: SharedTarget) {
        self.targets.push(child);
    }
}

/// Writes to the first child; on failure the runtime falls through to the
/// next one in order.
#[derive(Debug)]
pub struct FallbackGroup {
    name: Option<String>,
    targets: Vec<SharedTarget>,
    return_to_first: bool,
}

impl Default for FallbackGroup {
    fn default() -> Self {
        FallbackGroup {
            name: None,
            targets: Vec::new(),
            return_to_first: true,
        }
    }
}

impl FallbackGroup {
    pub fn return_to_first(&self) -> bool {
        self.return_to_first
    }
}

impl Configurable for FallbackGroup {
    fn type_name(&self) -> &'static str {
        "fallback"
    }

    fn property_kind(&self, name: &str) -> Option<PropertyKind> {
        find_kind(
            name,
            &[
                ("name", PropertyKind::Text),
                ("return_to_first", PropertyKind::Text),
            ],
        )
    }

    fn set_text(&mut self, name: &str, value: &str) -> Result<(), PropertyError> {
        if is_member(name, "name") {
            self.name = Some(value.to_string());
        } else if is_member(name, "return_to_first") {
            self.return_to_first = coerce_bool(name, value)?;
        } else {
            return Err(PropertyError::unknown(name));
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl Target for FallbackGroup {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    fn shape(&self) -> TargetShape {
        TargetShape::Compound
    }

    fn child_targets(&self) -> &[SharedTarget] {
        &self.targets
    }

    fn add_child_target(&mut self, child: SharedTarget) {
        self.targets.push(child);
    }
}

/// Distributes events across children one at a time, in rotation.
#[derive(Debug, Default)]
pub struct RoundRobinGroup {
    name: Option<String>,
    targets: Vec<SharedTarget>,
}

impl Configurable for RoundRobinGroup {
    fn type_name(&self) -> &'static str {
        "round_robin"
    }

    fn property_kind(&self, name: &str) -> Option<PropertyKind> {
        find_kind(name, &[("name", PropertyKind::Text)])
    }

    fn set_text(&mut self, name: &str, value: &str) -> Result<(), PropertyError> {
        if is_member(name, "name") {
            self.name = Some(value.to_string());
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

impl Target for RoundRobinGroup {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    fn shape(&self) -> TargetShape {
        TargetShape::Compound
    }

    fn child_targets(&self) -> &[SharedTarget] {
        &self.targets
    }

    fn add_child_target(&mut self, child: SharedTarget) {
        self.targets.push(child);
    }
}
