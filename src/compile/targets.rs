//! Target composer: recursive, type-directed target construction.
//!
//! # Responsibilities
//! - `targets` section handling: per-type defaults, the async auto-wrap
//!   rewrite, default-wrapper injection, registration
//! - Recursive construction of a single target from a declarative node
//! - Generic child handling shared with layouts, filters and time sources:
//!   sequence-item append, typed layout assignment, text fallback
//!
//! # Design Decisions
//! - Child elements are attempted in a fixed order: sequence item, typed
//!   layout, structural child (wrapper/compound shapes only), generic text
//!   assignment. Whatever is left over is a soft unknown-element warning.
//! - Decorations run at the section level on freshly parsed top-level
//!   targets, async wrap first, default wrapper second. Each rewrite moves
//!   the public name to the new outer node and renames the original with
//!   the `_wrapped` suffix; the rename is not collision-checked.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{ConfigError, ConfigResult};
use crate::layouts::Layout;
use crate::properties::{Configurable, PropertyKind};
use crate::reader::ConfigElement;
use crate::targets::{display_name, SharedTarget, Target, TargetShape};

use super::ConfigCompiler;

/// Baseline nodes applied per target type before the target's own node
/// (`default_target_parameters` entries, keyed by normalized type name).
#[derive(Debug, Default)]
pub(crate) struct TargetDefaults {
    by_type: HashMap<String, ConfigElement>,
}

impl TargetDefaults {
    fn set(&mut self, type_name: &str, node: ConfigElement) {
        self.by_type.insert(normalize_type(type_name), node);
    }

    fn get(&self, type_name: &str) -> Option<&ConfigElement> {
        self.by_type.get(&normalize_type(type_name))
    }
}

fn normalize_type(name: &str) -> String {
    let trimmed = name.trim();
    let local = trimmed.rsplit(':').next().unwrap_or(trimmed);
    local.trim().to_lowercase()
}

impl ConfigCompiler {
    /// `targets` section: defaults and the default wrapper template are
    /// collected as they appear; every target child is constructed,
    /// decorated and registered.
    pub(crate) fn parse_targets_section(&mut self, elem: &ConfigElement) -> ConfigResult<()> {
        let async_wrap = elem.bool_attribute("async")?.unwrap_or(false);
        let mut default_wrapper: Option<ConfigElement> = None;
        let mut defaults = TargetDefaults::default();

        for child in elem.children() {
            let name = child.name();
            if name.eq_ignore_ascii_case("default_wrapper") {
                child.required_attribute("type")?;
                default_wrapper = Some(child.clone());
            } else if name.eq_ignore_ascii_case("default_target_parameters") {
                let type_name = child.required_attribute("type")?;
                defaults.set(type_name, child.clone());
            } else if let Some(type_name) = self.target_type_of(child)? {
                let target = self.create_target(&type_name, child, &defaults)?;
                if target.name().is_none() {
                    return Err(ConfigError::MissingAttribute {
                        element: name.to_string(),
                        attribute: "name".to_string(),
                    });
                }
                let target = self.decorate(target, async_wrap, default_wrapper.as_ref())?;
                self.targets.insert(Arc::from(target));
            } else {
                self.soft_error(ConfigError::UnknownElement {
                    parent: "targets".to_string(),
                    element: name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Classify a child as a target definition and resolve its type name:
    /// a generic `target`/`wrapper`/`compound` element carrying a `type`
    /// attribute, or an element whose local name is a registered target
    /// type.
    fn target_type_of(&self, child: &ConfigElement) -> ConfigResult<Option<String>> {
        let name = child.name();
        if name.eq_ignore_ascii_case("target")
            || name.eq_ignore_ascii_case("wrapper")
            || name.eq_ignore_ascii_case("compound")
        {
            let raw = child.required_attribute("type")?;
            return Ok(Some(self.variables.expand(raw)));
        }
        if self.registry.targets.contains(name) {
            return Ok(Some(name.to_string()));
        }
        Ok(None)
    }

    /// Construct one target: resolve the type, apply the per-type defaults
    /// node first, then the target's own attributes and children.
    pub(crate) fn create_target(
        &mut self,
        type_name: &str,
        node: &ConfigElement,
        defaults: &TargetDefaults,
    ) -> ConfigResult<Box<dyn Target>> {
        let mut target = self.registry.targets.create(type_name)?;
        if let Some(baseline) = defaults.get(type_name) {
            self.configure_target(&mut *target, baseline, defaults)?;
        }
        self.configure_target(&mut *target, node, defaults)?;
        Ok(target)
    }

    fn configure_target(
        &mut self,
        target: &mut dyn Target,
        node: &ConfigElement,
        defaults: &TargetDefaults,
    ) -> ConfigResult<()> {
        self.apply_attributes(target, node)?;
        for child in node.children() {
            if self.try_generic_child(target, child)? {
                continue;
            }
            if self.try_structural_child(target, child, defaults)? {
                continue;
            }
            self.apply_text_child(target, child)?;
        }
        Ok(())
    }

    /// Structural children only exist on wrapper and compound shapes: a
    /// `*_ref` element resolves an already-registered name, a nested target
    /// definition is constructed (and registered when it has a name of its
    /// own) in place.
    fn try_structural_child(
        &mut self,
        target: &mut dyn Target,
        child: &ConfigElement,
        defaults: &TargetDefaults,
    ) -> ConfigResult<bool> {
        if target.shape() == TargetShape::Leaf {
            return Ok(false);
        }
        let name = child.name().to_lowercase();
        if name.ends_with("_ref") || name.ends_with("-ref") {
            let raw = child.required_attribute("name")?;
            let ref_name = self.variables.expand(raw);
            let resolved = self
                .targets
                .get(&ref_name)
                .ok_or(ConfigError::TargetNotFound { name: ref_name })?;
            Self::attach_child(target, resolved)?;
            return Ok(true);
        }
        let Some(type_name) = self.target_type_of(child)? else {
            return Ok(false);
        };
        let nested = self.create_target(&type_name, child, defaults)?;
        let shared: SharedTarget = Arc::from(nested);
        self.targets.insert(shared.clone());
        Self::attach_child(target, shared)?;
        Ok(true)
    }

    fn attach_child(target: &mut dyn Target, child: SharedTarget) -> ConfigResult<()> {
        match target.shape() {
            TargetShape::Wrapper => {
                if target.wrapped().is_some() {
                    return Err(ConfigError::WrapperOccupied {
                        name: display_name(target),
                    });
                }
                target.set_wrapped(child);
            }
            TargetShape::Compound => target.add_child_target(child),
            // Shape is checked before attaching; nothing to do for leaves.
            TargetShape::Leaf => {}
        }
        Ok(())
    }

    /// Post-construction decorations, in fixed order.
    fn decorate(
        &mut self,
        target: Box<dyn Target>,
        async_wrap: bool,
        default_wrapper: Option<&ConfigElement>,
    ) -> ConfigResult<Box<dyn Target>> {
        let mut target = target;
        if async_wrap {
            target = self.wrap_async(target);
        }
        if let Some(template) = default_wrapper {
            target = self.inject_default_wrapper(template, target)?;
        }
        Ok(target)
    }

    /// Freeze `target` under its `_wrapped` rename and register it. Returns
    /// the original name (to move onto the outer node) and the frozen child.
    fn freeze_renamed(&mut self, mut target: Box<dyn Target>) -> (Option<String>, SharedTarget) {
        let original = target.name().map(str::to_string);
        if let Some(name) = &original {
            target.set_name(&format!("{name}_wrapped"));
        }
        let shared: SharedTarget = Arc::from(target);
        self.targets.insert(shared.clone());
        (original, shared)
    }

    /// Automatic async-queue wrapping for every freshly parsed top-level
    /// target of an `async = true` section.
    fn wrap_async(&mut self, target: Box<dyn Target>) -> Box<dyn Target> {
        let (original, inner) = self.freeze_renamed(target);
        let mut wrapper = Box::new(crate::targets::wrappers::AsyncQueueWrapper::default());
        wrapper.set_wrapped(inner);
        if let Some(name) = &original {
            wrapper.set_name(name);
            tracing::debug!(target_name = %name, "target wrapped in async queue");
        }
        wrapper
    }

    /// Default-wrapper injection: re-instantiate the template around the
    /// target, attaching it at the innermost open slot of the template's
    /// wrapper chain.
    fn inject_default_wrapper(
        &mut self,
        template: &ConfigElement,
        target: Box<dyn Target>,
    ) -> ConfigResult<Box<dyn Target>> {
        let (original, inner) = self.freeze_renamed(target);
        let mut outer = self.build_wrapper_chain(template, inner)?;
        if let Some(name) = &original {
            outer.set_name(name);
            tracing::debug!(target_name = %name, wrapper = outer.type_name(), "default wrapper applied");
        }
        Ok(outer)
    }

    /// Recursively construct the template's wrapper chain. Each node must be
    /// a wrapper; the first nested target definition continues the chain,
    /// and the innermost node without one receives `innermost`.
    fn build_wrapper_chain(
        &mut self,
        node: &ConfigElement,
        innermost: SharedTarget,
    ) -> ConfigResult<Box<dyn Target>> {
        let type_name = match self.target_type_of(node)? {
            Some(type_name) => type_name,
            None => {
                let raw = node.required_attribute("type")?;
                self.variables.expand(raw)
            }
        };
        let mut wrapper = self.registry.targets.create(&type_name)?;
        if wrapper.shape() != TargetShape::Wrapper {
            return Err(ConfigError::NotAWrapper { type_name });
        }
        self.apply_attributes(&mut *wrapper, node)?;

        let mut attached = false;
        for child in node.children() {
            let nested = self.target_type_of(child)?;
            if nested.is_some() && !attached {
                let deeper = self.build_wrapper_chain(child, innermost.clone())?;
                wrapper.set_wrapped(Arc::from(deeper));
                attached = true;
            } else if nested.is_some() {
                self.soft_error(ConfigError::UnknownElement {
                    parent: node.name().to_string(),
                    element: child.name().to_string(),
                });
            } else if self.try_generic_child(&mut *wrapper, child)? {
                // handled as a plain property child
            } else {
                self.apply_text_child(&mut *wrapper, child)?;
            }
        }
        if !attached {
            wrapper.set_wrapped(innermost);
        }
        Ok(wrapper)
    }

    // --- generic child handling, shared by every configurable kind -------

    /// Apply every attribute as a property, variable-expanded, skipping the
    /// `type` attribute itself.
    pub(crate) fn apply_attributes<T: Configurable + ?Sized>(
        &mut self,
        obj: &mut T,
        node: &ConfigElement,
    ) -> ConfigResult<()> {
        for (name, raw) in node.attributes() {
            if name.eq_ignore_ascii_case("type") {
                continue;
            }
            let value = self.variables.expand(raw);
            obj.set_text(name, &value)
                .map_err(|source| ConfigError::Property {
                    type_name: obj.type_name().to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Attributes plus generic children; the recursion used for layouts,
    /// filters, sequence items and time sources.
    pub(crate) fn configure_object<T: Configurable + ?Sized>(
        &mut self,
        obj: &mut T,
        node: &ConfigElement,
    ) -> ConfigResult<()> {
        self.apply_attributes(obj, node)?;
        for child in node.children() {
            if self.try_generic_child(obj, child)? {
                continue;
            }
            self.apply_text_child(obj, child)?;
        }
        Ok(())
    }

    /// Sequence-item append and typed layout assignment. Returns `false`
    /// when the child is not handled by either.
    pub(crate) fn try_generic_child<T: Configurable + ?Sized>(
        &mut self,
        obj: &mut T,
        child: &ConfigElement,
    ) -> ConfigResult<bool> {
        let name = child.name();
        match obj.property_kind(name) {
            Some(PropertyKind::ItemList) => {
                let mut item = obj.new_item(name).map_err(|source| ConfigError::Property {
                    type_name: obj.type_name().to_string(),
                    source,
                })?;
                self.configure_object(&mut *item, child)?;
                obj.push_item(name, item)
                    .map_err(|source| ConfigError::Property {
                        type_name: obj.type_name().to_string(),
                        source,
                    })?;
                Ok(true)
            }
            Some(PropertyKind::Layout) => {
                let Some(raw_type) = child.attribute("type") else {
                    return Ok(false);
                };
                let type_name = self.variables.expand(raw_type);
                let layout = self.create_layout(&type_name, child)?;
                obj.set_layout(name, layout)
                    .map_err(|source| ConfigError::Property {
                        type_name: obj.type_name().to_string(),
                        source,
                    })?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Generic property assignment from the element's text value; a child
    /// with no text is an unknown element (soft).
    pub(crate) fn apply_text_child<T: Configurable + ?Sized>(
        &mut self,
        obj: &mut T,
        child: &ConfigElement,
    ) -> ConfigResult<()> {
        match child.text() {
            Some(text) => {
                let value = self.variables.expand(text);
                obj.set_text(child.name(), &value)
                    .map_err(|source| ConfigError::Property {
                        type_name: obj.type_name().to_string(),
                        source,
                    })
            }
            None => {
                self.soft_error(ConfigError::UnknownElement {
                    parent: obj.type_name().to_string(),
                    element: child.name().to_string(),
                });
                Ok(())
            }
        }
    }

    /// Construct and configure a layout by registered type name.
    pub(crate) fn create_layout(
        &mut self,
        type_name: &str,
        node: &ConfigElement,
    ) -> ConfigResult<Box<dyn Layout>> {
        let mut layout = self.registry.layouts.create(type_name)?;
        self.configure_object(&mut *layout, node)?;
        Ok(layout)
    }
}
