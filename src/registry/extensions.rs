//! Extension sets: named bundles of registrable types.
//!
//! An extension set is the capability-set analog of a plugin assembly: a
//! named collection of target/filter/layout/time-source factories. The host
//! registers sets into an [`ExtensionCatalog`] up front; `extensions`
//! sections in the document then pull whole sets (or single types) into the
//! compile's [`TypeRegistry`] by logical name.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::filters::{Filter, WhenTextFilter};
use crate::layouts::{JsonLayout, Layout, SimpleLayout};
use crate::registry::{Factory, TypeRegistry};
use crate::targets::builtin::{ConsoleTarget, FileTarget, MemoryTarget, NullTarget};
use crate::targets::compound::{FallbackGroup, RoundRobinGroup, SplitGroup};
use crate::targets::wrappers::{AsyncQueueWrapper, BufferingWrapper, RetryWrapper};
use crate::targets::Target;
use crate::time::{AccurateLocal, AccurateUtc, FastLocal, FastUtc, SystemTime, TimeSource};

/// One registrable type with its kind-specific factory.
#[derive(Clone)]
pub enum ExtensionItem {
    Target(Factory<dyn Target>),
    Filter(Factory<dyn Filter>),
    Layout(Factory<dyn Layout>),
    TimeSource(Factory<dyn TimeSource>),
}

impl ExtensionItem {
    fn kind(&self) -> &'static str {
        match self {
            ExtensionItem::Target(_) => "target",
            ExtensionItem::Filter(_) => "filter",
            ExtensionItem::Layout(_) => "layout",
            ExtensionItem::TimeSource(_) => "time source",
        }
    }
}

/// A named bundle of registrable types.
#[derive(Clone)]
pub struct ExtensionSet {
    name: String,
    items: Vec<(String, ExtensionItem)>,
}

impl ExtensionSet {
    pub fn new(name: impl Into<String>) -> ExtensionSet {
        ExtensionSet {
            name: name.into(),
            items: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_target(
        mut self,
        name: impl Into<String>,
        factory: impl Fn() -> Box<dyn Target> + Send + Sync + 'static,
    ) -> ExtensionSet {
        self.items
            .push((name.into(), ExtensionItem::Target(Arc::new(factory))));
        self
    }

    pub fn with_filter(
        mut self,
        name: impl Into<String>,
        factory: impl Fn() -> Box<dyn Filter> + Send + Sync + 'static,
    ) -> ExtensionSet {
        self.items
            .push((name.into(), ExtensionItem::Filter(Arc::new(factory))));
        self
    }

    pub fn with_layout(
        mut self,
        name: impl Into<String>,
        factory: impl Fn() -> Box<dyn Layout> + Send + Sync + 'static,
    ) -> ExtensionSet {
        self.items
            .push((name.into(), ExtensionItem::Layout(Arc::new(factory))));
        self
    }

    pub fn with_time_source(
        mut self,
        name: impl Into<String>,
        factory: impl Fn() -> Box<dyn TimeSource> + Send + Sync + 'static,
    ) -> ExtensionSet {
        self.items
            .push((name.into(), ExtensionItem::TimeSource(Arc::new(factory))));
        self
    }

    /// Install every item into `registry`, each name under `prefix`.
    pub fn install(&self, registry: &mut TypeRegistry, prefix: &str) {
        for (name, item) in &self.items {
            install_item(registry, &format!("{prefix}{name}"), item);
        }
    }

    /// Install a single item by its registered name. Returns `false` when
    /// the set has no such type.
    pub fn install_single(&self, registry: &mut TypeRegistry, type_name: &str, prefix: &str) -> bool {
        for (name, item) in &self.items {
            if name.eq_ignore_ascii_case(type_name.trim()) {
                install_item(registry, &format!("{prefix}{name}"), item);
                return true;
            }
        }
        false
    }

    fn find(&self, type_name: &str) -> Option<&ExtensionItem> {
        self.items
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(type_name.trim()))
            .map(|(_, item)| item)
    }
}

impl fmt::Debug for ExtensionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<String> = self
            .items
            .iter()
            .map(|(name, item)| format!("{name} ({})", item.kind()))
            .collect();
        f.debug_struct("ExtensionSet")
            .field("name", &self.name)
            .field("items", &items)
            .finish()
    }
}

fn install_item(registry: &mut TypeRegistry, name: &str, item: &ExtensionItem) {
    match item {
        ExtensionItem::Target(factory) => registry.targets.register(name, factory.clone()),
        ExtensionItem::Filter(factory) => registry.filters.register(name, factory.clone()),
        ExtensionItem::Layout(factory) => registry.layouts.register(name, factory.clone()),
        ExtensionItem::TimeSource(factory) => {
            registry.time_sources.register(name, factory.clone())
        }
    }
}

/// Catalog of extension sets available to `extensions` sections.
#[derive(Debug, Default, Clone)]
pub struct ExtensionCatalog {
    sets: Vec<ExtensionSet>,
}

impl ExtensionCatalog {
    pub fn new() -> ExtensionCatalog {
        ExtensionCatalog::default()
    }

    /// Make a set available for registration by logical name.
    pub fn add(&mut self, set: ExtensionSet) {
        self.sets.push(set);
    }

    /// Logical-name lookup, case-insensitive.
    pub fn get(&self, name: &str) -> Option<&ExtensionSet> {
        self.sets
            .iter()
            .find(|set| set.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Search every set for a single type name.
    pub fn find_type(&self, type_name: &str) -> Option<(&ExtensionSet, &ExtensionItem)> {
        self.sets
            .iter()
            .find_map(|set| set.find(type_name).map(|item| (set, item)))
    }
}

/// The types every compile starts with.
pub fn builtin_set() -> &'static ExtensionSet {
    static BUILTINS: Lazy<ExtensionSet> = Lazy::new(|| {
        ExtensionSet::new("logpipe")
            .with_target("console", || Box::new(ConsoleTarget::default()))
            .with_target("file", || Box::new(FileTarget::default()))
            .with_target("memory", || Box::new(MemoryTarget::default()))
            .with_target("null", || Box::new(NullTarget::default()))
            .with_target("buffering", || Box::new(BufferingWrapper::default()))
            .with_target("async_queue", || Box::new(AsyncQueueWrapper::default()))
            .with_target("retry", || Box::new(RetryWrapper::default()))
            .with_target("split", || Box::new(SplitGroup::default()))
            .with_target("fallback", || Box::new(FallbackGroup::default()))
            .with_target("round_robin", || Box::new(RoundRobinGroup::default()))
            .with_filter("when_contains", || Box::new(WhenTextFilter::contains()))
            .with_filter("when_not_contains", || Box::new(WhenTextFilter::not_contains()))
            .with_filter("when_equals", || Box::new(WhenTextFilter::equals()))
            .with_layout("simple", || Box::new(SimpleLayout::default()))
            .with_layout("json", || Box::new(JsonLayout::default()))
            .with_time_source("system", || Box::new(SystemTime))
            .with_time_source("fast_local", || Box::new(FastLocal::default()))
            .with_time_source("fast_utc", || Box::new(FastUtc::default()))
            .with_time_source("accurate_local", || Box::new(AccurateLocal))
            .with_time_source("accurate_utc", || Box::new(AccurateUtc))
    });
    &BUILTINS
}
