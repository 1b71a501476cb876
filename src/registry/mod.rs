//! Type registries: name → factory resolution.
//!
//! # Responsibilities
//! - Map registered type names to factory functions, one namespace per item
//!   kind (targets, filters, layouts, time sources)
//! - Normalize lookups: trimmed, case-insensitive, namespace prefix before
//!   `:` stripped
//!
//! # Design Decisions
//! - A registry is an explicit capability set populated at startup from the
//!   built-in extension set and extended at compile time by `extensions`
//!   sections. There is no runtime type discovery.

pub mod extensions;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{ConfigError, ConfigResult};
use crate::filters::Filter;
use crate::layouts::Layout;
use crate::targets::Target;
use crate::time::TimeSource;

/// Factory producing a fresh, default-configured instance.
pub type Factory<T> = Arc<dyn Fn() -> Box<T> + Send + Sync>;

/// Name → factory map for one item kind.
pub struct FactoryMap<T: ?Sized> {
    kind: &'static str,
    entries: HashMap<String, Factory<T>>,
}

impl<T: ?Sized> FactoryMap<T> {
    pub fn new(kind: &'static str) -> FactoryMap<T> {
        FactoryMap {
            kind,
            entries: HashMap::new(),
        }
    }

    /// Register a factory under `name`. A later registration with the same
    /// name wins, which is how extensions shadow built-ins.
    pub fn register(&mut self, name: &str, factory: Factory<T>) {
        self.entries.insert(normalize(name), factory);
    }

    pub fn register_fn(
        &mut self,
        name: &str,
        factory: impl Fn() -> Box<T> + Send + Sync + 'static,
    ) {
        self.register(name, Arc::new(factory));
    }

    /// Construct an instance of the named type.
    pub fn create(&self, type_name: &str) -> ConfigResult<Box<T>> {
        let key = normalize(type_name);
        match self.entries.get(&key) {
            Some(factory) => Ok(factory()),
            None => Err(ConfigError::UnknownType {
                kind: self.kind,
                name: type_name.trim().to_string(),
            }),
        }
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(&normalize(type_name))
    }
}

impl<T: ?Sized> fmt::Debug for FactoryMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("FactoryMap")
            .field("kind", &self.kind)
            .field("names", &names)
            .finish()
    }
}

/// Lookup normalization: trim, strip any namespace prefix before `:`,
/// lowercase.
fn normalize(name: &str) -> String {
    let trimmed = name.trim();
    let local = trimmed.rsplit(':').next().unwrap_or(trimmed);
    local.trim().to_lowercase()
}

/// All factory namespaces consulted during a compile.
#[derive(Debug)]
pub struct TypeRegistry {
    pub targets: FactoryMap<dyn Target>,
    pub filters: FactoryMap<dyn Filter>,
    pub layouts: FactoryMap<dyn Layout>,
    pub time_sources: FactoryMap<dyn TimeSource>,
}

impl TypeRegistry {
    /// Registry with no registered types at all.
    pub fn empty() -> TypeRegistry {
        TypeRegistry {
            targets: FactoryMap::new("target"),
            filters: FactoryMap::new("filter"),
            layouts: FactoryMap::new("layout"),
            time_sources: FactoryMap::new("time source"),
        }
    }

    /// Registry preloaded with the built-in extension set.
    pub fn with_builtins() -> TypeRegistry {
        let mut registry = TypeRegistry::empty();
        extensions::builtin_set().install(&mut registry, "");
        registry
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        TypeRegistry::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targets::builtin::ConsoleTarget;

    #[test]
    fn lookup_is_normalized() {
        let mut map: FactoryMap<dyn Target> = FactoryMap::new("target");
        map.register_fn("console", || Box::new(ConsoleTarget::default()));

        assert!(map.contains("Console"));
        assert!(map.contains(" console "));
        assert!(map.contains("ext:console"));
        assert!(map.create("CONSOLE").is_ok());
    }

    #[test]
    fn unknown_type_reports_kind_and_name() {
        let map: FactoryMap<dyn Target> = FactoryMap::new("target");
        match map.create("telegram") {
            Err(ConfigError::UnknownType { kind, name }) => {
                assert_eq!(kind, "target");
                assert_eq!(name, "telegram");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn builtins_cover_every_kind() {
        let registry = TypeRegistry::with_builtins();
        assert!(registry.targets.contains("file"));
        assert!(registry.filters.contains("when_contains"));
        assert!(registry.layouts.contains("json"));
        assert!(registry.time_sources.contains("fast_utc"));
    }

    #[test]
    fn later_registration_shadows_earlier() {
        let mut registry = TypeRegistry::with_builtins();
        registry
            .targets
            .register_fn("console", || Box::new(ConsoleTarget::default()));
        assert!(registry.targets.create("console").is_ok());
    }
}
