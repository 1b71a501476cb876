//! Configuration compiler.
//!
//! # Responsibilities
//! - Drive one compile pass: dispatch sections, thread the session state,
//!   defer rules until every target is registered, conclude with a
//!   validated [`LoggingConfiguration`] or a surfaced error
//! - Root-element handling: `logging` directly, or a pass-through
//!   `configuration` wrapper
//! - The `extensions`, `variable` and `time` sections
//!
//! # Design Decisions
//! - All mutable compile state lives on the [`ConfigCompiler`] session
//!   object, which is consumed by one compile; there is no ambient global
//!   state, so independent compiles cannot interfere.
//! - Within one document the registrar runs first and variables second, so
//!   later sections can resolve extension types and `${name}` tokens.
//! - Rules are parsed last, across all included documents, so forward
//!   references from rules to targets just work.

pub mod include;
pub mod rules;
pub mod targets;
pub mod validation;
pub mod variables;

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{ConfigError, ConfigResult};
use crate::levels::Level;
use crate::reader::{self, ConfigElement};
use crate::registry::extensions::ExtensionCatalog;
use crate::registry::TypeRegistry;
use crate::rules::LoggingRule;
use crate::summary::ConfigSummary;
use crate::targets::{SharedTarget, TargetTable};
use crate::time::{FastLocal, TimeSource};
use self::variables::VariableStore;

/// Outcome of the most recent compile pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileStatus {
    Unstarted,
    Failed,
    Succeeded,
}

impl CompileStatus {
    pub fn name(self) -> &'static str {
        match self {
            CompileStatus::Unstarted => "unstarted",
            CompileStatus::Failed => "failed",
            CompileStatus::Succeeded => "succeeded",
        }
    }
}

/// How the runtime interprets message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageFormatMode {
    /// Detect templates per message.
    #[default]
    Auto,
    /// Always parse messages as templates.
    Template,
    /// Treat messages as opaque text.
    Plain,
}

impl FromStr for MessageFormatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.eq_ignore_ascii_case("auto") {
            Ok(MessageFormatMode::Auto)
        } else if name.eq_ignore_ascii_case("template") {
            Ok(MessageFormatMode::Template)
        } else if name.eq_ignore_ascii_case("plain") {
            Ok(MessageFormatMode::Plain)
        } else {
            Err(format!(
                "unknown message format '{name}', expected auto, template or plain"
            ))
        }
    }
}

/// Global toggles read from the root element (or seeded by the host).
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Promote configuration faults to errors. `strict()` folds the two
    /// spellings together.
    pub throw_exceptions: Option<bool>,
    pub throw_config_exceptions: Option<bool>,
    /// Minimum severity the runtime considers at all.
    pub global_threshold: Level,
    /// Culture tag applied when formatting values; opaque to the compiler.
    pub default_culture: Option<String>,
    pub message_format: MessageFormatMode,
}

impl CompileOptions {
    /// Effective strict mode: the first non-null of the config-specific
    /// flag and the general flag.
    pub fn strict(&self) -> bool {
        self.throw_config_exceptions
            .or(self.throw_exceptions)
            .unwrap_or(false)
    }
}

/// One configuration source file and its resolved auto-reload flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub auto_reload: bool,
}

/// Canonical-path registry: include dedup plus the files-to-watch surface.
#[derive(Debug, Default)]
pub struct SourceRegistry {
    entries: Vec<SourceFile>,
}

impl SourceRegistry {
    /// Record a source path. Returns `false` when it was already present,
    /// which is what makes re-inclusion a no-op.
    pub fn register(&mut self, path: PathBuf) -> bool {
        if self.entries.iter().any(|e| e.path == path) {
            return false;
        }
        self.entries.push(SourceFile {
            path,
            auto_reload: false,
        });
        true
    }

    pub fn set_auto_reload(&mut self, path: &Path, auto_reload: bool) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.path == path) {
            entry.auto_reload = auto_reload;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceFile> {
        self.entries.iter()
    }

    /// Paths whose documents asked to be watched for changes.
    pub fn reload_paths(&self) -> Vec<PathBuf> {
        self.entries
            .iter()
            .filter(|e| e.auto_reload)
            .map(|e| e.path.clone())
            .collect()
    }
}

/// One compile session. Created per pass and consumed by it; the API is not
/// meant to be shared across threads while a compile is running.
pub struct ConfigCompiler {
    pub(crate) registry: TypeRegistry,
    pub(crate) catalog: ExtensionCatalog,
    pub(crate) variables: VariableStore,
    pub(crate) targets: TargetTable,
    pub(crate) rules: Vec<LoggingRule>,
    pub(crate) pending_rules: Vec<ConfigElement>,
    pub(crate) sources: SourceRegistry,
    pub(crate) soft_errors: Vec<ConfigError>,
    pub(crate) options: CompileOptions,
    pub(crate) time_source: Option<Arc<dyn TimeSource>>,
    pub(crate) status: CompileStatus,
}

impl Default for ConfigCompiler {
    fn default() -> Self {
        ConfigCompiler::new()
    }
}

impl ConfigCompiler {
    /// Session with the built-in types and an empty extension catalog.
    pub fn new() -> ConfigCompiler {
        ConfigCompiler {
            registry: TypeRegistry::with_builtins(),
            catalog: ExtensionCatalog::new(),
            variables: VariableStore::default(),
            targets: TargetTable::default(),
            rules: Vec::new(),
            pending_rules: Vec::new(),
            sources: SourceRegistry::default(),
            soft_errors: Vec::new(),
            options: CompileOptions::default(),
            time_source: None,
            status: CompileStatus::Unstarted,
        }
    }

    /// Make an extension catalog available to `extensions` sections.
    pub fn with_catalog(mut self, catalog: ExtensionCatalog) -> ConfigCompiler {
        self.catalog = catalog;
        self
    }

    /// Seed options before the document's root attributes apply on top.
    pub fn with_options(mut self, options: CompileOptions) -> ConfigCompiler {
        self.options = options;
        self
    }

    /// Compile a configuration file from disk.
    pub fn compile_file(mut self, path: &Path) -> ConfigResult<LoggingConfiguration> {
        let display = path.display().to_string();
        let mut outcome = self.include_file(path);
        if outcome.is_ok() {
            outcome = self
                .apply_deferred_rules()
                .map_err(|e| ConfigError::with_source(&display, e));
        }
        self.conclude(outcome, &display)
    }

    /// Compile configuration text with no backing file.
    pub fn compile_str(mut self, text: &str) -> ConfigResult<LoggingConfiguration> {
        let mut outcome = self
            .parse_text(text, None)
            .map_err(|e| ConfigError::with_source("<string>", e));
        if outcome.is_ok() {
            outcome = self
                .apply_deferred_rules()
                .map_err(|e| ConfigError::with_source("<string>", e));
        }
        self.conclude(outcome, "<string>")
    }

    /// Compile an already-built declarative tree.
    pub fn compile_element(
        mut self,
        root: &ConfigElement,
        source: Option<&Path>,
    ) -> ConfigResult<LoggingConfiguration> {
        if let Some(path) = source {
            self.sources.register(path.to_path_buf());
        }
        let name = source
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<element>".to_string());
        let mut outcome = self
            .dispatch_root(root, source)
            .map_err(|e| ConfigError::with_source(&name, e));
        if outcome.is_ok() {
            outcome = self
                .apply_deferred_rules()
                .map_err(|e| ConfigError::with_source(&name, e));
        }
        self.conclude(outcome, &name)
    }

    /// Resolve the pass to a finished configuration or a surfaced error.
    /// Nothing propagates silently past this point.
    fn conclude(
        mut self,
        outcome: ConfigResult<()>,
        source_name: &str,
    ) -> ConfigResult<LoggingConfiguration> {
        match outcome {
            Ok(()) => {
                self.status = CompileStatus::Succeeded;
                if let Err(error) = self.validate() {
                    self.status = CompileStatus::Failed;
                    let error = ConfigError::with_source(source_name, error);
                    tracing::error!(%error, "configuration rejected by validation");
                    return Err(error);
                }
                tracing::info!(
                    source = source_name,
                    targets = self.targets.len(),
                    rules = self.rules.len(),
                    "configuration compiled"
                );
                Ok(LoggingConfiguration {
                    rules: self.rules,
                    targets: self.targets,
                    sources: self.sources,
                    options: self.options,
                    time_source: self
                        .time_source
                        .unwrap_or_else(|| Arc::new(FastLocal::default())),
                    status: CompileStatus::Succeeded,
                })
            }
            Err(error) => {
                self.status = CompileStatus::Failed;
                // Runs the skip branch: validation passes only apply to a
                // compile that reached the succeeded state.
                let _ = self.validate();
                tracing::error!(%error, "configuration compile failed");
                Err(error)
            }
        }
    }

    /// Parse configuration text and feed the resulting tree through the
    /// dispatcher. Reader warnings become soft errors.
    pub(crate) fn parse_text(&mut self, text: &str, source: Option<&Path>) -> ConfigResult<()> {
        let document = reader::toml::parse_document(text)?;
        for warning in document.warnings {
            self.soft_error(ConfigError::Reader(warning));
        }
        self.dispatch_root(&document.root, source)
    }

    /// Top-level routing: a `logging` element is a settings element; a
    /// `configuration` element is a pass-through wrapper around one or more
    /// of them. Anything else is a fatal naming mismatch.
    pub(crate) fn dispatch_root(
        &mut self,
        root: &ConfigElement,
        source: Option<&Path>,
    ) -> ConfigResult<()> {
        root.assert_name(&["logging", "configuration"])?;
        if root.name().eq_ignore_ascii_case("configuration") {
            for child in root.children() {
                if child.name().eq_ignore_ascii_case("logging") {
                    self.parse_logging(child, source)?;
                } else {
                    self.soft_error(ConfigError::UnknownElement {
                        parent: "configuration".to_string(),
                        element: child.name().to_string(),
                    });
                }
            }
            Ok(())
        } else {
            self.parse_logging(root, source)
        }
    }

    fn parse_logging(&mut self, elem: &ConfigElement, source: Option<&Path>) -> ConfigResult<()> {
        elem.assert_name(&["logging"])?;
        self.apply_root_attributes(elem, source)?;

        let base_dir = source.and_then(|p| p.parent().map(Path::to_path_buf));
        let base = base_dir.as_deref();

        // Extensions register first so later sections resolve plugin types;
        // variables load second so every later attribute value can expand.
        for child in elem.children() {
            if child.name().eq_ignore_ascii_case("extensions") {
                self.parse_extensions(child, base)?;
            }
        }
        for child in elem.children() {
            if child.name().eq_ignore_ascii_case("variable") {
                self.parse_variable(child)?;
            }
        }

        for child in elem.children() {
            let name = child.name();
            if name.eq_ignore_ascii_case("extensions") || name.eq_ignore_ascii_case("variable") {
                continue;
            }
            if name.eq_ignore_ascii_case("targets") {
                self.parse_targets_section(child)?;
            } else if name.eq_ignore_ascii_case("rules") {
                // Deferred: applied once every document has contributed its
                // targets.
                self.pending_rules.push(child.clone());
            } else if name.eq_ignore_ascii_case("include") {
                self.parse_include(child, base)?;
            } else if name.eq_ignore_ascii_case("time") {
                self.parse_time(child)?;
            } else {
                self.soft_error(ConfigError::UnknownElement {
                    parent: "logging".to_string(),
                    element: name.to_string(),
                });
            }
        }
        Ok(())
    }

    fn apply_root_attributes(
        &mut self,
        elem: &ConfigElement,
        source: Option<&Path>,
    ) -> ConfigResult<()> {
        for (name, value) in elem.attributes() {
            if name.eq_ignore_ascii_case("auto_reload") {
                let flag = self.root_bool(elem, name, value)?;
                if let Some(path) = source {
                    self.sources.set_auto_reload(path, flag);
                }
            } else if name.eq_ignore_ascii_case("throw_exceptions") {
                self.options.throw_exceptions = Some(self.root_bool(elem, name, value)?);
            } else if name.eq_ignore_ascii_case("throw_config_exceptions") {
                self.options.throw_config_exceptions = Some(self.root_bool(elem, name, value)?);
            } else if name.eq_ignore_ascii_case("global_threshold") {
                self.options.global_threshold =
                    value
                        .parse::<Level>()
                        .map_err(|reason| ConfigError::InvalidAttribute {
                            element: elem.name().to_string(),
                            attribute: name.clone(),
                            value: value.clone(),
                            reason,
                        })?;
            } else if name.eq_ignore_ascii_case("default_culture") {
                self.options.default_culture = Some(value.clone());
            } else if name.eq_ignore_ascii_case("message_format") {
                self.options.message_format =
                    value
                        .parse::<MessageFormatMode>()
                        .map_err(|reason| ConfigError::InvalidAttribute {
                            element: elem.name().to_string(),
                            attribute: name.clone(),
                            value: value.clone(),
                            reason,
                        })?;
            } else {
                tracing::warn!(attribute = %name, "unknown root attribute ignored");
            }
        }
        Ok(())
    }

    fn root_bool(&self, elem: &ConfigElement, name: &str, value: &str) -> ConfigResult<bool> {
        reader::parse_bool_text(value).ok_or_else(|| ConfigError::InvalidAttribute {
            element: elem.name().to_string(),
            attribute: name.to_string(),
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        })
    }

    /// `extensions` section: pull named types or whole sets from the
    /// catalog into the session registry. Load failures are recoverable.
    fn parse_extensions(
        &mut self,
        elem: &ConfigElement,
        base_dir: Option<&Path>,
    ) -> ConfigResult<()> {
        for child in elem.children() {
            if !child.name().eq_ignore_ascii_case("add") {
                self.soft_error(ConfigError::UnknownElement {
                    parent: "extensions".to_string(),
                    element: child.name().to_string(),
                });
                continue;
            }
            let prefix = child.attribute("prefix").unwrap_or("").to_string();
            if let Some(type_name) = child.attribute("type").map(str::to_string) {
                self.register_extension_type(&type_name, &prefix)?;
            } else if let Some(set_name) = child.attribute("assembly").map(str::to_string) {
                self.register_extension_set(&set_name, &prefix)?;
            } else if let Some(file) = child.attribute("assembly_file").map(str::to_string) {
                self.register_extension_file(&file, base_dir, &prefix)?;
            } else {
                self.recoverable(ConfigError::Extension {
                    name: "<add>".to_string(),
                    reason: "entry needs a type, assembly or assembly_file attribute".to_string(),
                })?;
            }
        }
        Ok(())
    }

    fn register_extension_type(&mut self, type_name: &str, prefix: &str) -> ConfigResult<()> {
        let set = self.catalog.find_type(type_name).map(|(set, _)| set.clone());
        match set {
            Some(set) => {
                set.install_single(&mut self.registry, type_name, prefix);
                tracing::info!(
                    extension_type = type_name,
                    set = set.name(),
                    "extension type registered"
                );
                Ok(())
            }
            None => self.recoverable(ConfigError::Extension {
                name: type_name.to_string(),
                reason: "type not present in any registered extension set".to_string(),
            }),
        }
    }

    fn register_extension_set(&mut self, set_name: &str, prefix: &str) -> ConfigResult<()> {
        let set = self.catalog.get(set_name).cloned();
        match set {
            Some(set) => {
                set.install(&mut self.registry, prefix);
                tracing::info!(set = set.name(), "extension set registered");
                Ok(())
            }
            None => self.recoverable(ConfigError::Extension {
                name: set_name.to_string(),
                reason: "no extension set with this name".to_string(),
            }),
        }
    }

    /// The file form resolves relative to the configuration's directory and
    /// matches the catalog by file stem.
    fn register_extension_file(
        &mut self,
        file: &str,
        base_dir: Option<&Path>,
        prefix: &str,
    ) -> ConfigResult<()> {
        let mut path = PathBuf::from(file);
        if path.is_relative() {
            if let Some(base) = base_dir {
                path = base.join(path);
            }
        }
        let set = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|stem| self.catalog.get(stem))
            .cloned();
        match set {
            Some(set) => {
                set.install(&mut self.registry, prefix);
                tracing::info!(set = set.name(), file = %path.display(), "extension set registered");
                Ok(())
            }
            None => self.recoverable(ConfigError::Extension {
                name: path.display().to_string(),
                reason: "no extension set matches this file".to_string(),
            }),
        }
    }

    /// `variable` element: the value is expanded against earlier variables
    /// at definition time, then stored as deferred text.
    fn parse_variable(&mut self, elem: &ConfigElement) -> ConfigResult<()> {
        let name = elem.required_attribute("name")?.to_string();
        let raw = elem
            .attribute("value")
            .or_else(|| elem.text())
            .unwrap_or("")
            .to_string();
        let value = self.variables.expand(&raw);
        self.variables.set(name, value);
        Ok(())
    }

    /// `time` element: select the event time source by registered type.
    fn parse_time(&mut self, elem: &ConfigElement) -> ConfigResult<()> {
        let raw = elem.required_attribute("type")?;
        let type_name = self.variables.expand(raw);
        let mut source = self.registry.time_sources.create(&type_name)?;
        self.apply_attributes(&mut *source, elem)?;
        tracing::debug!(time_source = %type_name, "time source installed");
        self.time_source = Some(Arc::from(source));
        Ok(())
    }

    /// Record a soft diagnostic: warn now, replay at validation, fatal only
    /// in aggregate under strict mode.
    pub(crate) fn soft_error(&mut self, error: ConfigError) {
        tracing::warn!(%error, "configuration warning");
        self.soft_errors.push(error);
    }

    /// Recoverable-load failure: under strict mode it propagates
    /// immediately, otherwise it is logged and collected.
    pub(crate) fn recoverable(&mut self, error: ConfigError) -> ConfigResult<()> {
        if self.options.strict() {
            return Err(error);
        }
        tracing::warn!(%error, "recoverable configuration failure");
        self.soft_errors.push(error);
        Ok(())
    }
}

/// A finished, mostly-immutable compile snapshot.
///
/// Targets and rules are frozen behind shared pointers, so any number of
/// runtime readers can walk the forest while a newer compile builds its own
/// snapshot elsewhere.
#[derive(Debug)]
pub struct LoggingConfiguration {
    rules: Vec<LoggingRule>,
    targets: TargetTable,
    sources: SourceRegistry,
    options: CompileOptions,
    time_source: Arc<dyn TimeSource>,
    status: CompileStatus,
}

impl LoggingConfiguration {
    /// Compile `path` with default options and built-in types.
    pub fn from_file(path: &Path) -> ConfigResult<LoggingConfiguration> {
        ConfigCompiler::new().compile_file(path)
    }

    /// Compile configuration text with default options and built-in types.
    pub fn from_str(text: &str) -> ConfigResult<LoggingConfiguration> {
        ConfigCompiler::new().compile_str(text)
    }

    /// Ordered rule forest.
    pub fn rules(&self) -> &[LoggingRule] {
        &self.rules
    }

    /// Read-only view of the flat name → target registry.
    pub fn targets(&self) -> &TargetTable {
        &self.targets
    }

    /// Case-insensitive target lookup.
    pub fn find_target(&self, name: &str) -> Option<SharedTarget> {
        self.targets.get(name)
    }

    /// Source files that fed this configuration.
    pub fn sources(&self) -> impl Iterator<Item = &SourceFile> {
        self.sources.iter()
    }

    /// Paths that should be watched for changes.
    pub fn reload_paths(&self) -> Vec<PathBuf> {
        self.sources.reload_paths()
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn time_source(&self) -> &Arc<dyn TimeSource> {
        &self.time_source
    }

    pub fn status(&self) -> CompileStatus {
        self.status
    }

    /// Registered targets referenced by no rule and contained by no other
    /// target.
    pub fn unused_targets(&self) -> Vec<String> {
        validation::unused_targets(&self.targets, &self.rules)
    }

    /// Serializable description of the compiled pipeline.
    pub fn summary(&self) -> ConfigSummary {
        ConfigSummary::of(self)
    }
}
