//! Error types for configuration compilation.
//!
//! # Responsibilities
//! - Fatal errors that abort a compile (`ConfigError`)
//! - Property coercion failures (`PropertyError`)
//!
//! # Design Decisions
//! - Malformed structure (bad element name, missing attribute, unresolved
//!   type or target reference) is always fatal.
//! - Recoverable load failures (extensions, ignorable includes) are collected
//!   as soft errors in the session and only become fatal under strict mode.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while compiling a configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The current element's name did not match the expected set.
    #[error("unexpected element <{found}>, expected one of: {expected}")]
    NameMismatch { found: String, expected: String },

    /// A required attribute was absent.
    #[error("missing required attribute '{attribute}' on <{element}>")]
    MissingAttribute { element: String, attribute: String },

    /// An attribute value could not be coerced.
    #[error("invalid value '{value}' for attribute '{attribute}' on <{element}>: {reason}")]
    InvalidAttribute {
        element: String,
        attribute: String,
        value: String,
        reason: String,
    },

    /// A type name did not resolve against the registry.
    #[error("unknown {kind} type '{name}'")]
    UnknownType { kind: &'static str, name: String },

    /// A rule or reference named a target that is not registered.
    #[error("target '{name}' not found")]
    TargetNotFound { name: String },

    /// A wrapper target received a second child.
    #[error("wrapper target '{name}' already has a wrapped target")]
    WrapperOccupied { name: String },

    /// The default wrapper template (or a node inside it) is not a wrapper.
    #[error("target type '{type_name}' is not a wrapper target")]
    NotAWrapper { type_name: String },

    /// Property assignment failed on a configurable object.
    #[error("cannot configure {type_name}: {source}")]
    Property {
        type_name: String,
        #[source]
        source: PropertyError,
    },

    /// A child element no section or type knows how to handle. Soft: it is
    /// collected as a warning and only aggregates to fatal in strict mode.
    #[error("unknown element <{element}> inside <{parent}>")]
    UnknownElement { parent: String, element: String },

    /// A non-fatal anomaly reported by the tree reader.
    #[error("reader warning: {0}")]
    Reader(String),

    /// An extension entry could not be resolved.
    #[error("extension '{name}' could not be loaded: {reason}")]
    Extension { name: String, reason: String },

    /// An include reference resolved to nothing.
    #[error("include '{path}' failed: {reason}")]
    Include { path: String, reason: String },

    /// A source file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration text was not a valid document.
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A fatal error annotated with the source it originated from.
    #[error("{source_name}: {source}")]
    WithSource {
        source_name: String,
        #[source]
        source: Box<ConfigError>,
    },

    /// Several soft errors promoted to one fatal error under strict mode.
    #[error("{}", aggregate_summary(.0))]
    Aggregate(Vec<ConfigError>),
}

impl ConfigError {
    /// Annotate an error with the source identifier it came from.
    pub fn with_source(source_name: impl Into<String>, error: ConfigError) -> ConfigError {
        ConfigError::WithSource {
            source_name: source_name.into(),
            source: Box::new(error),
        }
    }

    /// Collapse accumulated soft errors into a single fatal error.
    pub fn aggregate(errors: Vec<ConfigError>) -> ConfigError {
        ConfigError::Aggregate(errors)
    }
}

fn aggregate_summary(errors: &[ConfigError]) -> String {
    let details: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    format!(
        "{} configuration error(s): {}",
        errors.len(),
        details.join("; ")
    )
}

/// Errors raised while assigning a property on a configurable object.
#[derive(Debug, Error)]
pub enum PropertyError {
    /// No settable member with this name exists.
    #[error("unknown property '{name}'")]
    Unknown { name: String },

    /// The textual value could not be coerced into the member's type.
    #[error("invalid value '{value}' for property '{name}': {reason}")]
    Invalid {
        name: String,
        value: String,
        reason: String,
    },

    /// The member is not a sequence and cannot accept appended items.
    #[error("property '{name}' does not accept nested items")]
    NotAList { name: String },

    /// The member does not accept a layout value.
    #[error("property '{name}' does not accept a layout")]
    NotALayout { name: String },
}

impl PropertyError {
    pub fn unknown(name: impl Into<String>) -> PropertyError {
        PropertyError::Unknown { name: name.into() }
    }

    pub fn invalid(
        name: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> PropertyError {
        PropertyError::Invalid {
            name: name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}
