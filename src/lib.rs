//! logpipe — compiles declarative configuration into a logging pipeline.
//!
//! The compiler turns a tree-shaped configuration document into a forest of
//! routing rules over a flat registry of composed output targets (leaf,
//! wrapper, compound). It resolves named references, rewrites target trees
//! (async auto-wrapping, default-wrapper injection), follows includes with
//! wildcard expansion and dedup, and degrades gracefully under partial
//! failure. Executing the pipeline against live events is the runtime's
//! job; this crate produces the compiled structures and the list of source
//! paths worth watching.

// Compilation pipeline
pub mod compile;
pub mod reader;
pub mod registry;

// Compiled model
pub mod filters;
pub mod layouts;
pub mod levels;
pub mod rules;
pub mod targets;
pub mod time;

// Cross-cutting concerns
pub mod error;
pub mod properties;
pub mod runtime;
pub mod summary;

mod wildcard;

pub use compile::{
    CompileOptions, CompileStatus, ConfigCompiler, LoggingConfiguration, MessageFormatMode,
    SourceFile,
};
pub use error::{ConfigError, ConfigResult, PropertyError};
pub use levels::{Level, LevelMask};
pub use runtime::PipelineHandle;
