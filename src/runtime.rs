//! Published pipeline snapshot for concurrent readers.
//!
//! A compile pass builds a [`LoggingConfiguration`] privately; installing it
//! here swaps the published snapshot atomically. Readers load an `Arc` and
//! keep reading their snapshot even while a newer compile replaces it —
//! completed configurations are never mutated in place.

use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::compile::{CompileStatus, LoggingConfiguration};

/// The state visible to runtime readers at one point in time.
#[derive(Debug)]
pub struct PipelineState {
    status: CompileStatus,
    configuration: Option<Arc<LoggingConfiguration>>,
}

impl PipelineState {
    /// Tri-state outcome of the most recent compile.
    pub fn status(&self) -> CompileStatus {
        self.status
    }

    /// The active configuration. After a failed reload this is still the
    /// last good one.
    pub fn configuration(&self) -> Option<&Arc<LoggingConfiguration>> {
        self.configuration.as_ref()
    }
}

/// Handle shared between the host, a reload driver and runtime readers.
#[derive(Debug)]
pub struct PipelineHandle {
    state: ArcSwap<PipelineState>,
}

impl PipelineHandle {
    pub fn new() -> PipelineHandle {
        PipelineHandle {
            state: ArcSwap::from_pointee(PipelineState {
                status: CompileStatus::Unstarted,
                configuration: None,
            }),
        }
    }

    /// Publish a freshly compiled configuration.
    pub fn install(&self, configuration: LoggingConfiguration) {
        self.state.store(Arc::new(PipelineState {
            status: CompileStatus::Succeeded,
            configuration: Some(Arc::new(configuration)),
        }));
    }

    /// Record a failed compile. The previous configuration, if any, stays
    /// active so a bad reload never takes logging down.
    pub fn mark_failed(&self) {
        let previous = self.state.load_full();
        self.state.store(Arc::new(PipelineState {
            status: CompileStatus::Failed,
            configuration: previous.configuration.clone(),
        }));
    }

    /// Consistent snapshot of status plus configuration.
    pub fn snapshot(&self) -> Arc<PipelineState> {
        self.state.load_full()
    }

    pub fn status(&self) -> CompileStatus {
        self.state.load().status
    }

    /// Watch surface of the active configuration.
    pub fn reload_paths(&self) -> Vec<PathBuf> {
        match self.state.load().configuration() {
            Some(configuration) => configuration.reload_paths(),
            None => Vec::new(),
        }
    }
}

impl Default for PipelineHandle {
    fn default() -> Self {
        PipelineHandle::new()
    }
}
