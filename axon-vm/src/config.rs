//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Safety bounds and observability switches for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Stop the run with a resource error after this many reductions
    /// across all tasks. `None` means unbounded.
    pub max_steps: Option<u64>,

    /// Fail a dispatch after consulting this many handlers. Catches
    /// pathological delegation loops.
    pub max_dispatch_depth: usize,

    /// Record a [`axon_core::StepEvent`] per reduction.
    pub trace: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_steps: None,
            max_dispatch_depth: 64,
            trace: false,
        }
    }
}

impl RunConfig {
    /// A config with tracing enabled.
    pub fn traced() -> Self {
        Self {
            trace: true,
            ..Self::default()
        }
    }
}
