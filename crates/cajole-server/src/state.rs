//! Shared server state.

use cajole::ArrowDialect;
use std::sync::Arc;

/// State shared by all request handlers.
///
/// The transpiler is stateless (its shared base environment lives
/// behind a process-wide `OnceLock` and is immutable after first use),
/// so handlers clone the `Arc` and never contend on anything mutable.
#[derive(Clone)]
pub struct AppState {
    pub transpiler: Arc<ArrowDialect>,
}

impl AppState {
    /// Create the server state.
    pub fn new() -> Self {
        Self {
            transpiler: Arc::new(ArrowDialect::new()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
