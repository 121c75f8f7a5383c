//! Cajole server library - exports modules for testing.

pub mod handlers;
pub mod state;

pub use handlers::router;
pub use state::AppState;
