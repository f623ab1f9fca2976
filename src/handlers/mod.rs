//! HTTP surface
//!
//! Handlers, wire types, the route table, and the shared state they run
//! against.

pub mod health;
pub mod router;
pub mod state;
pub mod types;
pub mod webhook;

// Re-export commonly used items
pub use router::build_router;
pub use state::{AppState, RelayState};
