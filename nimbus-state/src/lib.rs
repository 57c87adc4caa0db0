//! Nimbus State Management
//!
//! Persists the backend identifier of every managed resource so later runs
//! can read, delete or skip it.
//!
//! - **StateFile**: all managed resources and their identifiers
//! - **StateBackend**: storage of the state file
//! - **LocalBackend**: JSON file on the local disk

pub mod backend;
pub mod backends;
pub mod state;

// Re-export main types for convenience
pub use backend::{BackendError, BackendResult, StateBackend};
pub use backends::LocalBackend;
pub use state::{ResourceState, StateFile};
