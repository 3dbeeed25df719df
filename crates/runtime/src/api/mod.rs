//! Public runtime API surface.
//!
//! This module gathers the types exposed to consumers of the runtime crate so
//! other layers can stay focused on orchestration, workers, or infrastructure.

pub mod authority;
pub mod errors;
pub mod handle;

pub use authority::AuthoritativeSource;
pub use errors::{DispatchError, Result, RuntimeError};
pub use handle::RuntimeHandle;
