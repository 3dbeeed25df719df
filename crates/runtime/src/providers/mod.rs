//! Authoritative source implementations.

pub mod local;

pub use local::{LocalAuthority, LocalAuthorityOptions};
