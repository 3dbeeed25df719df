//! Asynchronous seam to the authoritative move validator.
//!
//! The pipeline never assumes where the authority lives: a remote session
//! server, an in-process [`LocalAuthority`](crate::providers::LocalAuthority)
//! or a scripted test double all implement [`AuthoritativeSource`].
use async_trait::async_trait;

use super::errors::DispatchError;
use crate::wire::{MoveMessage, MoveResponse};

/// Validates moves against the authoritative copy of the game.
///
/// Different implementations can handle:
/// - A persistent bidirectional channel to a session server
/// - An in-process engine for offline play
/// - Scripted responses in tests
#[async_trait]
pub trait AuthoritativeSource: Send + Sync {
    /// Submits one move and waits for its verdict.
    ///
    /// An `Ok` response with `success == false` and an `Err` are handled
    /// identically by the pipeline; the distinction only matters for logs.
    async fn submit_move(&self, message: MoveMessage) -> Result<MoveResponse, DispatchError>;
}
