//! Unified error types surfaced by the runtime API.
//!
//! [`RuntimeError`] covers worker coordination and configuration failures
//! that callers must handle. [`DispatchError`] covers a single move's round
//! trip to the authoritative source; the pipeline absorbs those by rolling
//! back, so they only reach callers through events and logs.
use std::time::Duration;

use thiserror::Error;
use tokio::sync::oneshot;

use game_core::{GameError, MotionError, StateError};

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("pipeline worker command channel closed")]
    CommandChannelClosed,

    #[error("pipeline worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("authoritative push channel closed")]
    PushChannelClosed,

    #[error("pipeline worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    InvalidMotion(#[from] MotionError),

    #[error(transparent)]
    InvalidState(#[from] StateError),

    #[error("malformed push message")]
    InvalidPush(#[source] DispatchError),

    #[error("runtime requires an initial game state before building")]
    MissingInitialState,

    #[error("runtime requires an authoritative source before building")]
    MissingAuthority,
}

impl RuntimeError {
    /// Stable code for log filtering, delegating to game-core for domain errors.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::CommandChannelClosed => "RUNTIME_COMMAND_CHANNEL_CLOSED",
            Self::ReplyChannelClosed(_) => "RUNTIME_REPLY_CHANNEL_CLOSED",
            Self::PushChannelClosed => "RUNTIME_PUSH_CHANNEL_CLOSED",
            Self::WorkerJoin(_) => "RUNTIME_WORKER_JOIN",
            Self::InvalidMotion(err) => err.error_code(),
            Self::InvalidState(err) => err.error_code(),
            Self::InvalidPush(_) => "RUNTIME_INVALID_PUSH",
            Self::MissingInitialState => "RUNTIME_MISSING_INITIAL_STATE",
            Self::MissingAuthority => "RUNTIME_MISSING_AUTHORITY",
        }
    }
}

/// Failure of one move's round trip to the authoritative source.
///
/// Every variant is handled the same way: the move is dropped and the local
/// mirror rolls back to the last confirmed snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("rejected by authority: {0}")]
    Rejected(String),

    #[error("malformed message: {0}")]
    Codec(String),
}

impl From<serde_json::Error> for DispatchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Codec(err.to_string())
    }
}
