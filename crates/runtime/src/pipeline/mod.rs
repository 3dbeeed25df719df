//! Optimistic move pipeline: rate limiting, local prediction, reconciliation.
//!
//! These pieces are synchronous and own no tasks or channels; the
//! pipeline worker drives them from a
//! single task so they never need locking.
mod gate;
mod predictor;
mod reconciler;

pub use gate::{CooldownConfig, CooldownGate, SubmissionPermit, SubmissionSlot, Throttle};
pub use predictor::{PendingMove, Prediction, Predictor};
pub use reconciler::{AuthoritativeUpdate, ConfirmedSnapshot, Reconciler, Reconciliation};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Client-assigned identifier of a dispatched move, increasing per session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoveId(pub u64);

impl MoveId {
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for MoveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "move#{}", self.0)
    }
}
