//! Event types for different topics.

use serde::Serialize;

use game_core::{ActorId, MotionRequest, MoveOutcome, OpponentState, Position};

use crate::pipeline::{MoveId, Throttle};

/// Events related to local submissions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MotionEvent {
    /// The mirror advanced and the move was dispatched.
    Applied {
        id: MoveId,
        request: MotionRequest,
        outcome: MoveOutcome,
    },

    /// The motion was blocked locally. Nothing was dispatched.
    Blocked {
        request: MotionRequest,
        outcome: MoveOutcome,
    },

    /// The cooldown gate dropped the submission.
    Dropped {
        request: MotionRequest,
        throttle: Throttle,
    },
}

/// Events emitted when an authoritative verdict reaches the mirror
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ReconcileEvent {
    /// The authority accepted the move.
    Confirmed {
        id: MoveId,
        /// Mirror position after reconciliation.
        position: Position,
        score: u64,
        /// The authoritative state differed from the prediction.
        mismatch: bool,
        replayed: usize,
        round_trip_ms: u64,
    },

    /// The move was rejected, timed out or failed to reach the authority,
    /// and the mirror was rolled back.
    RolledBack {
        id: MoveId,
        reason: String,
        position: Position,
        replayed: usize,
    },

    /// Confirmed ahead of an earlier move that is still unanswered.
    Held { id: MoveId },

    /// A verdict arrived after a newer authoritative snapshot.
    Superseded { id: MoveId },

    /// No confirmed snapshot to roll back to. A full-state push is needed.
    ResyncRequired { id: MoveId },
}

/// Events driven by pushes from the authority
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SessionEvent {
    OpponentUpdated(OpponentState),

    OpponentLeft { id: ActorId },

    CollectiblesReplaced { count: usize },

    /// A full snapshot replaced the mirror.
    StateReplaced { position: Position, score: u64 },

    /// The authority reported the session complete.
    Completed { score: u64 },
}
