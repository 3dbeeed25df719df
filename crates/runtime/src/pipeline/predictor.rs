//! Local, speculative application of motions.
use tokio::time::Instant;
use tracing::debug;

use game_core::{
    CharSearchMemory, GameConfig, GameEngine, GameState, MotionEngine, MotionRequest, MoveOutcome,
    PlayerState,
};

use super::MoveId;

/// A move applied locally and dispatched, awaiting its verdict.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingMove {
    pub id: MoveId,
    pub request: MotionRequest,
    pub issued_at: Instant,
    /// Player state right after this move was (re)applied locally.
    pub predicted: PlayerState,
    /// Search memory right after this move was (re)applied locally.
    pub search_after: CharSearchMemory,
}

/// Result of [`Predictor::predict`].
#[derive(Clone, Debug, PartialEq)]
pub enum Prediction {
    /// The mirror advanced; `pending` must be queued and dispatched.
    Applied {
        pending: PendingMove,
        outcome: MoveOutcome,
    },
    /// Nothing changed and nothing is sent.
    Blocked { outcome: MoveOutcome },
}

/// Applies motions to the local mirror before the authority answers.
#[derive(Clone, Debug)]
pub struct Predictor {
    config: GameConfig,
    next_id: MoveId,
}

impl Predictor {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            next_id: MoveId(1),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Last id handed out, if any.
    pub fn last_issued(&self) -> Option<MoveId> {
        self.next_id.0.checked_sub(1).filter(|&id| id > 0).map(MoveId)
    }

    /// Runs `request` against the mirror.
    ///
    /// A blocked move is never dispatched, so it leaves both the mirror and
    /// the search memory untouched.
    pub fn predict(
        &mut self,
        state: &mut GameState,
        motions: &mut MotionEngine,
        request: MotionRequest,
        now: Instant,
    ) -> Prediction {
        let search_before = *motions.search_memory();
        let outcome = GameEngine::new(state).execute(motions, &request, &self.config);

        if outcome.is_blocked() {
            motions.restore_search_memory(search_before);
            debug!(
                target: "runtime::predictor",
                motion = %request,
                family = %request.motion.family(),
                position = %state.player.position,
                "motion blocked locally"
            );
            return Prediction::Blocked { outcome };
        }

        let id = self.next_id;
        self.next_id = id.next();
        debug!(
            target: "runtime::predictor",
            %id,
            motion = %request,
            family = %request.motion.family(),
            position = %state.player.position,
            executed = outcome.moves_executed,
            requested = outcome.requested,
            "motion applied optimistically"
        );

        Prediction::Applied {
            pending: PendingMove {
                id,
                request,
                issued_at: now,
                predicted: state.player,
                search_after: *motions.search_memory(),
            },
            outcome,
        }
    }
}
