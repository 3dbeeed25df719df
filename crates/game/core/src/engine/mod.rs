//! Move execution over a whole [`GameState`].
//!
//! The [`GameEngine`] is the single reducer for player moves. The optimistic
//! predictor, the reconciler's replay and the in-process authority all call
//! [`GameEngine::execute`], so the same request against the same state and
//! search memory always produces the same successor state.
use crate::config::GameConfig;
use crate::grid::Position;
use crate::motion::{MotionEngine, MotionRequest, MotionResult, apply_count};
use crate::rng::{DrawContext, PcgRng, RngOracle, compute_seed};
use crate::state::GameState;

/// Everything a single move changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoveOutcome {
    /// Final motion result. Blocked moves leave the state untouched.
    pub result: MotionResult,
    pub moves_executed: usize,
    pub requested: usize,
    /// Collectible picked up at the destination.
    pub collected: Option<Position>,
    /// Where the picked-up collectible reappeared.
    pub respawned: Option<Position>,
    /// Score after the move.
    pub score: u64,
    /// The move completed the session.
    pub completed: bool,
}

impl MoveOutcome {
    pub const fn is_blocked(&self) -> bool {
        !self.result.valid
    }

    pub const fn is_partial(&self) -> bool {
        self.moves_executed > 0 && self.moves_executed < self.requested
    }
}

/// Applies moves to a borrowed [`GameState`].
pub struct GameEngine<'a> {
    state: &'a mut GameState,
}

impl<'a> GameEngine<'a> {
    /// Creates a new game engine with the given state.
    pub fn new(state: &'a mut GameState) -> Self {
        Self { state }
    }

    /// Executes `request` for the player.
    ///
    /// On a valid move the player adopts the final position and preferred
    /// column, the nonce advances, and a collectible at the destination is
    /// collected (and possibly respawned). Intermediate cells of a counted
    /// move never collect. A completed session blocks every further move.
    pub fn execute(
        &mut self,
        motions: &mut MotionEngine,
        request: &MotionRequest,
        config: &GameConfig,
    ) -> MoveOutcome {
        let state = &mut *self.state;
        let origin = state.player;

        if state.completed {
            return MoveOutcome {
                result: MotionResult::blocked(origin.position, origin.preferred_column),
                moves_executed: 0,
                requested: request.count,
                collected: None,
                respawned: None,
                score: origin.score,
                completed: false,
            };
        }

        let occupancy = state.occupancy();
        let counted = apply_count(motions, request, &state.motion_context(&occupancy));
        let mut outcome = MoveOutcome {
            result: counted.result,
            moves_executed: counted.moves_executed,
            requested: counted.requested,
            collected: None,
            respawned: None,
            score: origin.score,
            completed: false,
        };
        if !counted.result.valid {
            return outcome;
        }

        state.player.position = counted.result.position;
        state.player.preferred_column = counted.result.preferred_column;
        state.nonce += 1;

        let destination = counted.result.position;
        if state.collectibles.remove(&destination) {
            state.player.score += config.collectible_points;
            outcome.collected = Some(destination);
            if config.respawn_collectibles {
                outcome.respawned = respawn(state);
            }
        }

        outcome.score = state.player.score;
        if config
            .target_score
            .is_some_and(|target| state.player.score >= target)
        {
            state.completed = true;
            outcome.completed = true;
        }
        outcome
    }
}

fn respawn(state: &mut GameState) -> Option<Position> {
    let candidates = state.spawn_candidates();
    let seed = compute_seed(state.game_seed, state.nonce, DrawContext::Respawn);
    let position = candidates.get(PcgRng.pick(seed, candidates.len())?).copied()?;
    state.collectibles.insert(position);
    Some(position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::TextGrid;
    use crate::motion::Motion;

    fn state() -> GameState {
        GameState::with_seed(9, TextGrid::from_lines(["abcdef", "ghijkl"]), Position::ORIGIN)
            .unwrap()
            .with_collectibles([Position::new(0, 3), Position::new(1, 5)])
    }

    #[test]
    fn test_pickup_scores_and_respawns() {
        let mut state = state();
        let mut motions = MotionEngine::new();
        let outcome = GameEngine::new(&mut state).execute(
            &mut motions,
            &MotionRequest::counted(Motion::Right, 3),
            &GameConfig::new(),
        );

        assert_eq!(outcome.moves_executed, 3);
        assert_eq!(outcome.collected, Some(Position::new(0, 3)));
        assert_eq!(outcome.score, GameConfig::DEFAULT_COLLECTIBLE_POINTS);
        assert_eq!(state.player.position, Position::new(0, 3));
        assert_eq!(state.nonce, 1);

        let respawned = outcome.respawned.unwrap();
        assert_ne!(respawned, Position::new(0, 3));
        assert!(state.collectibles.contains(&respawned));
        assert_eq!(state.collectibles.len(), 2);
    }

    #[test]
    fn test_counted_move_collects_only_at_destination() {
        let mut state = state();
        let outcome = GameEngine::new(&mut state).execute(
            &mut MotionEngine::new(),
            &MotionRequest::counted(Motion::Right, 5),
            &GameConfig::new().without_respawn(),
        );

        assert_eq!(outcome.result.position, Position::new(0, 5));
        assert_eq!(outcome.collected, None);
        assert_eq!(state.player.score, 0);
        assert!(state.collectibles.contains(&Position::new(0, 3)));
    }

    #[test]
    fn test_blocked_move_leaves_state_untouched() {
        let mut state = state();
        let before = state.clone();
        let outcome = GameEngine::new(&mut state).execute(
            &mut MotionEngine::new(),
            &MotionRequest::single(Motion::Up),
            &GameConfig::new(),
        );

        assert!(outcome.is_blocked());
        assert_eq!(state, before);
    }

    #[test]
    fn test_replay_is_deterministic() {
        let script = ["3l", "j", "$", "0", "k", "fe"];
        let run = || {
            let mut state = state();
            let mut motions = MotionEngine::new();
            let config = GameConfig::new();
            for notation in script {
                let request: MotionRequest = notation.parse().unwrap();
                GameEngine::new(&mut state).execute(&mut motions, &request, &config);
            }
            (state, *motions.search_memory())
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_target_score_completes_and_freezes() {
        let mut state = state();
        let config = GameConfig::new().without_respawn().with_target_score(10);
        let mut motions = MotionEngine::new();

        let outcome = GameEngine::new(&mut state).execute(
            &mut motions,
            &MotionRequest::counted(Motion::Right, 3),
            &config,
        );
        assert!(outcome.completed);
        assert!(state.completed);

        let after = GameEngine::new(&mut state).execute(
            &mut motions,
            &MotionRequest::single(Motion::Left),
            &config,
        );
        assert!(after.is_blocked());
        assert_eq!(state.player.position, Position::new(0, 3));
    }
}
