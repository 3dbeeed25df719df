//! Merges authoritative verdicts with outstanding speculative moves.
//!
//! The reconciler keeps two views of the session: the last *confirmed*
//! snapshot (what the authority has vouched for) and the queue of moves that
//! were applied to the mirror but not yet folded into it. The mirror is always
//! reconstructible as "confirmed snapshot + outstanding moves replayed in
//! submission order", which is exactly what a rollback does.
//!
//! Verdicts are folded into the snapshot strictly in id order. A confirmation
//! that overtakes an earlier, still unanswered move is held until that move
//! is answered, so a late rejection never has to undo confirmed history.
use std::collections::VecDeque;

use tracing::{debug, info, warn};

use game_core::{
    CharSearchMemory, GameConfig, GameEngine, GameState, MotionEngine, OpponentState, Position,
};

use super::{MoveId, PendingMove};
use crate::wire::MoveResponse;

/// Authoritative facts carried by a successful response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct AuthoritativeUpdate {
    pub position: Option<Position>,
    pub score: Option<u64>,
    pub completed: bool,
}

impl From<&MoveResponse> for AuthoritativeUpdate {
    fn from(response: &MoveResponse) -> Self {
        Self {
            position: response.new_position,
            score: response.new_score,
            completed: response.completed.unwrap_or(false),
        }
    }
}

/// Last state the authority vouched for.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfirmedSnapshot {
    pub state: GameState,
    /// Search memory after the confirmed moves, restored on rollback.
    pub search: CharSearchMemory,
    /// Newest move whose verdict is folded into `state`.
    pub through: Option<MoveId>,
}

impl ConfirmedSnapshot {
    fn covers(&self, id: MoveId) -> bool {
        self.through.is_some_and(|through| through >= id)
    }

    /// Folds one confirmed move: replays it (when its request is known) and
    /// adopts the authoritative player fields. Returns whether the result
    /// differs from what the mirror predicted.
    fn fold(
        &mut self,
        entry: &Entry,
        update: AuthoritativeUpdate,
        motions: &mut MotionEngine,
        config: &GameConfig,
    ) -> bool {
        if let Some(pending) = &entry.pending {
            GameEngine::new(&mut self.state).execute(motions, &pending.request, config);
        }

        let player = &mut self.state.player;
        if let Some(position) = update.position
            && position != player.position
        {
            player.position = position;
            player.preferred_column = position.col;
        }
        if let Some(score) = update.score {
            player.score = score;
        }
        self.state.completed |= update.completed;
        self.through = Some(entry.id);

        let adopted = self.state.player;
        entry.pending.as_ref().is_none_or(|pending| {
            pending.predicted.position != adopted.position || pending.predicted.score != adopted.score
        })
    }
}

/// What a verdict did to the local mirror.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reconciliation {
    /// The move, and any held confirmations queued behind it, were folded
    /// into the confirmed snapshot. On `mismatch` the mirror was rebased onto
    /// the authoritative state and `replayed` later moves were re-applied.
    Confirmed {
        id: MoveId,
        mismatch: bool,
        replayed: usize,
    },
    /// Confirmed, but an earlier move is still unanswered. The verdict is
    /// folded once every earlier move has one.
    Held { id: MoveId },
    /// The verdict is older than an authoritative snapshot already adopted.
    Superseded { id: MoveId },
    /// The move was dropped and the mirror rolled back.
    RolledBack { id: MoveId, replayed: usize },
    /// Rejection of a move that is no longer outstanding.
    Ignored { id: MoveId },
    /// No confirmed snapshot exists to roll back to.
    ResyncRequired { id: MoveId },
}

/// One slot of the outstanding queue.
///
/// `pending` is `None` for a confirmation of a move the mirror had already
/// dropped (a timeout answered late): it only carries authoritative fields.
#[derive(Clone, Debug)]
struct Entry {
    id: MoveId,
    pending: Option<PendingMove>,
    verdict: Option<AuthoritativeUpdate>,
}

/// Outstanding-move queue plus confirmed snapshot.
#[derive(Clone, Debug)]
pub struct Reconciler {
    config: GameConfig,
    outstanding: VecDeque<Entry>,
    confirmed: Option<ConfirmedSnapshot>,
}

impl Reconciler {
    /// Reconciler without a confirmed snapshot. Every verdict requires a
    /// resync until [`resync`](Self::resync) provides one.
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            outstanding: VecDeque::new(),
            confirmed: None,
        }
    }

    /// Reconciler whose confirmed snapshot is `state`.
    pub fn with_confirmed(config: GameConfig, state: GameState, search: CharSearchMemory) -> Self {
        Self {
            config,
            outstanding: VecDeque::new(),
            confirmed: Some(ConfirmedSnapshot {
                state,
                search,
                through: None,
            }),
        }
    }

    pub fn enqueue(&mut self, pending: PendingMove) {
        self.outstanding.push_back(Entry {
            id: pending.id,
            pending: Some(pending),
            verdict: None,
        });
    }

    /// Moves applied to the mirror but not yet folded into the confirmed
    /// snapshot, held confirmations included.
    pub fn outstanding(&self) -> impl Iterator<Item = &PendingMove> {
        self.outstanding
            .iter()
            .filter_map(|entry| entry.pending.as_ref())
    }

    pub fn outstanding_ids(&self) -> Vec<MoveId> {
        self.outstanding().map(|pending| pending.id).collect()
    }

    /// Every verdict has been folded.
    pub fn is_idle(&self) -> bool {
        self.outstanding.is_empty()
    }

    pub fn confirmed(&self) -> Option<&ConfirmedSnapshot> {
        self.confirmed.as_ref()
    }

    /// Applies a successful verdict for `id`.
    ///
    /// The verdict is recorded, then every answered move at the head of the
    /// queue is folded into the confirmed snapshot in id order. When any
    /// folded result disagrees with its prediction, the mirror is rebased
    /// onto the new snapshot.
    pub fn confirm(
        &mut self,
        id: MoveId,
        update: AuthoritativeUpdate,
        mirror: &mut GameState,
        motions: &mut MotionEngine,
    ) -> Reconciliation {
        let Some(confirmed) = &self.confirmed else {
            warn!(target: "runtime::reconciler", %id, "confirmation without confirmed snapshot");
            return Reconciliation::ResyncRequired { id };
        };
        if confirmed.covers(id) {
            debug!(target: "runtime::reconciler", %id, "confirmation superseded");
            return Reconciliation::Superseded { id };
        }

        match self.outstanding.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => entry.verdict = Some(update),
            None => {
                debug!(target: "runtime::reconciler", %id, "confirmation for a dropped move");
                let index = self.outstanding.partition_point(|entry| entry.id < id);
                self.outstanding.insert(
                    index,
                    Entry {
                        id,
                        pending: None,
                        verdict: Some(update),
                    },
                );
            }
        }

        let mismatch = self.fold_answered();
        let Some(confirmed) = self.confirmed.as_ref().filter(|confirmed| confirmed.covers(id))
        else {
            debug!(target: "runtime::reconciler", %id, "confirmation held for earlier verdicts");
            return Reconciliation::Held { id };
        };
        let adopted = confirmed.state.player;
        let completed = confirmed.state.completed;

        if mismatch {
            let replayed = self.rebase(mirror, motions);
            info!(
                target: "runtime::reconciler",
                %id,
                position = %adopted.position,
                score = adopted.score,
                replayed,
                "authoritative state differs from prediction, rebased"
            );
            return Reconciliation::Confirmed {
                id,
                mismatch: true,
                replayed,
            };
        }

        mirror.completed |= completed;
        debug!(target: "runtime::reconciler", %id, "prediction confirmed");
        Reconciliation::Confirmed {
            id,
            mismatch: false,
            replayed: 0,
        }
    }

    /// Drops `id` after a rejection, timeout or transport failure, folds any
    /// confirmations it was holding back, restores the confirmed snapshot and
    /// replays the remaining outstanding moves in submission order. Nothing
    /// is re-dispatched.
    pub fn reject(
        &mut self,
        id: MoveId,
        mirror: &mut GameState,
        motions: &mut MotionEngine,
    ) -> Reconciliation {
        let Some(index) = self.outstanding.iter().position(|entry| entry.id == id) else {
            return Reconciliation::Ignored { id };
        };
        self.outstanding.remove(index);
        if self.confirmed.is_none() {
            warn!(target: "runtime::reconciler", %id, "rejection without confirmed snapshot");
            return Reconciliation::ResyncRequired { id };
        }

        self.fold_answered();
        let replayed = self.rebase(mirror, motions);
        info!(
            target: "runtime::reconciler",
            %id,
            position = %mirror.player.position,
            replayed,
            "move dropped, rolled back"
        );
        Reconciliation::RolledBack { id, replayed }
    }

    /// Replaces both views with a full authoritative snapshot.
    ///
    /// Outstanding moves are discarded: the snapshot already reflects
    /// whatever the authority did with them. `last_issued` marks every
    /// verdict still in flight as superseded.
    pub fn resync(
        &mut self,
        state: GameState,
        mirror: &mut GameState,
        motions: &MotionEngine,
        last_issued: Option<MoveId>,
    ) {
        let discarded = self.outstanding.len();
        self.outstanding.clear();
        self.confirmed = Some(ConfirmedSnapshot {
            state: state.clone(),
            search: *motions.search_memory(),
            through: last_issued,
        });
        *mirror = state;
        info!(target: "runtime::reconciler", discarded, "resynchronised from full state");
    }

    /// Merges another actor's state into both views.
    pub fn merge_opponent(&mut self, opponent: OpponentState, mirror: &mut GameState) {
        mirror.upsert_opponent(opponent);
        if let Some(confirmed) = self.confirmed.as_mut() {
            confirmed.state.upsert_opponent(opponent);
        }
    }

    pub fn remove_opponent(&mut self, opponent: game_core::ActorId, mirror: &mut GameState) {
        mirror.remove_opponent(opponent);
        if let Some(confirmed) = self.confirmed.as_mut() {
            confirmed.state.remove_opponent(opponent);
        }
    }

    /// Replaces the collectible set in both views.
    pub fn replace_collectibles(&mut self, positions: &[Position], mirror: &mut GameState) {
        mirror.replace_collectibles(positions.iter().copied());
        if let Some(confirmed) = self.confirmed.as_mut() {
            confirmed.state.replace_collectibles(positions.iter().copied());
        }
    }

    /// Folds answered moves from the head of the queue into the confirmed
    /// snapshot, stopping at the first move still awaiting a verdict.
    /// Returns whether any folded move disagreed with its prediction.
    fn fold_answered(&mut self) -> bool {
        let Some(confirmed) = self.confirmed.as_mut() else {
            return false;
        };
        let mut scratch = MotionEngine::with_search_memory(confirmed.search);
        let mut mismatch = false;

        while self
            .outstanding
            .front()
            .is_some_and(|entry| entry.verdict.is_some())
        {
            let Some(entry) = self.outstanding.pop_front() else {
                break;
            };
            let Some(update) = entry.verdict else {
                break;
            };
            mismatch |= confirmed.fold(&entry, update, &mut scratch, &self.config);
        }

        confirmed.search = *scratch.search_memory();
        mismatch
    }

    /// Mirror := confirmed snapshot + replay of outstanding moves.
    fn rebase(&mut self, mirror: &mut GameState, motions: &mut MotionEngine) -> usize {
        let Some(confirmed) = &self.confirmed else {
            return 0;
        };
        *mirror = confirmed.state.clone();
        motions.restore_search_memory(confirmed.search);

        let mut replayed = 0;
        for pending in self
            .outstanding
            .iter_mut()
            .filter_map(|entry| entry.pending.as_mut())
        {
            GameEngine::new(mirror).execute(motions, &pending.request, &self.config);
            pending.predicted = mirror.player;
            pending.search_after = *motions.search_memory();
            replayed += 1;
        }
        replayed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Prediction, Predictor};
    use game_core::{MotionRequest, TextGrid};
    use tokio::time::Instant;

    struct Session {
        mirror: GameState,
        motions: MotionEngine,
        predictor: Predictor,
        reconciler: Reconciler,
    }

    impl Session {
        fn new() -> Self {
            let state = initial();
            Self {
                reconciler: Reconciler::with_confirmed(
                    GameConfig::new(),
                    state.clone(),
                    CharSearchMemory::new(),
                ),
                mirror: state,
                motions: MotionEngine::new(),
                predictor: Predictor::new(GameConfig::new()),
            }
        }

        fn submit(&mut self, notation: &str) -> PendingMove {
            let request: MotionRequest = notation.parse().unwrap();
            match self
                .predictor
                .predict(&mut self.mirror, &mut self.motions, request, Instant::now())
            {
                Prediction::Applied { pending, .. } => {
                    self.reconciler.enqueue(pending.clone());
                    pending
                }
                Prediction::Blocked { .. } => panic!("{notation} was blocked"),
            }
        }

        fn confirm(&mut self, pending: &PendingMove) -> Reconciliation {
            let update = AuthoritativeUpdate {
                position: Some(pending.predicted.position),
                score: Some(pending.predicted.score),
                completed: false,
            };
            self.reconciler
                .confirm(pending.id, update, &mut self.mirror, &mut self.motions)
        }

        fn reject(&mut self, pending: &PendingMove) -> Reconciliation {
            self.reconciler
                .reject(pending.id, &mut self.mirror, &mut self.motions)
        }
    }

    fn initial() -> GameState {
        GameState::with_seed(
            3,
            TextGrid::from_lines(["abcdefghij", "klmnopqrst", "uvwxyz"]),
            Position::ORIGIN,
        )
        .unwrap()
        .with_collectibles([Position::new(0, 3), Position::new(1, 9)])
    }

    fn apply_directly(notations: &[&str]) -> (GameState, CharSearchMemory) {
        let mut state = initial();
        let mut motions = MotionEngine::new();
        for notation in notations {
            let request: MotionRequest = notation.parse().unwrap();
            GameEngine::new(&mut state).execute(&mut motions, &request, &GameConfig::new());
        }
        (state, *motions.search_memory())
    }

    #[test]
    fn test_matching_confirmation_drops_pending() {
        let mut session = Session::new();
        let first = session.submit("l");

        assert_eq!(
            session.confirm(&first),
            Reconciliation::Confirmed {
                id: first.id,
                mismatch: false,
                replayed: 0
            }
        );
        assert!(session.reconciler.is_idle());
        let confirmed = session.reconciler.confirmed().unwrap();
        assert_eq!(confirmed.state, session.mirror);
        assert_eq!(confirmed.through, Some(first.id));
    }

    #[test]
    fn test_rejection_replays_remaining_moves_in_order() {
        let notations = ["l", "j", "2l", "fr", "$"];
        let mut session = Session::new();
        let moves: Vec<_> = notations.iter().map(|n| session.submit(n)).collect();

        let outcome = session.reject(&moves[1]);
        assert_eq!(
            outcome,
            Reconciliation::RolledBack {
                id: moves[1].id,
                replayed: 4
            }
        );

        let (expected, search) = apply_directly(&["l", "2l", "fr", "$"]);
        assert_eq!(session.mirror, expected);
        assert_eq!(*session.motions.search_memory(), search);
        assert_eq!(
            session.reconciler.outstanding_ids(),
            vec![moves[0].id, moves[2].id, moves[3].id, moves[4].id]
        );
    }

    #[test]
    fn test_out_of_order_confirmations() {
        let mut session = Session::new();
        let first = session.submit("3l");
        let second = session.submit("j");

        assert_eq!(
            session.confirm(&second),
            Reconciliation::Held { id: second.id }
        );
        assert_eq!(session.reconciler.confirmed().unwrap().state, initial());
        assert_eq!(
            session.confirm(&first),
            Reconciliation::Confirmed {
                id: first.id,
                mismatch: false,
                replayed: 0
            }
        );
        assert!(session.reconciler.is_idle());

        let (expected, search) = apply_directly(&["3l", "j"]);
        let confirmed = session.reconciler.confirmed().unwrap();
        assert_eq!(confirmed.state, expected);
        assert_eq!(confirmed.search, search);
        assert_eq!(confirmed.through, Some(second.id));
        assert_eq!(session.mirror, expected);
    }

    #[test]
    fn test_mismatch_rebases_onto_authority() {
        let mut session = Session::new();
        let first = session.submit("l");
        let second = session.submit("j");

        let update = AuthoritativeUpdate {
            position: Some(Position::new(0, 5)),
            score: Some(0),
            completed: false,
        };
        let outcome = session.reconciler.confirm(
            first.id,
            update,
            &mut session.mirror,
            &mut session.motions,
        );
        assert_eq!(
            outcome,
            Reconciliation::Confirmed {
                id: first.id,
                mismatch: true,
                replayed: 1
            }
        );
        // `j` replayed from the authoritative column.
        assert_eq!(session.mirror.player.position, Position::new(1, 5));
        let pending: Vec<_> = session.reconciler.outstanding().collect();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, second.id);
        assert_eq!(pending[0].predicted.position, Position::new(1, 5));
    }

    #[test]
    fn test_rejection_after_later_confirmation_undoes_only_rejected_move() {
        let mut session = Session::new();
        // Lands on the collectible at (0, 3), scoring and respawning it.
        let first = session.submit("3l");
        let second = session.submit("j");
        assert_eq!(session.mirror.player.score, 10);

        // The authority never applied `3l`, so `j` starts from the origin.
        let update = AuthoritativeUpdate {
            position: Some(Position::new(1, 0)),
            score: Some(0),
            completed: false,
        };
        assert_eq!(
            session.reconciler.confirm(
                second.id,
                update,
                &mut session.mirror,
                &mut session.motions,
            ),
            Reconciliation::Held { id: second.id }
        );
        assert_eq!(
            session.reject(&first),
            Reconciliation::RolledBack {
                id: first.id,
                replayed: 0
            }
        );

        let (expected, _) = apply_directly(&["j"]);
        assert_eq!(session.mirror, expected);
        assert_eq!(session.mirror.nonce, initial().nonce);
        assert_eq!(session.mirror.collectibles, initial().collectibles);
        assert!(session.reconciler.is_idle());
        let confirmed = session.reconciler.confirmed().unwrap();
        assert_eq!(confirmed.state, expected);
        assert_eq!(confirmed.through, Some(second.id));

        // A stale verdict for either move changes nothing.
        assert_eq!(
            session.confirm(&first),
            Reconciliation::Superseded { id: first.id }
        );
        assert_eq!(session.mirror, expected);
    }

    #[test]
    fn test_rejection_keeps_held_confirmations_behind_unanswered_moves() {
        let mut session = Session::new();
        let first = session.submit("l");
        let second = session.submit("l");
        let third = session.submit("j");

        // The authority skipped the second `l`.
        let update = AuthoritativeUpdate {
            position: Some(Position::new(1, 1)),
            score: Some(0),
            completed: false,
        };
        assert_eq!(
            session.reconciler.confirm(
                third.id,
                update,
                &mut session.mirror,
                &mut session.motions,
            ),
            Reconciliation::Held { id: third.id }
        );
        assert_eq!(
            session.reject(&second),
            Reconciliation::RolledBack {
                id: second.id,
                replayed: 2
            }
        );
        // `first` is still unanswered, so nothing was folded yet.
        assert_eq!(session.reconciler.confirmed().unwrap().through, None);
        assert_eq!(
            session.reconciler.outstanding_ids(),
            vec![first.id, third.id]
        );

        let (expected, _) = apply_directly(&["l", "j"]);
        assert_eq!(session.mirror, expected);

        let update = AuthoritativeUpdate {
            position: Some(Position::new(0, 1)),
            score: Some(0),
            completed: false,
        };
        session
            .reconciler
            .confirm(first.id, update, &mut session.mirror, &mut session.motions);
        assert!(session.reconciler.is_idle());
        assert_eq!(session.reconciler.confirmed().unwrap().state, expected);
        assert_eq!(session.mirror, expected);
    }

    #[test]
    fn test_late_confirmation_of_dropped_move_adopts_authority() {
        let mut session = Session::new();
        let first = session.submit("l");
        session.reject(&first);
        assert_eq!(session.mirror.player.position, Position::ORIGIN);

        let update = AuthoritativeUpdate {
            position: Some(Position::new(0, 1)),
            score: Some(0),
            completed: false,
        };
        assert_eq!(
            session.reconciler.confirm(
                first.id,
                update,
                &mut session.mirror,
                &mut session.motions,
            ),
            Reconciliation::Confirmed {
                id: first.id,
                mismatch: true,
                replayed: 0
            }
        );
        assert_eq!(session.mirror.player.position, Position::new(0, 1));
        assert!(session.reconciler.is_idle());
    }

    #[test]
    fn test_unknown_rejection_is_ignored() {
        let mut session = Session::new();
        let first = session.submit("l");
        session.confirm(&first);
        assert_eq!(
            session.reject(&first),
            Reconciliation::Ignored { id: first.id }
        );
    }

    #[test]
    fn test_missing_snapshot_requires_resync() {
        let mut mirror = initial();
        let mut motions = MotionEngine::new();
        let mut predictor = Predictor::new(GameConfig::new());
        let mut reconciler = Reconciler::new(GameConfig::new());

        let Prediction::Applied { pending, .. } = predictor.predict(
            &mut mirror,
            &mut motions,
            MotionRequest::single(game_core::Motion::Right),
            Instant::now(),
        ) else {
            panic!("expected an applied prediction");
        };
        reconciler.enqueue(pending.clone());
        assert_eq!(
            reconciler.reject(pending.id, &mut mirror, &mut motions),
            Reconciliation::ResyncRequired { id: pending.id }
        );

        reconciler.resync(initial(), &mut mirror, &motions, predictor.last_issued());
        assert_eq!(mirror, initial());
        assert!(reconciler.confirmed().is_some());
    }

    #[test]
    fn test_opponent_merge_reaches_both_views() {
        let mut session = Session::new();
        let opponent = OpponentState {
            id: game_core::ActorId(2),
            position: Position::new(2, 2),
            score: 40,
        };
        session
            .reconciler
            .merge_opponent(opponent, &mut session.mirror);

        let first = session.submit("l");
        session.reject(&first);
        assert_eq!(
            session.mirror.opponents.get(&opponent.id),
            Some(&opponent)
        );
    }
}
