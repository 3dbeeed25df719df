//! Pipeline worker that owns the local mirror of the session.
//!
//! Receives submissions from [`RuntimeHandle`](crate::RuntimeHandle), runs
//! them through the cooldown gate and predictor, dispatches accepted moves to
//! the [`AuthoritativeSource`], and folds verdicts and pushes back into the
//! mirror through the [`Reconciler`]. Every state change happens on this one
//! task, so nothing here is shared or locked.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use game_core::{
    CharSearchMemory, GameState, MotionEngine, MotionRequest, MoveOutcome, OpponentState,
    TextGrid,
};

use crate::api::{AuthoritativeSource, DispatchError};
use crate::events::{EventBus, MotionEvent, ReconcileEvent, SessionEvent};
use crate::pipeline::{
    AuthoritativeUpdate, CooldownGate, MoveId, PendingMove, Prediction, Predictor, Reconciler,
    Reconciliation, SubmissionPermit, SubmissionSlot, Throttle,
};
use crate::runtime::RuntimeConfig;
use crate::wire::{MoveMessage, MoveResponse, PushMessage};

/// Commands that can be sent to the pipeline worker
pub enum Command {
    /// Run a motion through the gate and predictor. `permit` holds the
    /// gate's slot until the submission has been processed.
    Submit {
        request: MotionRequest,
        permit: SubmissionPermit,
        reply: oneshot::Sender<SubmitOutcome>,
    },
    /// Query the local mirror (read-only).
    QueryState { reply: oneshot::Sender<GameState> },
    /// Ids of moves still awaiting a verdict, in submission order.
    PendingMoves { reply: oneshot::Sender<Vec<MoveId>> },
}

/// Immediate result of a submission.
///
/// The authoritative verdict arrives later as a
/// [`ReconcileEvent`](crate::events::ReconcileEvent).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum SubmitOutcome {
    /// Applied to the mirror and dispatched as `id`.
    Applied { id: MoveId, outcome: MoveOutcome },
    /// Blocked locally, nothing dispatched.
    Blocked { outcome: MoveOutcome },
    /// Dropped by the cooldown gate.
    Dropped { throttle: Throttle },
}

impl SubmitOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, SubmitOutcome::Applied { .. })
    }
}

/// Result of one dispatch task.
struct Verdict {
    id: MoveId,
    issued_at: Instant,
    result: Result<MoveResponse, DispatchError>,
}

/// Background task that owns the mirror, gate, predictor and reconciler.
pub struct PipelineWorker {
    mirror: GameState,
    motions: MotionEngine,
    gate: CooldownGate,
    predictor: Predictor,
    reconciler: Reconciler,
    authority: Arc<dyn AuthoritativeSource>,
    dispatch_timeout: Duration,
    completion_announced: bool,
    command_rx: mpsc::Receiver<Command>,
    push_rx: mpsc::Receiver<PushMessage>,
    verdict_tx: mpsc::Sender<Verdict>,
    verdict_rx: mpsc::Receiver<Verdict>,
    event_bus: EventBus,
}

impl PipelineWorker {
    /// Creates a worker whose mirror and confirmed snapshot start at `state`.
    pub fn new(
        state: GameState,
        config: &RuntimeConfig,
        authority: Arc<dyn AuthoritativeSource>,
        command_rx: mpsc::Receiver<Command>,
        push_rx: mpsc::Receiver<PushMessage>,
        event_bus: EventBus,
    ) -> Self {
        info!(
            target: "runtime::worker",
            position = %state.player.position,
            rows = state.grid.height(),
            collectibles = state.collectibles.len(),
            "PipelineWorker initialized"
        );

        let (verdict_tx, verdict_rx) = mpsc::channel(config.dispatch_buffer_size.max(1));
        Self {
            reconciler: Reconciler::with_confirmed(
                config.game_config.clone(),
                state.clone(),
                CharSearchMemory::new(),
            ),
            predictor: Predictor::new(config.game_config.clone()),
            gate: CooldownGate::new(config.cooldown.clone()),
            motions: MotionEngine::new(),
            completion_announced: state.completed,
            mirror: state,
            authority,
            dispatch_timeout: config.dispatch_timeout,
            command_rx,
            push_rx,
            verdict_tx,
            verdict_rx,
            event_bus,
        }
    }

    /// Slot that handles claim before queueing a submission.
    pub fn submission_slot(&self) -> SubmissionSlot {
        self.gate.slot()
    }

    /// Main worker loop. Ends once every handle is dropped.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.command_rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(verdict) = self.verdict_rx.recv() => self.handle_verdict(verdict),
                Some(push) = self.push_rx.recv() => self.handle_push(push),
            }
        }
        debug!(
            target: "runtime::worker",
            outstanding = self.reconciler.outstanding_ids().len(),
            "PipelineWorker stopped"
        );
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Submit {
                request,
                permit,
                reply,
            } => {
                let outcome = self.handle_submit(request, Instant::now());
                permit.complete();
                if reply.send(outcome).is_err() {
                    debug!(target: "runtime::worker", "Submit reply channel closed (caller dropped)");
                }
            }
            Command::QueryState { reply } => {
                if reply.send(self.mirror.clone()).is_err() {
                    debug!(target: "runtime::worker", "QueryState reply channel closed (caller dropped)");
                }
            }
            Command::PendingMoves { reply } => {
                if reply.send(self.reconciler.outstanding_ids()).is_err() {
                    debug!(target: "runtime::worker", "PendingMoves reply channel closed (caller dropped)");
                }
            }
        }
    }

    fn handle_submit(&mut self, request: MotionRequest, now: Instant) -> SubmitOutcome {
        if let Err(throttle) = self.gate.accept(&request, now) {
            self.event_bus
                .publish(MotionEvent::Dropped { request, throttle });
            return SubmitOutcome::Dropped { throttle };
        }

        match self
            .predictor
            .predict(&mut self.mirror, &mut self.motions, request, now)
        {
            Prediction::Blocked { outcome } => {
                self.event_bus
                    .publish(MotionEvent::Blocked { request, outcome });
                SubmitOutcome::Blocked { outcome }
            }
            Prediction::Applied { pending, outcome } => {
                let id = pending.id;
                self.dispatch(&pending);
                self.reconciler.enqueue(pending);
                self.event_bus.publish(MotionEvent::Applied {
                    id,
                    request,
                    outcome,
                });
                if outcome.completed {
                    self.announce_completion();
                }
                SubmitOutcome::Applied { id, outcome }
            }
        }
    }

    /// Sends `pending` on its own task, bounded by the dispatch timeout.
    fn dispatch(&self, pending: &PendingMove) {
        let message = MoveMessage::new(pending.id, &pending.request);
        let authority = Arc::clone(&self.authority);
        let verdict_tx = self.verdict_tx.clone();
        let timeout = self.dispatch_timeout;
        let (id, issued_at) = (pending.id, pending.issued_at);

        tokio::spawn(async move {
            let result = match tokio::time::timeout(timeout, authority.submit_move(message)).await
            {
                Ok(result) => result,
                Err(_) => Err(DispatchError::Timeout(timeout)),
            };
            if verdict_tx
                .send(Verdict {
                    id,
                    issued_at,
                    result,
                })
                .await
                .is_err()
            {
                debug!(target: "runtime::worker", %id, "worker stopped before verdict arrived");
            }
        });
    }

    fn handle_verdict(&mut self, verdict: Verdict) {
        let Verdict {
            id,
            issued_at,
            result,
        } = verdict;
        let round_trip = issued_at.elapsed();

        match result {
            Ok(response) if response.success => {
                self.gate.record_latency(round_trip);
                let update = AuthoritativeUpdate::from(&response);
                let reconciliation =
                    self.reconciler
                        .confirm(id, update, &mut self.mirror, &mut self.motions);
                self.publish_reconciliation(reconciliation, None, round_trip);
                if update.completed {
                    self.announce_completion();
                }
            }
            Ok(response) => {
                self.gate.record_latency(round_trip);
                let reason = response
                    .error
                    .unwrap_or_else(|| String::from("rejected without reason"));
                debug!(target: "runtime::worker", %id, %reason, "move rejected");
                self.roll_back(id, DispatchError::Rejected(reason));
            }
            Err(error) => {
                warn!(target: "runtime::worker", %id, %error, "dispatch failed");
                self.roll_back(id, error);
            }
        }
    }

    fn roll_back(&mut self, id: MoveId, error: DispatchError) {
        let reconciliation = self
            .reconciler
            .reject(id, &mut self.mirror, &mut self.motions);
        self.publish_reconciliation(reconciliation, Some(error), Duration::ZERO);
    }

    fn publish_reconciliation(
        &self,
        reconciliation: Reconciliation,
        error: Option<DispatchError>,
        round_trip: Duration,
    ) {
        let player = self.mirror.player;
        let event = match reconciliation {
            Reconciliation::Confirmed {
                id,
                mismatch,
                replayed,
            } => ReconcileEvent::Confirmed {
                id,
                position: player.position,
                score: player.score,
                mismatch,
                replayed,
                round_trip_ms: u64::try_from(round_trip.as_millis()).unwrap_or(u64::MAX),
            },
            Reconciliation::RolledBack { id, replayed } => ReconcileEvent::RolledBack {
                id,
                reason: error.map(|error| error.to_string()).unwrap_or_default(),
                position: player.position,
                replayed,
            },
            Reconciliation::Held { id } => ReconcileEvent::Held { id },
            Reconciliation::Superseded { id } => ReconcileEvent::Superseded { id },
            Reconciliation::ResyncRequired { id } => ReconcileEvent::ResyncRequired { id },
            Reconciliation::Ignored { id } => {
                debug!(target: "runtime::worker", %id, "verdict for unknown move ignored");
                return;
            }
        };
        self.event_bus.publish(event);
    }

    fn handle_push(&mut self, push: PushMessage) {
        match push {
            PushMessage::Opponent {
                id,
                position,
                score,
            } => {
                let opponent = OpponentState {
                    id,
                    position,
                    score,
                };
                self.reconciler.merge_opponent(opponent, &mut self.mirror);
                self.event_bus
                    .publish(SessionEvent::OpponentUpdated(opponent));
            }
            PushMessage::OpponentLeft { id } => {
                self.reconciler.remove_opponent(id, &mut self.mirror);
                self.event_bus.publish(SessionEvent::OpponentLeft { id });
            }
            PushMessage::Collectibles { positions } => {
                self.reconciler
                    .replace_collectibles(&positions, &mut self.mirror);
                self.event_bus.publish(SessionEvent::CollectiblesReplaced {
                    count: self.mirror.collectibles.len(),
                });
            }
            PushMessage::FullState {
                lines,
                player,
                opponents,
                collectibles,
                completed,
            } => {
                let grid = lines.map_or_else(|| self.mirror.grid.clone(), TextGrid::from_lines);
                let mut state =
                    match GameState::with_seed(self.mirror.game_seed, grid, player.position) {
                        Ok(state) => state,
                        Err(error) => {
                            warn!(target: "runtime::worker", %error, "ignoring invalid full state");
                            return;
                        }
                    };
                state.nonce = self
                    .reconciler
                    .confirmed()
                    .map_or(self.mirror.nonce, |confirmed| confirmed.state.nonce);
                state.player = player;
                for opponent in opponents {
                    state.upsert_opponent(opponent);
                }
                state.replace_collectibles(collectibles);
                state.completed = completed;

                self.reconciler.resync(
                    state,
                    &mut self.mirror,
                    &self.motions,
                    self.predictor.last_issued(),
                );
                self.event_bus.publish(SessionEvent::StateReplaced {
                    position: player.position,
                    score: player.score,
                });
                if completed {
                    self.announce_completion();
                }
            }
        }
    }

    fn announce_completion(&mut self) {
        if self.completion_announced {
            return;
        }
        self.completion_announced = true;
        info!(
            target: "runtime::worker",
            score = self.mirror.player.score,
            "session completed"
        );
        self.event_bus.publish(SessionEvent::Completed {
            score: self.mirror.player.score,
        });
    }
}
