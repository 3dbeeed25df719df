//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for
//! submitting motions, feeding authoritative pushes, or streaming events from
//! specific topics.
use tokio::sync::{broadcast, mpsc, oneshot};

use game_core::{GameState, MotionRequest};

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, MotionEvent, Topic};
use crate::pipeline::{MoveId, SubmissionSlot};
use crate::wire::{self, PushMessage};
use crate::workers::{Command, SubmitOutcome};

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    push_tx: mpsc::Sender<PushMessage>,
    slot: SubmissionSlot,
    event_bus: EventBus,
}

impl RuntimeHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<Command>,
        push_tx: mpsc::Sender<PushMessage>,
        slot: SubmissionSlot,
        event_bus: EventBus,
    ) -> Self {
        Self {
            command_tx,
            push_tx,
            slot,
            event_bus,
        }
    }

    /// Submit a motion for optimistic application and dispatch
    ///
    /// While another submission (from any clone of this handle) is still
    /// being processed, the motion is dropped as `Throttle::Busy` without
    /// being queued.
    pub async fn submit(&self, request: MotionRequest) -> Result<SubmitOutcome> {
        let permit = match self.slot.claim() {
            Ok(permit) => permit,
            Err(throttle) => {
                self.event_bus
                    .publish(MotionEvent::Dropped { request, throttle });
                return Ok(SubmitOutcome::Dropped { throttle });
            }
        };
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::Submit {
                request,
                permit,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Submit a motion in key notation (`"5j"`, `"fx"`, `"gg"`)
    ///
    /// Unknown notation fails immediately and never reaches the worker.
    pub async fn submit_str(&self, notation: &str) -> Result<SubmitOutcome> {
        let request: MotionRequest = notation.parse()?;
        self.submit(request).await
    }

    /// Query the local mirror (read-only snapshot)
    pub async fn query_state(&self) -> Result<GameState> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::QueryState { reply: reply_tx })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Ids of moves still awaiting a verdict, in submission order
    pub async fn pending_moves(&self) -> Result<Vec<MoveId>> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::PendingMoves { reply: reply_tx })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Feed an unsolicited message from the authority into the pipeline
    pub async fn deliver_push(&self, push: PushMessage) -> Result<()> {
        self.push_tx
            .send(push)
            .await
            .map_err(|_| RuntimeError::PushChannelClosed)
    }

    /// Decode and feed a JSON push message
    pub async fn deliver_push_json(&self, text: &str) -> Result<()> {
        let push = wire::decode_push(text).map_err(RuntimeError::InvalidPush)?;
        self.deliver_push(push).await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Motion` - Applied, blocked and dropped submissions
    /// - `Topic::Reconcile` - Confirmations, rollbacks and resync requests
    /// - `Topic::Session` - Opponent, collectible and snapshot pushes
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use runtime::Topic;
    ///
    /// let mut reconcile_rx = handle.subscribe(Topic::Reconcile);
    /// while let Ok(event) = reconcile_rx.recv().await {
    ///     // Redraw after rollbacks
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    ///
    /// Returns a map of topic to receiver for each requested topic.
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> std::collections::HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
