//! Runtime orchestration for the optimistic move pipeline.
//!
//! This crate wires the deterministic motion rules from `game-core` into a
//! client that feels instant: motions are applied to a local mirror right
//! away, dispatched to an authoritative source, and reconciled when the
//! verdict arrives. Consumers embed [`Runtime`] to submit motions, feed
//! authoritative pushes, and subscribe to events through [`RuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`pipeline`] holds the synchronous gate, predictor and reconciler
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`wire`] defines the JSON contract with the authority
//! - [`providers`] offers an in-process authority
//! - [`workers`] keeps background tasks internal to the crate
pub mod api;
pub mod events;
pub mod pipeline;
pub mod providers;
pub mod runtime;
pub mod wire;

mod workers;

pub use api::{AuthoritativeSource, DispatchError, Result, RuntimeError, RuntimeHandle};
pub use events::{Event, EventBus, MotionEvent, ReconcileEvent, SessionEvent, Topic};
pub use pipeline::{
    AuthoritativeUpdate, ConfirmedSnapshot, CooldownConfig, CooldownGate, MoveId, PendingMove,
    Prediction, Predictor, Reconciler, Reconciliation, SubmissionPermit, SubmissionSlot,
    Throttle,
};
pub use providers::{LocalAuthority, LocalAuthorityOptions};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use wire::{MoveMessage, MoveResponse, PushMessage};
pub use workers::SubmitOutcome;
