//! Deterministic motion rules and game state shared by every client.
//!
//! `game-core` defines the canonical cursor-motion semantics over a text grid
//! and the reducer that applies them to a session. It performs no I/O and
//! holds no clock, so the optimistic client and the authoritative source can
//! run the exact same code. All player moves flow through
//! [`engine::GameEngine`], and supporting crates depend on the types
//! re-exported here.
pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod motion;
pub mod rng;
pub mod state;

pub use config::GameConfig;
pub use engine::{GameEngine, MoveOutcome};
pub use error::{ErrorSeverity, GameError};
pub use grid::{Cell, CharClass, OccupancyGrid, Position, TextGrid};
pub use motion::{
    CharSearch, CharSearchMemory, CountedMotion, Motion, MotionContext, MotionEngine, MotionError,
    MotionFamily, MotionRequest, MotionResult, SearchKind, apply_count,
};
pub use rng::{PcgRng, RngOracle};
pub use state::{ActorId, GameState, OpponentState, PlayerState, StateError};
