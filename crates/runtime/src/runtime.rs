//! High-level runtime orchestrator.
//!
//! The runtime owns the pipeline worker, wires up command, push and event
//! channels, and exposes a builder-based API for clients to submit motions.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use game_core::{GameConfig, GameState};

use crate::api::{AuthoritativeSource, Result, RuntimeError, RuntimeHandle};
use crate::events::EventBus;
use crate::pipeline::CooldownConfig;
use crate::workers::{Command, PipelineWorker};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub game_config: GameConfig,
    pub cooldown: CooldownConfig,
    /// A dispatch without a verdict after this long is rolled back.
    pub dispatch_timeout: Duration,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    pub push_buffer_size: usize,
    /// Verdicts waiting to be folded into the mirror.
    pub dispatch_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            game_config: GameConfig::default(),
            cooldown: CooldownConfig::default(),
            dispatch_timeout: Duration::from_secs(2),
            event_buffer_size: 100,
            command_buffer_size: 32,
            push_buffer_size: 32,
            dispatch_buffer_size: 64,
        }
    }
}

impl RuntimeConfig {
    /// Construct configuration from process environment variables.
    ///
    /// - `GAME_COLLECTIBLE_POINTS` / `GAME_TARGET_SCORE` / `GAME_RESPAWN`
    /// - `RUNTIME_DISPATCH_TIMEOUT_MS`
    /// - `RUNTIME_COOLDOWN_BASE_MS`
    /// - `RUNTIME_EVENT_BUFFER` / `RUNTIME_COMMAND_BUFFER`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(points) = read_env::<u64>("GAME_COLLECTIBLE_POINTS") {
            config.game_config.collectible_points = points;
        }
        if let Some(target) = read_env::<u64>("GAME_TARGET_SCORE") {
            config.game_config.target_score = Some(target);
        }
        if let Some(respawn) = read_env_bool("GAME_RESPAWN") {
            config.game_config.respawn_collectibles = respawn;
        }

        if let Some(millis) = read_env::<u64>("RUNTIME_DISPATCH_TIMEOUT_MS") {
            config.dispatch_timeout = Duration::from_millis(millis.max(1));
        }
        if let Some(millis) = read_env::<u64>("RUNTIME_COOLDOWN_BASE_MS") {
            config.cooldown.base = Duration::from_millis(millis);
        }

        if let Some(capacity) = read_env::<usize>("RUNTIME_EVENT_BUFFER") {
            config.event_buffer_size = capacity.max(1);
        }
        if let Some(capacity) = read_env::<usize>("RUNTIME_COMMAND_BUFFER") {
            config.command_buffer_size = capacity.max(1);
        }

        config
    }
}

/// Main runtime that orchestrates the optimistic move pipeline
///
/// Runtime owns the worker task. [`RuntimeHandle`] provides a cloneable
/// façade for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    worker_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    ///
    /// The handle can be shared across clients and async tasks.
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Shutdown the runtime gracefully
    ///
    /// The worker stops once every outstanding [`RuntimeHandle`] clone is
    /// dropped as well.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.handle);

        self.worker_handle.await.map_err(RuntimeError::WorkerJoin)
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    state: Option<GameState>,
    authority: Option<Arc<dyn AuthoritativeSource>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            state: None,
            authority: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Provide initial game state (required)
    ///
    /// It seeds both the local mirror and the confirmed snapshot.
    pub fn initial_state(mut self, state: GameState) -> Self {
        self.state = Some(state);
        self
    }

    /// Set the authoritative source moves are dispatched to (required)
    pub fn authority(mut self, authority: impl AuthoritativeSource + 'static) -> Self {
        self.authority = Some(Arc::new(authority));
        self
    }

    /// Set an already shared authoritative source
    pub fn shared_authority(mut self, authority: Arc<dyn AuthoritativeSource>) -> Self {
        self.authority = Some(authority);
        self
    }

    /// Build the runtime and spawn its worker
    pub async fn build(self) -> Result<Runtime> {
        let state = self.state.ok_or(RuntimeError::MissingInitialState)?;
        let authority = self.authority.ok_or(RuntimeError::MissingAuthority)?;

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size);
        let (push_tx, push_rx) = mpsc::channel(self.config.push_buffer_size);
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);

        let worker = PipelineWorker::new(
            state,
            &self.config,
            authority,
            command_rx,
            push_rx,
            event_bus.clone(),
        );
        let handle = RuntimeHandle::new(
            command_tx,
            push_tx,
            worker.submission_slot(),
            event_bus,
        );

        let worker_handle = tokio::spawn(async move {
            worker.run().await;
        });

        Ok(Runtime {
            handle,
            worker_handle,
        })
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

fn read_env_bool(key: &str) -> Option<bool> {
    match env::var(key).ok()?.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
