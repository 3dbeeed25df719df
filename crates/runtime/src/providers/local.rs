//! In-process authority for offline play and tests.
//!
//! [`LocalAuthority`] validates moves with the same [`GameEngine`] the client
//! predicts with, so every verdict matches the prediction unless the level,
//! collectibles or opponents diverge. Latency, jitter and periodic rejections
//! can be injected to exercise the reconciliation paths.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::Mutex;
use tracing::debug;

use game_core::{GameConfig, GameEngine, GameState, MotionEngine};

use crate::api::{AuthoritativeSource, DispatchError};
use crate::wire::{MoveMessage, MoveResponse};

/// Simulated network behaviour.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LocalAuthorityOptions {
    /// Delay before each response.
    pub latency: Duration,
    /// Upper bound of uniform extra delay added to `latency`.
    pub jitter: Duration,
    /// Reject every n-th received move without applying it.
    pub reject_every: Option<u64>,
}

impl LocalAuthorityOptions {
    fn delay(&self) -> Duration {
        let jitter = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        if jitter == 0 {
            return self.latency;
        }
        let extra = rand::thread_rng().gen_range(0..=jitter);
        self.latency + Duration::from_millis(extra)
    }
}

struct Session {
    state: GameState,
    motions: MotionEngine,
    config: GameConfig,
    received: u64,
}

/// Authority that owns its own copy of the session.
///
/// Moves are applied in arrival order; only the response is delayed, so
/// jitter can reorder verdicts but never the authoritative history.
#[derive(Clone)]
pub struct LocalAuthority {
    session: Arc<Mutex<Session>>,
    options: LocalAuthorityOptions,
}

impl LocalAuthority {
    pub fn new(state: GameState, config: GameConfig) -> Self {
        Self::with_options(state, config, LocalAuthorityOptions::default())
    }

    pub fn with_options(state: GameState, config: GameConfig, options: LocalAuthorityOptions) -> Self {
        Self {
            session: Arc::new(Mutex::new(Session {
                state,
                motions: MotionEngine::new(),
                config,
                received: 0,
            })),
            options,
        }
    }

    /// Authoritative state (read-only snapshot)
    pub async fn state(&self) -> GameState {
        self.session.lock().await.state.clone()
    }

    /// Number of moves received so far, rejected ones included
    pub async fn received(&self) -> u64 {
        self.session.lock().await.received
    }

    async fn validate(&self, message: &MoveMessage) -> MoveResponse {
        let mut session = self.session.lock().await;
        session.received += 1;

        if self
            .options
            .reject_every
            .is_some_and(|every| every > 0 && session.received % every == 0)
        {
            debug!(target: "runtime::authority", move_id = %message.move_id, "injected rejection");
            return MoveResponse::rejected("rejected by local authority");
        }

        let request = match message.request() {
            Ok(request) => request,
            Err(error) => return MoveResponse::rejected(error.to_string()),
        };

        let Session {
            state,
            motions,
            config,
            ..
        } = &mut *session;
        let search_before = *motions.search_memory();
        let outcome = GameEngine::new(state).execute(motions, &request, config);
        if outcome.is_blocked() {
            motions.restore_search_memory(search_before);
            return MoveResponse::rejected(format!("{request} is blocked"));
        }

        debug!(
            target: "runtime::authority",
            move_id = %message.move_id,
            position = %state.player.position,
            score = state.player.score,
            "move accepted"
        );
        MoveResponse::accepted(state.player.position, state.player.score, state.completed)
    }
}

#[async_trait]
impl AuthoritativeSource for LocalAuthority {
    async fn submit_move(&self, message: MoveMessage) -> Result<MoveResponse, DispatchError> {
        let response = self.validate(&message).await;
        let delay = self.options.delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(response)
    }
}
