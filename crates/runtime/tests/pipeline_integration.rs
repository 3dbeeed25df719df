use std::collections::HashMap;
use std::future;
use std::time::Duration;

use async_trait::async_trait;
use game_core::{ActorId, GameConfig, GameState, PlayerState, Position, TextGrid};
use runtime::{
    AuthoritativeSource, CooldownConfig, DispatchError, Event, LocalAuthority,
    LocalAuthorityOptions, MotionEvent, MoveId, MoveMessage, MoveResponse, PushMessage,
    ReconcileEvent, Runtime, RuntimeConfig, RuntimeError, RuntimeHandle, SessionEvent,
    SubmitOutcome, Throttle, Topic,
};
use tokio::sync::broadcast;

fn initial_state() -> GameState {
    GameState::with_seed(
        7,
        TextGrid::from_lines(["hello world", "vim motions", "are fun"]),
        Position::ORIGIN,
    )
    .expect("valid level")
    .with_collectibles([Position::new(0, 6), Position::new(2, 4)])
}

/// Cooldown that never throttles, so tests can submit back to back.
fn unthrottled() -> RuntimeConfig {
    RuntimeConfig {
        cooldown: CooldownConfig {
            base: Duration::ZERO,
            slow_penalty: Duration::ZERO,
            very_slow_penalty: Duration::ZERO,
            repeat_penalty: Duration::ZERO,
            ..CooldownConfig::default()
        },
        ..RuntimeConfig::default()
    }
}

async fn start(
    config: RuntimeConfig,
    authority: impl AuthoritativeSource + 'static,
) -> (Runtime, RuntimeHandle) {
    let runtime = Runtime::builder()
        .config(config)
        .initial_state(initial_state())
        .authority(authority)
        .build()
        .await
        .expect("Runtime should start successfully");
    let handle = runtime.handle();
    (runtime, handle)
}

async fn next_reconcile(rx: &mut broadcast::Receiver<Event>) -> ReconcileEvent {
    match rx.recv().await.expect("reconcile event") {
        Event::Reconcile(event) => event,
        other => panic!("unexpected event on reconcile topic: {other:?}"),
    }
}

async fn next_session(rx: &mut broadcast::Receiver<Event>) -> SessionEvent {
    match rx.recv().await.expect("session event") {
        Event::Session(event) => event,
        other => panic!("unexpected event on session topic: {other:?}"),
    }
}

/// Never answers, so every dispatch times out.
struct SilentAuthority;

#[async_trait]
impl AuthoritativeSource for SilentAuthority {
    async fn submit_move(&self, _message: MoveMessage) -> Result<MoveResponse, DispatchError> {
        future::pending().await
    }
}

/// Applies moves in arrival order but holds each verdict for a per-move delay.
struct ReorderingAuthority {
    inner: LocalAuthority,
    delays: HashMap<MoveId, Duration>,
}

#[async_trait]
impl AuthoritativeSource for ReorderingAuthority {
    async fn submit_move(&self, message: MoveMessage) -> Result<MoveResponse, DispatchError> {
        let delay = self.delays.get(&message.move_id).copied().unwrap_or_default();
        let response = self.inner.submit_move(message).await;
        tokio::time::sleep(delay).await;
        response
    }
}

#[tokio::test]
async fn test_confirmed_moves_match_authority() {
    let authority = LocalAuthority::new(initial_state(), GameConfig::new());
    let (runtime, handle) = start(unthrottled(), authority.clone()).await;
    let mut reconcile = handle.subscribe(Topic::Reconcile);

    let outcome = handle.submit_str("w").await.expect("submit");
    let SubmitOutcome::Applied { id, outcome } = outcome else {
        panic!("expected applied outcome, got {outcome:?}");
    };
    assert_eq!(id, MoveId(1));
    assert_eq!(outcome.collected, Some(Position::new(0, 6)));
    assert_eq!(outcome.score, 10);

    assert!(handle.submit_str("j").await.expect("submit").is_applied());

    for expected in [MoveId(1), MoveId(2)] {
        match next_reconcile(&mut reconcile).await {
            ReconcileEvent::Confirmed { id, mismatch, .. } => {
                assert_eq!(id, expected);
                assert!(!mismatch);
            }
            other => panic!("expected confirmation, got {other:?}"),
        }
    }

    let mirror = handle.query_state().await.expect("state");
    assert_eq!(mirror, authority.state().await);
    assert_eq!(mirror.player.position, Position::new(1, 6));
    assert!(handle.pending_moves().await.expect("pending").is_empty());

    drop(handle);
    runtime.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_rejected_move_rolls_back_and_replays() {
    let authority = LocalAuthority::with_options(
        initial_state(),
        GameConfig::new(),
        LocalAuthorityOptions {
            reject_every: Some(2),
            ..LocalAuthorityOptions::default()
        },
    );
    let (_runtime, handle) = start(unthrottled(), authority.clone()).await;
    let mut reconcile = handle.subscribe(Topic::Reconcile);

    for notation in ["l", "j", "l"] {
        assert!(handle.submit_str(notation).await.expect("submit").is_applied());
    }

    let mut rolled_back = Vec::new();
    for _ in 0..3 {
        if let ReconcileEvent::RolledBack { id, reason, .. } = next_reconcile(&mut reconcile).await
        {
            assert!(reason.contains("rejected"));
            rolled_back.push(id);
        }
    }
    assert_eq!(rolled_back, vec![MoveId(2)]);

    let mirror = handle.query_state().await.expect("state");
    assert_eq!(mirror.player.position, Position::new(0, 2));
    assert_eq!(mirror, authority.state().await);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_treated_as_rejection() {
    let config = RuntimeConfig {
        dispatch_timeout: Duration::from_secs(2),
        ..unthrottled()
    };
    let (_runtime, handle) = start(config, SilentAuthority).await;
    let mut reconcile = handle.subscribe(Topic::Reconcile);

    assert!(handle.submit_str("2l").await.expect("submit").is_applied());
    let mirror = handle.query_state().await.expect("state");
    assert_eq!(mirror.player.position, Position::new(0, 2));

    match next_reconcile(&mut reconcile).await {
        ReconcileEvent::RolledBack {
            id,
            reason,
            position,
            replayed,
        } => {
            assert_eq!(id, MoveId(1));
            assert!(reason.contains("no response"));
            assert_eq!(position, Position::ORIGIN);
            assert_eq!(replayed, 0);
        }
        other => panic!("expected rollback, got {other:?}"),
    }
    let mirror = handle.query_state().await.expect("state");
    assert_eq!(mirror, initial_state());
}

#[tokio::test(start_paused = true)]
async fn test_out_of_order_verdicts_converge() {
    let authority = LocalAuthority::new(initial_state(), GameConfig::new());
    let delays = HashMap::from([
        (MoveId(1), Duration::from_millis(300)),
        (MoveId(2), Duration::from_millis(10)),
    ]);
    let reordering = ReorderingAuthority {
        inner: authority.clone(),
        delays,
    };
    let (_runtime, handle) = start(unthrottled(), reordering).await;
    let mut reconcile = handle.subscribe(Topic::Reconcile);

    assert!(handle.submit_str("3l").await.expect("submit").is_applied());
    assert!(handle.submit_str("j").await.expect("submit").is_applied());

    assert_eq!(
        next_reconcile(&mut reconcile).await,
        ReconcileEvent::Held { id: MoveId(2) }
    );
    assert!(matches!(
        next_reconcile(&mut reconcile).await,
        ReconcileEvent::Confirmed {
            id: MoveId(1),
            mismatch: false,
            ..
        }
    ));
    assert!(handle.pending_moves().await.expect("pending").is_empty());

    let mirror = handle.query_state().await.expect("state");
    assert_eq!(mirror.player.position, Position::new(1, 3));
    assert_eq!(mirror, authority.state().await);
}

#[tokio::test(start_paused = true)]
async fn test_late_rejection_behind_confirmed_move_converges() {
    let authority = LocalAuthority::with_options(
        initial_state(),
        GameConfig::new(),
        LocalAuthorityOptions {
            reject_every: Some(2),
            ..LocalAuthorityOptions::default()
        },
    );
    let delays = HashMap::from([
        (MoveId(1), Duration::from_millis(10)),
        (MoveId(2), Duration::from_millis(300)),
        (MoveId(3), Duration::from_millis(10)),
    ]);
    let reordering = ReorderingAuthority {
        inner: authority.clone(),
        delays,
    };
    let (_runtime, handle) = start(unthrottled(), reordering).await;
    let mut reconcile = handle.subscribe(Topic::Reconcile);

    // `w` reaches the collectible at (0, 6) locally but is rejected after
    // the `j` behind it was already confirmed.
    for notation in ["l", "w", "j"] {
        assert!(handle.submit_str(notation).await.expect("submit").is_applied());
    }
    let mirror = handle.query_state().await.expect("state");
    assert_eq!(mirror.player.score, 10);

    let mut rolled_back = Vec::new();
    for _ in 0..3 {
        if let ReconcileEvent::RolledBack { id, .. } = next_reconcile(&mut reconcile).await {
            rolled_back.push(id);
        }
    }
    assert_eq!(rolled_back, vec![MoveId(2)]);

    let mirror = handle.query_state().await.expect("state");
    assert_eq!(mirror.player.position, Position::new(1, 1));
    assert_eq!(mirror.player.score, 0);
    assert_eq!(mirror.collectibles, initial_state().collectibles);
    assert_eq!(mirror, authority.state().await);
    assert!(handle.pending_moves().await.expect("pending").is_empty());
}

#[tokio::test]
async fn test_concurrent_submission_is_dropped_as_busy() {
    let authority = LocalAuthority::new(initial_state(), GameConfig::new());
    let (_runtime, handle) = start(unthrottled(), authority).await;
    let mut motion = handle.subscribe(Topic::Motion);
    let other = handle.clone();

    let (first, second) = tokio::join!(handle.submit_str("l"), other.submit_str("j"));
    assert!(first.expect("submit").is_applied());
    assert_eq!(
        second.expect("submit"),
        SubmitOutcome::Dropped {
            throttle: Throttle::Busy
        }
    );
    match motion.recv().await.expect("motion event") {
        Event::Motion(MotionEvent::Dropped { throttle, .. }) => {
            assert_eq!(throttle, Throttle::Busy);
        }
        other => panic!("expected a dropped submission, got {other:?}"),
    }

    // The slot is free again once the first submission was processed.
    assert!(handle.submit_str("j").await.expect("submit").is_applied());
    let mirror = handle.query_state().await.expect("state");
    assert_eq!(mirror.player.position, Position::new(1, 1));
}

#[tokio::test]
async fn test_blocked_and_invalid_motions_are_not_dispatched() {
    let authority = LocalAuthority::new(initial_state(), GameConfig::new());
    let (_runtime, handle) = start(unthrottled(), authority.clone()).await;

    let outcome = handle.submit_str("k").await.expect("submit");
    assert!(matches!(outcome, SubmitOutcome::Blocked { .. }));

    let error = handle.submit_str("teleport").await.unwrap_err();
    assert!(matches!(error, RuntimeError::InvalidMotion(_)));
    assert_eq!(error.error_code(), "MOTION_UNKNOWN");

    assert_eq!(authority.received().await, 0);
    assert!(handle.pending_moves().await.expect("pending").is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cooldown_drops_rapid_submissions() {
    let authority = LocalAuthority::new(initial_state(), GameConfig::new());
    let (_runtime, handle) = start(RuntimeConfig::default(), authority).await;

    assert!(handle.submit_str("w").await.expect("submit").is_applied());
    let outcome = handle.submit_str("b").await.expect("submit");
    assert!(matches!(
        outcome,
        SubmitOutcome::Dropped {
            throttle: Throttle::Cooldown { .. }
        }
    ));

    tokio::time::advance(Duration::from_millis(50)).await;
    assert!(handle.submit_str("b").await.expect("submit").is_applied());
}

#[tokio::test]
async fn test_pushes_merge_into_mirror() {
    let authority = LocalAuthority::new(initial_state(), GameConfig::new());
    let (_runtime, handle) = start(unthrottled(), authority).await;
    let mut session = handle.subscribe(Topic::Session);

    handle
        .deliver_push_json(r#"{"type":"opponent","id":2,"position":{"row":0,"col":1},"score":30}"#)
        .await
        .expect("push");
    assert!(matches!(
        next_session(&mut session).await,
        SessionEvent::OpponentUpdated(_)
    ));

    // The opponent occupies the cell to the right.
    let outcome = handle.submit_str("l").await.expect("submit");
    assert!(matches!(outcome, SubmitOutcome::Blocked { .. }));

    handle
        .deliver_push(PushMessage::OpponentLeft { id: ActorId(2) })
        .await
        .expect("push");
    assert_eq!(
        next_session(&mut session).await,
        SessionEvent::OpponentLeft { id: ActorId(2) }
    );

    handle
        .deliver_push(PushMessage::FullState {
            lines: None,
            player: PlayerState {
                position: Position::new(2, 0),
                preferred_column: 0,
                score: 50,
            },
            opponents: Vec::new(),
            collectibles: vec![Position::new(1, 4)],
            completed: false,
        })
        .await
        .expect("push");
    assert_eq!(
        next_session(&mut session).await,
        SessionEvent::StateReplaced {
            position: Position::new(2, 0),
            score: 50,
        }
    );

    let mirror = handle.query_state().await.expect("state");
    assert_eq!(mirror.player.position, Position::new(2, 0));
    assert_eq!(mirror.player.score, 50);
    assert!(mirror.opponents.is_empty());
    assert_eq!(mirror.collectibles.len(), 1);

    let error = handle.deliver_push_json("{\"type\":\"teleport\"}").await.unwrap_err();
    assert_eq!(error.error_code(), "RUNTIME_INVALID_PUSH");
}
