//! Tests for the turn loop against a scripted in-memory transport.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tokio::time::Instant;

use grot_client::{
    BOARD_SIZE, DEFAULT_DEBUG_DELAY, GameSession, Move, MoveStrategy, RandomStrategy,
    SessionParams, Snapshot, Transport, TransportError, TransportErrorKind, shutdown_channel,
};

const GAME_URL: &str = "http://grot.test/games/abc/board?token=t";

#[derive(Debug, Clone, PartialEq)]
enum Event {
    GetStarted,
    GetFinished,
    PostStarted(usize, Move),
    PostFinished(usize),
}

#[derive(Default)]
struct Script {
    first: Mutex<Option<Result<Snapshot, TransportError>>>,
    replies: Mutex<VecDeque<Result<Snapshot, TransportError>>>,
    log: Mutex<Vec<(Event, Instant)>>,
    posts: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    latency: Duration,
}

/// Transport that replays canned responses and records every call.
#[derive(Clone)]
struct ScriptedTransport {
    script: Arc<Script>,
}

impl ScriptedTransport {
    fn new(
        first: Result<Snapshot, TransportError>,
        replies: Vec<Result<Snapshot, TransportError>>,
        latency: Duration,
    ) -> Self {
        Self {
            script: Arc::new(Script {
                first: Mutex::new(Some(first)),
                replies: Mutex::new(replies.into()),
                latency,
                ..Script::default()
            }),
        }
    }

    fn record(&self, event: Event) {
        self.script
            .log
            .lock()
            .expect("log lock")
            .push((event, Instant::now()));
    }

    fn events(&self) -> Vec<Event> {
        self.script
            .log
            .lock()
            .expect("log lock")
            .iter()
            .map(|(event, _)| event.clone())
            .collect()
    }

    fn time_of(&self, wanted: &Event) -> Instant {
        self.script
            .log
            .lock()
            .expect("log lock")
            .iter()
            .find(|(event, _)| match (event, wanted) {
                (Event::PostStarted(a, _), Event::PostStarted(b, _)) => a == b,
                _ => event == wanted,
            })
            .map(|(_, at)| *at)
            .expect("event not recorded")
    }

    fn post_count(&self) -> usize {
        self.script.posts.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        let now = self.script.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.script.max_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.script.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn fetch_snapshot(&self, _url: &str) -> Result<Snapshot, TransportError> {
        self.enter();
        self.record(Event::GetStarted);
        tokio::time::sleep(self.script.latency).await;
        let reply = self
            .script
            .first
            .lock()
            .expect("first lock")
            .take()
            .expect("bootstrap GET issued twice");
        self.record(Event::GetFinished);
        self.leave();
        reply
    }

    async fn submit_move(&self, url: &str, mv: &Move) -> Result<Snapshot, TransportError> {
        assert_eq!(url, GAME_URL);
        self.enter();
        let n = self.script.posts.fetch_add(1, Ordering::SeqCst) + 1;
        self.record(Event::PostStarted(n, *mv));
        tokio::time::sleep(self.script.latency).await;
        let reply = self
            .script
            .replies
            .lock()
            .expect("replies lock")
            .pop_front()
            .unwrap_or_else(|| {
                Err(TransportError::new(
                    TransportErrorKind::Network,
                    "script exhausted",
                ))
            });
        self.record(Event::PostFinished(n));
        self.leave();
        reply
    }
}

/// Strategy that always plays the same cell and remembers what it was shown.
struct FixedStrategy {
    mv: Move,
    seen: Arc<Mutex<Vec<Snapshot>>>,
}

impl MoveStrategy for FixedStrategy {
    fn next_move(&mut self, snapshot: &Snapshot) -> Move {
        self.seen.lock().expect("seen lock").push(snapshot.clone());
        self.mv
    }

    fn name(&self) -> &str {
        "Fixed"
    }
}

fn ongoing() -> Result<Snapshot, TransportError> {
    Ok(Snapshot::from(json!({"status": "ongoing"})))
}

fn server_error() -> Result<Snapshot, TransportError> {
    Err(TransportError::new(
        TransportErrorKind::Status(500),
        "Internal Server Error",
    ))
}

fn session(
    transport: ScriptedTransport,
    debug: bool,
) -> GameSession<ScriptedTransport, RandomStrategy> {
    let params = SessionParams::new(GAME_URL.to_string(), debug, None);
    GameSession::new(params, transport, RandomStrategy::with_seed(1))
}

#[tokio::test(start_paused = true)]
async fn test_posts_never_overlap() {
    let transport = ScriptedTransport::new(
        ongoing(),
        vec![ongoing(), ongoing(), ongoing()],
        Duration::from_millis(50),
    );
    let (_handle, mut shutdown) = shutdown_channel();

    let result = session(transport.clone(), false).start(&mut shutdown).await;
    assert!(result.is_err(), "session ends when the script runs out");

    let events = transport.events();
    assert_eq!(events.len(), 2 + 4 * 2);
    assert_eq!(events[0], Event::GetStarted);
    assert_eq!(events[1], Event::GetFinished);
    for (i, pair) in events[2..].chunks(2).enumerate() {
        let n = i + 1;
        assert!(
            matches!(pair[0], Event::PostStarted(k, _) if k == n),
            "expected POST #{} to start, got {:?}",
            n,
            pair[0]
        );
        assert_eq!(pair[1], Event::PostFinished(n));
    }
    assert_eq!(transport.script.max_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_debug_mode_waits_between_turns() {
    let transport = ScriptedTransport::new(
        ongoing(),
        vec![ongoing(), ongoing(), server_error()],
        Duration::ZERO,
    );
    let (_handle, mut shutdown) = shutdown_channel();

    let err = session(transport.clone(), true)
        .start(&mut shutdown)
        .await
        .expect_err("third POST fails");
    assert_eq!(err.status(), Some(500));

    for n in 1..3 {
        let resolved = transport.time_of(&Event::PostFinished(n));
        let next = transport.time_of(&Event::PostStarted(n + 1, Move::new(0, 0)));
        assert!(
            next - resolved >= Duration::from_millis(3000),
            "POST #{} started {:?} after POST #{} resolved",
            n + 1,
            next - resolved,
            n
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_normal_mode_does_not_wait() {
    let transport = ScriptedTransport::new(
        ongoing(),
        vec![ongoing(), ongoing(), server_error()],
        Duration::ZERO,
    );
    let (_handle, mut shutdown) = shutdown_channel();

    let _ = session(transport.clone(), false).start(&mut shutdown).await;

    for n in 1..3 {
        let resolved = transport.time_of(&Event::PostFinished(n));
        let next = transport.time_of(&Event::PostStarted(n + 1, Move::new(0, 0)));
        assert!(next - resolved < Duration::from_millis(1));
    }
}

#[tokio::test(start_paused = true)]
async fn test_custom_debug_delay() {
    let transport = ScriptedTransport::new(ongoing(), vec![ongoing()], Duration::ZERO);
    let (_handle, mut shutdown) = shutdown_channel();

    let _ = session(transport.clone(), true)
        .with_debug_delay(Duration::from_millis(200))
        .start(&mut shutdown)
        .await;

    let resolved = transport.time_of(&Event::PostFinished(1));
    let next = transport.time_of(&Event::PostStarted(2, Move::new(0, 0)));
    assert!(next - resolved >= Duration::from_millis(200));
    assert!(next - resolved < DEFAULT_DEBUG_DELAY);
}

#[tokio::test(start_paused = true)]
async fn test_debug_flag_is_sticky() {
    let transport = ScriptedTransport::new(
        ongoing(),
        vec![ongoing(), ongoing(), ongoing()],
        Duration::ZERO,
    );
    let mut session = session(transport, true);
    let snapshot = Snapshot::from(json!({"status": "ongoing"}));

    let first = session.play_turn(snapshot, true).await.expect("turn 1");
    assert!(first.debug);
    assert_eq!(first.delay, Some(DEFAULT_DEBUG_DELAY));

    let second = session
        .play_turn(first.snapshot, first.debug)
        .await
        .expect("turn 2");
    assert!(second.debug);
    assert_eq!(second.delay, Some(DEFAULT_DEBUG_DELAY));

    let plain = session
        .play_turn(second.snapshot, false)
        .await
        .expect("turn 3");
    assert!(!plain.debug);
    assert_eq!(plain.delay, None);
    assert_eq!(session.turns(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_two_turns_with_well_formed_moves() {
    let transport = ScriptedTransport::new(ongoing(), vec![ongoing()], Duration::ZERO);
    let (_handle, mut shutdown) = shutdown_channel();

    let _ = session(transport.clone(), false).start(&mut shutdown).await;

    let events = transport.events();
    let posts: Vec<Move> = events
        .iter()
        .filter_map(|event| match event {
            Event::PostStarted(_, mv) => Some(*mv),
            _ => None,
        })
        .collect();
    assert_eq!(posts.len(), 2);
    for mv in posts {
        assert!(mv.x < BOARD_SIZE && mv.y < BOARD_SIZE, "bad move {}", mv);
    }

    // Nothing else happens between the first reply and the second POST.
    let first_done = events
        .iter()
        .position(|e| *e == Event::PostFinished(1))
        .expect("first POST finished");
    assert!(matches!(events[first_done + 1], Event::PostStarted(2, _)));
}

#[tokio::test(start_paused = true)]
async fn test_server_error_stops_the_loop() {
    let transport = ScriptedTransport::new(
        ongoing(),
        vec![ongoing(), server_error(), ongoing(), ongoing()],
        Duration::ZERO,
    );
    let (_handle, mut shutdown) = shutdown_channel();
    let mut session = session(transport.clone(), false);

    let err = session
        .start(&mut shutdown)
        .await
        .expect_err("second POST fails");

    assert_eq!(err.kind, TransportErrorKind::Status(500));
    assert_eq!(transport.post_count(), 2, "no POST after the failure");
    assert_eq!(session.turns(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_bootstrap_failure_sends_no_moves() {
    let transport = ScriptedTransport::new(
        Err(TransportError::new(TransportErrorKind::Decode, "not JSON")),
        vec![ongoing()],
        Duration::ZERO,
    );
    let (_handle, mut shutdown) = shutdown_channel();

    let err = session(transport.clone(), true)
        .start(&mut shutdown)
        .await
        .expect_err("bootstrap fails");

    assert_eq!(err.kind, TransportErrorKind::Decode);
    assert_eq!(transport.post_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_during_debug_pause() {
    let replies = (0..100).map(|_| ongoing()).collect();
    let transport = ScriptedTransport::new(ongoing(), replies, Duration::ZERO);
    let (handle, mut shutdown) = shutdown_channel();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(4000)).await;
        handle.shutdown();
    });

    let summary = session(transport.clone(), true)
        .start(&mut shutdown)
        .await
        .expect("shutdown is not an error");

    // POSTs at t=0 and t=3000ms, shutdown lands in the second pause.
    assert_eq!(*summary.turns(), 2);
    assert_eq!(transport.post_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_before_start() {
    let transport = ScriptedTransport::new(ongoing(), vec![ongoing()], Duration::ZERO);
    let (handle, mut shutdown) = shutdown_channel();
    handle.shutdown();

    let summary = session(transport.clone(), false)
        .start(&mut shutdown)
        .await
        .expect("clean stop");

    assert_eq!(*summary.turns(), 0);
    assert!(transport.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_strategy_sees_each_snapshot() {
    let transport = ScriptedTransport::new(
        Ok(Snapshot::from(json!({"moves": 3}))),
        vec![Ok(Snapshot::from(json!({"moves": 2})))],
        Duration::ZERO,
    );
    let seen = Arc::new(Mutex::new(Vec::new()));
    let strategy = FixedStrategy {
        mv: Move::new(4, 4),
        seen: Arc::clone(&seen),
    };
    let params = SessionParams::new(GAME_URL.to_string(), false, None);
    let mut session = GameSession::new(params, transport.clone(), strategy);
    let (_handle, mut shutdown) = shutdown_channel();

    let _ = session.start(&mut shutdown).await;

    let seen = seen.lock().expect("seen lock");
    assert_eq!(
        *seen,
        vec![
            Snapshot::from(json!({"moves": 3})),
            Snapshot::from(json!({"moves": 2})),
        ]
    );
    assert!(
        transport
            .events()
            .iter()
            .any(|e| *e == Event::PostStarted(1, Move::new(4, 4)))
    );
}
