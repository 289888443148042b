use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tutorlink_config::ReconnectConfig;
use tutorlink_realtime::stream::{
    ConnectError, ConnectionState, Connector, StreamError, StreamManager, StreamMessage,
    StreamOptions, Transport, TransportEvent,
};
use url::Url;

#[derive(Clone, Copy)]
enum Step {
    Handshake,
    Construction,
    Open,
}

/// Server side of one scripted connection.
#[derive(Clone)]
struct ServerEnd {
    events: mpsc::UnboundedSender<TransportEvent>,
    sent: Arc<Mutex<Vec<String>>>,
    closed_with: Arc<Mutex<Option<u16>>>,
}

impl ServerEnd {
    fn push_text(&self, value: serde_json::Value) {
        let _ = self.events.send(TransportEvent::Text(value.to_string()));
    }

    fn push(&self, event: TransportEvent) {
        let _ = self.events.send(event);
    }

    fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    fn closed_with(&self) -> Option<u16> {
        *self.closed_with.lock().unwrap()
    }
}

struct ScriptedTransport {
    events: mpsc::UnboundedReceiver<TransportEvent>,
    sent: Arc<Mutex<Vec<String>>>,
    closed_with: Arc<Mutex<Option<u16>>>,
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&mut self, text: String) -> Result<(), StreamError> {
        self.sent.lock().unwrap().push(text);
        Ok(())
    }

    async fn recv(&mut self) -> TransportEvent {
        self.events
            .recv()
            .await
            .unwrap_or(TransportEvent::Closed { code: 1006 })
    }

    async fn close(&mut self, code: u16) {
        *self.closed_with.lock().unwrap() = Some(code);
    }
}

/// Plays back a script of connection outcomes, then keeps opening.
#[derive(Default)]
struct ScriptedConnector {
    script: Mutex<VecDeque<Step>>,
    servers: Mutex<Vec<ServerEnd>>,
    attempts: AtomicU32,
}

impl ScriptedConnector {
    fn new(steps: &[Step]) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.iter().copied().collect()),
            ..Default::default()
        })
    }

    fn always_failing() -> Arc<Self> {
        Self::new(&[Step::Handshake; 64])
    }

    fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    fn server(&self, index: usize) -> ServerEnd {
        self.servers.lock().unwrap()[index].clone()
    }

    fn connections(&self) -> usize {
        self.servers.lock().unwrap().len()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, _url: &Url) -> Result<Box<dyn Transport>, ConnectError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let step = self.script.lock().unwrap().pop_front().unwrap_or(Step::Open);
        match step {
            Step::Handshake => Err(ConnectError::Handshake("connection refused".into())),
            Step::Construction => Err(ConnectError::Construction("bad url".into())),
            Step::Open => {
                let (tx, rx) = mpsc::unbounded_channel();
                let sent = Arc::new(Mutex::new(Vec::new()));
                let closed_with = Arc::new(Mutex::new(None));
                self.servers.lock().unwrap().push(ServerEnd {
                    events: tx,
                    sent: Arc::clone(&sent),
                    closed_with: Arc::clone(&closed_with),
                });
                Ok(Box::new(ScriptedTransport {
                    events: rx,
                    sent,
                    closed_with,
                }))
            }
        }
    }
}

fn options() -> StreamOptions {
    let mut options = StreamOptions::new(Url::parse("ws://test.local/ws/admin/payments/").unwrap());
    options.reconnect = ReconnectConfig {
        base_interval_ms: 1000,
        multiplier: 2.0,
        max_interval_ms: 30_000,
        max_attempts: 5,
    };
    options.ping_interval = Duration::from_secs(30);
    options
}

fn record_states(manager: &StreamManager) -> (Arc<Mutex<Vec<ConnectionState>>>, tutorlink_realtime::Subscription) {
    let states = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&states);
    let sub = manager.on_state_change(move |state| sink.lock().unwrap().push(state.clone()));
    (states, sub)
}

fn record_errors(manager: &StreamManager) -> (Arc<Mutex<Vec<StreamError>>>, tutorlink_realtime::Subscription) {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    let sub = manager.on_error(move |err| sink.lock().unwrap().push(err.clone()));
    (errors, sub)
}

fn record_messages(manager: &StreamManager) -> (Arc<Mutex<Vec<StreamMessage>>>, tutorlink_realtime::Subscription) {
    let messages = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&messages);
    let sub = manager.on_message(move |msg| sink.lock().unwrap().push(msg.clone()));
    (messages, sub)
}

/// Advances (paused) time in small steps until `condition` holds.
async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..100_000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached");
}

fn scheduled_delays(states: &[ConnectionState]) -> Vec<u64> {
    states
        .iter()
        .filter_map(|s| match s {
            ConnectionState::ReconnectScheduled { delay, .. } => Some(delay.as_millis() as u64),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_three_failed_handshakes_then_open() {
    let connector = ScriptedConnector::new(&[Step::Handshake, Step::Handshake, Step::Handshake]);
    let manager = StreamManager::with_connector(options(), connector.clone());
    let (states, _sub) = record_states(&manager);

    manager.connect();
    wait_until(|| manager.is_connected()).await;

    let states = states.lock().unwrap().clone();
    assert_eq!(scheduled_delays(&states), vec![1000, 2000, 4000]);
    assert_eq!(
        states.iter().filter(|s| **s == ConnectionState::Open).count(),
        1
    );
    assert_eq!(states.last(), Some(&ConnectionState::Open));
    assert_eq!(connector.attempts(), 4);
    assert!(matches!(manager.last_error(), Some(StreamError::Handshake(_))));
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_gives_up_after_max_attempts() {
    let connector = ScriptedConnector::always_failing();
    let manager = StreamManager::with_connector(options(), connector.clone());
    let (states, _s) = record_states(&manager);
    let (errors, _e) = record_errors(&manager);

    manager.connect();
    wait_until(|| manager.state() == ConnectionState::Failed).await;

    assert_eq!(
        scheduled_delays(&states.lock().unwrap()),
        vec![1000, 2000, 4000, 8000, 16000]
    );
    // Initial attempt plus five reconnects.
    assert_eq!(connector.attempts(), 6);

    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(connector.attempts(), 6);

    let exhausted: Vec<_> = errors
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.is_exhausted())
        .cloned()
        .collect();
    assert_eq!(exhausted, vec![StreamError::ReconnectExhausted { attempts: 5 }]);
}

#[tokio::test(start_paused = true)]
async fn test_successful_open_resets_backoff() {
    let connector = ScriptedConnector::new(&[Step::Handshake, Step::Handshake]);
    let manager = StreamManager::with_connector(options(), connector.clone());
    let (states, _sub) = record_states(&manager);

    manager.connect();
    wait_until(|| manager.is_connected()).await;
    assert_eq!(scheduled_delays(&states.lock().unwrap()), vec![1000, 2000]);

    connector.server(0).push(TransportEvent::Closed { code: 1006 });
    wait_until(|| connector.connections() == 2 && manager.is_connected()).await;

    assert_eq!(scheduled_delays(&states.lock().unwrap()), vec![1000, 2000, 1000]);
}

#[tokio::test(start_paused = true)]
async fn test_normal_close_from_server_does_not_reconnect() {
    let connector = ScriptedConnector::new(&[]);
    let manager = StreamManager::with_connector(options(), connector.clone());

    manager.connect();
    wait_until(|| manager.is_connected()).await;

    connector.server(0).push(TransportEvent::Closed { code: 1001 });
    wait_until(|| manager.state() == ConnectionState::Idle).await;

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(connector.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_construction_failure_is_not_retried() {
    let connector = ScriptedConnector::new(&[Step::Construction]);
    let manager = StreamManager::with_connector(options(), connector.clone());
    let (errors, _e) = record_errors(&manager);

    manager.connect();
    wait_until(|| !errors.lock().unwrap().is_empty()).await;
    tokio::time::sleep(Duration::from_secs(120)).await;

    assert_eq!(manager.state(), ConnectionState::Idle);
    assert_eq!(connector.attempts(), 1);
    assert!(matches!(
        errors.lock().unwrap()[0],
        StreamError::Construction(_)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_messages_fan_out_and_pong_is_filtered() {
    let connector = ScriptedConnector::new(&[]);
    let manager = StreamManager::with_connector(options(), connector.clone());
    let (first, _a) = record_messages(&manager);
    let (second, _b) = record_messages(&manager);

    manager.connect();
    wait_until(|| manager.is_connected()).await;

    let server = connector.server(0);
    server.push_text(json!({"type": "pong"}));
    server.push_text(json!({"type": "metrics_update", "data": {"total_revenue": "10.00"}}));
    wait_until(|| !first.lock().unwrap().is_empty()).await;

    for received in [&first, &second] {
        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].kind(), "metrics_update");
    }
}

#[tokio::test(start_paused = true)]
async fn test_invalid_frame_goes_to_error_listeners() {
    let connector = ScriptedConnector::new(&[]);
    let manager = StreamManager::with_connector(options(), connector.clone());
    let (messages, _m) = record_messages(&manager);
    let (errors, _e) = record_errors(&manager);

    manager.connect();
    wait_until(|| manager.is_connected()).await;

    connector.server(0).push(TransportEvent::Text("not json".into()));
    connector.server(0).push_text(json!({"data": 1}));
    wait_until(|| errors.lock().unwrap().len() == 2).await;

    assert!(messages.lock().unwrap().is_empty());
    assert!(
        errors
            .lock()
            .unwrap()
            .iter()
            .all(|e| matches!(e, StreamError::InvalidFrame(_)))
    );
    assert!(manager.is_connected());
}

#[tokio::test(start_paused = true)]
async fn test_transport_error_is_reported_without_reconnect() {
    let connector = ScriptedConnector::new(&[]);
    let manager = StreamManager::with_connector(options(), connector.clone());
    let (errors, _e) = record_errors(&manager);

    manager.connect();
    wait_until(|| manager.is_connected()).await;

    connector
        .server(0)
        .push(TransportEvent::Error("bad frame header".into()));
    wait_until(|| !errors.lock().unwrap().is_empty()).await;

    assert!(manager.is_connected());
    assert_eq!(connector.attempts(), 1);
    assert_eq!(
        manager.last_error(),
        Some(StreamError::Transport("bad frame header".into()))
    );
}

#[tokio::test(start_paused = true)]
async fn test_panicking_listener_does_not_block_delivery() {
    let connector = ScriptedConnector::new(&[]);
    let manager = StreamManager::with_connector(options(), connector.clone());
    let _bad = manager.on_message(|_| panic!("listener bug"));
    let delivered = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&delivered);
    let _good = manager.on_message(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    manager.connect();
    wait_until(|| manager.is_connected()).await;

    connector.server(0).push_text(json!({"type": "fraud_alert"}));
    connector.server(0).push_text(json!({"type": "fraud_alert"}));
    wait_until(|| delivered.load(Ordering::SeqCst) == 2).await;
    assert!(manager.is_connected());
}

#[tokio::test(start_paused = true)]
async fn test_send_only_while_open() {
    let connector = ScriptedConnector::new(&[]);
    let manager = StreamManager::with_connector(options(), connector.clone());

    assert!(!manager.send(&json!({"type": "subscribe"})));

    manager.connect();
    wait_until(|| manager.is_connected()).await;

    assert!(manager.send(&json!({"type": "subscribe", "n": 1})));
    assert!(manager.send(&json!({"type": "subscribe", "n": 2})));
    let server = connector.server(0);
    wait_until(|| server.sent().len() == 2).await;

    let sent = server.sent();
    assert!(sent[0].contains("\"n\":1"));
    assert!(sent[1].contains("\"n\":2"));

    manager.disconnect().await;
    assert!(!manager.send(&json!({"type": "subscribe"})));
    assert_eq!(server.sent().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_keepalive_ping_while_open() {
    let connector = ScriptedConnector::new(&[]);
    let manager = StreamManager::with_connector(options(), connector.clone());

    manager.connect();
    wait_until(|| manager.is_connected()).await;

    let server = connector.server(0);
    assert!(server.sent().is_empty());
    tokio::time::sleep(Duration::from_secs(61)).await;

    let sent = server.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|frame| frame == r#"{"type":"ping"}"#));
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_closes_normally_and_silences_listeners() {
    let connector = ScriptedConnector::new(&[]);
    let manager = StreamManager::with_connector(options(), connector.clone());
    let (states, _s) = record_states(&manager);
    let (messages, _m) = record_messages(&manager);

    manager.connect();
    wait_until(|| manager.is_connected()).await;
    let server = connector.server(0);

    manager.disconnect().await;

    assert_eq!(server.closed_with(), Some(1000));
    let tail: Vec<_> = states.lock().unwrap().iter().rev().take(2).cloned().collect();
    assert_eq!(tail, vec![ConnectionState::Idle, ConnectionState::Closing]);
    assert!(!manager.is_connected());

    // A late frame and elapsed timers change nothing.
    let before = states.lock().unwrap().len();
    server.push_text(json!({"type": "metrics_update"}));
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert!(messages.lock().unwrap().is_empty());
    assert_eq!(states.lock().unwrap().len(), before);
    assert_eq!(connector.attempts(), 1);
    assert!(server.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_cancels_scheduled_reconnect() {
    let connector = ScriptedConnector::always_failing();
    let manager = StreamManager::with_connector(options(), connector.clone());

    manager.connect();
    wait_until(|| matches!(manager.state(), ConnectionState::ReconnectScheduled { .. })).await;

    manager.disconnect().await;
    let attempts = connector.attempts();
    tokio::time::sleep(Duration::from_secs(120)).await;

    assert_eq!(connector.attempts(), attempts);
    assert_eq!(manager.state(), ConnectionState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_unsubscribe_twice_and_after_teardown() {
    let connector = ScriptedConnector::new(&[]);
    let manager = StreamManager::with_connector(options(), connector.clone());
    let (messages, mut sub) = record_messages(&manager);

    manager.connect();
    wait_until(|| manager.is_connected()).await;

    sub.unsubscribe();
    sub.unsubscribe();
    connector.server(0).push_text(json!({"type": "dispute_update"}));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(messages.lock().unwrap().is_empty());

    let (_, mut late) = record_states(&manager);
    drop(manager);
    late.unsubscribe();
    late.unsubscribe();
}

#[tokio::test(start_paused = true)]
async fn test_drop_stops_reconnecting() {
    let connector = ScriptedConnector::always_failing();
    let manager = StreamManager::with_connector(options(), connector.clone());
    let (states, _s) = record_states(&manager);

    manager.connect();
    wait_until(|| connector.attempts() == 2).await;
    drop(manager);

    let seen = states.lock().unwrap().len();
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(connector.attempts(), 2);
    assert_eq!(states.lock().unwrap().len(), seen);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_then_connect_is_noop() {
    let connector = ScriptedConnector::new(&[]);
    let manager = StreamManager::with_connector(options(), connector.clone());

    manager.connect();
    wait_until(|| manager.is_connected()).await;
    manager.shutdown().await;

    assert_eq!(connector.server(0).closed_with(), Some(1000));
    assert_eq!(connector.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_after_failed_state() {
    let mut steps = vec![Step::Handshake; 6];
    steps.push(Step::Open);
    let connector = ScriptedConnector::new(&steps);
    let manager = StreamManager::with_connector(options(), connector.clone());

    manager.connect();
    wait_until(|| manager.state() == ConnectionState::Failed).await;

    manager.connect();
    wait_until(|| manager.is_connected()).await;
    assert_eq!(connector.attempts(), 7);
}
