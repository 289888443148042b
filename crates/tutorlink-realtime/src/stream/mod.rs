//! Reconnecting event-stream manager.
//!
//! A [`StreamManager`] keeps one logical subscription to a server-push
//! endpoint alive. It owns a single driver task that connects, pumps frames,
//! sends keep-alive pings and reconnects with exponential backoff after
//! abnormal closures. Consumers observe it through three listener
//! categories: messages, connection-state changes and errors.
//!
//! ```text
//! Idle -> Connecting -> Open -> Closing -> Idle
//!              ^          |
//!              |          v (abnormal close / failed handshake)
//!              +-- ReconnectScheduled --(limit reached)--> Failed
//! ```
//!
//! # Example
//!
//! ```ignore
//! use tutorlink_realtime::stream::{StreamManager, StreamOptions};
//!
//! let options = StreamOptions::from_config(&config, "/ws/admin/payments/", Some(&token))?;
//! let manager = StreamManager::new(options);
//! let _sub = manager.on_message(|msg| println!("{}", msg.kind()));
//! manager.connect();
//! // ...
//! manager.disconnect().await;
//! ```

mod error;
mod message;
mod transport;

pub use error::StreamError;
pub use message::{PING_TYPE, PONG_TYPE, StreamMessage, ping_frame};
pub use transport::{
    CLOSE_ABNORMAL, CLOSE_GOING_AWAY, CLOSE_NO_STATUS, CLOSE_NORMAL, ConnectError, Connector,
    Transport, TransportEvent, WebSocketConnector, is_normal_closure,
};

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use tutorlink_config::{RealtimeConfig, ReconnectConfig};
use tutorlink_observability::{
    track_reconnect_scheduled, track_stream_connected, track_stream_message,
};
use url::Url;

use crate::backoff::Backoff;
use crate::listeners::{ListenerSet, Subscription};

/// Connection lifecycle of a [`StreamManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Open,
    Closing,
    /// Waiting `delay` before reconnect attempt number `attempt` (1-based).
    ReconnectScheduled { attempt: u32, delay: Duration },
    /// Reconnection was abandoned. `connect()` starts over.
    Failed,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Connecting => f.write_str("connecting"),
            Self::Open => f.write_str("open"),
            Self::Closing => f.write_str("closing"),
            Self::ReconnectScheduled { attempt, delay } => {
                write!(f, "reconnecting (attempt {attempt} in {}ms)", delay.as_millis())
            }
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// Settings for one stream.
#[derive(Debug, Clone)]
pub struct StreamOptions {
    pub url: Url,
    pub ping_interval: Duration,
    pub reconnect: ReconnectConfig,
    /// Log every frame at debug level.
    pub debug: bool,
}

impl StreamOptions {
    pub fn new(url: Url) -> Self {
        let defaults = RealtimeConfig::default();
        Self {
            url,
            ping_interval: defaults.ping_interval(),
            reconnect: defaults.reconnect,
            debug: defaults.debug,
        }
    }

    /// Options for the feature stream at `path`, authenticated with `token`.
    pub fn from_config(
        config: &RealtimeConfig,
        path: &str,
        token: Option<&str>,
    ) -> Result<Self, StreamError> {
        let url = config
            .endpoint(path, token)
            .map_err(|e| StreamError::Construction(e.to_string()))?;
        Ok(Self {
            url,
            ping_interval: config.ping_interval(),
            reconnect: config.reconnect.clone(),
            debug: config.debug,
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State shared between the manager handle and its driver task.
struct Shared {
    /// URL path only; the query carries the auth token and is never logged.
    endpoint: String,
    debug: bool,
    state: Mutex<ConnectionState>,
    last_error: Mutex<Option<StreamError>>,
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
    torn_down: AtomicBool,
    messages: ListenerSet<StreamMessage>,
    states: ListenerSet<ConnectionState>,
    errors: ListenerSet<StreamError>,
}

impl Shared {
    fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    fn set_state(&self, next: ConnectionState) {
        if self.is_torn_down() {
            return;
        }
        {
            let mut state = lock(&self.state);
            if *state == next {
                return;
            }
            *state = next.clone();
        }
        debug!(endpoint = %self.endpoint, state = %next, "Stream state changed");
        self.states.emit(&next);
    }

    fn report(&self, err: StreamError) {
        warn!(endpoint = %self.endpoint, error = %err, "Stream error");
        *lock(&self.last_error) = Some(err.clone());
        if !self.is_torn_down() {
            self.errors.emit(&err);
        }
    }

    fn dispatch(&self, text: &str) {
        if self.debug {
            debug!(endpoint = %self.endpoint, frame = %text, "Received frame");
        }
        match StreamMessage::parse(text) {
            Ok(message) if message.is_pong() => {}
            Ok(message) => {
                track_stream_message(message.kind());
                if !self.is_torn_down() {
                    self.messages.emit(&message);
                }
            }
            Err(err) => self.report(err),
        }
    }

    fn open_outbound(&self) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        *lock(&self.outbound) = Some(tx);
        rx
    }

    /// Drops the sender; frames still queued are discarded with the receiver.
    fn close_outbound(&self) {
        lock(&self.outbound).take();
    }
}

struct Driver {
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

/// Reconnecting event-stream client.
///
/// Dropping the manager tears it down: the driver task is aborted (closing
/// the transport), and every listener registry is cleared. Use
/// [`disconnect`](Self::disconnect) or [`shutdown`](Self::shutdown) to also
/// wait for the driver to finish.
///
/// Drop does not wait. On a multi-threaded runtime a delivery that was
/// already fanning out when the manager dropped may still reach the
/// listeners it had snapshotted. Only `disconnect` and `shutdown`
/// guarantee that no listener runs after they return.
pub struct StreamManager {
    shared: Arc<Shared>,
    connector: Arc<dyn Connector>,
    options: StreamOptions,
    driver: Mutex<Option<Driver>>,
}

impl StreamManager {
    /// A manager speaking WebSocket.
    pub fn new(options: StreamOptions) -> Self {
        Self::with_connector(options, Arc::new(WebSocketConnector))
    }

    pub fn with_connector(options: StreamOptions, connector: Arc<dyn Connector>) -> Self {
        let shared = Arc::new(Shared {
            endpoint: options.url.path().to_string(),
            debug: options.debug,
            state: Mutex::new(ConnectionState::Idle),
            last_error: Mutex::new(None),
            outbound: Mutex::new(None),
            torn_down: AtomicBool::new(false),
            messages: ListenerSet::new("message"),
            states: ListenerSet::new("state"),
            errors: ListenerSet::new("error"),
        });
        Self {
            shared,
            connector,
            options,
            driver: Mutex::new(None),
        }
    }

    /// Starts the driver task. No-op while a driver is already running or
    /// after teardown. Must be called within a Tokio runtime.
    pub fn connect(&self) {
        if self.shared.is_torn_down() {
            return;
        }
        let mut driver = lock(&self.driver);
        if driver.as_ref().is_some_and(|d| !d.handle.is_finished()) {
            return;
        }
        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(drive(
            Arc::clone(&self.shared),
            Arc::clone(&self.connector),
            self.options.clone(),
            stop_rx,
        ));
        *driver = Some(Driver {
            stop: Some(stop_tx),
            handle,
        });
    }

    /// Closes the connection with code 1000 and waits for the driver to
    /// finish. State listeners observe `Closing` (when open) and then `Idle`.
    pub async fn disconnect(&self) {
        let driver = lock(&self.driver).take();
        if let Some(mut driver) = driver {
            if let Some(stop) = driver.stop.take() {
                let _ = stop.send(());
            }
            if let Err(e) = driver.handle.await {
                if e.is_panic() {
                    error!(endpoint = %self.shared.endpoint, "Stream driver panicked");
                }
            }
        }
        self.shared.close_outbound();
        self.shared.set_state(ConnectionState::Idle);
    }

    /// Disconnects, then tears the manager down.
    pub async fn shutdown(self) {
        self.disconnect().await;
        self.teardown();
    }

    fn teardown(&self) {
        self.shared.torn_down.store(true, Ordering::SeqCst);
        if let Some(driver) = lock(&self.driver).take() {
            driver.handle.abort();
        }
        self.shared.close_outbound();
        self.shared.messages.close();
        self.shared.states.close();
        self.shared.errors.close();
    }

    /// Queues `payload` as a JSON frame. Returns `false` without sending
    /// anything unless the stream is open.
    pub fn send<T: Serialize + ?Sized>(&self, payload: &T) -> bool {
        let Some(tx) = lock(&self.shared.outbound).clone() else {
            return false;
        };
        match serde_json::to_string(payload) {
            Ok(text) => tx.send(text).is_ok(),
            Err(e) => {
                self.shared.report(StreamError::Encode(e.to_string()));
                false
            }
        }
    }

    pub fn on_message<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&StreamMessage) + Send + Sync + 'static,
    {
        self.shared.messages.add(listener)
    }

    pub fn on_state_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ConnectionState) + Send + Sync + 'static,
    {
        self.shared.states.add(listener)
    }

    pub fn on_error<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&StreamError) + Send + Sync + 'static,
    {
        self.shared.errors.add(listener)
    }

    pub fn state(&self) -> ConnectionState {
        lock(&self.shared.state).clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    pub fn last_error(&self) -> Option<StreamError> {
        lock(&self.shared.last_error).clone()
    }

    /// URL path of the stream (without the token query).
    pub fn endpoint(&self) -> &str {
        &self.shared.endpoint
    }
}

impl Drop for StreamManager {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for StreamManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamManager")
            .field("endpoint", &self.shared.endpoint)
            .field("state", &self.state())
            .finish()
    }
}

enum SessionEnd {
    Stopped,
    Closed(u16),
}

async fn drive(
    shared: Arc<Shared>,
    connector: Arc<dyn Connector>,
    options: StreamOptions,
    mut stop: oneshot::Receiver<()>,
) {
    let mut backoff = Backoff::for_reconnect(&options.reconnect);

    loop {
        shared.set_state(ConnectionState::Connecting);

        let attempt = tokio::select! {
            biased;
            _ = &mut stop => {
                shared.set_state(ConnectionState::Idle);
                return;
            }
            result = connector.connect(&options.url) => result,
        };

        let code = match attempt {
            Ok(transport) => {
                backoff.reset();
                match run_session(&shared, transport, &options, &mut stop).await {
                    SessionEnd::Stopped => {
                        shared.set_state(ConnectionState::Idle);
                        return;
                    }
                    SessionEnd::Closed(code) => code,
                }
            }
            Err(ConnectError::Construction(msg)) => {
                shared.report(StreamError::Construction(msg));
                shared.set_state(ConnectionState::Idle);
                return;
            }
            Err(ConnectError::Handshake(msg)) => {
                shared.report(StreamError::Handshake(msg));
                CLOSE_ABNORMAL
            }
        };

        if is_normal_closure(code) {
            info!(endpoint = %shared.endpoint, code, "Stream closed by server");
            shared.set_state(ConnectionState::Idle);
            return;
        }

        let Some(delay) = backoff.next_delay() else {
            let attempts = backoff.attempts();
            error!(endpoint = %shared.endpoint, attempts, "Giving up on reconnecting");
            shared.set_state(ConnectionState::Failed);
            shared.report(StreamError::ReconnectExhausted { attempts });
            return;
        };
        let attempt = backoff.attempts();
        warn!(
            endpoint = %shared.endpoint,
            code,
            attempt,
            delay_ms = delay.as_millis() as u64,
            "Stream closed abnormally, reconnect scheduled"
        );
        track_reconnect_scheduled(&shared.endpoint, attempt);
        shared.set_state(ConnectionState::ReconnectScheduled { attempt, delay });

        tokio::select! {
            biased;
            _ = &mut stop => {
                shared.set_state(ConnectionState::Idle);
                return;
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

async fn run_session(
    shared: &Shared,
    mut transport: Box<dyn Transport>,
    options: &StreamOptions,
    stop: &mut oneshot::Receiver<()>,
) -> SessionEnd {
    let mut outbound = shared.open_outbound();
    shared.set_state(ConnectionState::Open);
    info!(endpoint = %shared.endpoint, "Stream connected");
    track_stream_connected(&shared.endpoint);

    let period = options.ping_interval;
    let mut ping = tokio::time::interval_at(Instant::now() + period, period);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = &mut *stop => {
                shared.close_outbound();
                shared.set_state(ConnectionState::Closing);
                transport.close(CLOSE_NORMAL).await;
                return SessionEnd::Stopped;
            }
            Some(frame) = outbound.recv() => {
                if shared.debug {
                    debug!(endpoint = %shared.endpoint, frame = %frame, "Sending frame");
                }
                if let Err(e) = transport.send(frame).await {
                    shared.report(e);
                }
            }
            _ = ping.tick() => {
                if let Err(e) = transport.send(ping_frame()).await {
                    shared.report(e);
                }
            }
            event = transport.recv() => match event {
                TransportEvent::Text(text) => shared.dispatch(&text),
                TransportEvent::Error(e) => shared.report(StreamError::Transport(e)),
                TransportEvent::Closed { code } => {
                    shared.close_outbound();
                    return SessionEnd::Closed(code);
                }
            },
        }
    }
}
