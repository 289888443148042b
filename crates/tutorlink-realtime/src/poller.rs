//! Polling loop with failure backoff.
//!
//! A [`Poller`] invokes an async callback immediately and then once per
//! interval. Consecutive failures stretch the delay exponentially; a success
//! restores the base interval. Once failures exceed the configured maximum
//! the loop stops and [`PollError::Exhausted`] is reported once.
//!
//! # Example
//!
//! ```ignore
//! use tutorlink_realtime::poller::Poller;
//!
//! let poller = Poller::new("unread_count", PollConfig::from_env());
//! let _sub = poller.on_error(|e| tracing::warn!("{e}"));
//! poller.start(move || {
//!     let api = api.clone();
//!     async move { NotificationService::unread_count(&api).await.map(|_| ()) }
//! });
//! ```

use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use tutorlink_config::PollConfig;
use tutorlink_observability::track_poll_failure;

use crate::backoff::Backoff;
use crate::listeners::{ListenerSet, Subscription};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    #[error("Polling stopped after {failures} consecutive failures: {last_error}")]
    Exhausted { failures: u32, last_error: String },
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Which loop, if any, may currently run. Bumping `generation` retires
/// every older loop even if its task has not observed the abort yet.
#[derive(Debug, Default)]
struct RunState {
    generation: u64,
    running: bool,
}

impl RunState {
    fn is_live(&self, generation: u64) -> bool {
        self.running && self.generation == generation
    }
}

struct PollShared {
    name: String,
    /// Guards the start of every invocation and the handling of its result.
    run: Mutex<RunState>,
    failures: AtomicU32,
    errors: ListenerSet<PollError>,
}

/// Repeats an async callback on an interval. Stops on drop.
pub struct Poller {
    config: PollConfig,
    shared: Arc<PollShared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Poller {
    pub fn new(name: impl Into<String>, config: PollConfig) -> Self {
        Self {
            config,
            shared: Arc::new(PollShared {
                name: name.into(),
                run: Mutex::new(RunState::default()),
                failures: AtomicU32::new(0),
                errors: ListenerSet::new("poll-error"),
            }),
            task: Mutex::new(None),
        }
    }

    pub fn on_error<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&PollError) + Send + Sync + 'static,
    {
        self.shared.errors.add(listener)
    }

    /// Starts polling, replacing any previous loop. The first invocation
    /// happens immediately. Must be called within a Tokio runtime.
    pub fn start<F, Fut, E>(&self, mut callback: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        self.stop();
        let generation = {
            let mut run = lock(&self.shared.run);
            run.generation += 1;
            run.running = true;
            run.generation
        };
        self.shared.failures.store(0, Ordering::SeqCst);

        let shared = Arc::clone(&self.shared);
        let mut backoff = Backoff::for_polling(&self.config);
        let interval = self.config.interval;

        let handle = tokio::spawn(async move {
            loop {
                let invocation = {
                    let run = lock(&shared.run);
                    if !run.is_live(generation) {
                        return;
                    }
                    callback()
                };
                let result = invocation.await;

                let (delay, exhausted) = {
                    let mut run = lock(&shared.run);
                    if !run.is_live(generation) {
                        return;
                    }
                    match result {
                        Ok(()) => {
                            backoff.reset();
                            shared.failures.store(0, Ordering::SeqCst);
                            (Some(interval), None)
                        }
                        Err(e) => {
                            let failures = shared.failures.fetch_add(1, Ordering::SeqCst) + 1;
                            track_poll_failure(&shared.name);
                            let message = e.to_string();
                            match backoff.next_delay() {
                                Some(delay) => {
                                    warn!(
                                        poller = %shared.name,
                                        failures,
                                        retry_in_ms = delay.as_millis() as u64,
                                        error = %message,
                                        "Poll failed"
                                    );
                                    (Some(delay), None)
                                }
                                None => {
                                    error!(poller = %shared.name, failures, error = %message, "Polling exhausted");
                                    run.running = false;
                                    (None, Some(PollError::Exhausted {
                                        failures,
                                        last_error: message,
                                    }))
                                }
                            }
                        }
                    }
                };

                if let Some(err) = exhausted {
                    shared.errors.emit(&err);
                    return;
                }
                if let Some(delay) = delay {
                    debug!(poller = %shared.name, delay_ms = delay.as_millis() as u64, "Next poll scheduled");
                    tokio::time::sleep(delay).await;
                }
            }
        });

        *lock(&self.task) = Some(handle);
    }

    /// Stops polling. No invocation begins after this returns, and the
    /// result of one in flight is discarded.
    pub fn stop(&self) {
        lock(&self.shared.run).running = false;
        if let Some(handle) = lock(&self.task).take() {
            handle.abort();
        }
    }

    /// Whether the loop is active (started and neither stopped nor exhausted).
    pub fn is_running(&self) -> bool {
        lock(&self.shared.run).running
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.shared.failures.load(Ordering::SeqCst)
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
        self.shared.errors.close();
    }
}
