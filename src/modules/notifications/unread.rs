use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tutorlink_config::PollConfig;
use tutorlink_realtime::{PollError, Poller, Subscription};

use super::service::NotificationService;
use crate::api::ApiClient;

/// Keeps the unread badge current by polling the unread count.
///
/// The last successful count is kept while requests fail, so the badge never
/// flickers to zero on a transient outage. Polling stops when the counter is
/// dropped.
pub struct UnreadCounter {
    poller: Poller,
    count: Arc<AtomicU64>,
}

impl UnreadCounter {
    pub fn new(config: PollConfig) -> Self {
        Self {
            poller: Poller::new("unread_count", config),
            count: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn start(&self, api: ApiClient) {
        let count = Arc::clone(&self.count);
        self.poller.start(move || {
            let api = api.clone();
            let count = Arc::clone(&count);
            async move {
                let unread = NotificationService::unread_count(&api).await?;
                count.store(unread, Ordering::SeqCst);
                Ok::<(), tutorlink_core::ApiError>(())
            }
        });
    }

    pub fn stop(&self) {
        self.poller.stop();
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.poller.is_running()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.poller.consecutive_failures()
    }

    /// Called once if polling gives up after repeated failures.
    pub fn on_error<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&PollError) + Send + Sync + 'static,
    {
        self.poller.on_error(listener)
    }
}
