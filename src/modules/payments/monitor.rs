use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use tutorlink_auth::TokenStore;
use tutorlink_config::RealtimeConfig;
use tutorlink_core::ApiError;
use tutorlink_models::RealtimeEvent;
use tutorlink_models::payments::{
    DisputeUpdate, FraudAlert, PaymentMetrics, Transaction, WebhookStatus,
};
use tutorlink_realtime::{
    ConnectionState, StreamError, StreamManager, StreamMessage, StreamOptions, Subscription,
};

use super::service::PaymentService;
use crate::api::ApiClient;

pub const PAYMENTS_STREAM: &str = "/ws/admin/payments/";
pub const TRANSACTIONS_STREAM: &str = "/ws/admin/transactions/";
pub const WEBHOOKS_STREAM: &str = "/ws/admin/webhooks/";

pub const MAX_RECENT_TRANSACTIONS: usize = 50;
pub const MAX_FRAUD_ALERTS: usize = 20;
pub const MAX_DISPUTES: usize = 50;
pub const MAX_WEBHOOK_PROVIDERS: usize = 20;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Everything the admin payment dashboard shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentSnapshot {
    pub metrics: Option<PaymentMetrics>,
    /// Newest first, at most [`MAX_RECENT_TRANSACTIONS`].
    pub recent_transactions: Vec<Transaction>,
    /// Newest first, at most [`MAX_FRAUD_ALERTS`].
    pub fraud_alerts: Vec<FraudAlert>,
    /// Latest update per dispute, most recently updated first, at most
    /// [`MAX_DISPUTES`].
    pub disputes: Vec<DisputeUpdate>,
    /// Latest status per provider, most recently updated first, at most
    /// [`MAX_WEBHOOK_PROVIDERS`].
    pub webhooks: Vec<WebhookStatus>,
    pub last_event_at: Option<DateTime<Utc>>,
}

impl PaymentSnapshot {
    pub fn apply(&mut self, event: RealtimeEvent, now: DateTime<Utc>) {
        self.last_event_at = Some(now);
        match event {
            RealtimeEvent::MetricsUpdate(metrics) => self.metrics = Some(metrics),
            RealtimeEvent::TransactionUpdate(transaction) => {
                self.recent_transactions.retain(|t| t.id != transaction.id);
                self.recent_transactions.insert(0, transaction);
                self.recent_transactions.truncate(MAX_RECENT_TRANSACTIONS);
            }
            RealtimeEvent::FraudAlert(alert) => {
                self.fraud_alerts.insert(0, alert);
                self.fraud_alerts.truncate(MAX_FRAUD_ALERTS);
            }
            RealtimeEvent::DisputeUpdate(update) => {
                self.disputes.retain(|d| d.dispute_id != update.dispute_id);
                self.disputes.insert(0, update);
                self.disputes.truncate(MAX_DISPUTES);
            }
            RealtimeEvent::WebhookStatus(status) => {
                self.webhooks.retain(|w| w.provider != status.provider);
                self.webhooks.insert(0, status);
                self.webhooks.truncate(MAX_WEBHOOK_PROVIDERS);
            }
            // Parent-facing event; not part of the admin dashboard.
            RealtimeEvent::PurchaseApprovalNotification(_) => {}
        }
    }
}

/// Live admin payment dashboard.
///
/// Owns a [`StreamManager`]; dropping the monitor closes the stream.
pub struct PaymentMonitor {
    manager: StreamManager,
    snapshot: Arc<Mutex<PaymentSnapshot>>,
    _messages: Subscription,
}

impl PaymentMonitor {
    pub fn new(config: &RealtimeConfig, tokens: &TokenStore) -> Result<Self, StreamError> {
        Self::for_path(config, tokens, PAYMENTS_STREAM)
    }

    /// Monitor fed by another admin stream (transactions or webhooks). Every
    /// admin stream speaks the same event vocabulary.
    pub fn for_path(
        config: &RealtimeConfig,
        tokens: &TokenStore,
        path: &str,
    ) -> Result<Self, StreamError> {
        let options = StreamOptions::from_config(config, path, tokens.token().as_deref())?;
        Ok(Self::with_manager(StreamManager::new(options)))
    }

    pub fn with_manager(manager: StreamManager) -> Self {
        let snapshot = Arc::new(Mutex::new(PaymentSnapshot::default()));
        let sink = Arc::clone(&snapshot);
        let messages = manager.on_message(move |message: &StreamMessage| {
            match message.decode::<RealtimeEvent>() {
                Ok(event) => lock(&sink).apply(event, Utc::now()),
                Err(e) => {
                    debug!(kind = message.kind(), error = %e, "Ignoring unrecognised payment event")
                }
            }
        });

        Self {
            manager,
            snapshot,
            _messages: messages,
        }
    }

    pub fn start(&self) {
        self.manager.connect();
    }

    pub async fn stop(&self) {
        self.manager.disconnect().await;
    }

    /// Seeds the metrics from REST so the dashboard is not empty until the
    /// first pushed update.
    #[instrument(skip(self, api))]
    pub async fn load_metrics(&self, api: &ApiClient) -> Result<(), ApiError> {
        let metrics = PaymentService::metrics(api).await?;
        let mut snapshot = lock(&self.snapshot);
        if snapshot.metrics.is_none() {
            snapshot.metrics = Some(metrics);
        }
        Ok(())
    }

    pub fn snapshot(&self) -> PaymentSnapshot {
        lock(&self.snapshot).clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.manager.state()
    }

    /// Whether the figures may be out of date because the stream is not open.
    pub fn is_stale(&self) -> bool {
        !self.manager.is_connected()
    }

    /// The underlying stream, for extra listeners.
    pub fn stream(&self) -> &StreamManager {
        &self.manager
    }
}
