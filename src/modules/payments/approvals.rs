use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, instrument};

use tutorlink_auth::TokenStore;
use tutorlink_config::RealtimeConfig;
use tutorlink_core::{ApiError, PageQuery};
use tutorlink_models::payments::{ApprovalDecisionDto, PurchaseApproval, PurchaseApprovalStatus};
use tutorlink_models::{ParentId, PurchaseApprovalId, RealtimeEvent};
use tutorlink_realtime::{
    ConnectionState, StreamError, StreamManager, StreamMessage, StreamOptions, Subscription,
};

use super::service::PaymentService;
use crate::api::ApiClient;

pub fn approvals_stream_path(parent_id: ParentId) -> String {
    format!("/ws/parent/{parent_id}/approvals/")
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Inserts or refreshes a pending request; drops one that was decided.
fn upsert(pending: &mut Vec<PurchaseApproval>, approval: PurchaseApproval) {
    pending.retain(|p| p.id != approval.id);
    if approval.status == PurchaseApprovalStatus::Pending {
        pending.push(approval);
        pending.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
    }
}

/// A parent's pending purchase approvals, kept live by the approvals stream.
pub struct ApprovalInbox {
    parent_id: ParentId,
    manager: StreamManager,
    pending: Arc<Mutex<Vec<PurchaseApproval>>>,
    _messages: Subscription,
}

impl ApprovalInbox {
    pub fn new(
        config: &RealtimeConfig,
        tokens: &TokenStore,
        parent_id: ParentId,
    ) -> Result<Self, StreamError> {
        let options = StreamOptions::from_config(
            config,
            &approvals_stream_path(parent_id),
            tokens.token().as_deref(),
        )?;
        Ok(Self::with_manager(parent_id, StreamManager::new(options)))
    }

    pub fn with_manager(parent_id: ParentId, manager: StreamManager) -> Self {
        let pending = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&pending);
        let messages = manager.on_message(move |message: &StreamMessage| {
            match message.decode::<RealtimeEvent>() {
                Ok(RealtimeEvent::PurchaseApprovalNotification(approval)) => {
                    debug!(approval.id = %approval.id, status = ?approval.status, "Purchase approval pushed");
                    upsert(&mut lock(&sink), approval);
                }
                Ok(other) => debug!(kind = other.kind(), "Ignoring non-approval event"),
                Err(e) => debug!(kind = message.kind(), error = %e, "Ignoring unrecognised event"),
            }
        });

        Self {
            parent_id,
            manager,
            pending,
            _messages: messages,
        }
    }

    pub fn parent_id(&self) -> ParentId {
        self.parent_id
    }

    pub fn start(&self) {
        self.manager.connect();
    }

    pub async fn stop(&self) {
        self.manager.disconnect().await;
    }

    /// Loads the requests already waiting before the stream was opened.
    #[instrument(skip(self, api), fields(parent.id = %self.parent_id))]
    pub async fn load(&self, api: &ApiClient) -> Result<usize, ApiError> {
        let page = PaymentService::list_purchase_approvals(
            api,
            Some(PurchaseApprovalStatus::Pending),
            PageQuery::first(50),
        )
        .await?;

        let mut pending = lock(&self.pending);
        for approval in page.results {
            upsert(&mut pending, approval);
        }
        Ok(pending.len())
    }

    /// Pending requests, newest first.
    pub fn pending(&self) -> Vec<PurchaseApproval> {
        lock(&self.pending).clone()
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }

    pub async fn approve(
        &self,
        api: &ApiClient,
        id: PurchaseApprovalId,
        reason: Option<String>,
    ) -> Result<PurchaseApproval, ApiError> {
        let decided =
            PaymentService::approve_purchase(api, id, &ApprovalDecisionDto { reason }).await?;
        lock(&self.pending).retain(|p| p.id != id);
        Ok(decided)
    }

    pub async fn reject(
        &self,
        api: &ApiClient,
        id: PurchaseApprovalId,
        reason: Option<String>,
    ) -> Result<PurchaseApproval, ApiError> {
        let decided =
            PaymentService::reject_purchase(api, id, &ApprovalDecisionDto { reason }).await?;
        lock(&self.pending).retain(|p| p.id != id);
        Ok(decided)
    }

    pub fn state(&self) -> ConnectionState {
        self.manager.state()
    }

    pub fn is_stale(&self) -> bool {
        !self.manager.is_connected()
    }

    pub fn stream(&self) -> &StreamManager {
        &self.manager
    }
}
