use serde_json::json;
use tracing::{info, instrument};

use tutorlink_core::{ApiError, BatchSummary, PageQuery, Paginated, settle_all};
use tutorlink_models::NotificationId;
use tutorlink_models::notifications::{Notification, NotificationFilterParams, UnreadCount};

use crate::api::ApiClient;

pub const NOTIFICATIONS_PATH: &str = "/notifications/";
pub const UNREAD_COUNT_PATH: &str = "/notifications/unread-count/";

pub struct NotificationService;

impl NotificationService {
    #[instrument(skip(api))]
    pub async fn list(
        api: &ApiClient,
        filters: &NotificationFilterParams,
        page: PageQuery,
    ) -> Result<Paginated<Notification>, ApiError> {
        api.get_page(NOTIFICATIONS_PATH, filters, page).await
    }

    #[instrument(skip(api))]
    pub async fn unread_count(api: &ApiClient) -> Result<u64, ApiError> {
        let unread: UnreadCount = api.get(UNREAD_COUNT_PATH).await?;
        Ok(unread.count)
    }

    #[instrument(skip(api))]
    pub async fn mark_read(api: &ApiClient, id: NotificationId) -> Result<(), ApiError> {
        api.post_action(&format!("{NOTIFICATIONS_PATH}{id}/mark-read/"), &json!({}))
            .await
    }

    /// Marks each notification as read with its own request. Every request
    /// runs even if earlier ones fail; the summary says which did.
    #[instrument(skip(api, ids))]
    pub async fn mark_all_read(
        api: &ApiClient,
        ids: Vec<NotificationId>,
    ) -> BatchSummary<NotificationId> {
        let summary = settle_all(ids, |id| Self::mark_read(api, id)).await;
        info!(
            succeeded = summary.succeeded_count(),
            failed = summary.failed_count(),
            "Mark all as read finished"
        );
        summary
    }

    #[instrument(skip(api))]
    pub async fn delete(api: &ApiClient, id: NotificationId) -> Result<(), ApiError> {
        api.delete(&format!("{NOTIFICATIONS_PATH}{id}/")).await
    }
}
