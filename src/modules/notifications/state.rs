//! Notification list with local unread bookkeeping.

use tutorlink_core::{ApiError, BatchSummary, PageQuery};
use tutorlink_models::NotificationId;
use tutorlink_models::notifications::{Notification, NotificationFilterParams};

use super::service::NotificationService;
use crate::api::ApiClient;
use crate::utils::list_state::ListState;

pub struct NotificationsState {
    list: ListState<Notification, NotificationFilterParams>,
    unread: u64,
}

impl Default for NotificationsState {
    fn default() -> Self {
        Self::new(20)
    }
}

impl NotificationsState {
    pub fn new(page_size: u32) -> Self {
        Self {
            list: ListState::new(page_size),
            unread: 0,
        }
    }

    pub fn list(&self) -> &ListState<Notification, NotificationFilterParams> {
        &self.list
    }

    pub fn notifications(&self) -> &[Notification] {
        self.list.items()
    }

    pub fn unread(&self) -> u64 {
        self.unread
    }

    pub fn error(&self) -> Option<&str> {
        self.list.error()
    }

    pub fn set_unread_only(&mut self, unread_only: bool) {
        let filters = if unread_only {
            NotificationFilterParams::unread_only()
        } else {
            NotificationFilterParams::default()
        };
        self.list.set_filters(filters);
    }

    /// Reloads the first page and the unread badge.
    pub async fn refresh(&mut self, api: &ApiClient) -> bool {
        let loaded = self
            .list
            .refresh(|filters, page| async move {
                NotificationService::list(api, &filters, page).await
            })
            .await;
        self.refresh_unread(api).await;
        loaded
    }

    pub async fn load_more(&mut self, api: &ApiClient) -> bool {
        self.list
            .load_more(|filters, page: PageQuery| async move {
                NotificationService::list(api, &filters, page).await
            })
            .await
    }

    pub async fn refresh_unread(&mut self, api: &ApiClient) {
        match NotificationService::unread_count(api).await {
            Ok(count) => self.unread = count,
            Err(e) => self.list.set_error(&e),
        }
    }

    /// Marks one notification read and updates the badge without refetching.
    pub async fn mark_read(&mut self, api: &ApiClient, id: NotificationId) -> bool {
        match NotificationService::mark_read(api, id).await {
            Ok(()) => {
                self.mark_locally_read(&[id]);
                true
            }
            Err(e) => {
                self.list.set_error(&e);
                false
            }
        }
    }

    /// Marks every loaded unread notification read. Items that fail stay
    /// unread and the summary is surfaced as the error message.
    pub async fn mark_all_read(&mut self, api: &ApiClient) -> BatchSummary<NotificationId> {
        let ids: Vec<NotificationId> = self
            .list
            .items()
            .iter()
            .filter(|n| !n.is_read)
            .map(|n| n.id)
            .collect();

        let summary = NotificationService::mark_all_read(api, ids).await;
        self.mark_locally_read(&summary.succeeded);
        if !summary.is_complete() {
            self.list.set_error(&ApiError::invalid_state(format!(
                "Some notifications could not be marked as read ({})",
                summary.describe()
            )));
        }
        summary
    }

    pub async fn delete(&mut self, api: &ApiClient, id: NotificationId) -> bool {
        match NotificationService::delete(api, id).await {
            Ok(()) => {
                let was_unread = self
                    .list
                    .items()
                    .iter()
                    .any(|n| n.id == id && !n.is_read);
                self.list.remove_where(|n| n.id == id);
                if was_unread {
                    self.unread = self.unread.saturating_sub(1);
                }
                true
            }
            Err(e) => {
                self.list.set_error(&e);
                false
            }
        }
    }

    fn mark_locally_read(&mut self, ids: &[NotificationId]) {
        let changed = self
            .list
            .update_where(|n| !n.is_read && ids.contains(&n.id), |n| n.is_read = true);
        self.unread = self.unread.saturating_sub(changed as u64);
    }
}
