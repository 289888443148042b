use tutorlink_models::ReceiptId;
use tutorlink_models::receipts::{EmailReceiptDto, Receipt, ReceiptFilterParams};

use super::service::ReceiptService;
use crate::api::ApiClient;
use crate::utils::list_state::ListState;

/// Receipt history with a detail pane.
#[derive(Default)]
pub struct ReceiptsState {
    list: ListState<Receipt, ReceiptFilterParams>,
    selected: Option<Receipt>,
    notice: Option<String>,
}

impl ReceiptsState {
    pub fn new(page_size: u32) -> Self {
        Self {
            list: ListState::new(page_size),
            selected: None,
            notice: None,
        }
    }

    pub fn list(&self) -> &ListState<Receipt, ReceiptFilterParams> {
        &self.list
    }

    pub fn receipts(&self) -> &[Receipt] {
        self.list.items()
    }

    pub fn selected(&self) -> Option<&Receipt> {
        self.selected.as_ref()
    }

    /// Confirmation from the last successful action, e.g. an emailed receipt.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.list.error()
    }

    pub fn set_filters(&mut self, filters: ReceiptFilterParams) {
        self.list.set_filters(filters);
    }

    pub async fn refresh(&mut self, api: &ApiClient) -> bool {
        self.list
            .refresh(|filters, page| async move { ReceiptService::list(api, &filters, page).await })
            .await
    }

    pub async fn load_more(&mut self, api: &ApiClient) -> bool {
        self.list
            .load_more(|filters, page| async move { ReceiptService::list(api, &filters, page).await })
            .await
    }

    /// Loads the full receipt, line items included.
    pub async fn open(&mut self, api: &ApiClient, id: ReceiptId) -> bool {
        match ReceiptService::get(api, id).await {
            Ok(receipt) => {
                self.selected = Some(receipt);
                true
            }
            Err(e) => {
                self.list.set_error(&e);
                false
            }
        }
    }

    pub fn close(&mut self) {
        self.selected = None;
    }

    pub async fn email(&mut self, api: &ApiClient, id: ReceiptId, email: Option<String>) -> bool {
        self.notice = None;
        let recipient = email.clone();
        match ReceiptService::email_receipt(api, id, &EmailReceiptDto { email }).await {
            Ok(()) => {
                self.notice = Some(match recipient {
                    Some(address) => format!("Receipt sent to {address}"),
                    None => "Receipt sent to your account email".to_string(),
                });
                true
            }
            Err(e) => {
                self.list.set_error(&e);
                false
            }
        }
    }
}
