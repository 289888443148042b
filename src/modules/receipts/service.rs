use tracing::instrument;

use tutorlink_core::{ApiError, PageQuery, Paginated};
use tutorlink_models::ReceiptId;
use tutorlink_models::receipts::{EmailReceiptDto, Receipt, ReceiptFilterParams};

use crate::api::ApiClient;
use crate::audit_event;
use crate::validator::validated;

pub const RECEIPTS_PATH: &str = "/payments/receipts/";

pub struct ReceiptService;

impl ReceiptService {
    #[instrument(skip(api))]
    pub async fn list(
        api: &ApiClient,
        filters: &ReceiptFilterParams,
        page: PageQuery,
    ) -> Result<Paginated<Receipt>, ApiError> {
        api.get_page(RECEIPTS_PATH, filters, page).await
    }

    #[instrument(skip(api))]
    pub async fn get(api: &ApiClient, id: ReceiptId) -> Result<Receipt, ApiError> {
        api.get(&format!("{RECEIPTS_PATH}{id}/")).await
    }

    /// Emails a copy of the receipt; without an address the backend uses the
    /// account email.
    #[instrument(skip(api, dto))]
    pub async fn email_receipt(
        api: &ApiClient,
        id: ReceiptId,
        dto: &EmailReceiptDto,
    ) -> Result<(), ApiError> {
        validated(dto)?;
        api.post_action(&format!("{RECEIPTS_PATH}{id}/email/"), dto)
            .await?;
        audit_event!("email", "receipt", receipt.id = %id);
        Ok(())
    }
}
