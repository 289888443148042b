use serde::Serialize;
use tracing::instrument;

use tutorlink_core::{ApiError, PageQuery, Paginated};
use tutorlink_models::payments::{
    ApprovalDecisionDto, PaymentMetrics, PurchaseApproval, PurchaseApprovalStatus, RefundRequest,
    Transaction, TransactionFilterParams,
};
use tutorlink_models::{PurchaseApprovalId, TransactionId};

use crate::api::ApiClient;
use crate::audit_event;
use crate::validator::validated;

pub const METRICS_PATH: &str = "/payments/admin/metrics/";
pub const TRANSACTIONS_PATH: &str = "/payments/admin/transactions/";
pub const PURCHASE_APPROVALS_PATH: &str = "/payments/purchase-approvals/";

#[derive(Debug, Serialize)]
struct ApprovalQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<PurchaseApprovalStatus>,
}

pub struct PaymentService;

impl PaymentService {
    #[instrument(skip(api))]
    pub async fn metrics(api: &ApiClient) -> Result<PaymentMetrics, ApiError> {
        api.get(METRICS_PATH).await
    }

    #[instrument(skip(api))]
    pub async fn list_transactions(
        api: &ApiClient,
        filters: &TransactionFilterParams,
        page: PageQuery,
    ) -> Result<Paginated<Transaction>, ApiError> {
        api.get_page(TRANSACTIONS_PATH, filters, page).await
    }

    #[instrument(skip(api, request))]
    pub async fn refund(
        api: &ApiClient,
        id: TransactionId,
        request: &RefundRequest,
    ) -> Result<Transaction, ApiError> {
        validated(request)?;
        let transaction: Transaction = api
            .post(&format!("{TRANSACTIONS_PATH}{id}/refund/"), request)
            .await?;
        audit_event!("refund", "transaction", transaction.id = %id, partial = request.amount.is_some());
        Ok(transaction)
    }

    #[instrument(skip(api))]
    pub async fn list_purchase_approvals(
        api: &ApiClient,
        status: Option<PurchaseApprovalStatus>,
        page: PageQuery,
    ) -> Result<Paginated<PurchaseApproval>, ApiError> {
        api.get_page(PURCHASE_APPROVALS_PATH, &ApprovalQuery { status }, page)
            .await
    }

    #[instrument(skip(api, decision))]
    pub async fn approve_purchase(
        api: &ApiClient,
        id: PurchaseApprovalId,
        decision: &ApprovalDecisionDto,
    ) -> Result<PurchaseApproval, ApiError> {
        Self::decide(api, id, "approve", decision).await
    }

    #[instrument(skip(api, decision))]
    pub async fn reject_purchase(
        api: &ApiClient,
        id: PurchaseApprovalId,
        decision: &ApprovalDecisionDto,
    ) -> Result<PurchaseApproval, ApiError> {
        Self::decide(api, id, "reject", decision).await
    }

    async fn decide(
        api: &ApiClient,
        id: PurchaseApprovalId,
        action: &'static str,
        decision: &ApprovalDecisionDto,
    ) -> Result<PurchaseApproval, ApiError> {
        validated(decision)?;
        let approval: PurchaseApproval = api
            .post(&format!("{PURCHASE_APPROVALS_PATH}{id}/{action}/"), decision)
            .await?;
        audit_event!(action, "purchase_approval", approval.id = %id);
        Ok(approval)
    }
}
