//! Typed payloads for the live event streams.
//!
//! Frames are JSON objects discriminated by `type`, with the body under
//! `data`:
//!
//! ```json
//! {"type": "metrics_update", "data": {"total_revenue": "1520.00", ...}}
//! ```
//!
//! The stream manager treats frames as opaque; feature code decodes them
//! into [`RealtimeEvent`].

use serde::{Deserialize, Serialize};

use crate::payments::{
    DisputeUpdate, FraudAlert, PaymentMetrics, PurchaseApproval, Transaction, WebhookStatus,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum RealtimeEvent {
    MetricsUpdate(PaymentMetrics),
    TransactionUpdate(Transaction),
    WebhookStatus(WebhookStatus),
    FraudAlert(FraudAlert),
    DisputeUpdate(DisputeUpdate),
    PurchaseApprovalNotification(PurchaseApproval),
}

impl RealtimeEvent {
    /// The wire discriminant of this event.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MetricsUpdate(_) => "metrics_update",
            Self::TransactionUpdate(_) => "transaction_update",
            Self::WebhookStatus(_) => "webhook_status",
            Self::FraudAlert(_) => "fraud_alert",
            Self::DisputeUpdate(_) => "dispute_update",
            Self::PurchaseApprovalNotification(_) => "purchase_approval_notification",
        }
    }
}
