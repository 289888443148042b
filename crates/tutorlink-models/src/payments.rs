//! Payment, transaction, and purchase approval models.
//!
//! Amounts are decimal strings on the wire and stay strings here; the client
//! only displays money, it never computes with it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tutorlink_core::serde::{deserialize_decimal_string, deserialize_optional_decimal_string};
use validator::Validate;

use crate::ids::{DisputeId, ParentId, PurchaseApprovalId, StudentId, TransactionId};

/// Aggregate payment metrics for the admin monitoring dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentMetrics {
    #[serde(deserialize_with = "deserialize_decimal_string")]
    pub total_revenue: String,
    #[serde(default)]
    pub transactions_today: u64,
    /// Percentage in [0, 100]
    #[serde(default)]
    pub success_rate: f64,
    #[serde(default)]
    pub failed_transactions: u64,
    #[serde(default, deserialize_with = "deserialize_optional_decimal_string")]
    pub pending_payouts: Option<String>,
    #[serde(default)]
    pub active_disputes: u64,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Succeeded,
    Failed,
    Refunded,
    Disputed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(deserialize_with = "deserialize_decimal_string")]
    pub amount: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub status: TransactionStatus,
    #[serde(default)]
    pub payer_name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct TransactionFilterParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TransactionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_after: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RefundRequest {
    #[validate(length(min = 3, max = 500))]
    pub reason: String,
    /// Partial refund amount; the full amount is refunded when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseApprovalStatus {
    Pending,
    Approved,
    Rejected,
    Expired,
}

/// A student's purchase waiting on a parent's decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseApproval {
    pub id: PurchaseApprovalId,
    pub student_id: StudentId,
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub parent_id: Option<ParentId>,
    pub item_description: String,
    #[serde(deserialize_with = "deserialize_decimal_string")]
    pub amount: String,
    pub status: PurchaseApprovalStatus,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ApprovalDecisionDto {
    #[validate(length(max = 500))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Health of a payment provider webhook endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookStatus {
    pub provider: String,
    pub status: String,
    #[serde(default)]
    pub last_event_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub failure_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudAlert {
    pub transaction_id: TransactionId,
    /// Score in [0, 1]
    pub risk_score: f64,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisputeUpdate {
    pub dispute_id: DisputeId,
    pub transaction_id: TransactionId,
    pub status: String,
    #[serde(default, deserialize_with = "deserialize_optional_decimal_string")]
    pub amount: Option<String>,
}
