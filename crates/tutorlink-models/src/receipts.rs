//! Payment receipt models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tutorlink_core::serde::deserialize_decimal_string;
use validator::Validate;

use crate::ids::{ReceiptId, TransactionId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptLineItem {
    pub description: String,
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(deserialize_with = "deserialize_decimal_string")]
    pub amount: String,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: ReceiptId,
    pub receipt_number: String,
    #[serde(default)]
    pub transaction_id: Option<TransactionId>,
    #[serde(deserialize_with = "deserialize_decimal_string")]
    pub total: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub line_items: Vec<ReceiptLineItem>,
    #[serde(default)]
    pub pdf_url: Option<String>,
    pub issued_at: DateTime<Utc>,
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ReceiptFilterParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_after: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_before: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// Request to email a copy of a receipt.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct EmailReceiptDto {
    /// Defaults to the account email server-side when absent
    #[validate(email)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}
