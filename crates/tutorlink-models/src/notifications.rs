//! In-app notification models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::NotificationId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ClassReminder,
    Payment,
    PurchaseApproval,
    Invitation,
    Task,
    System,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "notification_type")]
    pub kind: NotificationKind,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCount {
    #[serde(alias = "unread_count")]
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct NotificationFilterParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_read: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_type: Option<NotificationKind>,
}

impl NotificationFilterParams {
    pub fn unread_only() -> Self {
        Self {
            is_read: Some(false),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_kind_maps_to_other() {
        let json = r#"{"id":4,"title":"Hi","notification_type":"marketing","created_at":"2024-01-01T00:00:00Z"}"#;
        let n: Notification = serde_json::from_str(json).unwrap();
        assert_eq!(n.kind, NotificationKind::Other);
        assert!(!n.is_read);
    }

    #[test]
    fn test_unread_count_alias() {
        let c: UnreadCount = serde_json::from_str(r#"{"unread_count":7}"#).unwrap();
        assert_eq!(c.count, 7);
    }

    #[test]
    fn test_unread_only_filter() {
        let json = serde_json::to_string(&NotificationFilterParams::unread_only()).unwrap();
        assert_eq!(json, r#"{"is_read":false}"#);
    }
}
