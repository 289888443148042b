//! Teacher invitation models.
//!
//! Admins invite teachers by email. The invitee receives a link carrying an
//! opaque token, reviews the invitation, and accepts it by creating an account
//! and filling in a first profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::ids::InvitationId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
    Expired,
    Revoked,
}

/// A teacher invitation as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: InvitationId,
    pub token: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub invited_by_name: String,
    #[serde(default)]
    pub message: Option<String>,
    pub status: InvitationStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Invitation {
    /// Whether the invitation is past its expiry, regardless of status.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.status == InvitationStatus::Expired || self.expires_at <= now
    }

    /// Whether the invitee can still accept or decline.
    pub fn is_actionable_at(&self, now: DateTime<Utc>) -> bool {
        self.status == InvitationStatus::Pending && !self.is_expired_at(now)
    }
}

/// Filters for the admin invitation list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct InvitationFilterParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<InvitationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// DTO for inviting a new teacher.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateInvitationDto {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(max = 500))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// DTO submitted when an invitee accepts.
///
/// Assembled step by step by the invitation wizard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct AcceptInvitationDto {
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 8, max = 128))]
    pub password_confirm: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(min = 7, max = 20))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[validate(length(min = 1, max = 10))]
    pub subjects: Vec<String>,
    #[validate(range(min = 5.0, max = 500.0))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<f64>,
    #[validate(length(max = 2000))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// Result of accepting an invitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptInvitationResponse {
    pub token: String,
    #[serde(default)]
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn invitation(status: InvitationStatus, expires_in_hours: i64) -> Invitation {
        let now = Utc::now();
        Invitation {
            id: InvitationId(1),
            token: "tok".to_string(),
            email: "new.teacher@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            invited_by_name: "Admin".to_string(),
            message: None,
            status,
            expires_at: now + Duration::hours(expires_in_hours),
            created_at: now - Duration::days(1),
        }
    }

    #[test]
    fn test_pending_unexpired_is_actionable() {
        let inv = invitation(InvitationStatus::Pending, 24);
        assert!(inv.is_actionable_at(Utc::now()));
    }

    #[test]
    fn test_past_expiry_is_not_actionable() {
        let inv = invitation(InvitationStatus::Pending, -1);
        assert!(inv.is_expired_at(Utc::now()));
        assert!(!inv.is_actionable_at(Utc::now()));
    }

    #[test]
    fn test_accepted_is_not_actionable() {
        let inv = invitation(InvitationStatus::Accepted, 24);
        assert!(!inv.is_actionable_at(Utc::now()));
    }

    #[test]
    fn test_create_invitation_validation() {
        let dto = CreateInvitationDto {
            email: "bad".to_string(),
            first_name: String::new(),
            last_name: "Doe".to_string(),
            message: Some("x".repeat(501)),
        };
        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("first_name"));
        assert!(fields.contains_key("message"));
        assert!(!fields.contains_key("last_name"));
    }

    #[test]
    fn test_filter_params_skip_none() {
        let params = InvitationFilterParams {
            status: Some(InvitationStatus::Pending),
            search: None,
        };
        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(json, r#"{"status":"pending"}"#);
    }
}
