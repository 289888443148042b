//! Invitation acceptance wizard.
//!
//! The invitee reviews the invitation, chooses a password, fills in a first
//! teacher profile and confirms. Each step validates only its own fields
//! before the wizard advances; going back never discards input. The accept
//! DTO is assembled incrementally and posted once, from the final step.
//!
//! ```text
//! Review -> Account -> Profile -> Confirm -> submit()
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};
use validator::ValidationErrors;

use tutorlink_models::invitations::{
    AcceptInvitationDto, AcceptInvitationResponse, Invitation, InvitationStatus,
};

use super::service::{InvitationService, validate_acceptance};
use crate::api::ApiClient;
use crate::utils::wizard::{WizardError, WizardStep, check_step};
use crate::validator::errors_for;

const ACCOUNT_FIELDS: &[&str] = &["password", "password_confirm"];
const PROFILE_FIELDS: &[&str] = &[
    "first_name",
    "last_name",
    "phone_number",
    "subjects",
    "hourly_rate",
    "bio",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvitationStep {
    Review,
    Account,
    Profile,
    Confirm,
}

impl WizardStep for InvitationStep {
    const ORDER: &'static [Self] = &[Self::Review, Self::Account, Self::Profile, Self::Confirm];

    fn title(self) -> &'static str {
        match self {
            Self::Review => "Review",
            Self::Account => "Account",
            Self::Profile => "Profile",
            Self::Confirm => "Confirm",
        }
    }
}

/// Profile fields collected on the `Profile` step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileFields {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub subjects: Vec<String>,
    pub hourly_rate: Option<f64>,
    pub bio: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct InvitationWizard {
    token: String,
    invitation: Invitation,
    step: InvitationStep,
    draft: AcceptInvitationDto,
    submitted: bool,
}

impl fmt::Debug for InvitationWizard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvitationWizard")
            .field("invitation", &self.invitation.id)
            .field("step", &self.step)
            .field("submitted", &self.submitted)
            .finish_non_exhaustive()
    }
}

impl InvitationWizard {
    /// Fetches the invitation behind `token` and opens the wizard on it.
    #[instrument(skip(api, token))]
    pub async fn load(api: &ApiClient, token: &str) -> Result<Self, WizardError> {
        let invitation = InvitationService::get_by_token(api, token).await?;
        Ok(Self::from_invitation(token, invitation))
    }

    /// Opens the wizard on an already fetched invitation. The invitee's name
    /// is prefilled from it.
    pub fn from_invitation(token: impl Into<String>, invitation: Invitation) -> Self {
        let draft = AcceptInvitationDto {
            first_name: invitation.first_name.clone(),
            last_name: invitation.last_name.clone(),
            ..Default::default()
        };
        Self {
            token: token.into(),
            invitation,
            step: InvitationStep::Review,
            draft,
            submitted: false,
        }
    }

    pub fn step(&self) -> InvitationStep {
        self.step
    }

    pub fn invitation(&self) -> &Invitation {
        &self.invitation
    }

    /// The DTO as assembled so far.
    pub fn draft(&self) -> &AcceptInvitationDto {
        &self.draft
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Why the invitation cannot be acted on, if it cannot.
    pub fn blocker_at(&self, now: DateTime<Utc>) -> Option<&'static str> {
        match self.invitation.status {
            InvitationStatus::Accepted => Some("This invitation has already been accepted."),
            InvitationStatus::Declined => Some("This invitation was declined."),
            InvitationStatus::Revoked => Some("This invitation has been withdrawn."),
            _ if self.invitation.is_expired_at(now) => {
                Some("This invitation has expired. Ask your administrator to send a new one.")
            }
            _ => None,
        }
    }

    pub fn set_account(&mut self, password: impl Into<String>, password_confirm: impl Into<String>) {
        self.draft.password = password.into();
        self.draft.password_confirm = password_confirm.into();
    }

    pub fn set_profile(&mut self, fields: ProfileFields) {
        self.draft.first_name = fields.first_name.trim().to_string();
        self.draft.last_name = fields.last_name.trim().to_string();
        self.draft.phone_number = non_blank(fields.phone_number);
        self.draft.subjects = fields
            .subjects
            .into_iter()
            .map(|s| s.trim().to_string())
            .collect();
        self.draft.hourly_rate = fields.hourly_rate;
        self.draft.bio = non_blank(fields.bio);
    }

    /// Current profile input, for redisplay after `back()`.
    pub fn profile(&self) -> ProfileFields {
        ProfileFields {
            first_name: self.draft.first_name.clone(),
            last_name: self.draft.last_name.clone(),
            phone_number: self.draft.phone_number.clone(),
            subjects: self.draft.subjects.clone(),
            hourly_rate: self.draft.hourly_rate,
            bio: self.draft.bio.clone(),
        }
    }

    pub fn next(&mut self) -> Result<InvitationStep, WizardError> {
        self.next_at(Utc::now())
    }

    /// Validates the current step and advances. On the last step this only
    /// validates.
    pub fn next_at(&mut self, now: DateTime<Utc>) -> Result<InvitationStep, WizardError> {
        if self.submitted {
            return Err(WizardError::AlreadySubmitted);
        }
        self.validate_step(self.step, now)?;
        if let Some(next) = self.step.next() {
            debug!(from = ?self.step, to = ?next, "Invitation wizard advanced");
            self.step = next;
        }
        Ok(self.step)
    }

    pub fn back(&mut self) -> Result<InvitationStep, WizardError> {
        let previous = self.step.previous().ok_or(WizardError::AtFirstStep)?;
        self.step = previous;
        Ok(previous)
    }

    pub async fn submit(&mut self, api: &ApiClient) -> Result<AcceptInvitationResponse, WizardError> {
        self.submit_at(api, Utc::now()).await
    }

    /// Posts the assembled DTO. Only allowed from the `Confirm` step; a
    /// successful submission signs the new teacher in.
    #[instrument(skip(self, api), fields(invitation.id = %self.invitation.id))]
    pub async fn submit_at(
        &mut self,
        api: &ApiClient,
        now: DateTime<Utc>,
    ) -> Result<AcceptInvitationResponse, WizardError> {
        if self.submitted {
            return Err(WizardError::AlreadySubmitted);
        }
        if self.step != InvitationStep::Confirm {
            return Err(WizardError::NotReady {
                step: self.step.title(),
            });
        }
        self.validate_step(InvitationStep::Review, now)?;
        self.validate_step(InvitationStep::Confirm, now)?;

        let response = InvitationService::accept(api, &self.token, &self.draft).await?;
        self.submitted = true;
        Ok(response)
    }

    /// Declines the invitation instead of accepting it.
    #[instrument(skip(self, api), fields(invitation.id = %self.invitation.id))]
    pub async fn decline(&mut self, api: &ApiClient) -> Result<(), WizardError> {
        if self.submitted {
            return Err(WizardError::AlreadySubmitted);
        }
        self.validate_step(InvitationStep::Review, Utc::now())?;
        InvitationService::decline(api, &self.token).await?;
        self.submitted = true;
        Ok(())
    }

    fn validate_step(&self, step: InvitationStep, now: DateTime<Utc>) -> Result<(), WizardError> {
        if step == InvitationStep::Review {
            return match self.blocker_at(now) {
                Some(reason) => Err(WizardError::Blocked(reason.to_string())),
                None => Ok(()),
            };
        }

        let errors = validate_acceptance(&self.draft)
            .err()
            .unwrap_or_else(ValidationErrors::new);
        let errors = match step {
            InvitationStep::Account => errors_for(&errors, ACCOUNT_FIELDS),
            InvitationStep::Profile => errors_for(&errors, PROFILE_FIELDS),
            _ => errors,
        };
        check_step(step, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tutorlink_models::InvitationId;

    fn invitation(status: InvitationStatus, expires_in_hours: i64) -> Invitation {
        let now = Utc::now();
        Invitation {
            id: InvitationId(5),
            token: "tok".to_string(),
            email: "grace@example.com".to_string(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            invited_by_name: "Admin".to_string(),
            message: None,
            status,
            expires_at: now + Duration::hours(expires_in_hours),
            created_at: now - Duration::days(1),
        }
    }

    fn profile() -> ProfileFields {
        ProfileFields {
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            phone_number: Some("  ".to_string()),
            subjects: vec![" Computer Science ".to_string()],
            hourly_rate: Some(55.0),
            bio: None,
        }
    }

    #[test]
    fn test_prefills_names_from_invitation() {
        let wizard = InvitationWizard::from_invitation("tok", invitation(InvitationStatus::Pending, 24));
        assert_eq!(wizard.step(), InvitationStep::Review);
        assert_eq!(wizard.draft().first_name, "Grace");
        assert_eq!(wizard.draft().last_name, "Hopper");
    }

    #[test]
    fn test_expired_invitation_blocks_review() {
        let mut wizard =
            InvitationWizard::from_invitation("tok", invitation(InvitationStatus::Pending, -2));
        let err = wizard.next().unwrap_err();
        assert!(matches!(err, WizardError::Blocked(_)));
        assert!(err.user_message().contains("expired"));
        assert_eq!(wizard.step(), InvitationStep::Review);
    }

    #[test]
    fn test_accepted_invitation_blocks_review() {
        let mut wizard =
            InvitationWizard::from_invitation("tok", invitation(InvitationStatus::Accepted, 24));
        assert!(matches!(wizard.next(), Err(WizardError::Blocked(_))));
    }

    #[test]
    fn test_account_step_only_reports_account_fields() {
        let mut wizard =
            InvitationWizard::from_invitation("tok", invitation(InvitationStatus::Pending, 24));
        wizard.next().unwrap();
        wizard.set_account("short", "different");

        let err = wizard.next().unwrap_err();
        let fields = err.field_errors().unwrap().field_errors();
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("password_confirm"));
        assert!(!fields.contains_key("subjects"));
        assert_eq!(wizard.step(), InvitationStep::Account);
    }

    #[test]
    fn test_back_keeps_entered_data() {
        let mut wizard =
            InvitationWizard::from_invitation("tok", invitation(InvitationStatus::Pending, 24));
        wizard.next().unwrap();
        wizard.set_account("longenough", "longenough");
        wizard.next().unwrap();
        wizard.set_profile(profile());

        assert_eq!(wizard.back().unwrap(), InvitationStep::Account);
        assert_eq!(wizard.back().unwrap(), InvitationStep::Review);
        assert!(matches!(wizard.back(), Err(WizardError::AtFirstStep)));

        wizard.next().unwrap();
        wizard.next().unwrap();
        assert_eq!(wizard.draft().password, "longenough");
        assert_eq!(wizard.profile().subjects, vec!["Computer Science".to_string()]);
        assert_eq!(wizard.profile().phone_number, None);
    }

    #[test]
    fn test_profile_step_requires_subject() {
        let mut wizard =
            InvitationWizard::from_invitation("tok", invitation(InvitationStatus::Pending, 24));
        wizard.next().unwrap();
        wizard.set_account("longenough", "longenough");
        wizard.next().unwrap();
        wizard.set_profile(ProfileFields {
            subjects: Vec::new(),
            hourly_rate: Some(1000.0),
            ..profile()
        });

        let err = wizard.next().unwrap_err();
        let fields = err.field_errors().unwrap().field_errors();
        assert!(fields.contains_key("subjects"));
        assert!(fields.contains_key("hourly_rate"));
        assert!(!fields.contains_key("password"));
    }

    #[test]
    fn test_reaches_confirm_when_every_step_is_valid() {
        let mut wizard =
            InvitationWizard::from_invitation("tok", invitation(InvitationStatus::Pending, 24));
        wizard.next().unwrap();
        wizard.set_account("longenough", "longenough");
        wizard.next().unwrap();
        wizard.set_profile(profile());
        assert_eq!(wizard.next().unwrap(), InvitationStep::Confirm);
        assert_eq!(wizard.next().unwrap(), InvitationStep::Confirm);
    }
}
