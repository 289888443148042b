use tracing::instrument;
use validator::{Validate, ValidationError, ValidationErrors};

use tutorlink_core::{ApiError, PageQuery, Paginated};
use tutorlink_models::InvitationId;
use tutorlink_models::invitations::{
    AcceptInvitationDto, AcceptInvitationResponse, CreateInvitationDto, Invitation,
    InvitationFilterParams,
};
use tutorlink_models::teachers::validate_subjects;

use crate::api::ApiClient;
use crate::audit_event;
use crate::modules::auth::AuthService;
use crate::validator::validated;

pub const INVITATIONS_PATH: &str = "/accounts/teacher-invitations/";

fn token_path(token: &str, action: Option<&str>) -> Result<String, ApiError> {
    let token = token.trim();
    if token.is_empty() || token.contains('/') {
        return Err(ApiError::invalid_state(
            "This invitation link is incomplete. Please open the link from your email again.",
        ));
    }
    Ok(match action {
        Some(action) => format!("{INVITATIONS_PATH}{token}/{action}/"),
        None => format!("{INVITATIONS_PATH}{token}/"),
    })
}

/// Field rules plus the checks that span fields: matching passwords and a
/// clean subject list.
pub fn validate_acceptance(dto: &AcceptInvitationDto) -> Result<(), ValidationErrors> {
    let mut errors = match dto.validate() {
        Ok(()) => ValidationErrors::new(),
        Err(errors) => errors,
    };

    if dto.password != dto.password_confirm {
        errors.add(
            "password_confirm",
            ValidationError::new("mismatch").with_message("Passwords do not match".into()),
        );
    }
    if let Err(e) = validate_subjects(&dto.subjects) {
        errors.add("subjects", e);
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

pub struct InvitationService;

impl InvitationService {
    #[instrument(skip(api))]
    pub async fn list(
        api: &ApiClient,
        filters: &InvitationFilterParams,
        page: PageQuery,
    ) -> Result<Paginated<Invitation>, ApiError> {
        api.get_page(INVITATIONS_PATH, filters, page).await
    }

    #[instrument(skip(api, dto), fields(invitee.email = %dto.email))]
    pub async fn create(api: &ApiClient, dto: CreateInvitationDto) -> Result<Invitation, ApiError> {
        validated(&dto)?;
        let invitation: Invitation = api.post(INVITATIONS_PATH, &dto).await?;
        audit_event!("create", "invitation", invitation.id = %invitation.id);
        Ok(invitation)
    }

    #[instrument(skip(api, token))]
    pub async fn get_by_token(api: &ApiClient, token: &str) -> Result<Invitation, ApiError> {
        api.get(&token_path(token, None)?).await
    }

    /// Accepts the invitation and signs the new teacher in.
    #[instrument(skip(api, token, dto))]
    pub async fn accept(
        api: &ApiClient,
        token: &str,
        dto: &AcceptInvitationDto,
    ) -> Result<AcceptInvitationResponse, ApiError> {
        validate_acceptance(dto)?;
        let path = token_path(token, Some("accept"))?;

        let response: AcceptInvitationResponse = api.post(&path, dto).await?;
        AuthService::persist_token(api, &response.token).await?;

        audit_event!("accept", "invitation");
        Ok(response)
    }

    #[instrument(skip(api, token))]
    pub async fn decline(api: &ApiClient, token: &str) -> Result<(), ApiError> {
        let path = token_path(token, Some("decline"))?;
        api.post_action(&path, &serde_json::json!({})).await?;
        audit_event!("decline", "invitation");
        Ok(())
    }

    #[instrument(skip(api))]
    pub async fn resend(api: &ApiClient, id: InvitationId) -> Result<Invitation, ApiError> {
        let invitation: Invitation = api
            .post(&format!("{INVITATIONS_PATH}{id}/resend/"), &serde_json::json!({}))
            .await?;
        audit_event!("resend", "invitation", invitation.id = %id);
        Ok(invitation)
    }

    #[instrument(skip(api))]
    pub async fn revoke(api: &ApiClient, id: InvitationId) -> Result<Invitation, ApiError> {
        let invitation: Invitation = api
            .post(&format!("{INVITATIONS_PATH}{id}/revoke/"), &serde_json::json!({}))
            .await?;
        audit_event!("revoke", "invitation", invitation.id = %id);
        Ok(invitation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto() -> AcceptInvitationDto {
        AcceptInvitationDto {
            password: "correct horse".to_string(),
            password_confirm: "correct horse".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone_number: None,
            subjects: vec!["Mathematics".to_string()],
            hourly_rate: Some(40.0),
            bio: None,
        }
    }

    #[test]
    fn test_token_path() {
        assert_eq!(
            token_path(" abc123 ", Some("accept")).unwrap(),
            "/accounts/teacher-invitations/abc123/accept/"
        );
        assert!(token_path("", None).is_err());
        assert!(token_path("a/b", None).is_err());
    }

    #[test]
    fn test_validate_acceptance_accepts_complete_dto() {
        assert!(validate_acceptance(&dto()).is_ok());
    }

    #[test]
    fn test_validate_acceptance_password_mismatch() {
        let mut dto = dto();
        dto.password_confirm = "something else".to_string();
        let errors = validate_acceptance(&dto).unwrap_err();
        assert_eq!(errors.field_errors().len(), 1);
        assert!(errors.field_errors().contains_key("password_confirm"));
    }

    #[test]
    fn test_validate_acceptance_duplicate_subjects() {
        let mut dto = dto();
        dto.subjects = vec!["Physics".to_string(), "physics".to_string()];
        let errors = validate_acceptance(&dto).unwrap_err();
        assert!(errors.field_errors().contains_key("subjects"));
    }
}
