use serde_json::json;
use tracing::{instrument, warn};

use tutorlink_core::ApiError;
use tutorlink_models::auth::{CurrentUser, LoginRequest, LoginResponse};

use crate::api::ApiClient;
use crate::audit_event;
use crate::validator::validated;

pub const LOGIN_PATH: &str = "/accounts/login/";
pub const LOGOUT_PATH: &str = "/accounts/logout/";
pub const ME_PATH: &str = "/accounts/me/";

pub struct AuthService;

impl AuthService {
    /// Signs in and persists the returned token.
    #[instrument(skip(api, dto), fields(user.email = %dto.email))]
    pub async fn login(api: &ApiClient, dto: LoginRequest) -> Result<LoginResponse, ApiError> {
        validated(&dto)?;

        let response: LoginResponse = api.post(LOGIN_PATH, &dto).await?;
        Self::persist_token(api, &response.token).await?;

        audit_event!("login", "session", user.id = %response.user.id, user.role = ?response.user.role);
        Ok(response)
    }

    /// Signs out. The local token is always cleared, even when the backend
    /// cannot be reached.
    #[instrument(skip(api))]
    pub async fn logout(api: &ApiClient) -> Result<(), ApiError> {
        if !api.tokens().is_authenticated() {
            return Ok(());
        }

        if let Err(e) = api.post_action(LOGOUT_PATH, &json!({})).await {
            warn!(error = %e, "Backend logout failed; clearing local session anyway");
        }

        api.tokens().clear().await.map_err(|e| {
            ApiError::invalid_state(format!("Could not clear the saved session: {e}"))
        })?;

        audit_event!("logout", "session");
        Ok(())
    }

    #[instrument(skip(api))]
    pub async fn current_user(api: &ApiClient) -> Result<CurrentUser, ApiError> {
        api.get(ME_PATH).await
    }

    pub(crate) async fn persist_token(api: &ApiClient, token: &str) -> Result<(), ApiError> {
        api.tokens()
            .set_token(token)
            .await
            .map_err(|e| ApiError::invalid_state(format!("Could not save the session: {e}")))
    }
}
