use axum::extract::State;
use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::extract::ValidatedJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[garde(length(min = 1))]
    pub login: String,
    #[serde(default)]
    #[garde(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// POST /login - Check credentials and receive a bearer token
///
/// Expected Input:
/// ```json
/// { "login": "string", "password": "string" }
/// ```
///
/// Unknown logins and wrong passwords produce the same 400 response.
#[tracing::instrument(name = "handlers.login", skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    tracing::info!(login = %req.login, "request body decoded");

    let user = state
        .store
        .user_auth(&req.login, &req.password)
        .await
        .map_err(|e| {
            tracing::error!("failed to check credentials: {}", e);
            ApiError::internal_server_error("failed to log in")
        })?
        .ok_or_else(|| {
            tracing::warn!(login = %req.login, "login rejected");
            ApiError::bad_request("invalid login or password")
        })?;

    let token = state.tokens.issue(&user).map_err(|e| {
        tracing::error!("failed to issue token: {}", e);
        ApiError::internal_server_error("failed to log in")
    })?;

    tracing::info!(user_id = user.user_id, "user logged in");

    Ok(ApiResponse::success(LoginResponse { token }))
}
