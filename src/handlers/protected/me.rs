use axum::Extension;
use serde::Serialize;

use crate::middleware::{ApiResponse, ApiResult, Principal};
use crate::types::{Role, UserId};

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct User {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
}

/// GET /me - echo the identity carried by the bearer token
#[tracing::instrument(name = "handlers.me", skip_all)]
pub async fn me(Extension(principal): Extension<Principal>) -> ApiResult<MeResponse> {
    Ok(ApiResponse::success(MeResponse {
        user: User {
            user_id: principal.user_id,
            username: principal.username,
            role: principal.role,
        },
    }))
}
