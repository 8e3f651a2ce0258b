use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::Claims;
use crate::error::ApiError;
use crate::state::AppState;
use crate::types::{Role, UserId};

/// Authenticated caller, placed into request extensions by [`jwt_auth_middleware`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
}

impl Principal {
    pub fn has_any_role(&self, allowed: &[Role]) -> bool {
        allowed.contains(&self.role)
    }
}

impl TryFrom<Claims> for Principal {
    type Error = ApiError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = claims
            .user_id
            .ok_or_else(|| ApiError::missing_claim("no user id in token claims"))?;

        let username = claims
            .username
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ApiError::missing_claim("no username in token"))?;

        let role = claims
            .role
            .filter(|code| *code != 0)
            .map(Role::from)
            .ok_or_else(|| ApiError::missing_claim("no user role in token"))?;

        Ok(Self {
            user_id,
            username,
            role,
        })
    }
}

/// JWT authentication middleware that validates tokens and extracts the caller
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(request.headers()).map_err(|msg| {
        tracing::warn!("rejected request: {}", msg);
        ApiError::unauthorized(msg)
    })?;

    let claims = state.tokens.decode(&token).map_err(|e| {
        tracing::warn!("rejected bearer token: {}", e);
        ApiError::unauthorized("invalid token")
    })?;

    let principal = Principal::try_from(claims).map_err(|e| {
        tracing::error!("{}", e);
        e
    })?;

    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, &'static str> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or("missing authorization header")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "invalid authorization header format")?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        Some(_) => Err("empty bearer token"),
        None => Err("authorization header must use Bearer token format"),
    }
}
