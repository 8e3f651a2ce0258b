//! JSON request decoding with validation.
//!
//! Three failure kinds are kept apart, each a 400: an empty body, a body that is not the
//! expected JSON, and a decoded body whose fields fail validation.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
};
use garde::Validate;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

use crate::error::ApiError;

/// Decode and validate a raw request body.
///
/// Handlers that must authorize before touching the body take [`Bytes`] and call this
/// directly; everything else uses [`ValidatedJson`].
pub fn decode_request<T>(body: &[u8]) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate<Context = ()>,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        tracing::error!("request body is empty");
        return Err(ApiError::EmptyRequest);
    }

    let request: T = serde_json::from_slice(body).map_err(|e| {
        tracing::error!("failed to decode request body: {}", e);
        ApiError::InvalidJson
    })?;

    if let Err(report) = request.validate(&()) {
        let field_errors: BTreeMap<String, String> = report
            .iter()
            .map(|(path, error)| (path.to_string(), error.to_string()))
            .collect();
        tracing::error!("invalid request: {}", report);
        return Err(ApiError::validation_error(field_errors));
    }

    Ok(request)
}

/// Extractor for a JSON body that has passed validation
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate<Context = ()>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state).await.map_err(|e| {
            tracing::error!("failed to read request body: {}", e);
            ApiError::InvalidJson
        })?;

        decode_request(&body).map(ValidatedJson)
    }
}
