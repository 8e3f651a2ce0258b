use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;

/// Value of the `status` field every response carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "Error")]
    Error,
}

/// Success envelope: `{"status": "OK"}` merged with the fields of the payload
#[derive(Debug, Serialize)]
struct Envelope<'a, T: Serialize> {
    status: Status,
    #[serde(flatten)]
    payload: Option<&'a T>,
}

/// Wrapper for API responses that automatically adds the success envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub payload: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful 200 API response.
    ///
    /// The payload must serialize as a map; its fields are merged next to `status`.
    pub fn success(payload: T) -> Self {
        Self {
            payload: Some(payload),
        }
    }
}

impl ApiResponse<()> {
    /// Bare `{"status": "OK"}`
    pub fn ok() -> Self {
        Self { payload: None }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let envelope = Envelope {
            status: Status::Ok,
            payload: self.payload.as_ref(),
        };

        let body = match serde_json::to_value(&envelope) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("failed to process response: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "status": Status::Error,
                        "error": "failed to process response"
                    })),
                )
                    .into_response();
            }
        };

        (StatusCode::OK, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;
