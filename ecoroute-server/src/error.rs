use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tower::BoxError;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Timeout,
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Timeout => (
                StatusCode::REQUEST_TIMEOUT,
                "Request took too long".to_string(),
            ),
            ApiError::Internal(message) => {
                tracing::error!("{message}");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<ecoroute_core::Error> for ApiError {
    fn from(err: ecoroute_core::Error) -> Self {
        use ecoroute_core::Error;
        match err {
            Error::UnknownNode(_)
            | Error::InvalidData(_)
            | Error::InvalidGeometry(_)
            | Error::NoPointsFound => ApiError::BadRequest(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("Routing task failed: {err}"))
    }
}

/// Maps errors raised by the tower middleware stack
pub async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        ApiError::Timeout
    } else {
        ApiError::Internal(format!("Unhandled internal error: {err}"))
    }
}
