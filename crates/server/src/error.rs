//! Error-to-response mapping for the HTTP surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use vigil_core::VigilError;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Anything a handler can fail with. Bad input (missing/unknown backend,
/// unparseable parameter, malformed body) is the caller's fault; a
/// retrieval failure is the upstream's.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Retrieval(String),
}

impl ApiError {
    pub fn bad_param(key: &str, value: &str) -> Self {
        ApiError::BadRequest(format!("invalid value for {}: {}", key, value))
    }
}

impl From<VigilError> for ApiError {
    fn from(err: VigilError) -> Self {
        match err {
            VigilError::Retrieval(detail) => ApiError::Retrieval(detail),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, format!("no such algorithm: {}", what)),
            ApiError::Retrieval(msg) => (StatusCode::BAD_GATEWAY, msg),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}
