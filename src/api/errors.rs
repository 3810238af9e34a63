//! API Error Handling
//!
//! Maps spin failures onto HTTP status codes. Error bodies use the same shape
//! as successful spins so clients parse one type.

use super::models::SpinResponse;
use crate::errors::SpinError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::fmt;

/// API error with the id of the request that produced it
#[derive(Debug)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub request_id: String,
}

#[derive(Debug)]
pub enum ApiErrorKind {
    BadRequest(String),
    NotFound(String),
    /// A settings or RNG call failed
    Upstream(String),
    InternalError(String),
}

impl ApiError {
    pub fn bad_request(request_id: String, message: String) -> Self {
        Self {
            kind: ApiErrorKind::BadRequest(message),
            request_id,
        }
    }

    pub fn not_found(request_id: String, message: String) -> Self {
        Self {
            kind: ApiErrorKind::NotFound(message),
            request_id,
        }
    }

    /// Classify a failed spin
    pub fn from_spin(request_id: String, error: &SpinError) -> Self {
        let message = error.to_string();
        let kind = match error {
            e if e.is_bad_request() => ApiErrorKind::BadRequest(message),
            SpinError::Rtp(_) | SpinError::Verdict(_) => ApiErrorKind::Upstream(message),
            _ => ApiErrorKind::InternalError(message),
        };
        Self { kind, request_id }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind {
            ApiErrorKind::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiErrorKind::NotFound(_) => StatusCode::NOT_FOUND,
            ApiErrorKind::Upstream(_) | ApiErrorKind::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match &self.kind {
            ApiErrorKind::BadRequest(msg)
            | ApiErrorKind::NotFound(msg)
            | ApiErrorKind::Upstream(msg)
            | ApiErrorKind::InternalError(msg) => msg,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ApiErrorKind::BadRequest(msg) => write!(f, "[{}] Bad Request: {}", self.request_id, msg),
            ApiErrorKind::NotFound(msg) => write!(f, "[{}] Not Found: {}", self.request_id, msg),
            ApiErrorKind::Upstream(msg) => write!(f, "[{}] Upstream Error: {}", self.request_id, msg),
            ApiErrorKind::InternalError(msg) => write!(f, "[{}] Internal Error: {}", self.request_id, msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(SpinResponse::error(self.message()))).into_response()
    }
}
