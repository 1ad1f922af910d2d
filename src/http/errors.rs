use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

use crate::domain::access::AccessError;
use crate::domain::errors::ErrorKind;
use crate::domain::guest::GuestError;
use crate::importer::ImportError;

// ============================================================================
// Failure → HTTP response
// ============================================================================
//
// Every error renders as `{"error": "<message>"}` with a status picked from
// its ErrorKind. Internal failures only ever show the generic text; their
// source was logged where it happened.
//
// ============================================================================

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn error_body(status: StatusCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(json!({ "error": message.into() }))
}

impl ResponseError for GuestError {
    fn status_code(&self) -> StatusCode {
        status_for(self.kind())
    }

    fn error_response(&self) -> HttpResponse {
        error_body(self.status_code(), self.to_string())
    }
}

impl ResponseError for AccessError {
    fn status_code(&self) -> StatusCode {
        status_for(self.kind())
    }

    fn error_response(&self) -> HttpResponse {
        error_body(self.status_code(), self.to_string())
    }
}

impl ResponseError for ImportError {
    fn status_code(&self) -> StatusCode {
        status_for(self.kind())
    }

    fn error_response(&self) -> HttpResponse {
        error_body(self.status_code(), self.to_string())
    }
}

/// Problems with the request itself, found before any domain call
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("header user-racf is required")]
    MissingCaller,

    #[error("user-racf must be exactly 5 alphanumeric characters")]
    InvalidCaller,

    #[error("authentication required")]
    Unauthenticated,

    #[error("invalid guest ID")]
    InvalidId,

    #[error("invalid request: {0}")]
    InvalidBody(String),
}

impl ResponseError for RequestError {
    fn status_code(&self) -> StatusCode {
        match self {
            RequestError::Unauthenticated => StatusCode::UNAUTHORIZED,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        error_body(self.status_code(), self.to_string())
    }
}
