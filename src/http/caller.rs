use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};

use crate::domain::validation::require_credential_code;
use super::errors::RequestError;

pub const CALLER_HEADER: &str = "user-racf";

/// Raw header value, trimmed; `None` when absent or blank
pub fn caller_header(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(CALLER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Caller access code from the `user-racf` header, upper-cased.
///
/// Only the format is checked here; whether the code exists is the
/// directory's call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerCredential(pub String);

impl CallerCredential {
    fn from_request_head(req: &HttpRequest) -> Result<Self, RequestError> {
        let raw = caller_header(req).ok_or(RequestError::MissingCaller)?;
        let code = require_credential_code(&raw).map_err(|e| {
            tracing::debug!(error = %e, "Malformed user-racf header");
            RequestError::InvalidCaller
        })?;
        Ok(CallerCredential(code))
    }
}

impl FromRequest for CallerCredential {
    type Error = RequestError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_request_head(req))
    }
}
