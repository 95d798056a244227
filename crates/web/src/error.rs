use std::error::Error as StdError;

use http::StatusCode;
use thiserror::Error;
use wharf_http::protocol::{Method, Response};

use crate::schema::AggregateValidationError;

/// The error type carried out of handlers and middlewares.
///
/// `Http` and `Validation` know how to render themselves; anything else is
/// `Internal` and becomes a 500 with its message as the only detail.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Http(#[from] HttpException),

    #[error(transparent)]
    Validation(#[from] AggregateValidationError),

    #[error("{0}")]
    Internal(Box<dyn StdError + Send + Sync>),
}

impl Error {
    pub fn internal<E: Into<Box<dyn StdError + Send + Sync>>>(e: E) -> Self {
        Self::Internal(e.into())
    }

    pub fn into_response(self) -> Response {
        match self {
            Self::Http(e) => e.to_response(),
            Self::Validation(e) => e.to_response(),
            Self::Internal(e) => HttpException::internal(e.to_string()).to_response(),
        }
    }
}

/// A failure that maps directly onto an HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status}: {message}")]
pub struct HttpException {
    status: StatusCode,
    message: String,
}

impl HttpException {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    /// No route matched `path` under any router.
    pub fn not_found(path: &str, method: Method) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("Route '{path}' not found for method {method}"))
    }

    /// A handler looked something up and it wasn't there.
    pub fn resource_not_found(resource: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{resource} not found."))
    }

    pub fn method_not_allowed(path: &str, method: Method) -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, format!("Method '{method}' is not allowed for '{path}'."))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn malformed(detail: impl AsRef<str>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, format!("Malformed request: {}", detail.as_ref()))
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, message)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// `{"error": {"code": <status>, "message": <message>}}`
    pub fn to_response(&self) -> Response {
        Response::error(self.status, self.message.as_str())
    }
}
