use std::fmt;

use http::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value, json};
use thiserror::Error;
use wharf_http::protocol::Response;

/// Machine readable reason of a [`FieldError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValueMismatch,
    TypeMismatch,
    ConstraintViolation,
    NullValue,
    InvalidFormat,
    PatternMismatch,
    OutOfRange,
    InvalidLength,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValueMismatch => "VALUE_MISMATCH",
            Self::TypeMismatch => "TYPE_MISMATCH",
            Self::ConstraintViolation => "CONSTRAINT_VIOLATION",
            Self::NullValue => "NULL_VALUE",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::PatternMismatch => "PATTERN_MISMATCH",
            Self::OutOfRange => "OUT_OF_RANGE",
            Self::InvalidLength => "INVALID_LENGTH",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One violation on one field.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    code: ErrorCode,
    field: String,
    message: String,
    details: Map<String, Value>,
}

impl FieldError {
    pub fn new(code: ErrorCode, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code, field: field.into(), message: message.into(), details: Map::new() }
    }

    /// `Field '<field>' expects type '<expected>', but received '<received>'.`
    pub fn type_mismatch(field: &str, expected: &str, received: &str) -> Self {
        Self::new(ErrorCode::TypeMismatch, field, format!("Field '{field}' expects type '{expected}', but received '{received}'."))
            .with_detail("expected_type", expected)
            .with_detail("received_type", received)
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> &Map<String, Value> {
        &self.details
    }

    /// Nests the error under `parent`, producing `parent.field`.
    pub(crate) fn prefixed(mut self, parent: &str) -> Self {
        self.field = format!("{parent}.{}", self.field);
        self
    }
}

/// Every violation found while validating one body against one model.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{} validation error(s) occurred.", .errors.len())]
pub struct AggregateValidationError {
    model: String,
    errors: Vec<FieldError>,
}

impl AggregateValidationError {
    pub fn new(model: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self { model: model.into(), errors }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn to_response(&self) -> Response {
        let body = json!({
            "error": {
                "type": "SCHEMA_VALIDATION_ERROR",
                "model": self.model,
                "count": self.errors.len(),
                "errors": self.errors,
            }
        });
        Response::json(StatusCode::BAD_REQUEST, &body)
    }
}
