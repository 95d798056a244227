//! Built-in field validators.
//!
//! Validators only see values that passed the type check. Apart from
//! [`NotNull`] they are never called with `null`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::schema::{ErrorCode, FieldError, value_type_name};

/// A per-field constraint.
///
/// Any `Fn(&Value, &str) -> Result<(), FieldError>` is a validator too.
pub trait Validator: Send + Sync {
    fn validate(&self, value: &Value, field: &str) -> Result<(), FieldError>;

    /// Whether the validator wants to see `null` values.
    fn checks_null(&self) -> bool {
        false
    }
}

impl<F> Validator for F
where
    F: Fn(&Value, &str) -> Result<(), FieldError> + Send + Sync,
{
    fn validate(&self, value: &Value, field: &str) -> Result<(), FieldError> {
        self(value, field)
    }
}

/// Fails iff the value is `null` or absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotNull;

impl Validator for NotNull {
    fn validate(&self, value: &Value, field: &str) -> Result<(), FieldError> {
        if value.is_null() {
            return Err(FieldError::new(ErrorCode::NullValue, field, format!("'{field}' is required and cannot be null.")));
        }
        Ok(())
    }

    fn checks_null(&self) -> bool {
        true
    }
}

/// Length bounds for strings (in characters) and arrays (in items).
#[derive(Debug, Clone, Copy, Default)]
pub struct Length {
    min: Option<usize>,
    max: Option<usize>,
}

impl Length {
    pub fn new(min: Option<usize>, max: Option<usize>) -> Self {
        Self { min, max }
    }

    pub fn min(min: usize) -> Self {
        Self::new(Some(min), None)
    }

    pub fn max(max: usize) -> Self {
        Self::new(None, Some(max))
    }

    pub fn between(min: usize, max: usize) -> Self {
        Self::new(Some(min), Some(max))
    }
}

impl Validator for Length {
    fn validate(&self, value: &Value, field: &str) -> Result<(), FieldError> {
        let length = match value {
            Value::String(s) => s.chars().count(),
            Value::Array(items) => items.len(),
            other => return Err(FieldError::type_mismatch(field, "string | array", value_type_name(other))),
        };

        if let Some(min) = self.min
            && length < min
        {
            return Err(FieldError::new(
                ErrorCode::InvalidLength,
                field,
                format!("'{field}' is too short. Minimum length is {min}, but got {length}."),
            )
            .with_detail("min_length", min)
            .with_detail("received_length", length));
        }
        if let Some(max) = self.max
            && length > max
        {
            return Err(FieldError::new(
                ErrorCode::InvalidLength,
                field,
                format!("'{field}' is too long. Maximum length is {max}, but got {length}."),
            )
            .with_detail("max_length", max)
            .with_detail("received_length", length));
        }
        Ok(())
    }
}

/// Inclusive numeric bounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct Range {
    min: Option<f64>,
    max: Option<f64>,
}

impl Range {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn min(min: impl Into<f64>) -> Self {
        Self::new(Some(min.into()), None)
    }

    pub fn max(max: impl Into<f64>) -> Self {
        Self::new(None, Some(max.into()))
    }

    pub fn between(min: impl Into<f64>, max: impl Into<f64>) -> Self {
        Self::new(Some(min.into()), Some(max.into()))
    }
}

impl Validator for Range {
    fn validate(&self, value: &Value, field: &str) -> Result<(), FieldError> {
        let Some(number) = value.as_f64() else {
            return Err(FieldError::type_mismatch(field, "number", value_type_name(value)));
        };

        if let Some(min) = self.min
            && number < min
        {
            return Err(FieldError::new(ErrorCode::OutOfRange, field, format!("'{field}' must be at least {min}. Got {value}."))
                .with_detail("min", min)
                .with_detail("received_value", value.clone()));
        }
        if let Some(max) = self.max
            && number > max
        {
            return Err(FieldError::new(ErrorCode::OutOfRange, field, format!("'{field}' must be at most {max}. Got {value}."))
                .with_detail("max", max)
                .with_detail("received_value", value.clone()));
        }
        Ok(())
    }
}

/// A regular expression matched at the start of the stringified value.
///
/// Strings, numbers and booleans are accepted.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{pattern})"))?;
        Ok(Self { source: pattern.to_string(), regex })
    }
}

impl Validator for Pattern {
    fn validate(&self, value: &Value, field: &str) -> Result<(), FieldError> {
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => return Err(FieldError::type_mismatch(field, "string", value_type_name(other))),
        };

        if !self.regex.is_match(&text) {
            return Err(FieldError::new(ErrorCode::PatternMismatch, field, format!("'{field}' does not match the required format."))
                .with_detail("pattern", self.source.as_str())
                .with_detail("received_value", text));
        }
        Ok(())
    }
}

static EMAIL_REGEX: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+$"));

/// `user@domain.tld` shaped strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct Email;

impl Validator for Email {
    fn validate(&self, value: &Value, field: &str) -> Result<(), FieldError> {
        let Value::String(text) = value else {
            return Err(FieldError::type_mismatch(field, "string", value_type_name(value)));
        };

        let valid = match EMAIL_REGEX.as_ref() {
            Ok(regex) => regex.is_match(text),
            Err(_) => false,
        };
        if !valid {
            return Err(FieldError::new(
                ErrorCode::InvalidFormat,
                field,
                format!("'{field}' must be a valid email address (e.g. user@domain.com). Got: '{text}'."),
            )
            .with_detail("received_value", text.as_str())
            .with_detail("expected_format", "user@domain.com"));
        }
        Ok(())
    }
}

const DEFAULT_SPECIAL_CHARS: &str = r#"!@#$%^&*()_+-=[]{}|;':",./<>?"#;

/// Password strength: a minimum length plus required character classes.
///
/// All missing requirements are reported in one message.
#[derive(Debug, Clone)]
pub struct Password {
    min_length: usize,
    require_upper: bool,
    require_lower: bool,
    require_digits: bool,
    require_special: bool,
    special_chars: String,
}

impl Default for Password {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_upper: true,
            require_lower: true,
            require_digits: true,
            require_special: true,
            special_chars: DEFAULT_SPECIAL_CHARS.to_string(),
        }
    }
}

impl Password {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    pub fn require_upper(mut self, require: bool) -> Self {
        self.require_upper = require;
        self
    }

    pub fn require_lower(mut self, require: bool) -> Self {
        self.require_lower = require;
        self
    }

    pub fn require_digits(mut self, require: bool) -> Self {
        self.require_digits = require;
        self
    }

    pub fn require_special(mut self, require: bool) -> Self {
        self.require_special = require;
        self
    }

    pub fn special_chars(mut self, special_chars: impl Into<String>) -> Self {
        self.special_chars = special_chars.into();
        self
    }
}

impl Validator for Password {
    fn validate(&self, value: &Value, field: &str) -> Result<(), FieldError> {
        let Value::String(text) = value else {
            return Err(FieldError::type_mismatch(field, "string", value_type_name(value)));
        };

        let mut missing = Vec::new();
        if text.chars().count() < self.min_length {
            missing.push(format!("at least {} characters", self.min_length));
        }
        if self.require_upper && !text.chars().any(char::is_uppercase) {
            missing.push("at least one uppercase letter".to_string());
        }
        if self.require_lower && !text.chars().any(char::is_lowercase) {
            missing.push("at least one lowercase letter".to_string());
        }
        if self.require_digits && !text.chars().any(|c| c.is_ascii_digit()) {
            missing.push("at least one digit".to_string());
        }
        if self.require_special && !text.chars().any(|c| self.special_chars.contains(c)) {
            missing.push(format!("at least one special character ({})", self.special_chars));
        }

        if !missing.is_empty() {
            return Err(FieldError::new(ErrorCode::PatternMismatch, field, format!("{field} must contain: {}.", missing.join(", "))));
        }
        Ok(())
    }
}

/// Membership in a fixed set of values. `null` passes only if listed.
#[derive(Debug, Clone)]
pub struct OneOf {
    options: Vec<Value>,
}

impl OneOf {
    pub fn new<I, V>(options: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self { options: options.into_iter().map(Into::into).collect() }
    }
}

impl Validator for OneOf {
    fn validate(&self, value: &Value, field: &str) -> Result<(), FieldError> {
        if !self.options.contains(value) {
            return Err(FieldError::new(ErrorCode::ConstraintViolation, field, format!("'{field}' must be one of the allowed values."))
                .with_detail("received", value.clone())
                .with_detail("allowed", self.options.clone()));
        }
        Ok(())
    }
}

/// Lower bound on string length, number value or array length.
#[derive(Debug, Clone, Copy)]
pub struct Min(pub f64);

impl Validator for Min {
    fn validate(&self, value: &Value, field: &str) -> Result<(), FieldError> {
        let min = self.0;
        let message = match value {
            Value::String(s) => {
                let length = s.chars().count();
                ((length as f64) < min).then(|| (format!("'{field}' is too short. Minimum {min} characters, got {length}."), Value::from(length)))
            }
            Value::Number(n) => n
                .as_f64()
                .filter(|v| *v < min)
                .map(|_| (format!("'{field}' is below the minimum value. Minimum is {min}, got {n}."), value.clone())),
            Value::Array(items) => {
                let length = items.len();
                ((length as f64) < min).then(|| (format!("'{field}' has too few items. Minimum {min} items, got {length}."), Value::from(length)))
            }
            _ => None,
        };

        match message {
            Some((message, received)) => Err(FieldError::new(ErrorCode::InvalidLength, field, message)
                .with_detail("min", min)
                .with_detail("received", received)),
            None => Ok(()),
        }
    }
}

/// Upper bound on string length, number value or array length.
#[derive(Debug, Clone, Copy)]
pub struct Max(pub f64);

impl Validator for Max {
    fn validate(&self, value: &Value, field: &str) -> Result<(), FieldError> {
        let max = self.0;
        let message = match value {
            Value::String(s) => {
                let length = s.chars().count();
                ((length as f64) > max).then(|| (format!("'{field}' is too long. Maximum {max} characters, got {length}."), Value::from(length)))
            }
            Value::Number(n) => n
                .as_f64()
                .filter(|v| *v > max)
                .map(|_| (format!("'{field}' exceeds maximum value. Maximum is {max}, got {n}."), value.clone())),
            Value::Array(items) => {
                let length = items.len();
                ((length as f64) > max).then(|| (format!("'{field}' has too many items. Maximum {max} items, got {length}."), Value::from(length)))
            }
            _ => None,
        };

        match message {
            Some((message, received)) => Err(FieldError::new(ErrorCode::InvalidLength, field, message)
                .with_detail("max", max)
                .with_detail("received", received)),
            None => Ok(()),
        }
    }
}

/// Exact equality with an expected value.
#[derive(Debug, Clone)]
pub struct Assert {
    expected: Value,
}

impl Assert {
    pub fn new(expected: impl Into<Value>) -> Self {
        Self { expected: expected.into() }
    }
}

impl Validator for Assert {
    fn validate(&self, value: &Value, field: &str) -> Result<(), FieldError> {
        if *value != self.expected {
            return Err(FieldError::new(
                ErrorCode::ValueMismatch,
                field,
                "Assertion failed: The actual value does not equal the expected value.",
            )
            .with_detail("expected_value", self.expected.clone())
            .with_detail("actual_value", value.clone()));
        }
        Ok(())
    }
}
