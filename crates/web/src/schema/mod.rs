//! Declarative request body validation.
//!
//! A [`Schema`] lists the fields a model expects, their JSON types and the
//! validators that apply to each. Validation runs in two passes over the
//! data and reports every violation at once:
//!
//! 1. the type pass checks each declared field present in the data against
//!    its [`FieldType`], recursing into nested models;
//! 2. the constraint pass runs the validators of each declared field that
//!    passed the type pass. Absent fields are seen as `null`, and only
//!    validators that [check null](Validator::checks_null) run on `null`.
//!    A field stops at its first failing validator.
//!
//! Type errors come first in the aggregate, then validator errors, each in
//! field declaration order.
//!
//! ```
//! use serde_json::json;
//! use wharf_web::schema::{Field, FieldType, Length, NotNull, Range, Schema};
//!
//! let user = Schema::builder("User")
//!     .field(Field::new("name", FieldType::String).validator(NotNull).validator(Length::min(2)))
//!     .field(Field::new("age", FieldType::Integer).validator(Range::between(0, 130)))
//!     .build();
//!
//! let error = user.validate_and_build(&json!({"age": "old"})).unwrap_err();
//! # let _ = error;
//! ```

mod error;
mod validators;

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::trace;

use crate::error::{Error, HttpException};

pub use error::AggregateValidationError;
pub use error::ErrorCode;
pub use error::FieldError;
pub use validators::Assert;
pub use validators::Email;
pub use validators::Length;
pub use validators::Max;
pub use validators::Min;
pub use validators::NotNull;
pub use validators::OneOf;
pub use validators::Password;
pub use validators::Pattern;
pub use validators::Range;
pub use validators::Validator;

/// The JSON type name of `value`, as used in type mismatch messages.
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Declared type of a field.
#[derive(Debug, Clone)]
pub enum FieldType {
    Any,
    String,
    /// Integral numbers only.
    Integer,
    /// Integers and floats.
    Number,
    Boolean,
    Array,
    Object,
    /// A nested object validated against its own schema.
    Model(Arc<Schema>),
    /// Any of the listed types.
    Union(Vec<FieldType>),
}

impl FieldType {
    /// Whether `value` has this type. `null` never matches, nullability is a
    /// property of the field.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Any => !value.is_null(),
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object | Self::Model(_) => value.is_object(),
            Self::Union(types) => types.iter().any(|t| t.matches(value)),
        }
    }

    pub fn name(&self) -> String {
        match self {
            Self::Any => "any".to_string(),
            Self::String => "string".to_string(),
            Self::Integer => "integer".to_string(),
            Self::Number => "number".to_string(),
            Self::Boolean => "boolean".to_string(),
            Self::Array => "array".to_string(),
            Self::Object => "object".to_string(),
            Self::Model(schema) => schema.name().to_string(),
            Self::Union(types) => types.iter().map(FieldType::name).collect::<Vec<_>>().join(" | "),
        }
    }
}

/// One declared field: name, type, nullability and validators.
pub struct Field {
    name: String,
    field_type: FieldType,
    nullable: bool,
    validators: Vec<Box<dyn Validator>>,
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("nullable", &self.nullable)
            .field("validators", &self.validators.len())
            .finish()
    }
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self { name: name.into(), field_type, nullable: false, validators: Vec::new() }
    }

    /// Accepts an explicit `null` in the type pass.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Appends a validator. Validators run in insertion order.
    pub fn validator<V: Validator + 'static>(mut self, validator: V) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    fn check_type(&self, value: &Value) -> Result<(), Vec<FieldError>> {
        if value.is_null() {
            if self.nullable {
                return Ok(());
            }
            return Err(vec![FieldError::type_mismatch(&self.name, &self.field_type.name(), "null")]);
        }

        if !self.field_type.matches(value) {
            return Err(vec![FieldError::type_mismatch(&self.name, &self.field_type.name(), value_type_name(value))]);
        }

        if let (FieldType::Model(schema), Value::Object(nested)) = (&self.field_type, value) {
            let errors = schema.collect_errors(nested);
            if !errors.is_empty() {
                return Err(errors.into_iter().map(|e| e.prefixed(&self.name)).collect());
            }
        }
        Ok(())
    }

    fn check_constraints(&self, value: &Value) -> Result<(), FieldError> {
        for validator in &self.validators {
            if value.is_null() && !validator.checks_null() {
                continue;
            }
            validator.validate(value, &self.name)?;
        }
        Ok(())
    }
}

/// A named set of declared fields.
#[derive(Debug)]
pub struct Schema {
    name: String,
    fields: Vec<Field>,
}

#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<Field>,
}

impl SchemaBuilder {
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn build(self) -> Arc<Schema> {
        Arc::new(Schema { name: self.name, fields: self.fields })
    }
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder { name: name.into(), fields: Vec::new() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Runs both passes over `data`.
    pub fn validate(&self, data: &Map<String, Value>) -> Result<(), AggregateValidationError> {
        let errors = self.collect_errors(data);
        if errors.is_empty() {
            Ok(())
        } else {
            trace!(model = %self.name, count = errors.len(), "schema validation failed");
            Err(AggregateValidationError::new(self.name.as_str(), errors))
        }
    }

    /// Validates `data` and keeps the declared fields it carries.
    ///
    /// Anything other than a JSON object is a 400.
    pub fn validate_and_build(&self, data: &Value) -> Result<ModelInstance, Error> {
        let Value::Object(object) = data else {
            return Err(HttpException::bad_request(format!(
                "Request body for '{}' must be a JSON object, got {}.",
                self.name,
                value_type_name(data)
            ))
            .into());
        };

        self.validate(object)?;

        let values = self
            .fields
            .iter()
            .filter_map(|field| object.get(&field.name).map(|value| (field.name.clone(), value.clone())))
            .collect();
        Ok(ModelInstance { model: self.name.clone(), values })
    }

    fn collect_errors(&self, data: &Map<String, Value>) -> Vec<FieldError> {
        let mut type_errors = Vec::new();
        let mut failed = vec![false; self.fields.len()];

        for (index, field) in self.fields.iter().enumerate() {
            let Some(value) = data.get(&field.name) else {
                continue;
            };
            if let Err(errors) = field.check_type(value) {
                failed[index] = true;
                type_errors.extend(errors);
            }
        }

        let mut errors = type_errors;
        for (field, failed) in self.fields.iter().zip(failed) {
            if failed {
                continue;
            }
            let value = data.get(&field.name).unwrap_or(&Value::Null);
            if let Err(error) = field.check_constraints(value) {
                errors.push(error);
            }
        }
        errors
    }
}

/// The declared fields of a validated body, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInstance {
    model: String,
    values: Vec<(String, Value)>,
}

impl ModelInstance {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.iter().find(|(name, _)| name == field).map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.values.into_iter().collect())
    }
}

/// A typed model bound from a validated body.
pub trait Model: DeserializeOwned {
    fn schema() -> Arc<Schema>;
}

/// Validates `data` against `M`'s schema, then deserializes it into `M`.
pub fn validate_and_build<M: Model>(data: &Value) -> Result<M, Error> {
    let schema = M::schema();
    let instance = schema.validate_and_build(data)?;
    serde_json::from_value(instance.into_value())
        .map_err(|e| HttpException::bad_request(format!("Request body can't be bound to '{}': {e}", schema.name())).into())
}
