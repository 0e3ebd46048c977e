//! Declared output shapes for structured model completions.
//!
//! A [`Schema`] is serialized into the request (`generationConfig.responseSchema`)
//! and enforced again on the response before anything is deserialized, so a
//! payload that drifts from the declaration never reaches a caller.

mod catalog;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::error::ServiceError;

pub use catalog::{
    lesson_plans_schema, recognition_schema, story_segment_schema, PLAN_ACTIVITY_COUNT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

impl SchemaKind {
    fn wire_name(self) -> &'static str {
        match self {
            SchemaKind::String => "STRING",
            SchemaKind::Integer => "INTEGER",
            SchemaKind::Number => "NUMBER",
            SchemaKind::Boolean => "BOOLEAN",
            SchemaKind::Object => "OBJECT",
            SchemaKind::Array => "ARRAY",
        }
    }

    fn describe(self) -> &'static str {
        match self {
            SchemaKind::String => "a string",
            SchemaKind::Integer => "an integer",
            SchemaKind::Number => "a number",
            SchemaKind::Boolean => "a boolean",
            SchemaKind::Object => "an object",
            SchemaKind::Array => "an array",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {reason}")]
pub struct SchemaViolation {
    pub path: String,
    pub reason: String,
}

impl SchemaViolation {
    fn new(path: &str, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    kind: SchemaKind,
    enum_values: Vec<String>,
    properties: IndexMap<String, Schema>,
    required: Vec<String>,
    items: Option<Box<Schema>>,
    minimum: Option<f64>,
    maximum: Option<f64>,
    min_items: Option<usize>,
    max_items: Option<usize>,
}

impl Schema {
    fn of(kind: SchemaKind) -> Self {
        Self {
            kind,
            enum_values: Vec::new(),
            properties: IndexMap::new(),
            required: Vec::new(),
            items: None,
            minimum: None,
            maximum: None,
            min_items: None,
            max_items: None,
        }
    }

    pub fn string() -> Self {
        Self::of(SchemaKind::String)
    }

    pub fn integer() -> Self {
        Self::of(SchemaKind::Integer)
    }

    pub fn number() -> Self {
        Self::of(SchemaKind::Number)
    }

    pub fn boolean() -> Self {
        Self::of(SchemaKind::Boolean)
    }

    pub fn object() -> Self {
        Self::of(SchemaKind::Object)
    }

    pub fn array(items: Schema) -> Self {
        let mut schema = Self::of(SchemaKind::Array);
        schema.items = Some(Box::new(items));
        schema
    }

    pub fn one_of(mut self, values: &[&str]) -> Self {
        self.enum_values = values.iter().map(|value| (*value).to_string()).collect();
        self
    }

    pub fn property(mut self, name: &str, schema: Schema) -> Self {
        self.properties.insert(name.to_string(), schema);
        self
    }

    pub fn require(mut self, names: &[&str]) -> Self {
        self.required = names.iter().map(|name| (*name).to_string()).collect();
        self
    }

    pub fn range(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    pub fn minimum(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub fn item_count(mut self, min: usize, max: usize) -> Self {
        self.min_items = Some(min);
        self.max_items = Some(max);
        self
    }

    pub fn kind(&self) -> SchemaKind {
        self.kind
    }

    /// OpenAPI-subset encoding accepted by Gemini's `responseSchema`.
    pub fn to_wire(&self) -> Value {
        let mut out = Map::new();
        out.insert("type".to_string(), json!(self.kind.wire_name()));
        if !self.enum_values.is_empty() {
            out.insert("enum".to_string(), json!(self.enum_values));
        }
        if !self.properties.is_empty() {
            let mut properties = Map::new();
            for (name, schema) in &self.properties {
                properties.insert(name.clone(), schema.to_wire());
            }
            out.insert("properties".to_string(), Value::Object(properties));
            out.insert(
                "propertyOrdering".to_string(),
                json!(self.properties.keys().collect::<Vec<_>>()),
            );
        }
        if !self.required.is_empty() {
            out.insert("required".to_string(), json!(self.required));
        }
        if let Some(items) = self.items.as_ref() {
            out.insert("items".to_string(), items.to_wire());
        }
        if let Some(minimum) = self.minimum {
            out.insert("minimum".to_string(), json!(minimum));
        }
        if let Some(maximum) = self.maximum {
            out.insert("maximum".to_string(), json!(maximum));
        }
        if let Some(min_items) = self.min_items {
            out.insert("minItems".to_string(), json!(min_items));
        }
        if let Some(max_items) = self.max_items {
            out.insert("maxItems".to_string(), json!(max_items));
        }
        Value::Object(out)
    }

    pub fn validate(&self, value: &Value) -> Result<(), SchemaViolation> {
        self.validate_at("$", value)
    }

    fn validate_at(&self, path: &str, value: &Value) -> Result<(), SchemaViolation> {
        match self.kind {
            SchemaKind::String => {
                let Some(text) = value.as_str() else {
                    return Err(self.type_mismatch(path, value));
                };
                if !self.enum_values.is_empty()
                    && !self.enum_values.iter().any(|allowed| allowed == text)
                {
                    return Err(SchemaViolation::new(
                        path,
                        format!(
                            "'{text}' is not one of [{}]",
                            self.enum_values.join(", ")
                        ),
                    ));
                }
            }
            SchemaKind::Integer => {
                let integral = value.is_i64() || value.is_u64();
                if !integral {
                    return Err(self.type_mismatch(path, value));
                }
                self.check_bounds(path, value.as_f64().unwrap_or_default())?;
            }
            SchemaKind::Number => {
                let Some(number) = value.as_f64() else {
                    return Err(self.type_mismatch(path, value));
                };
                self.check_bounds(path, number)?;
            }
            SchemaKind::Boolean => {
                if !value.is_boolean() {
                    return Err(self.type_mismatch(path, value));
                }
            }
            SchemaKind::Object => {
                let Some(object) = value.as_object() else {
                    return Err(self.type_mismatch(path, value));
                };
                for name in &self.required {
                    let present = object.get(name).map(|field| !field.is_null());
                    if present != Some(true) {
                        return Err(SchemaViolation::new(
                            path,
                            format!("missing required field '{name}'"),
                        ));
                    }
                }
                for (name, schema) in &self.properties {
                    match object.get(name) {
                        None | Some(Value::Null) => continue,
                        Some(field) => schema.validate_at(&format!("{path}.{name}"), field)?,
                    }
                }
            }
            SchemaKind::Array => {
                let Some(rows) = value.as_array() else {
                    return Err(self.type_mismatch(path, value));
                };
                if let Some(min_items) = self.min_items {
                    if rows.len() < min_items {
                        return Err(SchemaViolation::new(
                            path,
                            format!("expected at least {min_items} items, got {}", rows.len()),
                        ));
                    }
                }
                if let Some(max_items) = self.max_items {
                    if rows.len() > max_items {
                        return Err(SchemaViolation::new(
                            path,
                            format!("expected at most {max_items} items, got {}", rows.len()),
                        ));
                    }
                }
                if let Some(items) = self.items.as_ref() {
                    for (idx, row) in rows.iter().enumerate() {
                        items.validate_at(&format!("{path}[{idx}]"), row)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn check_bounds(&self, path: &str, number: f64) -> Result<(), SchemaViolation> {
        if !number.is_finite() {
            return Err(SchemaViolation::new(path, "number is not finite"));
        }
        if let Some(minimum) = self.minimum {
            if number < minimum {
                return Err(SchemaViolation::new(
                    path,
                    format!("{number} is below minimum {minimum}"),
                ));
            }
        }
        if let Some(maximum) = self.maximum {
            if number > maximum {
                return Err(SchemaViolation::new(
                    path,
                    format!("{number} is above maximum {maximum}"),
                ));
            }
        }
        Ok(())
    }

    fn type_mismatch(&self, path: &str, value: &Value) -> SchemaViolation {
        SchemaViolation::new(
            path,
            format!("expected {}, got {}", self.kind.describe(), json_type_name(value)),
        )
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(number) if number.is_f64() => "a fractional number",
        Value::Number(_) => "an integer",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Parses a model text payload, checks it against `schema`, then deserializes it.
///
/// Nothing is deserialized unless the whole payload conforms.
pub fn decode_conforming<T: DeserializeOwned>(
    text: &str,
    schema: &Schema,
) -> Result<T, ServiceError> {
    let body = strip_code_fence(text);
    if body.trim().is_empty() {
        return Err(ServiceError::EmptyResponse);
    }
    let value: Value =
        serde_json::from_str(&body).map_err(|err| ServiceError::InvalidJson(err.to_string()))?;
    schema.validate(&value)?;
    serde_json::from_value(value).map_err(|err| ServiceError::Decode(err.to_string()))
}

/// Drops a surrounding markdown fence (```json ... ```) if the model added one.
pub fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let mut body = trimmed.trim_start_matches('`').trim().to_string();
    if let Some(end) = body.rfind("```") {
        body = body[..end].trim().to_string();
    }
    if body.to_ascii_lowercase().starts_with("json") {
        body = body[4..].trim().to_string();
    }
    body
}
