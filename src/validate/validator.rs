use std::fmt;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::schema::schema_model::{FieldType, Schema, SchemaField};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationKind {
    /// Required field absent, null or blank
    Missing,
    /// Value does not fully match the field's pattern
    PatternMismatch { pattern: String },
    /// Select value outside the offered options
    NotAnOption,
    /// The schema's own pattern is not a valid regular expression
    InvalidPattern { pattern: String, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub name: String,
    #[serde(flatten)]
    pub kind: ViolationKind,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ViolationKind::Missing => write!(f, "{}: required", self.name),
            ViolationKind::PatternMismatch { pattern } => {
                write!(f, "{}: does not match {}", self.name, pattern)
            }
            ViolationKind::NotAnOption => write!(f, "{}: not one of the allowed options", self.name),
            ViolationKind::InvalidPattern { pattern, error } => {
                write!(f, "{}: schema pattern {} is invalid: {}", self.name, pattern, error)
            }
        }
    }
}

/// Check a submitted form against the schema. Violations come back in
/// schema order; an empty list means the submission is acceptable.
pub fn validate_submission(schema: &Schema, values: &Map<String, Value>) -> Vec<FieldViolation> {
    schema
        .fields()
        .filter_map(|field| check_field(field, values.get(&field.name)))
        .collect()
}

fn check_field(field: &SchemaField, value: Option<&Value>) -> Option<FieldViolation> {
    let violation = |kind| {
        Some(FieldViolation {
            name: field.name.clone(),
            kind,
        })
    };

    let text = value.and_then(value_text).unwrap_or_default();
    let text = text.trim();
    if text.is_empty() {
        return if field.required { violation(ViolationKind::Missing) } else { None };
    }

    if let Some(pattern) = &field.pattern {
        match full_match(pattern) {
            Ok(re) if !re.is_match(text) => {
                return violation(ViolationKind::PatternMismatch {
                    pattern: pattern.clone(),
                });
            }
            Ok(_) => {}
            Err(e) => {
                return violation(ViolationKind::InvalidPattern {
                    pattern: pattern.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    if field.field_type == FieldType::Select {
        if let Some(options) = field.options.as_ref().filter(|o| !o.is_empty()) {
            if !options.iter().any(|o| o == text) {
                return violation(ViolationKind::NotAnOption);
            }
        }
    }

    None
}

/// Patterns are applied to the whole value, as an HTML `pattern` attribute is.
fn full_match(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})$", pattern))
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
