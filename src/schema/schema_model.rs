use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Raw controls (as scraped, before normalization)
// ============================================================================

/// One form control as discovered on the registration page.
///
/// No uniqueness guarantee: the same logical field may show up several times
/// or under inconsistent names across page revisions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawControl {
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub control_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

// ============================================================================
// Canonical field model
// ============================================================================

/// The fixed set of input types the form client knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Email,
    Number,
    Select,
    Password,
    Tel,
    Hidden,
}

impl FieldType {
    /// Parse a source type string; anything unrecognized becomes `Text`.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "email" => FieldType::Email,
            "number" => FieldType::Number,
            "select" => FieldType::Select,
            "password" => FieldType::Password,
            "tel" => FieldType::Tel,
            "hidden" => FieldType::Hidden,
            _ => FieldType::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Email => "email",
            FieldType::Number => "number",
            FieldType::Select => "select",
            FieldType::Password => "password",
            FieldType::Tel => "tel",
            FieldType::Hidden => "hidden",
        }
    }
}

/// Which stage of the two-step registration wizard a field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    One,
    Two,
}

impl Step {
    pub fn number(&self) -> u8 {
        match self {
            Step::One => 1,
            Step::Two => 2,
        }
    }
}

/// A normalized field while the schema is being built. The `step`
/// discriminant is dropped when the field lands in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub step: Step,
    pub label: String,
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
    pub pattern: Option<String>,
    pub options: Option<Vec<String>>,
}

impl Field {
    pub fn into_schema_field(self) -> SchemaField {
        SchemaField {
            label: self.label,
            name: self.name,
            field_type: self.field_type,
            required: self.required,
            pattern: self.pattern,
            options: self.options,
        }
    }
}

/// A field as delivered to the form client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub label: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

// ============================================================================
// Schema (the cached data product)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaSource {
    Scraped,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub step1: Vec<SchemaField>,
    pub step2: Vec<SchemaField>,
    #[serde(with = "iso8601")]
    pub generated_at: DateTime<Utc>,
    pub source: SchemaSource,
}

impl Schema {
    /// All fields in wizard order (step 1 first).
    pub fn fields(&self) -> impl Iterator<Item = &SchemaField> {
        self.step1.iter().chain(self.step2.iter())
    }

    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields().find(|f| f.name == name)
    }

    pub fn with_source(mut self, source: SchemaSource) -> Self {
        self.source = source;
        self
    }

    /// Hash of the field lists only, so two builds of an unchanged page
    /// share a fingerprint regardless of timestamp or provenance.
    pub fn fingerprint(&self) -> String {
        use sha1::{Digest, Sha1};

        let mut hasher = Sha1::new();
        for (step, fields) in [(1u8, &self.step1), (2u8, &self.step2)] {
            for field in fields {
                hasher.update([step]);
                // SchemaField serialization cannot fail: plain strings and bools only.
                if let Ok(bytes) = serde_json::to_vec(field) {
                    hasher.update(&bytes);
                }
            }
        }
        format!("{:x}", hasher.finalize())
    }
}

/// `generatedAt` is written as RFC 3339 with millisecond precision and a `Z`
/// suffix, and read back from any RFC 3339 timestamp.
mod iso8601 {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
