use tracing::debug;

use crate::schema::schema_model::{Field, FieldType, Step};

/// An authoritative field definition that every schema must carry,
/// whatever the scrape found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CriticalField {
    pub step: Step,
    pub label: &'static str,
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
    pub pattern: Option<&'static str>,
}

pub const AADHAAR_PATTERN: &str = "^[0-9]{12}$";
pub const OTP_PATTERN: &str = "^[0-9]{6}$";
pub const PAN_PATTERN: &str = "^[A-Za-z]{5}[0-9]{4}[A-Za-z]{1}$";
pub const PINCODE_PATTERN: &str = "^[0-9]{6}$";
pub const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

const fn critical(
    step: Step,
    label: &'static str,
    name: &'static str,
    field_type: FieldType,
    required: bool,
    pattern: Option<&'static str>,
) -> CriticalField {
    CriticalField { step, label, name, field_type, required, pattern }
}

/// Injection order matters: it fixes where appended fields land.
pub const CRITICAL_FIELDS: &[CriticalField] = &[
    critical(Step::One, "Aadhaar Number", "aadhar", FieldType::Text, true, Some(AADHAAR_PATTERN)),
    critical(Step::One, "OTP", "otp", FieldType::Text, false, Some(OTP_PATTERN)),
    critical(Step::Two, "PAN Number", "pan", FieldType::Text, true, Some(PAN_PATTERN)),
    critical(Step::Two, "PIN Code", "pincode", FieldType::Text, true, Some(PINCODE_PATTERN)),
    critical(Step::Two, "City", "city", FieldType::Text, true, None),
    critical(Step::Two, "State", "state", FieldType::Text, true, None),
    critical(Step::One, "Business Name", "businessName", FieldType::Text, true, None),
    critical(Step::Two, "Owner Name", "ownerName", FieldType::Text, true, None),
    critical(Step::Two, "Email", "email", FieldType::Email, true, Some(EMAIL_PATTERN)),
    critical(Step::One, "Type of Organization", "organizationType", FieldType::Text, true, None),
];

/// Exact-name lookup into the critical table.
pub fn find_critical(name: &str) -> Option<&'static CriticalField> {
    CRITICAL_FIELDS.iter().find(|c| c.name == name)
}

impl CriticalField {
    pub fn to_field(&self) -> Field {
        Field {
            step: self.step,
            label: self.label.to_string(),
            name: self.name.to_string(),
            field_type: self.field_type,
            required: self.required,
            pattern: self.pattern.map(str::to_string),
            options: None,
        }
    }

    /// Shallow merge onto an existing record: every attribute the definition
    /// carries wins. A missing pattern leaves the scraped one in place.
    fn apply_to(&self, existing: &mut Field) {
        existing.step = self.step;
        existing.label = self.label.to_string();
        existing.name = self.name.to_string();
        existing.field_type = self.field_type;
        existing.required = self.required;
        if let Some(pattern) = self.pattern {
            existing.pattern = Some(pattern.to_string());
        }
        if existing.field_type != FieldType::Select {
            existing.options = None;
        }
    }
}

/// Upsert every critical field by exact name: overwrite the matching record
/// in place, or append when none matches.
pub fn inject_critical_fields(fields: &mut Vec<Field>) {
    for def in CRITICAL_FIELDS {
        match fields.iter_mut().find(|f| f.name == def.name) {
            Some(existing) => {
                debug!(name = def.name, "overriding scraped field with critical definition");
                def.apply_to(existing);
            }
            None => {
                debug!(name = def.name, "appending missing critical field");
                fields.push(def.to_field());
            }
        }
    }
}
