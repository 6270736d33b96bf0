use crate::schema::schema_model::{Field, FieldType, RawControl, Step};

/// Label used when a control has neither a label nor a name.
pub const DEFAULT_LABEL: &str = "Field";

/// Normalize one scraped control into a canonical field.
pub fn normalize_control(raw: &RawControl) -> Field {
    let label = resolve_label(raw);
    let field_type = FieldType::from_raw(&raw.control_type);

    // Options only make sense on a select; drop whatever else leaked through.
    let options = match field_type {
        FieldType::Select => raw.options.clone(),
        _ => None,
    };

    Field {
        step: infer_step(&label),
        name: guess_name(&label, raw.name.as_deref()),
        label,
        field_type,
        required: raw.required,
        pattern: None,
        options,
    }
}

pub fn normalize_controls(raw: &[RawControl]) -> Vec<Field> {
    raw.iter().map(normalize_control).collect()
}

fn resolve_label(raw: &RawControl) -> String {
    let label = raw.label.trim();
    if !label.is_empty() {
        return label.to_string();
    }
    match raw.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => DEFAULT_LABEL.to_string(),
    }
}

/// Aadhaar and OTP controls belong to the first wizard step; everything else
/// to the second.
pub fn infer_step(label: &str) -> Step {
    let l = label.to_lowercase();
    if l.contains("aadhaar") || l.contains("aadhar") || l.contains("otp") {
        Step::One
    } else {
        Step::Two
    }
}

/// Pick the machine name for a control.
///
/// A non-blank name attribute is used verbatim (trimmed). Otherwise the
/// label is matched against known keywords, in order, and finally collapsed
/// into its first three words.
pub fn guess_name(label: &str, name_attr: Option<&str>) -> String {
    if let Some(name) = name_attr.map(str::trim).filter(|n| !n.is_empty()) {
        return name.to_string();
    }

    let cleaned = clean_label(label);
    let has = |needle: &str| cleaned.contains(needle);

    if has("aadhaar") || has("aadhar") {
        return "aadhar".into();
    }
    if has("otp") {
        return "otp".into();
    }
    if has("pan") {
        return "pan".into();
    }
    if has("business") {
        return "businessName".into();
    }
    if has("organization") || has("organisation") || has("type") {
        return "organizationType".into();
    }
    if has("owner") || has("applicant") || has("name") {
        return "ownerName".into();
    }
    if has("email") {
        return "email".into();
    }

    cleaned.split_whitespace().take(3).collect()
}

/// Lowercase, turn every run of non-alphanumerics into a single space, trim.
fn clean_label(label: &str) -> String {
    label
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
