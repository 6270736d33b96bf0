use std::collections::HashMap;

use tracing::debug;

use crate::schema::critical::find_critical;
use crate::schema::schema_model::Field;

/// Field names that never reach the client (OTP verification is not part of
/// this flow).
pub const DROPPED_FIELDS: &[&str] = &["otp"];

/// Comparison key for field names: trimmed, lowercased.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Collapse fields that share a name (case and surrounding whitespace
/// ignored) and remove the dropped names.
///
/// The first occurrence keeps its position and normally its content. The one
/// exception: when a later duplicate carries an exact critical name and the
/// kept record does not, the critical definition replaces the kept content,
/// so authoritative fields always beat scraped lookalikes.
pub fn dedup_fields(fields: Vec<Field>) -> Vec<Field> {
    let mut kept: Vec<Field> = Vec::with_capacity(fields.len());
    let mut seen: HashMap<String, usize> = HashMap::new();

    for field in fields {
        let key = name_key(&field.name);
        if key.is_empty() {
            debug!(label = %field.label, "dropping field without a usable name");
            continue;
        }
        if DROPPED_FIELDS.contains(&key.as_str()) {
            continue;
        }

        match seen.get(&key) {
            Some(&idx) => {
                let current_is_critical = find_critical(&kept[idx].name).is_some();
                if !current_is_critical && find_critical(&field.name).is_some() {
                    debug!(name = %field.name, replaced = %kept[idx].name, "critical field replaces scraped duplicate");
                    kept[idx] = field;
                } else {
                    debug!(name = %field.name, "dropping duplicate field");
                }
            }
            None => {
                seen.insert(key, kept.len());
                kept.push(field);
            }
        }
    }

    kept
}
