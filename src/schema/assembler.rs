use chrono::{DateTime, Utc};
use tracing::info;

use crate::schema::critical::inject_critical_fields;
use crate::schema::dedup::dedup_fields;
use crate::schema::normalize::normalize_controls;
use crate::schema::schema_model::{Field, RawControl, Schema, SchemaSource, Step};

/// Split deduplicated fields into the two wizard steps, keeping relative
/// order, and stamp the result as freshly scraped.
pub fn assemble(fields: Vec<Field>, generated_at: DateTime<Utc>) -> Schema {
    let mut step1 = Vec::new();
    let mut step2 = Vec::new();

    for field in fields {
        match field.step {
            Step::One => step1.push(field.into_schema_field()),
            Step::Two => step2.push(field.into_schema_field()),
        }
    }

    Schema {
        step1,
        step2,
        generated_at,
        source: SchemaSource::Scraped,
    }
}

/// Full build from scraped controls: normalize, inject, dedup, assemble.
pub fn build_schema(controls: &[RawControl], generated_at: DateTime<Utc>) -> Schema {
    let mut fields = normalize_controls(controls);
    inject_critical_fields(&mut fields);

    let before = fields.len();
    let fields = dedup_fields(fields);

    let schema = assemble(fields, generated_at);
    info!(
        controls = controls.len(),
        dropped = before - schema.step1.len() - schema.step2.len(),
        step1 = schema.step1.len(),
        step2 = schema.step2.len(),
        "assembled schema"
    );
    schema
}
