use tracing::info;

use crate::browser::discovery::ControlSource;
use crate::browser::html::HtmlControlSource;
use crate::browser::session::BrowserControlSource;
use crate::cache::store::SchemaCache;
use crate::cli::config::{ExtractorKind, Settings};
use crate::service::schema_service::{Acquisition, SchemaService};
use crate::validate::validator::validate_submission;

pub type DynSource = Box<dyn ControlSource + Send>;

// ============================================================================
// schema subcommand
// ============================================================================

pub fn cmd_schema(
    settings: &Settings,
    refresh: bool,
    out: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = build_service(settings)?;
    let acquisition = service.acquire(refresh);
    log_acquisition(&acquisition);
    let schema = acquisition.into_result()?;

    let json = serde_json::to_string_pretty(&schema)?;
    match out {
        Some(path) => {
            std::fs::write(path, &json)?;
            info!(path, "schema written");
        }
        None => println!("{}", json),
    }
    Ok(())
}

// ============================================================================
// validate subcommand
// ============================================================================

/// Validate a submission file and return whether it passed.
pub fn cmd_validate(settings: &Settings, input: &str) -> Result<bool, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(input)?;
    let submission: serde_json::Value = serde_json::from_str(&content)?;
    let values = submission
        .as_object()
        .ok_or("submission must be a JSON object")?;

    let service = build_service(settings)?;
    let schema = service.get_schema(false)?;
    let violations = validate_submission(&schema, values);

    if violations.is_empty() {
        println!("Submission is valid ({} fields checked)", schema.fields().count());
        return Ok(true);
    }

    println!("{} problem(s):", violations.len());
    for violation in &violations {
        println!("  - {}", violation);
    }
    Ok(false)
}

// ============================================================================
// controls subcommand
// ============================================================================

pub fn cmd_controls(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let mut source = build_source(settings)?;
    let controls = source.list_controls()?;
    println!("{}", serde_json::to_string_pretty(&controls)?);
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Build the configured control discovery backend.
pub fn build_source(settings: &Settings) -> Result<DynSource, Box<dyn std::error::Error>> {
    match settings.extractor {
        ExtractorKind::Browser => Ok(Box::new(BrowserControlSource::new(
            settings.browser.clone(),
            &settings.target_url,
            &settings.form_selector,
            settings.timeout,
        ))),
        ExtractorKind::Static => Ok(Box::new(HtmlControlSource::new(
            &settings.target_url,
            &settings.form_selector,
            settings.timeout,
        )?)),
    }
}

pub fn build_service(settings: &Settings) -> Result<SchemaService<DynSource>, Box<dyn std::error::Error>> {
    let source = build_source(settings)?;
    Ok(SchemaService::new(source, SchemaCache::new(&settings.cache_path)))
}

fn log_acquisition(acquisition: &Acquisition) {
    match acquisition {
        Acquisition::Cached(_) => info!("schema source: cache"),
        Acquisition::Scraped(_) => info!("schema source: live page"),
        Acquisition::Fallback { cause, .. } => info!(error = %cause, "schema source: cache fallback"),
        Acquisition::Unavailable(_) => {}
    }
}
