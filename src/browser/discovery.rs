use serde::Deserialize;

use crate::schema::schema_model::RawControl;
use crate::service::error::ExtractError;

// ============================================================================
// ControlSource trait: pluggable control discovery
// ============================================================================

/// Lists the form controls of the registration page. Whether that means a
/// headless browser or a static HTML parse is up to the implementation.
pub trait ControlSource {
    fn list_controls(&mut self) -> Result<Vec<RawControl>, ExtractError>;
}

impl<T: ControlSource + ?Sized> ControlSource for Box<T> {
    fn list_controls(&mut self) -> Result<Vec<RawControl>, ExtractError> {
        (**self).list_controls()
    }
}

// ============================================================================
// Control candidates (DOM facts, before filtering)
// ============================================================================

/// Input types that are never user-facing fields.
pub const EXCLUDED_INPUT_TYPES: &[&str] = &["hidden", "button", "submit"];

/// Name fragments of framework plumbing and irrelevant controls on the page.
pub const EXCLUDED_NAME_MARKERS: &[&str] = &["contentplaceholder", "btnvalidateaadhaar"];

/// Prefix of server-generated control names.
pub const GENERATED_NAME_PREFIX: &str = "ctl";

/// What a discovery backend reads off one `input`/`select` element.
/// The label has already been resolved against the DOM.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ControlCandidate {
    pub tag: String,
    #[serde(rename = "type", default)]
    pub type_attr: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
}

/// True when the control should not appear in the scraped output at all.
pub fn is_excluded(type_attr: Option<&str>, name_attr: Option<&str>) -> bool {
    let type_attr = type_attr.unwrap_or("").trim().to_lowercase();
    if EXCLUDED_INPUT_TYPES.contains(&type_attr.as_str()) {
        return true;
    }

    let name = name_attr.unwrap_or("").to_lowercase();
    EXCLUDED_NAME_MARKERS.iter().any(|m| name.contains(m)) || name.starts_with(GENERATED_NAME_PREFIX)
}

/// Collapse inner whitespace of label text pulled out of the DOM.
pub fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl ControlCandidate {
    /// Apply the exclusion rules and build the raw control. Controls with
    /// neither a label nor a name are dropped.
    pub fn into_raw_control(self) -> Option<RawControl> {
        if is_excluded(self.type_attr.as_deref(), self.name.as_deref()) {
            return None;
        }

        let is_select = self.tag.eq_ignore_ascii_case("select");
        let label = clean_text(&self.label);
        let name = self.name.filter(|n| !n.is_empty());

        if label.is_empty() && name.is_none() {
            return None;
        }

        let control_type = if is_select {
            "select".to_string()
        } else {
            self.type_attr
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| "text".to_string())
        };

        let options = is_select.then(|| {
            self.options
                .iter()
                .map(|o| clean_text(o))
                .filter(|o| !o.is_empty())
                .collect()
        });

        Some(RawControl {
            label,
            name,
            control_type,
            required: self.required,
            options,
        })
    }
}

pub fn filter_candidates(candidates: Vec<ControlCandidate>) -> Vec<RawControl> {
    candidates
        .into_iter()
        .filter_map(ControlCandidate::into_raw_control)
        .collect()
}
