use std::collections::HashMap;
use std::time::Duration;

use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

use crate::browser::discovery::{ControlCandidate, ControlSource, clean_text, filter_candidates};
use crate::schema::schema_model::RawControl;
use crate::service::error::ExtractError;

const USER_AGENT: &str = concat!("udyam-schema/", env!("CARGO_PKG_VERSION"));

/// Control discovery over the server-rendered HTML, without a browser.
///
/// Works as long as the target page renders its form server-side; anything
/// injected by client-side script is invisible here.
pub struct HtmlControlSource {
    client: Client,
    url: String,
    form_selector: String,
    timeout: Duration,
}

impl HtmlControlSource {
    pub fn new(url: &str, form_selector: &str, timeout: Duration) -> Result<Self, ExtractError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ExtractError::Http {
                url: url.to_string(),
                source: e,
            })?;

        Ok(Self {
            client,
            url: url.to_string(),
            form_selector: form_selector.to_string(),
            timeout,
        })
    }

    fn fetch(&self) -> Result<String, ExtractError> {
        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                ExtractError::Timeout {
                    url: self.url.clone(),
                    timeout_secs: self.timeout.as_secs(),
                }
            } else {
                ExtractError::Http {
                    url: self.url.clone(),
                    source: e,
                }
            }
        };

        self.client
            .get(&self.url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(map_err)
    }
}

impl ControlSource for HtmlControlSource {
    fn list_controls(&mut self) -> Result<Vec<RawControl>, ExtractError> {
        info!(url = %self.url, "fetching registration page");
        let body = self.fetch()?;
        debug!(bytes = body.len(), "page fetched");
        parse_controls(&body, &self.form_selector)
    }
}

// ============================================================================
// Document parsing
// ============================================================================

fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Failed(format!("invalid selector '{}': {:?}", css, e)))
}

/// Extract raw controls from a page's HTML. Fails when no element matches
/// `form_selector`, since that means the page is not the registration form.
pub fn parse_controls(html: &str, form_selector: &str) -> Result<Vec<RawControl>, ExtractError> {
    let document = Html::parse_document(html);

    let form = selector(form_selector)?;
    if document.select(&form).next().is_none() {
        return Err(ExtractError::Failed(format!(
            "no element matching '{}' on page",
            form_selector
        )));
    }

    let controls = selector("input, select")?;
    let labels = selector("label")?;
    let option_sel = selector("option")?;
    let labels_by_for = index_labels(&document, &labels);

    let candidates = document
        .select(&controls)
        .map(|el| {
            let attrs = el.value();
            let tag = attrs.name().to_string();
            let options = if tag == "select" {
                el.select(&option_sel).map(|o| o.text().collect::<String>()).collect()
            } else {
                Vec::new()
            };

            ControlCandidate {
                label: resolve_label(el, &labels_by_for, &labels),
                type_attr: attrs.attr("type").map(str::to_string),
                name: attrs.attr("name").map(str::to_string),
                required: attrs.attr("required").is_some(),
                tag,
                options,
            }
        })
        .collect::<Vec<_>>();

    let found = candidates.len();
    let raw = filter_candidates(candidates);
    debug!(found, kept = raw.len(), "controls parsed from html");
    Ok(raw)
}

/// `label[for]` text by target id; the first label for an id wins.
fn index_labels(document: &Html, labels: &Selector) -> HashMap<String, String> {
    let mut by_for = HashMap::new();
    for label in document.select(labels) {
        if let Some(target) = label.value().attr("for") {
            by_for
                .entry(target.to_string())
                .or_insert_with(|| clean_text(&label.text().collect::<String>()));
        }
    }
    by_for
}

/// `label[for=id]` first, then the first label inside the nearest
/// enclosing `div`.
fn resolve_label(el: ElementRef<'_>, by_for: &HashMap<String, String>, labels: &Selector) -> String {
    if let Some(text) = el
        .value()
        .id()
        .and_then(|id| by_for.get(id))
        .filter(|text| !text.is_empty())
    {
        return text.clone();
    }

    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == "div")
        .and_then(|div| div.select(labels).next())
        .map(|label| clean_text(&label.text().collect::<String>()))
        .unwrap_or_default()
}
