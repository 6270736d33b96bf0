use std::fmt;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::browser::session::BrowserConfig;

pub const DEFAULT_CONFIG_PATH: &str = "udyam-schema.yaml";
pub const DEFAULT_TARGET_URL: &str = "https://udyamregistration.gov.in/UdyamRegistration.aspx";
pub const DEFAULT_CACHE_PATH: &str = "data/udyamForm.json";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "udyam-schema",
    version,
    about = "Scrape and cache the Udyam registration form schema"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: udyam-schema.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Registration page to scrape
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Schema cache file
    #[arg(long, global = true)]
    pub cache: Option<String>,

    /// Control discovery backend
    #[arg(long, value_enum, global = true)]
    pub extractor: Option<ExtractorKind>,

    /// Page load timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the current schema as JSON
    Schema {
        /// Re-scrape even when a cached schema exists
        #[arg(long)]
        refresh: bool,

        /// Write the schema to a file instead of stdout
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Validate a submission (JSON object) against the current schema
    Validate {
        /// Path to the submission JSON file
        #[arg(long)]
        input: String,
    },

    /// Dump the raw controls found on the page, without normalizing or caching
    Controls,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    /// Headless Chromium via the Node.js form helper
    Browser,
    /// Plain HTTP fetch and HTML parse
    Static,
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `udyam-schema.yaml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_target_url")]
    pub target_url: String,

    #[serde(default = "default_cache_path")]
    pub cache_path: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_extractor")]
    pub extractor: ExtractorKind,

    #[serde(default = "default_form_selector")]
    pub form_selector: String,

    #[serde(default)]
    pub browser: BrowserSection,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            target_url: default_target_url(),
            cache_path: default_cache_path(),
            timeout_secs: default_timeout_secs(),
            extractor: default_extractor(),
            form_selector: default_form_selector(),
            browser: BrowserSection::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserSection {
    #[serde(default = "default_node")]
    pub node: String,

    #[serde(default = "default_script")]
    pub script: String,
}

impl Default for BrowserSection {
    fn default() -> Self {
        let defaults = BrowserConfig::default();
        Self {
            node: defaults.node,
            script: defaults.script,
        }
    }
}

// Serde default helpers
fn default_target_url() -> String { DEFAULT_TARGET_URL.to_string() }
fn default_cache_path() -> String { DEFAULT_CACHE_PATH.to_string() }
fn default_timeout_secs() -> u64 { 60 }
fn default_extractor() -> ExtractorKind { ExtractorKind::Browser }
fn default_form_selector() -> String { "form".to_string() }
fn default_node() -> String { BrowserConfig::default().node }
fn default_script() -> String { BrowserConfig::default().script }

// ============================================================================
// Config File Loading
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io { path: String, source: std::io::Error },
    Yaml { path: String, source: serde_yaml::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => write!(f, "Cannot read config {}: {}", path, source),
            ConfigError::Yaml { path, source } => write!(f, "Invalid config {}: {}", path, source),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Yaml { source, .. } => Some(source),
        }
    }
}

/// Load the config file.
///
/// Without an explicit path the default file is optional: missing means
/// defaults, malformed means defaults plus a warning. An explicit path must
/// exist and parse.
pub fn load_config(path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(match std::fs::read_to_string(DEFAULT_CONFIG_PATH) {
            Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
                warn!(path = DEFAULT_CONFIG_PATH, error = %e, "ignoring malformed config");
                AppConfig::default()
            }),
            Err(_) => AppConfig::default(),
        });
    };

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_string(),
        source: e,
    })?;
    serde_yaml::from_str(&content).map_err(|e| ConfigError::Yaml {
        path: path.to_string(),
        source: e,
    })
}

// ============================================================================
// Settings (CLI args merged over config file)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub target_url: String,
    pub cache_path: String,
    pub timeout: Duration,
    pub extractor: ExtractorKind,
    pub form_selector: String,
    pub browser: BrowserConfig,
}

/// CLI flags win over the config file, which wins over defaults.
pub fn resolve_settings(cli: &Cli, config: &AppConfig) -> Settings {
    Settings {
        target_url: cli.url.clone().unwrap_or_else(|| config.target_url.clone()),
        cache_path: cli.cache.clone().unwrap_or_else(|| config.cache_path.clone()),
        timeout: Duration::from_secs(cli.timeout.unwrap_or(config.timeout_secs)),
        extractor: cli.extractor.unwrap_or(config.extractor),
        form_selector: config.form_selector.clone(),
        browser: BrowserConfig {
            node: config.browser.node.clone(),
            script: config.browser.script.clone(),
        },
    }
}
