use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;

// ============================================================================
// Extraction errors (page extractor)
// ============================================================================

#[derive(Debug)]
pub enum ExtractError {
    /// The page or its form did not show up within the timeout
    Timeout { url: String, timeout_secs: u64 },

    /// Navigation, network or browser-automation failure
    Failed(String),

    /// Node.js helper failed to spawn
    SubprocessSpawn { script: String, source: std::io::Error },

    /// Node.js helper exited before answering
    SubprocessExited { script: String, status: Option<ExitStatus> },

    /// Node.js helper is alive but did not answer in time
    NoReply { script: String, waited_secs: u64 },

    /// Broken NDJSON exchange with the browser helper
    Session(String),

    /// HTTP fetch failed (static extractor)
    Http { url: String, source: reqwest::Error },

    /// JSON parsing failed (helper output)
    JsonParse { context: String, source: serde_json::Error },

    /// JSON serialization failed (request to the helper)
    JsonSerialize { context: String, source: serde_json::Error },
}

impl ExtractError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ExtractError::Timeout { .. })
    }
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::Timeout { url, timeout_secs } => {
                write!(f, "Form on {} did not load within {}s", url, timeout_secs)
            }
            ExtractError::Failed(msg) => {
                write!(f, "Extraction failed: {}", msg)
            }
            ExtractError::SubprocessSpawn { script, source } => {
                write!(f, "Failed to spawn {} (is Node.js installed?): {}", script, source)
            }
            ExtractError::SubprocessExited { script, status } => match status {
                Some(status) => write!(f, "{} exited with {}", script, status),
                None => write!(f, "{} exited", script),
            },
            ExtractError::NoReply { script, waited_secs } => {
                write!(f, "{} sent no reply within {}s", script, waited_secs)
            }
            ExtractError::Session(msg) => {
                write!(f, "Browser session error: {}", msg)
            }
            ExtractError::Http { url, source } => {
                write!(f, "HTTP request to {} failed: {}", url, source)
            }
            ExtractError::JsonParse { context, source } => {
                write!(f, "JSON parse error ({}): {}", context, source)
            }
            ExtractError::JsonSerialize { context, source } => {
                write!(f, "JSON serialize error ({}): {}", context, source)
            }
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtractError::SubprocessSpawn { source, .. } => Some(source),
            ExtractError::Http { source, .. } => Some(source),
            ExtractError::JsonParse { source, .. } => Some(source),
            ExtractError::JsonSerialize { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ============================================================================
// Cache errors
// ============================================================================

#[derive(Debug)]
pub enum CacheError {
    Io { path: PathBuf, source: std::io::Error },
    Serialize(serde_json::Error),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Io { path, source } => {
                write!(f, "Cache I/O error at {}: {}", path.display(), source)
            }
            CacheError::Serialize(source) => {
                write!(f, "Failed to serialize schema for cache: {}", source)
            }
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Io { source, .. } => Some(source),
            CacheError::Serialize(source) => Some(source),
        }
    }
}

// ============================================================================
// Pipeline and service errors
// ============================================================================

/// Why a fresh schema could not be produced and stored.
#[derive(Debug)]
pub enum PipelineError {
    Extract(ExtractError),
    Cache(CacheError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Extract(e) => write!(f, "{}", e),
            PipelineError::Cache(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Extract(e) => Some(e),
            PipelineError::Cache(e) => Some(e),
        }
    }
}

impl From<ExtractError> for PipelineError {
    fn from(e: ExtractError) -> Self {
        PipelineError::Extract(e)
    }
}

impl From<CacheError> for PipelineError {
    fn from(e: CacheError) -> Self {
        PipelineError::Cache(e)
    }
}

/// The only error callers of the schema service ever see.
#[derive(Debug)]
pub enum SchemaError {
    /// Extraction failed and there is no usable cached schema
    SchemaUnavailable { cause: PipelineError },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::SchemaUnavailable { cause } => {
                write!(f, "Schema unavailable (no cached copy): {}", cause)
            }
        }
    }
}

impl std::error::Error for SchemaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SchemaError::SchemaUnavailable { cause } => Some(cause),
        }
    }
}
