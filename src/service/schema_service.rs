use std::sync::Mutex;

use chrono::{SubsecRound, Utc};
use tracing::{info, warn};

use crate::browser::discovery::ControlSource;
use crate::cache::store::SchemaCache;
use crate::schema::assembler::build_schema;
use crate::schema::schema_model::{Schema, SchemaSource};
use crate::service::error::{PipelineError, SchemaError};

/// Outcome of one schema request, before it is flattened into a `Result`.
#[derive(Debug)]
pub enum Acquisition {
    /// Served from cache without touching the page
    Cached(Schema),
    /// Freshly extracted and written to cache
    Scraped(Schema),
    /// Extraction failed; the cached copy is served instead
    Fallback { schema: Schema, cause: PipelineError },
    /// Extraction failed and nothing usable is cached
    Unavailable(PipelineError),
}

impl Acquisition {
    pub fn into_result(self) -> Result<Schema, SchemaError> {
        match self {
            Acquisition::Cached(schema)
            | Acquisition::Scraped(schema)
            | Acquisition::Fallback { schema, .. } => Ok(schema),
            Acquisition::Unavailable(cause) => Err(SchemaError::SchemaUnavailable { cause }),
        }
    }

    pub fn schema(&self) -> Option<&Schema> {
        match self {
            Acquisition::Cached(schema)
            | Acquisition::Scraped(schema)
            | Acquisition::Fallback { schema, .. } => Some(schema),
            Acquisition::Unavailable(_) => None,
        }
    }
}

/// Answers "give me the current schema", extracting and caching on demand
/// and falling back to the cached copy when extraction fails.
pub struct SchemaService<S: ControlSource> {
    // Held for the whole extract-and-store run so concurrent refreshes queue
    // instead of interleaving cache writes.
    source: Mutex<S>,
    cache: SchemaCache,
}

impl<S: ControlSource> SchemaService<S> {
    pub fn new(source: S, cache: SchemaCache) -> Self {
        Self {
            source: Mutex::new(source),
            cache,
        }
    }

    pub fn cache(&self) -> &SchemaCache {
        &self.cache
    }

    /// The current schema. Only fails when extraction failed and no cached
    /// copy exists.
    pub fn get_schema(&self, force_refresh: bool) -> Result<Schema, SchemaError> {
        self.acquire(force_refresh).into_result()
    }

    /// Like [`get_schema`](Self::get_schema) but reports which path produced
    /// the schema.
    pub fn acquire(&self, force_refresh: bool) -> Acquisition {
        if !force_refresh {
            if let Some(schema) = self.cache.read() {
                info!(generated_at = %schema.generated_at, "serving cached schema");
                return Acquisition::Cached(schema);
            }
        }

        match self.refresh() {
            Ok(schema) => Acquisition::Scraped(schema),
            Err(cause) => match self.cache.read() {
                Some(cached) => {
                    warn!(error = %cause, "extraction failed, serving cached schema");
                    Acquisition::Fallback {
                        schema: cached.with_source(SchemaSource::Fallback),
                        cause,
                    }
                }
                None => {
                    warn!(error = %cause, "extraction failed and no cached schema exists");
                    Acquisition::Unavailable(cause)
                }
            },
        }
    }

    /// Run the full pipeline and replace the cached copy.
    fn refresh(&self) -> Result<Schema, PipelineError> {
        let mut source = self.source.lock().unwrap_or_else(|e| e.into_inner());

        let controls = source.list_controls()?;
        // Millisecond precision is all the cache format keeps.
        let schema = build_schema(&controls, Utc::now().trunc_subsecs(3));
        self.cache.write(&schema)?;

        info!(fingerprint = %schema.fingerprint(), "schema refreshed");
        Ok(schema)
    }
}
