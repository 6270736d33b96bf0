use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::schema::schema_model::Schema;
use crate::service::error::CacheError;

/// Single-file JSON store holding the most recent schema.
#[derive(Debug, Clone)]
pub struct SchemaCache {
    path: PathBuf,
}

impl SchemaCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the last stored schema, or `None` when nothing usable is on disk.
    ///
    /// A missing file is the normal cold-start case. An unreadable or corrupt
    /// file is logged and also reported as absent, so it never blocks a fresh
    /// extraction.
    pub fn read(&self) -> Option<Schema> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no cached schema");
                return None;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cached schema unreadable, ignoring");
                return None;
            }
        };

        match serde_json::from_str::<Schema>(&content) {
            Ok(schema) => Some(schema),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cached schema is corrupt, ignoring");
                None
            }
        }
    }

    /// Replace the stored schema. Written to a uniquely named sibling temp
    /// file first and renamed over the old copy, so readers see either the
    /// old or the new schema, never half of one.
    pub fn write(&self, schema: &Schema) -> Result<(), CacheError> {
        let dir = match self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            Some(dir) => {
                fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
                dir
            }
            None => Path::new("."),
        };

        let json = serde_json::to_string_pretty(schema).map_err(CacheError::Serialize)?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| io_error(dir, e))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| io_error(tmp.path(), e))?;
        // On failure the temp file is dropped, which removes it.
        tmp.persist(&self.path)
            .map_err(|e| io_error(&self.path, e.error))?;

        debug!(path = %self.path.display(), "schema cached");
        Ok(())
    }
}

fn io_error(path: &Path, source: std::io::Error) -> CacheError {
    CacheError::Io {
        path: path.to_path_buf(),
        source,
    }
}
