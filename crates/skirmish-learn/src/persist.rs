//! Model persistence boundary: an opaque blob plus a key/value metadata map.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skirmish_core::PersistenceError;
use uuid::Uuid;

pub const MODEL_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_id: Uuid,
    /// Estimator kind, e.g. `linear_q`.
    pub kind: String,
    pub format_version: u32,
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

impl ModelMetadata {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            model_id: Uuid::new_v4(),
            kind: kind.into(),
            format_version: MODEL_FORMAT_VERSION,
            saved_at: Utc::now(),
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.values.insert(key.into(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Reject metadata written by an incompatible format version.
    pub fn check_version(&self) -> Result<(), PersistenceError> {
        if self.format_version != MODEL_FORMAT_VERSION {
            return Err(PersistenceError::Version {
                expected: MODEL_FORMAT_VERSION,
                found: self.format_version,
            });
        }
        Ok(())
    }
}

/// Persistence collaborator. Calls happen outside the frame loop; failures are returned to the
/// caller, which logs them.
pub trait ModelStore {
    fn save_model(
        &mut self,
        path: &Path,
        blob: &[u8],
        metadata: &ModelMetadata,
    ) -> Result<(), PersistenceError>;

    fn load_model(&self, path: &Path) -> Result<(Vec<u8>, ModelMetadata), PersistenceError>;
}

/// In-memory store keyed by path.
#[derive(Debug, Default, Clone)]
pub struct MemoryModelStore {
    entries: BTreeMap<PathBuf, (Vec<u8>, ModelMetadata)>,
}

impl MemoryModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overwrite the stored blob for `path`, keeping its metadata.
    pub fn corrupt(&mut self, path: &Path, blob: Vec<u8>) {
        if let Some(entry) = self.entries.get_mut(path) {
            entry.0 = blob;
        }
    }
}

impl ModelStore for MemoryModelStore {
    fn save_model(
        &mut self,
        path: &Path,
        blob: &[u8],
        metadata: &ModelMetadata,
    ) -> Result<(), PersistenceError> {
        self.entries
            .insert(path.to_path_buf(), (blob.to_vec(), metadata.clone()));
        Ok(())
    }

    fn load_model(&self, path: &Path) -> Result<(Vec<u8>, ModelMetadata), PersistenceError> {
        self.entries.get(path).cloned().ok_or_else(|| {
            PersistenceError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no model at {}", path.display()),
            ))
        })
    }
}
