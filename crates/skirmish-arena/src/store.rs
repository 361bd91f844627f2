//! File-backed model persistence.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use skirmish_core::PersistenceError;
use skirmish_learn::{ModelMetadata, ModelStore};

#[derive(Debug, Serialize, Deserialize)]
struct ModelFile {
    metadata: ModelMetadata,
    blob: Vec<u8>,
}

/// Stores each model as one JSON document under a base directory.
///
/// Relative model paths resolve against the base directory; absolute paths are used as-is.
/// Writes go to a sibling temp file first and are renamed into place.
#[derive(Debug, Clone)]
pub struct JsonModelStore {
    base_dir: PathBuf,
}

impl JsonModelStore {
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.base_dir.join(path)
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.resolve(path).is_file()
    }
}

impl ModelStore for JsonModelStore {
    fn save_model(
        &mut self,
        path: &Path,
        blob: &[u8],
        metadata: &ModelMetadata,
    ) -> Result<(), PersistenceError> {
        let target = self.resolve(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = ModelFile {
            metadata: metadata.clone(),
            blob: blob.to_vec(),
        };
        let bytes =
            serde_json::to_vec(&file).map_err(|e| PersistenceError::Encode(e.to_string()))?;

        let mut temp = target.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);
        fs::write(&temp, bytes)?;
        fs::rename(&temp, &target)?;

        tracing::debug!(path = %target.display(), model = %metadata.model_id, "saved model");
        Ok(())
    }

    fn load_model(&self, path: &Path) -> Result<(Vec<u8>, ModelMetadata), PersistenceError> {
        let target = self.resolve(path);
        let bytes = fs::read(&target)?;
        let file: ModelFile =
            serde_json::from_slice(&bytes).map_err(|e| PersistenceError::Decode(e.to_string()))?;
        file.metadata.check_version()?;
        tracing::debug!(path = %target.display(), model = %file.metadata.model_id, "loaded model");
        Ok((file.blob, file.metadata))
    }
}
