//! JSON file progress repository
//!
//! The whole progress mapping lives in one pretty-printed JSON file. Writes
//! go to a sibling temp file first and are renamed into place, so a crash
//! mid-write leaves the previous snapshot intact.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tango_algo::{ProgressRepository, StoreResult};

#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn quarantine_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".corrupt");
        self.path.with_file_name(name)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ProgressRepository for JsonFileRepository {
    /// Missing file: empty mapping. Unparseable file (bad JSON or bad
    /// UTF-8): moved aside to `<name>.corrupt` and treated as empty.
    fn load(&self) -> StoreResult<Value> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Value::Object(Map::new()));
            }
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => Ok(value),
            Err(err) => {
                let quarantine = self.quarantine_path();
                tracing::warn!(
                    path = %self.path.display(),
                    quarantine = %quarantine.display(),
                    error = %err,
                    "progress file is corrupt, starting empty"
                );
                // an empty mapping is only safe once the original is moved aside
                fs::rename(&self.path, &quarantine)?;
                Ok(Value::Object(Map::new()))
            }
        }
    }

    fn save(&self, snapshot: &Value) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let bytes = serde_json::to_vec_pretty(snapshot)?;
        let temp = self.temp_path();
        fs::write(&temp, bytes)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}
