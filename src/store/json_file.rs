//! JSON file store
//!
//! One directory per storage key: `state.json` holds the versioned plan
//! state, `units/<digest>.json` one record per work unit. Writes go through
//! a temp file and rename so readers never see a torn document. The CAS on
//! the state document is guarded by a process-level mutex; cross-process
//! writers are out of scope for a local store.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

use super::store::{AnalysisStore, StoreError, VersionedState};
use crate::model::{PlanState, UnitRecord};

pub struct JsonFileStore {
    root: PathBuf,
    cas_guard: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cas_guard: Mutex::new(()),
        }
    }

    fn key_dir(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn state_path(&self, key: &str) -> PathBuf {
        self.key_dir(key).join("state.json")
    }

    fn unit_path(&self, key: &str, directory: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(directory.as_bytes());
        let digest = hex::encode(&hasher.finalize()[..8]);
        self.key_dir(key).join("units").join(format!("{}.json", digest))
    }

    fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
        let parent = path.parent().ok_or_else(|| {
            StoreError::Io(format!("Path has no parent: {}", path.display()))
        })?;
        fs::create_dir_all(parent)?;

        let tmp = parent.join(format!(
            ".{}.{}.tmp",
            path.file_name().and_then(|n| n.to_str()).unwrap_or("record"),
            uuid::Uuid::new_v4().simple()
        ));

        let content = serde_json::to_string_pretty(value)?;
        fs::write(&tmp, content)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

#[async_trait]
impl AnalysisStore for JsonFileStore {
    async fn read_state(&self, key: &str) -> Result<Option<VersionedState>, StoreError> {
        Self::read_json(&self.state_path(key))
    }

    async fn write_state(
        &self,
        key: &str,
        state: &PlanState,
        expected: Option<u64>,
    ) -> Result<u64, StoreError> {
        let _guard = self.cas_guard.lock().await;

        let path = self.state_path(key);
        let current: Option<VersionedState> = Self::read_json(&path)?;
        let current_version = current.map(|v| v.version);

        if current_version != expected {
            return Err(StoreError::VersionConflict {
                key: key.to_string(),
                expected,
                actual: current_version,
            });
        }

        let version = current_version.map_or(1, |v| v + 1);
        Self::write_json(
            &path,
            &VersionedState {
                version,
                state: state.clone(),
            },
        )?;

        debug!(key, version, "Wrote plan state");
        Ok(version)
    }

    async fn read_unit(
        &self,
        key: &str,
        directory: &str,
    ) -> Result<Option<UnitRecord>, StoreError> {
        Self::read_json(&self.unit_path(key, directory))
    }

    async fn write_unit(&self, key: &str, record: &UnitRecord) -> Result<(), StoreError> {
        Self::write_json(&self.unit_path(key, &record.directory), record)?;
        debug!(key, directory = %record.directory, "Wrote unit record");
        Ok(())
    }

    async fn list_units(&self, key: &str) -> Result<Vec<UnitRecord>, StoreError> {
        let units_dir = self.key_dir(key).join("units");

        let entries = match fs::read_dir(&units_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(record) = Self::read_json::<UnitRecord>(&path)? {
                records.push(record);
            }
        }

        records.sort_by(|a, b| a.directory.cmp(&b.directory));
        Ok(records)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let dir = self.key_dir(key);
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for JsonFileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileStore")
            .field("root", &self.root)
            .finish()
    }
}
