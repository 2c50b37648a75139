//! In-memory store, primarily a test double

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use super::store::{AnalysisStore, StoreError, VersionedState};
use crate::model::{PlanState, UnitRecord};

#[derive(Default)]
pub struct MemoryStore {
    states: RwLock<HashMap<String, VersionedState>>,
    units: RwLock<HashMap<String, BTreeMap<String, UnitRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AnalysisStore for MemoryStore {
    async fn read_state(&self, key: &str) -> Result<Option<VersionedState>, StoreError> {
        Ok(self.states.read().unwrap().get(key).cloned())
    }

    async fn write_state(
        &self,
        key: &str,
        state: &PlanState,
        expected: Option<u64>,
    ) -> Result<u64, StoreError> {
        let mut states = self.states.write().unwrap();
        let current = states.get(key).map(|v| v.version);

        if current != expected {
            return Err(StoreError::VersionConflict {
                key: key.to_string(),
                expected,
                actual: current,
            });
        }

        let version = current.map_or(1, |v| v + 1);
        states.insert(
            key.to_string(),
            VersionedState {
                version,
                state: state.clone(),
            },
        );
        Ok(version)
    }

    async fn read_unit(
        &self,
        key: &str,
        directory: &str,
    ) -> Result<Option<UnitRecord>, StoreError> {
        Ok(self
            .units
            .read()
            .unwrap()
            .get(key)
            .and_then(|m| m.get(directory))
            .cloned())
    }

    async fn write_unit(&self, key: &str, record: &UnitRecord) -> Result<(), StoreError> {
        self.units
            .write()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .insert(record.directory.clone(), record.clone());
        Ok(())
    }

    async fn list_units(&self, key: &str) -> Result<Vec<UnitRecord>, StoreError> {
        Ok(self
            .units
            .read()
            .unwrap()
            .get(key)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.states.write().unwrap().remove(key);
        self.units.write().unwrap().remove(key);
        Ok(())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("states", &self.states.read().unwrap().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RepoCoords, TechnologyProfile};

    fn sample_state() -> PlanState {
        PlanState::new(
            RepoCoords::new("acme/widget"),
            TechnologyProfile::unknown(),
            vec![],
            vec![],
            vec![],
        )
    }

    #[tokio::test]
    async fn test_create_then_update() {
        let store = MemoryStore::new();
        let state = sample_state();

        let v1 = store.write_state("k", &state, None).await.unwrap();
        assert_eq!(v1, 1);

        let v2 = store.write_state("k", &state, Some(v1)).await.unwrap();
        assert_eq!(v2, 2);

        let read = store.read_state("k").await.unwrap().unwrap();
        assert_eq!(read.version, 2);
    }

    #[tokio::test]
    async fn test_create_conflicts_with_existing() {
        let store = MemoryStore::new();
        let state = sample_state();

        store.write_state("k", &state, None).await.unwrap();
        let result = store.write_state("k", &state, None).await;

        assert!(matches!(result, Err(StoreError::VersionConflict { .. })));
    }

    #[tokio::test]
    async fn test_stale_version_conflicts() {
        let store = MemoryStore::new();
        let state = sample_state();

        let v1 = store.write_state("k", &state, None).await.unwrap();
        store.write_state("k", &state, Some(v1)).await.unwrap();

        // A writer still holding v1 must lose
        let result = store.write_state("k", &state, Some(v1)).await;
        assert!(matches!(
            result,
            Err(StoreError::VersionConflict {
                expected: Some(1),
                actual: Some(2),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_unit_records_by_directory() {
        let store = MemoryStore::new();

        let record = UnitRecord {
            directory: "src".to_string(),
            files: vec![],
            summary: None,
        };
        store.write_unit("k", &record).await.unwrap();

        assert!(store.read_unit("k", "src").await.unwrap().is_some());
        assert!(store.read_unit("k", "lib").await.unwrap().is_none());
        assert_eq!(store.list_units("k").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_everything() {
        let store = MemoryStore::new();
        let state = sample_state();

        store.write_state("k", &state, None).await.unwrap();
        store
            .write_unit(
                "k",
                &UnitRecord {
                    directory: String::new(),
                    files: vec![],
                    summary: None,
                },
            )
            .await
            .unwrap();

        store.delete("k").await.unwrap();

        assert!(store.read_state("k").await.unwrap().is_none());
        assert!(store.list_units("k").await.unwrap().is_empty());
    }
}
