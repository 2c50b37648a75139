//! AnalysisStore trait definition

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{PlanState, UnitRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    /// Conditional write lost the race; re-read and retry
    #[error("Version conflict for {key}: expected {expected:?}, found {actual:?}")]
    VersionConflict {
        key: String,
        expected: Option<u64>,
        actual: Option<u64>,
    },

    #[error("Storage I/O error: {0}")]
    Io(String),

    #[error("Failed to (de)serialize stored record: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// A plan state together with the version its write produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedState {
    pub version: u64,
    pub state: PlanState,
}

/// Persistence seam for analysis runs
///
/// `write_state` is a compare-and-swap: `expected = None` creates the
/// document (failing if it already exists), `expected = Some(v)` requires
/// the current version to be exactly `v`. Unit records are keyed by
/// directory path and overwrite unconditionally; their content is derived
/// deterministically, so a duplicate write is harmless.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn read_state(&self, key: &str) -> Result<Option<VersionedState>, StoreError>;

    async fn write_state(
        &self,
        key: &str,
        state: &PlanState,
        expected: Option<u64>,
    ) -> Result<u64, StoreError>;

    async fn read_unit(&self, key: &str, directory: &str)
        -> Result<Option<UnitRecord>, StoreError>;

    async fn write_unit(&self, key: &str, record: &UnitRecord) -> Result<(), StoreError>;

    /// All unit records for the key, in directory order
    async fn list_units(&self, key: &str) -> Result<Vec<UnitRecord>, StoreError>;

    /// Removes the state document and every unit record
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
