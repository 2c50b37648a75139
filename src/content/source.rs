//! ContentSource trait definition

use async_trait::async_trait;
use thiserror::Error;

use crate::model::TechnologyProfile;

/// Errors raised by a content source
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Path not found: {path}")]
    NotFound { path: String },

    #[error("Not a directory: {path}")]
    NotADirectory { path: String },

    #[error("Failed to read {path}: {message}")]
    ReadFailed { path: String, message: String },

    #[error("Failed to list repository contents: {0}")]
    ListFailed(String),
}

/// Abstraction over repository content retrieval
///
/// Returns the raw file inventory; exclusion filtering is the planner's job
/// so the partition invariant has a single owner.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Lists every file under the repository (or the given subpath),
    /// as paths relative to the repository root
    async fn list_files(&self, subpath: Option<&str>) -> Result<Vec<String>, ContentError>;

    /// Reads one file's content as text
    async fn read_file(&self, path: &str) -> Result<String, ContentError>;

    /// Detects the repository's technology profile
    async fn detect_technology(
        &self,
        subpath: Option<&str>,
    ) -> Result<TechnologyProfile, ContentError>;
}
