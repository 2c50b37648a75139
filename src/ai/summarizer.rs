//! Summarizer trait and call payloads

use async_trait::async_trait;

use super::error::CollaboratorError;
use crate::model::{
    DirectoryResult, FileResult, RepoCoords, RepositoryAnalysis, TechnologyProfile, TokenUsage,
};

/// One file submitted for summarization
#[derive(Debug, Clone)]
pub struct FileInput {
    pub path: String,
    pub content: String,
}

/// Request for a combined per-unit call: all of a unit's files plus the
/// directory summary, in one round trip
#[derive(Debug, Clone)]
pub struct UnitRequest {
    pub directory: String,
    pub files: Vec<FileInput>,
    pub technology: TechnologyProfile,
}

#[derive(Debug, Clone)]
pub struct UnitSummary {
    pub files: Vec<FileResult>,
    pub directory: DirectoryResult,
    pub usage: TokenUsage,
}

/// Request for a directory summary derived from already-produced file
/// results, used when the root unit lacks its directory summary
#[derive(Debug, Clone)]
pub struct DirectoryRequest {
    pub directory: String,
    pub files: Vec<FileResult>,
    pub technology: TechnologyProfile,
}

#[derive(Debug, Clone)]
pub struct DirectorySummary {
    pub directory: DirectoryResult,
    pub usage: TokenUsage,
}

/// Request for the final repository-level synthesis
#[derive(Debug, Clone)]
pub struct RepositoryRequest {
    pub repo: RepoCoords,
    pub technology: TechnologyProfile,
    pub directories: Vec<DirectoryResult>,
}

#[derive(Debug, Clone)]
pub struct FinalSynthesis {
    pub analysis: RepositoryAnalysis,
    pub usage: TokenUsage,
}

/// The AI collaborator seam
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarizes every file of one work unit and the unit's directory in a
    /// single call
    async fn summarize_unit(&self, request: UnitRequest) -> Result<UnitSummary, CollaboratorError>;

    /// Summarizes a directory from existing file results
    async fn summarize_directory(
        &self,
        request: DirectoryRequest,
    ) -> Result<DirectorySummary, CollaboratorError>;

    /// Synthesizes the final repository analysis from all directory results
    async fn synthesize_repository(
        &self,
        request: RepositoryRequest,
    ) -> Result<FinalSynthesis, CollaboratorError>;

    fn name(&self) -> &str;
}
