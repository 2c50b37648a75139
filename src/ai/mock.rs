//! Scriptable summarizer for tests
//!
//! Produces deterministic summaries, counts calls per method, and can be
//! told to fail the next N calls.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use super::error::CollaboratorError;
use super::summarizer::{
    DirectoryRequest, DirectorySummary, FinalSynthesis, RepositoryRequest, Summarizer, UnitRequest,
    UnitSummary,
};
use crate::model::{
    DirectoryResult, Feature, FileResult, RepositoryAnalysis, TokenUsage,
};

pub struct MockSummarizer {
    unit_calls: AtomicUsize,
    directory_calls: AtomicUsize,
    repository_calls: AtomicUsize,
    failures_remaining: AtomicUsize,
    input_tokens_per_call: AtomicU64,
    output_tokens_per_call: AtomicU64,
}

impl MockSummarizer {
    pub fn new() -> Self {
        Self {
            unit_calls: AtomicUsize::new(0),
            directory_calls: AtomicUsize::new(0),
            repository_calls: AtomicUsize::new(0),
            failures_remaining: AtomicUsize::new(0),
            input_tokens_per_call: AtomicU64::new(100),
            output_tokens_per_call: AtomicU64::new(25),
        }
    }

    /// Token usage every successful call reports
    pub fn with_usage(self, input_tokens: u64, output_tokens: u64) -> Self {
        self.input_tokens_per_call
            .store(input_tokens, Ordering::SeqCst);
        self.output_tokens_per_call
            .store(output_tokens, Ordering::SeqCst);
        self
    }

    /// Fails the next `count` calls, regardless of method
    pub fn fail_next(&self, count: usize) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    pub fn unit_calls(&self) -> usize {
        self.unit_calls.load(Ordering::SeqCst)
    }

    pub fn directory_calls(&self) -> usize {
        self.directory_calls.load(Ordering::SeqCst)
    }

    pub fn repository_calls(&self) -> usize {
        self.repository_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.unit_calls() + self.directory_calls() + self.repository_calls()
    }

    fn usage(&self) -> TokenUsage {
        TokenUsage::new(
            self.input_tokens_per_call.load(Ordering::SeqCst),
            self.output_tokens_per_call.load(Ordering::SeqCst),
        )
    }

    fn maybe_fail(&self) -> Result<(), CollaboratorError> {
        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(CollaboratorError::Api {
                message: "simulated collaborator failure".to_string(),
                status_code: Some(500),
            });
        }
        Ok(())
    }
}

impl Default for MockSummarizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize_unit(&self, request: UnitRequest) -> Result<UnitSummary, CollaboratorError> {
        self.unit_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_fail()?;

        let now = Utc::now();
        let files: Vec<FileResult> = request
            .files
            .iter()
            .map(|f| FileResult {
                path: f.path.clone(),
                language: Some("Rust".to_string()),
                summary: format!("Summary of {}", f.path),
                features: None,
                exports: None,
                summarized_at: now,
            })
            .collect();

        let directory = DirectoryResult {
            path: request.directory.clone(),
            summary: format!("Summary of directory '{}'", request.directory),
            features: vec![],
            files_summarized: files.len(),
            summarized_at: now,
        };

        Ok(UnitSummary {
            files,
            directory,
            usage: self.usage(),
        })
    }

    async fn summarize_directory(
        &self,
        request: DirectoryRequest,
    ) -> Result<DirectorySummary, CollaboratorError> {
        self.directory_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_fail()?;

        Ok(DirectorySummary {
            directory: DirectoryResult {
                path: request.directory.clone(),
                summary: format!(
                    "Summary of directory '{}' from {} file results",
                    request.directory,
                    request.files.len()
                ),
                features: vec![],
                files_summarized: request.files.len(),
                summarized_at: Utc::now(),
            },
            usage: self.usage(),
        })
    }

    async fn synthesize_repository(
        &self,
        request: RepositoryRequest,
    ) -> Result<FinalSynthesis, CollaboratorError> {
        self.repository_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_fail()?;

        let analysis = RepositoryAnalysis {
            overview: format!(
                "Overview of {} from {} directory summaries",
                request.repo.locator,
                request.directories.len()
            ),
            features: vec![Feature {
                name: "Core".to_string(),
                description: "Primary functionality".to_string(),
                related_files: vec![],
            }],
            architecture: format!("{} project", request.technology.technology),
            dependencies: vec![],
            endpoints: None,
            generated_at: Utc::now(),
        };

        Ok(FinalSynthesis {
            analysis,
            usage: self.usage(),
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

impl std::fmt::Debug for MockSummarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSummarizer")
            .field("unit_calls", &self.unit_calls())
            .field("directory_calls", &self.directory_calls())
            .field("repository_calls", &self.repository_calls())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::summarizer::FileInput;
    use crate::model::{RepoCoords, TechnologyProfile};

    fn unit_request() -> UnitRequest {
        UnitRequest {
            directory: "src".to_string(),
            files: vec![FileInput {
                path: "src/a.rs".to_string(),
                content: "fn a() {}".to_string(),
            }],
            technology: TechnologyProfile::unknown(),
        }
    }

    #[tokio::test]
    async fn test_mock_counts_calls() {
        let mock = MockSummarizer::new();

        mock.summarize_unit(unit_request()).await.unwrap();
        mock.summarize_unit(unit_request()).await.unwrap();

        assert_eq!(mock.unit_calls(), 2);
        assert_eq!(mock.total_calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_deterministic_output() {
        let mock = MockSummarizer::new();
        let summary = mock.summarize_unit(unit_request()).await.unwrap();

        assert_eq!(summary.files.len(), 1);
        assert_eq!(summary.files[0].summary, "Summary of src/a.rs");
        assert_eq!(summary.directory.path, "src");
    }

    #[tokio::test]
    async fn test_mock_scripted_failure_then_recovery() {
        let mock = MockSummarizer::new();
        mock.fail_next(1);

        assert!(mock.summarize_unit(unit_request()).await.is_err());
        assert!(mock.summarize_unit(unit_request()).await.is_ok());
        assert_eq!(mock.unit_calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_usage_is_configurable() {
        let mock = MockSummarizer::new().with_usage(1000, 200);
        let synthesis = mock
            .synthesize_repository(RepositoryRequest {
                repo: RepoCoords::new("acme/widget"),
                technology: TechnologyProfile::unknown(),
                directories: vec![],
            })
            .await
            .unwrap();

        assert_eq!(synthesis.usage, TokenUsage::new(1000, 200));
    }
}
