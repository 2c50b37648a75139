//! repolens - AI-powered repository analysis pipeline
//!
//! This library analyzes a repository bottom-up: it partitions the file
//! inventory into per-directory work units, summarizes each unit with an
//! OpenAI-compatible model in one batched call, and aggregates the unit
//! results into a repository-level analysis. Every step persists its
//! results, so an interrupted run resumes where it left off without
//! re-spending model calls.
//!
//! # Core Concepts
//!
//! - **Batch plan**: The deterministic decomposition of a repository into
//!   work units, one per directory that directly contains analyzable files
//! - **Action list**: The host-owned schedule of steps; init expands it
//!   with one process entry per unit plus a trailing summary entry
//! - **Unit record**: The persisted per-directory result that makes
//!   reprocessing idempotent and free
//!
//! # Example Usage
//!
//! ```ignore
//! use repolens::content::LocalContentSource;
//! use repolens::ai::OpenAiSummarizer;
//! use repolens::config::RepolensConfig;
//! use repolens::model::RepoCoords;
//! use repolens::pipeline::{Pipeline, PipelineContext};
//! use repolens::store::JsonFileStore;
//! use repolens::taskgraph::{ActionEntry, AnalysisCommand};
//! use std::sync::Arc;
//!
//! async fn analyze() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RepolensConfig::default();
//!     let context = PipelineContext::new(
//!         Arc::new(LocalContentSource::new(".", config.max_file_bytes)),
//!         Arc::new(OpenAiSummarizer::new(
//!             config.endpoint.clone(),
//!             config.model.clone(),
//!             config.api_key.clone(),
//!         )),
//!         Arc::new(JsonFileStore::new(&config.store_dir)),
//!         config,
//!     );
//!     let pipeline = Pipeline::new(context);
//!
//!     let repo = RepoCoords::new("acme/widget");
//!     let actions = vec![ActionEntry::analysis(0, AnalysisCommand::Init { repo })];
//!     let output = pipeline.execute(actions[0].as_analysis().unwrap(), &actions, 0).await?;
//!     // Execute the expanded list entry by entry...
//!     # let _ = output;
//!     Ok(())
//! }
//! ```
//!
//! # Project Structure
//!
//! - [`planner`]: File filtering and work-unit partitioning
//! - [`taskgraph`]: Action-list commands and dependency-ordered expansion
//! - [`pipeline`]: The init/process/summary steps
//! - [`ai`]: The summarizer seam and its OpenAI-compatible implementation
//! - [`store`]: Versioned plan state and per-unit records

// Public modules
pub mod ai;
pub mod cli;
pub mod config;
pub mod content;
pub mod model;
pub mod pipeline;
pub mod planner;
pub mod progress;
pub mod store;
pub mod taskgraph;
pub mod util;

// Re-export key types for convenient access
pub use ai::{CollaboratorError, OpenAiSummarizer, Summarizer};
pub use config::{ConfigError, RepolensConfig};
pub use content::{ContentError, ContentSource, LocalContentSource};
pub use model::{AnalysisPhase, PlanState, RepoCoords, RepositoryAnalysis, WorkUnit};
pub use pipeline::{Pipeline, PipelineContext, PipelineError, StepOutput};
pub use planner::{BatchPlan, FileFilter};
pub use store::{AnalysisStore, JsonFileStore, MemoryStore, StoreError};
pub use taskgraph::{expand_action_list, ActionEntry, AnalysisCommand, TaskGraphError};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_repolens() {
        assert_eq!(NAME, "repolens");
    }
}
