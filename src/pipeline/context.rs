//! Shared collaborators for pipeline execution

use std::sync::Arc;

use crate::ai::Summarizer;
use crate::config::RepolensConfig;
use crate::content::ContentSource;
use crate::planner::FileFilter;
use crate::progress::{NoOpHandler, ProgressHandler};
use crate::store::AnalysisStore;

/// Everything a pipeline step needs to run
///
/// All collaborators sit behind trait objects so steps are testable with
/// in-memory doubles. The context is cheap to clone; it holds only Arcs and
/// plain config.
#[derive(Clone)]
pub struct PipelineContext {
    pub content: Arc<dyn ContentSource>,
    pub summarizer: Arc<dyn Summarizer>,
    pub store: Arc<dyn AnalysisStore>,
    pub progress: Arc<dyn ProgressHandler>,
    pub config: RepolensConfig,
    pub filter: FileFilter,
}

impl PipelineContext {
    pub fn new(
        content: Arc<dyn ContentSource>,
        summarizer: Arc<dyn Summarizer>,
        store: Arc<dyn AnalysisStore>,
        config: RepolensConfig,
    ) -> Self {
        Self {
            content,
            summarizer,
            store,
            progress: Arc::new(NoOpHandler),
            config,
            filter: FileFilter::default(),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressHandler>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_filter(mut self, filter: FileFilter) -> Self {
        self.filter = filter;
        self
    }
}

impl std::fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("summarizer", &self.summarizer.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
