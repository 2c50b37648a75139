//! Init step: plan the run and schedule its steps

use tracing::{info, warn};

use super::output::InitOutput;
use super::{Pipeline, PipelineError};
use crate::config::ConfigError;
use crate::model::{AnalysisPhase, PlanState, RepoCoords};
use crate::planner::BatchPlan;
use crate::progress::ProgressEvent;
use crate::taskgraph::{expand_action_list, ActionEntry};

impl Pipeline {
    /// Detects technology, partitions the file inventory into work units,
    /// persists the plan, and expands the host's action list with one process
    /// step per unit plus a trailing summary step.
    pub(super) async fn run_init(
        &self,
        repo: &RepoCoords,
        actions: &[ActionEntry],
        init_index: usize,
    ) -> Result<(InitOutput, Vec<ActionEntry>), PipelineError> {
        if repo.locator.trim().is_empty() {
            return Err(ConfigError::MissingLocator.into());
        }
        self.context.config.validate()?;

        self.context
            .progress
            .on_progress(&ProgressEvent::AnalysisStarted {
                locator: repo.locator.clone(),
            });

        let subpath = repo.subpath.as_deref();
        let technology = self.context.content.detect_technology(subpath).await?;
        let raw_files = self.context.content.list_files(subpath).await?;

        let plan = BatchPlan::build(&raw_files, &self.context.filter);
        if plan.files.is_empty() {
            warn!(locator = %repo.locator, "No analyzable files survived filtering");
        }

        // Expand before any write so a scheduling conflict leaves the store
        // untouched
        let expanded = expand_action_list(actions, init_index, repo, plan.batch_count())?;

        let key = repo.storage_key();
        let mut state = PlanState::new(
            repo.clone(),
            technology,
            plan.files,
            plan.directories,
            plan.units,
        );

        // Re-running init replaces any previous plan for the same
        // coordinates; unit records survive and make replanned units cheap
        let existing = self.context.store.read_state(&key).await?;
        let expected = existing.as_ref().map(|v| v.version);
        let version = self
            .context
            .store
            .write_state(&key, &state, expected)
            .await?;

        state.phase = AnalysisPhase::Processing;
        state.touch();
        self.context
            .store
            .write_state(&key, &state, Some(version))
            .await?;

        info!(
            locator = %repo.locator,
            technology = %state.technology.technology,
            total_files = state.total_files,
            batch_count = state.batch_count(),
            "Analysis planned"
        );
        self.context.progress.on_progress(&ProgressEvent::PlanReady {
            total_files: state.total_files,
            batch_count: state.batch_count(),
        });

        let output = InitOutput {
            technology: state.technology.technology.clone(),
            platforms: state.technology.platforms.clone(),
            total_files: state.total_files,
            total_directories: state.directories.len(),
            batch_count: state.batch_count(),
        };

        Ok((output, expanded))
    }
}
