//! Summary step: aggregate unit results into the repository analysis

use std::collections::BTreeMap;

use tracing::{info, warn};

use super::output::SummaryOutput;
use super::{Pipeline, PipelineError, MAX_CAS_RETRIES};
use crate::ai::{DirectoryRequest, RepositoryRequest};
use crate::model::{
    AnalysisPhase, DirectoryResult, PlanState, RepoCoords, RepositoryAnalysis, StepUsage,
    UnitRecord,
};
use crate::progress::ProgressEvent;
use crate::store::StoreError;

impl Pipeline {
    /// Verifies every unit is done, lazily synthesizes the root directory
    /// summary if the root unit lacks one, runs the final repository
    /// synthesis, and marks the run completed.
    ///
    /// On a retryable failure the plan state is best-effort marked failed
    /// before the error propagates; unit records stay untouched either way.
    pub(super) async fn run_summary(
        &self,
        repo: &RepoCoords,
    ) -> Result<SummaryOutput, PipelineError> {
        let key = repo.storage_key();
        match self.run_summary_inner(repo, &key).await {
            Ok(output) => Ok(output),
            Err(err) => {
                if err.is_retryable() {
                    self.mark_failed(&key, &err).await;
                }
                self.context.progress.on_progress(&ProgressEvent::Failed {
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn run_summary_inner(
        &self,
        repo: &RepoCoords,
        key: &str,
    ) -> Result<SummaryOutput, PipelineError> {
        let versioned = self
            .context
            .store
            .read_state(key)
            .await?
            .ok_or_else(|| PipelineError::MissingState {
                key: key.to_string(),
            })?;
        let state = versioned.state;

        let mut records: BTreeMap<String, UnitRecord> = self
            .context
            .store
            .list_units(key)
            .await?
            .into_iter()
            .map(|r| (r.directory.clone(), r))
            .collect();

        // The root unit may legitimately still lack its directory summary;
        // every other unit must be fully complete
        let missing = state
            .units
            .iter()
            .filter(|unit| match records.get(&unit.directory) {
                Some(record) => !record.is_complete() && !unit.is_root(),
                None => true,
            })
            .count();
        if missing > 0 {
            return Err(PipelineError::IncompleteRun {
                missing,
                total: state.units.len(),
            });
        }

        let mut usage = StepUsage::default();

        if let Some(record) = records.get("") {
            if !record.is_complete() {
                let synthesized = self.synthesize_root(key, record.clone(), &state, &mut usage).await?;
                records.insert(String::new(), synthesized);
            }
        }

        self.context
            .progress
            .on_progress(&ProgressEvent::SynthesisStarted {
                directories: state.units.len(),
            });

        // Shallowest-first, mirroring the unit order
        let directories: Vec<DirectoryResult> = state
            .units
            .iter()
            .filter_map(|unit| records.get(&unit.directory))
            .filter_map(|record| record.summary.clone())
            .collect();

        let synthesis = self
            .context
            .summarizer
            .synthesize_repository(RepositoryRequest {
                repo: repo.clone(),
                technology: state.technology.clone(),
                directories,
            })
            .await?;
        usage.record(
            synthesis.usage,
            self.context.config.input_price,
            self.context.config.output_price,
        );

        self.finalize_state(key).await?;

        let search_text = build_search_text(&state, &synthesis.analysis);

        info!(
            locator = %repo.locator,
            total_files = state.total_files,
            features = synthesis.analysis.features.len(),
            cost_usd = usage.cost_usd,
            "Analysis completed"
        );
        self.context.progress.on_progress(&ProgressEvent::Completed {
            total_files: state.total_files,
        });

        Ok(SummaryOutput {
            analysis: synthesis.analysis,
            search_text,
            usage,
        })
    }

    /// Produces and persists the root directory summary from the root unit's
    /// existing file results
    async fn synthesize_root(
        &self,
        key: &str,
        record: UnitRecord,
        state: &PlanState,
        usage: &mut StepUsage,
    ) -> Result<UnitRecord, PipelineError> {
        let summary = self
            .context
            .summarizer
            .summarize_directory(DirectoryRequest {
                directory: String::new(),
                files: record.files.clone(),
                technology: state.technology.clone(),
            })
            .await?;
        usage.record(
            summary.usage,
            self.context.config.input_price,
            self.context.config.output_price,
        );

        let completed = UnitRecord {
            directory: record.directory,
            files: record.files,
            summary: Some(summary.directory),
        };
        self.context.store.write_unit(key, &completed).await?;
        Ok(completed)
    }

    /// Transitions the plan state to completed with CAS retries
    async fn finalize_state(&self, key: &str) -> Result<(), PipelineError> {
        for _ in 0..MAX_CAS_RETRIES {
            let versioned = self
                .context
                .store
                .read_state(key)
                .await?
                .ok_or_else(|| PipelineError::MissingState {
                    key: key.to_string(),
                })?;
            let mut state = versioned.state;

            if !state.phase.can_transition_to(AnalysisPhase::Completed) {
                warn!(phase = %state.phase, "Cannot complete run from current phase");
                return Ok(());
            }
            state.phase = AnalysisPhase::Completed;
            state.error = None;
            state.touch();

            match self
                .context
                .store
                .write_state(key, &state, Some(versioned.version))
                .await
            {
                Ok(_) => return Ok(()),
                Err(StoreError::VersionConflict { .. }) => continue,
                Err(err) => return Err(err.into()),
            }
        }

        Err(StoreError::Io("state completion retries exhausted".to_string()).into())
    }

    /// Best-effort transition to the failed phase; never masks the original
    /// error
    async fn mark_failed(&self, key: &str, cause: &PipelineError) {
        let versioned = match self.context.store.read_state(key).await {
            Ok(Some(v)) => v,
            Ok(None) => return,
            Err(err) => {
                warn!(error = %err, "Could not read state to mark run failed");
                return;
            }
        };

        let mut state = versioned.state;
        if !state.phase.can_transition_to(AnalysisPhase::Failed) {
            return;
        }
        state.phase = AnalysisPhase::Failed;
        state.error = Some(cause.to_string());
        state.touch();

        if let Err(err) = self
            .context
            .store
            .write_state(key, &state, Some(versioned.version))
            .await
        {
            warn!(error = %err, "Could not persist failed phase");
        }
    }
}

/// Flat text blob for downstream indexing: coordinates, technology, and the
/// analysis prose joined by newlines
fn build_search_text(state: &PlanState, analysis: &RepositoryAnalysis) -> String {
    let mut parts = vec![
        state.repo.locator.clone(),
        state.technology.technology.clone(),
        state.technology.platforms.join(", "),
        analysis.overview.clone(),
        analysis.architecture.clone(),
    ];
    parts.extend(analysis.features.iter().map(|f| f.name.clone()));
    parts.retain(|p| !p.trim().is_empty());
    parts.join("\n")
}
