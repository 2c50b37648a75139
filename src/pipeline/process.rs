//! Process step: summarize one work unit

use std::collections::HashSet;

use chrono::Utc;
use futures_util::{stream, StreamExt};
use tracing::{debug, info, warn};

use super::output::ProcessOutput;
use super::{Pipeline, PipelineError, MAX_CAS_RETRIES};
use crate::ai::{FileInput, UnitRequest};
use crate::model::{
    AnalysisPhase, DirectoryResult, FileResult, PlanState, RepoCoords, StepUsage, UnitRecord,
    WorkUnit,
};
use crate::progress::ProgressEvent;
use crate::store::StoreError;

impl Pipeline {
    /// Fetches one unit's files, summarizes them in a single AI call, and
    /// persists the unit record before advancing the plan state.
    ///
    /// A unit whose record is already complete is skipped outright; the step
    /// costs nothing and makes no AI call.
    pub(super) async fn run_process(
        &self,
        repo: &RepoCoords,
        unit_index: usize,
    ) -> Result<ProcessOutput, PipelineError> {
        let key = repo.storage_key();
        let versioned = self
            .context
            .store
            .read_state(&key)
            .await?
            .ok_or_else(|| PipelineError::MissingState { key: key.clone() })?;
        let state = versioned.state;

        let unit = state
            .unit(unit_index)
            .ok_or(PipelineError::UnknownUnit {
                index: unit_index,
                count: state.units.len(),
            })?
            .clone();

        self.context
            .progress
            .on_progress(&ProgressEvent::UnitStarted {
                unit_index,
                directory: unit.directory.clone(),
            });

        if let Some(existing) = self.context.store.read_unit(&key, &unit.directory).await? {
            if existing.is_complete() {
                debug!(
                    unit_index,
                    directory = %unit.directory,
                    "Unit already has a complete record, skipping"
                );
                // The skip still writes state: the derived counter must pick
                // up records persisted by earlier sessions of this run
                let total_processed = self.advance_state(&key, unit_index).await?;
                let output = ProcessOutput {
                    unit_index,
                    directory: unit.directory.clone(),
                    files_in_unit: unit.files.len(),
                    files_summarized: 0,
                    total_processed,
                    total_files: state.total_files,
                    skipped: true,
                    usage: StepUsage::default(),
                };
                self.emit_unit_finished(&output);
                return Ok(output);
            }
        }

        let (inputs, fetch_failures) = self.fetch_unit_files(&unit).await;

        let mut usage = StepUsage::default();
        let (summarized, directory_result) = if inputs.is_empty() {
            // Nothing fetched; record the unit without spending an AI call
            warn!(
                unit_index,
                directory = %unit.directory,
                "No file content retrieved for unit"
            );
            let result = DirectoryResult {
                path: unit.directory.clone(),
                summary: "No file content could be retrieved for this directory.".to_string(),
                features: vec![],
                files_summarized: 0,
                summarized_at: Utc::now(),
            };
            (Vec::new(), result)
        } else {
            let summary = self
                .context
                .summarizer
                .summarize_unit(UnitRequest {
                    directory: unit.directory.clone(),
                    files: inputs,
                    technology: state.technology.clone(),
                })
                .await?;
            usage.record(
                summary.usage,
                self.context.config.input_price,
                self.context.config.output_price,
            );
            (summary.files, summary.directory)
        };

        let files_summarized = summarized.len();
        let mut files = summarized;
        files.extend(fetch_failures);

        let record = UnitRecord {
            directory: unit.directory.clone(),
            files,
            summary: Some(directory_result),
        };
        self.context.store.write_unit(&key, &record).await?;

        let total_processed = self.advance_state(&key, unit_index).await?;

        info!(
            unit_index,
            directory = %unit.directory,
            files_summarized,
            total_processed,
            "Unit processed"
        );

        let output = ProcessOutput {
            unit_index,
            directory: unit.directory,
            files_in_unit: unit.files.len(),
            files_summarized,
            total_processed,
            total_files: state.total_files,
            skipped: false,
            usage,
        };
        self.emit_unit_finished(&output);
        Ok(output)
    }

    /// Fetches the unit's files concurrently, preserving plan order
    ///
    /// Failures become error-carrying file results instead of failing the
    /// unit.
    async fn fetch_unit_files(&self, unit: &WorkUnit) -> (Vec<FileInput>, Vec<FileResult>) {
        let fetches = stream::iter(unit.files.iter().cloned().map(|path| {
            let content = self.context.content.clone();
            async move {
                let result = content.read_file(&path).await;
                (path, result)
            }
        }))
        .buffered(self.context.config.fetch_concurrency)
        .collect::<Vec<_>>()
        .await;

        let mut inputs = Vec::new();
        let mut failures = Vec::new();
        for (path, result) in fetches {
            match result {
                Ok(content) => inputs.push(FileInput { path, content }),
                Err(err) => {
                    warn!(path = %path, error = %err, "File fetch failed");
                    failures.push(FileResult::fetch_error(path, err));
                }
            }
        }

        (inputs, failures)
    }

    /// Recomputes progress from persisted unit records and writes the state
    /// back conditionally, retrying on version conflicts.
    ///
    /// Deriving `processed_files` from the records makes the counter
    /// self-healing: a crash between the unit write and the state write just
    /// means the next update counts the orphaned record.
    async fn advance_state(&self, key: &str, unit_index: usize) -> Result<usize, PipelineError> {
        let mut last_conflict = None;

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

            let records = self.context.store.list_units(key).await?;
            let complete: HashSet<&str> = records
                .iter()
                .filter(|r| r.is_complete())
                .map(|r| r.directory.as_str())
                .collect();

            let processed = derived_processed_files(&state, &complete);
            state.processed_files = state.processed_files.max(processed);
            state.current_unit = state.current_unit.max(unit_index + 1);
            if state.phase.can_transition_to(AnalysisPhase::Processing) {
                state.phase = AnalysisPhase::Processing;
                state.error = None;
            }
            state.touch();

            let processed_files = state.processed_files;
            match self
                .context
                .store
                .write_state(key, &state, Some(versioned.version))
                .await
            {
                Ok(_) => return Ok(processed_files),
                Err(StoreError::VersionConflict { .. }) => {
                    last_conflict = Some(StoreError::VersionConflict {
                        key: key.to_string(),
                        expected: Some(versioned.version),
                        actual: None,
                    });
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(last_conflict
            .unwrap_or_else(|| StoreError::Io("state update retries exhausted".to_string()))
            .into())
    }

    fn emit_unit_finished(&self, output: &ProcessOutput) {
        self.context
            .progress
            .on_progress(&ProgressEvent::UnitFinished {
                unit_index: output.unit_index,
                directory: output.directory.clone(),
                files_summarized: output.files_summarized,
                skipped: output.skipped,
            });
    }
}

/// Files covered by planned units whose records are complete
fn derived_processed_files(state: &PlanState, complete: &HashSet<&str>) -> usize {
    state
        .units
        .iter()
        .filter(|u| complete.contains(u.directory.as_str()))
        .map(|u| u.files.len())
        .sum()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::ai::MockSummarizer;
    use crate::config::RepolensConfig;
    use crate::content::MockContentSource;
    use crate::pipeline::PipelineContext;
    use crate::store::{AnalysisStore, MemoryStore, VersionedState};
    use crate::taskgraph::{ActionEntry, ActionPayload, AnalysisCommand};

    fn offline_config() -> RepolensConfig {
        RepolensConfig {
            endpoint: "http://localhost:11434".to_string(),
            model: "test-model".to_string(),
            api_key: None,
            request_timeout_secs: 5,
            fetch_concurrency: 4,
            max_file_bytes: 65_536,
            input_price: 3.0,
            output_price: 15.0,
            store_dir: std::env::temp_dir(),
            log_level: "info".to_string(),
        }
    }

    struct Fixture {
        pipeline: Pipeline,
        summarizer: Arc<MockSummarizer>,
        store: Arc<MemoryStore>,
        repo: RepoCoords,
    }

    async fn initialized_fixture(files: &[(&'static str, &'static str)]) -> Fixture {
        let content = MockContentSource::new();
        content.add_files(files.iter().copied());

        let summarizer = Arc::new(MockSummarizer::new());
        let store = Arc::new(MemoryStore::new());
        let repo = RepoCoords::new("acme/widget");

        let context = PipelineContext::new(
            Arc::new(content),
            summarizer.clone(),
            store.clone(),
            offline_config(),
        );
        let pipeline = Pipeline::new(context);

        let actions = vec![ActionEntry {
            index: 0,
            action: ActionPayload::Analysis(AnalysisCommand::Init { repo: repo.clone() }),
        }];
        pipeline.run_init(&repo, &actions, 0).await.unwrap();

        Fixture {
            pipeline,
            summarizer,
            store,
            repo,
        }
    }

    #[tokio::test]
    async fn test_process_summarizes_and_persists() {
        let fx = initialized_fixture(&[("a.rs", "fn a() {}"), ("src/b.rs", "fn b() {}")]).await;

        let output = fx.pipeline.run_process(&fx.repo, 1).await.unwrap();

        assert_eq!(output.directory, "src");
        assert_eq!(output.files_summarized, 1);
        assert!(!output.skipped);
        assert_eq!(output.usage.ai_calls, 1);
        assert!(output.usage.cost_usd > 0.0);

        let record = fx
            .store
            .read_unit(&fx.repo.storage_key(), "src")
            .await
            .unwrap()
            .unwrap();
        assert!(record.is_complete());
        assert_eq!(record.files.len(), 1);
    }

    #[tokio::test]
    async fn test_reprocessing_complete_unit_is_free() {
        let fx = initialized_fixture(&[("src/b.rs", "fn b() {}")]).await;

        fx.pipeline.run_process(&fx.repo, 0).await.unwrap();
        let output = fx.pipeline.run_process(&fx.repo, 0).await.unwrap();

        assert!(output.skipped);
        assert_eq!(output.usage.ai_calls, 0);
        assert_eq!(output.usage.cost_usd, 0.0);
        assert_eq!(fx.summarizer.unit_calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_does_not_fail_the_unit() {
        let content = MockContentSource::new();
        content.add_files([("src/a.rs", "fn a() {}"), ("src/b.rs", "fn b() {}")]);
        content.fail_read("src/b.rs");

        let summarizer = Arc::new(MockSummarizer::new());
        let store = Arc::new(MemoryStore::new());
        let repo = RepoCoords::new("acme/widget");
        let context = PipelineContext::new(
            Arc::new(content),
            summarizer.clone(),
            store.clone(),
            offline_config(),
        );
        let pipeline = Pipeline::new(context);
        let actions = vec![ActionEntry {
            index: 0,
            action: ActionPayload::Analysis(AnalysisCommand::Init { repo: repo.clone() }),
        }];
        pipeline.run_init(&repo, &actions, 0).await.unwrap();

        let output = pipeline.run_process(&repo, 0).await.unwrap();

        assert_eq!(output.files_in_unit, 2);
        assert_eq!(output.files_summarized, 1);

        let record = store
            .read_unit(&repo.storage_key(), "src")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.files.len(), 2);
        let failed = record
            .files
            .iter()
            .find(|f| f.path == "src/b.rs")
            .unwrap();
        assert!(failed.summary.contains("Could not retrieve"));
    }

    #[tokio::test]
    async fn test_all_fetches_failing_skips_ai_call() {
        let content = MockContentSource::new();
        content.add_file("src/a.rs", "fn a() {}");
        content.fail_read("src/a.rs");

        let summarizer = Arc::new(MockSummarizer::new());
        let store = Arc::new(MemoryStore::new());
        let repo = RepoCoords::new("acme/widget");
        let context = PipelineContext::new(
            Arc::new(content),
            summarizer.clone(),
            store,
            offline_config(),
        );
        let pipeline = Pipeline::new(context);
        let actions = vec![ActionEntry {
            index: 0,
            action: ActionPayload::Analysis(AnalysisCommand::Init { repo: repo.clone() }),
        }];
        pipeline.run_init(&repo, &actions, 0).await.unwrap();

        let output = pipeline.run_process(&repo, 0).await.unwrap();

        assert_eq!(output.files_summarized, 0);
        assert_eq!(output.usage.ai_calls, 0);
        assert_eq!(summarizer.unit_calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_unit_index_is_rejected() {
        let fx = initialized_fixture(&[("a.rs", "fn a() {}")]).await;

        let err = fx.pipeline.run_process(&fx.repo, 9).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::UnknownUnit { index: 9, count: 1 }
        ));
    }

    #[tokio::test]
    async fn test_process_without_init_is_rejected() {
        let context = PipelineContext::new(
            Arc::new(MockContentSource::new()),
            Arc::new(MockSummarizer::new()),
            Arc::new(MemoryStore::new()),
            offline_config(),
        );
        let pipeline = Pipeline::new(context);

        let err = pipeline
            .run_process(&RepoCoords::new("acme/widget"), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingState { .. }));
    }

    #[tokio::test]
    async fn test_progress_counter_derives_from_records() {
        let fx = initialized_fixture(&[
            ("a.rs", "fn a() {}"),
            ("src/b.rs", "fn b() {}"),
            ("src/c.rs", "fn c() {}"),
        ])
        .await;

        // Process out of order; the counter still tracks completed records
        let second = fx.pipeline.run_process(&fx.repo, 1).await.unwrap();
        assert_eq!(second.total_processed, 2);

        let first = fx.pipeline.run_process(&fx.repo, 0).await.unwrap();
        assert_eq!(first.total_processed, 3);
        assert_eq!(first.total_files, 3);
    }

    /// Store that bumps the state version behind the next conditional
    /// write, standing in for a second process racing the same run
    struct ContendedStore {
        inner: MemoryStore,
        contend_next: AtomicBool,
        state_writes: AtomicUsize,
    }

    impl ContendedStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                contend_next: AtomicBool::new(false),
                state_writes: AtomicUsize::new(0),
            }
        }

        fn contend_next_write(&self) {
            self.contend_next.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl AnalysisStore for ContendedStore {
        async fn read_state(&self, key: &str) -> Result<Option<VersionedState>, StoreError> {
            self.inner.read_state(key).await
        }

        async fn write_state(
            &self,
            key: &str,
            state: &PlanState,
            expected: Option<u64>,
        ) -> Result<u64, StoreError> {
            self.state_writes.fetch_add(1, Ordering::SeqCst);
            if self.contend_next.swap(false, Ordering::SeqCst) {
                let current = self.inner.read_state(key).await?.unwrap();
                self.inner
                    .write_state(key, &current.state, Some(current.version))
                    .await?;
            }
            self.inner.write_state(key, state, expected).await
        }

        async fn read_unit(
            &self,
            key: &str,
            directory: &str,
        ) -> Result<Option<UnitRecord>, StoreError> {
            self.inner.read_unit(key, directory).await
        }

        async fn write_unit(&self, key: &str, record: &UnitRecord) -> Result<(), StoreError> {
            self.inner.write_unit(key, record).await
        }

        async fn list_units(&self, key: &str) -> Result<Vec<UnitRecord>, StoreError> {
            self.inner.list_units(key).await
        }

        async fn delete(&self, key: &str) -> Result<(), StoreError> {
            self.inner.delete(key).await
        }
    }

    #[tokio::test]
    async fn test_state_update_retries_past_concurrent_writer() {
        let content = MockContentSource::new();
        content.add_files([("a.rs", "fn a() {}"), ("src/b.rs", "fn b() {}")]);

        let store = Arc::new(ContendedStore::new());
        let repo = RepoCoords::new("acme/widget");
        let context = PipelineContext::new(
            Arc::new(content),
            Arc::new(MockSummarizer::new()),
            store.clone(),
            offline_config(),
        );
        let pipeline = Pipeline::new(context);
        let actions = vec![ActionEntry {
            index: 0,
            action: ActionPayload::Analysis(AnalysisCommand::Init { repo: repo.clone() }),
        }];
        pipeline.run_init(&repo, &actions, 0).await.unwrap();
        let writes_after_init = store.state_writes.load(Ordering::SeqCst);

        // Another writer bumps the version between the read and the write
        store.contend_next_write();
        let output = pipeline.run_process(&repo, 0).await.unwrap();

        assert!(!output.skipped);
        assert_eq!(output.total_processed, 1);

        // First attempt lost the race, the retry landed
        assert_eq!(
            store.state_writes.load(Ordering::SeqCst),
            writes_after_init + 2
        );

        let state = store
            .read_state(&repo.storage_key())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.state.phase, AnalysisPhase::Processing);
        assert_eq!(state.state.processed_files, 1);
        assert_eq!(state.state.current_unit, 1);
    }

    #[tokio::test]
    async fn test_ai_failure_leaves_unit_incomplete() {
        let fx = initialized_fixture(&[("src/b.rs", "fn b() {}")]).await;
        fx.summarizer.fail_next(1);

        let err = fx.pipeline.run_process(&fx.repo, 0).await.unwrap_err();
        assert!(err.is_retryable());

        let record = fx
            .store
            .read_unit(&fx.repo.storage_key(), "src")
            .await
            .unwrap();
        assert!(record.is_none());

        // Retry succeeds and persists
        let output = fx.pipeline.run_process(&fx.repo, 0).await.unwrap();
        assert!(!output.skipped);
        assert_eq!(output.files_summarized, 1);
    }
}
