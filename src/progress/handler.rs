//! Progress handler trait and events

/// Events emitted while an analysis run advances
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Init started for a repository
    AnalysisStarted { locator: String },

    /// Planning finished and the steps are scheduled
    PlanReady {
        total_files: usize,
        batch_count: usize,
    },

    /// One work unit started processing
    UnitStarted { unit_index: usize, directory: String },

    /// One work unit finished (possibly skipped as already done)
    UnitFinished {
        unit_index: usize,
        directory: String,
        files_summarized: usize,
        skipped: bool,
    },

    /// Final synthesis started
    SynthesisStarted { directories: usize },

    /// The run completed
    Completed { total_files: usize },

    /// The run failed
    Failed { error: String },
}

/// Trait for observing progress events
pub trait ProgressHandler: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {
        // Intentionally empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    impl ProgressHandler for CountingHandler {
        fn on_progress(&self, _event: &ProgressEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_noop_handler() {
        NoOpHandler.on_progress(&ProgressEvent::AnalysisStarted {
            locator: "acme/widget".to_string(),
        });
    }

    #[test]
    fn test_events_reach_handler() {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = CountingHandler {
            count: count.clone(),
        };

        handler.on_progress(&ProgressEvent::PlanReady {
            total_files: 10,
            batch_count: 3,
        });
        handler.on_progress(&ProgressEvent::UnitStarted {
            unit_index: 0,
            directory: String::new(),
        });
        handler.on_progress(&ProgressEvent::Completed { total_files: 10 });

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }
}
