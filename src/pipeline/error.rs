//! Pipeline error types

use thiserror::Error;

use crate::ai::CollaboratorError;
use crate::config::ConfigError;
use crate::content::ContentError;
use crate::store::StoreError;
use crate::taskgraph::TaskGraphError;

/// Every way a pipeline step can fail
///
/// Failures are raised to the caller as typed errors rather than encoded in
/// step outputs; the host decides whether to retry the step.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// A process or summary step ran before init persisted the plan
    #[error("No plan state found for '{key}'; run init first")]
    MissingState { key: String },

    /// A process step referenced a unit index outside the plan
    #[error("Unit index {index} out of range; the plan has {count} units")]
    UnknownUnit { index: usize, count: usize },

    /// Summary ran while unit results are still missing
    #[error("Analysis run is incomplete: {missing} of {total} units unfinished")]
    IncompleteRun { missing: usize, total: usize },

    #[error(transparent)]
    TaskGraph(#[from] TaskGraphError),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PipelineError {
    /// Whether re-running the same step could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PipelineError::Content(_) | PipelineError::Collaborator(_) | PipelineError::Store(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryability() {
        let missing = PipelineError::MissingState {
            key: "acme".to_string(),
        };
        assert!(!missing.is_retryable());

        let api = PipelineError::Collaborator(CollaboratorError::Network {
            message: "connection refused".to_string(),
        });
        assert!(api.is_retryable());
    }

    #[test]
    fn test_messages_name_the_problem() {
        let err = PipelineError::IncompleteRun {
            missing: 2,
            total: 5,
        };
        assert!(err.to_string().contains("2 of 5"));

        let err = PipelineError::UnknownUnit { index: 7, count: 3 };
        assert!(err.to_string().contains('7'));
    }
}
