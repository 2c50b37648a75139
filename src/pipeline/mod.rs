//! The three-phase analysis pipeline
//!
//! Each phase (init, one process step per work unit, summary) is a single
//! stateless invocation driven by the host's action list. The dispatcher
//! matches the closed command union exhaustively.

mod context;
mod error;
mod init;
mod output;
mod process;
mod summary;

pub use context::PipelineContext;
pub use error::PipelineError;
pub use output::{InitOutput, ProcessOutput, StepOutput, SummaryOutput};

use crate::taskgraph::{ActionEntry, AnalysisCommand};

/// Attempts per conditional state write before giving up
const MAX_CAS_RETRIES: usize = 5;

/// Executes analysis commands against a set of collaborators
pub struct Pipeline {
    context: PipelineContext,
}

impl Pipeline {
    pub fn new(context: PipelineContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    /// Runs one scheduled command
    ///
    /// `actions` and `index` locate the currently executing entry on the
    /// host's action list; only init uses them, to expand the list.
    pub async fn execute(
        &self,
        command: &AnalysisCommand,
        actions: &[ActionEntry],
        index: usize,
    ) -> Result<StepOutput, PipelineError> {
        match command {
            AnalysisCommand::Init { repo } => {
                let (output, expanded) = self.run_init(repo, actions, index).await?;
                Ok(StepOutput::Init {
                    output,
                    actions: expanded,
                })
            }
            AnalysisCommand::Process { repo, unit_index } => Ok(StepOutput::Process(
                self.run_process(repo, *unit_index).await?,
            )),
            AnalysisCommand::Summary { repo } => {
                Ok(StepOutput::Summary(self.run_summary(repo).await?))
            }
        }
    }
}
