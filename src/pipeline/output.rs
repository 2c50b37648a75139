//! Step output payloads

use serde::{Deserialize, Serialize};

use crate::model::{RepositoryAnalysis, StepUsage};
use crate::taskgraph::ActionEntry;

/// Result of the init step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitOutput {
    pub technology: String,
    pub platforms: Vec<String>,
    pub total_files: usize,
    pub total_directories: usize,
    pub batch_count: usize,
}

/// Result of one process step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessOutput {
    pub unit_index: usize,
    pub directory: String,

    /// Files assigned to this unit by the plan
    pub files_in_unit: usize,

    /// Files that actually received an AI summary in this step
    pub files_summarized: usize,

    pub total_processed: usize,
    pub total_files: usize,

    /// True when the unit already had a complete record and was not re-run
    pub skipped: bool,

    pub usage: StepUsage,
}

/// Result of the summary step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryOutput {
    pub analysis: RepositoryAnalysis,

    /// Flat text blob for downstream indexing
    pub search_text: String,

    pub usage: StepUsage,
}

/// What one executed command produced
#[derive(Debug, Clone)]
pub enum StepOutput {
    Init {
        output: InitOutput,
        /// The expanded action list the host must adopt
        actions: Vec<ActionEntry>,
    },
    Process(ProcessOutput),
    Summary(SummaryOutput),
}
