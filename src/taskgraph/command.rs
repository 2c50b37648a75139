//! Action-list entries and the analysis command union

use serde::{Deserialize, Serialize};

use crate::model::RepoCoords;

/// The closed set of commands this subsystem understands
///
/// The dispatcher matches this exhaustively; there is no string-tagged
/// fallthrough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum AnalysisCommand {
    /// Plan the decomposition and schedule the process/summary steps
    Init { repo: RepoCoords },

    /// Execute one work unit
    Process { repo: RepoCoords, unit_index: usize },

    /// Aggregate all unit results into the final analysis
    Summary { repo: RepoCoords },
}

impl AnalysisCommand {
    pub fn repo(&self) -> &RepoCoords {
        match self {
            AnalysisCommand::Init { repo }
            | AnalysisCommand::Process { repo, .. }
            | AnalysisCommand::Summary { repo } => repo,
        }
    }
}

/// Payload of one action-list entry
///
/// Entries the host owns for other purposes pass through untouched as
/// opaque JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionPayload {
    Analysis(AnalysisCommand),
    Host(serde_json::Value),
}

/// One entry of the host's ordered, index-addressed action list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEntry {
    pub index: usize,
    pub action: ActionPayload,
}

impl ActionEntry {
    pub fn analysis(index: usize, command: AnalysisCommand) -> Self {
        Self {
            index,
            action: ActionPayload::Analysis(command),
        }
    }

    pub fn host(index: usize, value: serde_json::Value) -> Self {
        Self {
            index,
            action: ActionPayload::Host(value),
        }
    }

    pub fn as_analysis(&self) -> Option<&AnalysisCommand> {
        match &self.action {
            ActionPayload::Analysis(command) => Some(command),
            ActionPayload::Host(_) => None,
        }
    }
}
