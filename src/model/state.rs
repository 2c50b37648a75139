//! Plan state: the lifecycle record of one analysis run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::coords::RepoCoords;
use super::results::{DirectoryResult, FileResult, UnitRecord};

/// Technology profile detected once during planning, immutable afterward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnologyProfile {
    /// Detected platform/technology name, e.g. "Rust" or "Node.js"
    pub technology: String,

    /// Target platforms the technology typically ships to
    pub platforms: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,

    /// Raw content of the primary config file, used as architecture context
    /// during final synthesis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_content: Option<String>,
}

impl TechnologyProfile {
    pub fn unknown() -> Self {
        Self {
            technology: "Unknown".to_string(),
            platforms: Vec::new(),
            config_path: None,
            config_content: None,
        }
    }
}

/// One work unit: a directory and the files directly inside it
///
/// The empty directory path is the repository root. Units partition the
/// filtered file list: disjoint, exhaustive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkUnit {
    pub directory: String,
    pub files: Vec<String>,
}

impl WorkUnit {
    pub fn is_root(&self) -> bool {
        self.directory.is_empty()
    }
}

/// Lifecycle phase of an analysis run
///
/// Transitions are monotonic; no phase is reached twice except `Failed`,
/// which permits re-entry into `Processing` so a failed run can be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisPhase {
    Initializing,
    Processing,
    Completed,
    Failed,
}

impl AnalysisPhase {
    pub fn can_transition_to(&self, next: AnalysisPhase) -> bool {
        use AnalysisPhase::*;
        matches!(
            (self, next),
            (Initializing, Processing)
                | (Initializing, Failed)
                | (Processing, Processing)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Failed, Processing)
                | (Failed, Completed)
                | (Failed, Failed)
                // Re-running summary after completion is an idempotent no-op
                | (Completed, Completed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisPhase::Completed)
    }
}

impl fmt::Display for AnalysisPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AnalysisPhase::Initializing => "initializing",
            AnalysisPhase::Processing => "processing",
            AnalysisPhase::Completed => "completed",
            AnalysisPhase::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// The persisted plan for one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanState {
    pub phase: AnalysisPhase,
    pub repo: RepoCoords,
    pub technology: TechnologyProfile,
    pub total_files: usize,

    /// Monotonically non-decreasing, never exceeds `total_files`.
    /// Derived from persisted unit records on every state update so a crash
    /// between unit write and state write self-heals.
    pub processed_files: usize,

    /// Full filtered file list, the ground truth the partition covers
    pub files: Vec<String>,

    /// All directories containing surviving files, deepest first
    pub directories: Vec<String>,

    /// Ordered work-unit partition, shallowest first
    pub units: Vec<WorkUnit>,

    /// Index of the next unprocessed unit
    pub current_unit: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub updated_at: DateTime<Utc>,
}

impl PlanState {
    pub fn new(
        repo: RepoCoords,
        technology: TechnologyProfile,
        files: Vec<String>,
        directories: Vec<String>,
        units: Vec<WorkUnit>,
    ) -> Self {
        Self {
            phase: AnalysisPhase::Initializing,
            repo,
            technology,
            total_files: files.len(),
            processed_files: 0,
            files,
            directories,
            units,
            current_unit: 0,
            error: None,
            updated_at: Utc::now(),
        }
    }

    pub fn batch_count(&self) -> usize {
        self.units.len()
    }

    pub fn unit(&self, index: usize) -> Option<&WorkUnit> {
        self.units.get(index)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// The assembled in-memory aggregate: plan state plus all results, keyed by
/// path. Reconstructed from the state document and the unit records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub state: PlanState,
    pub files: BTreeMap<String, FileResult>,
    pub directories: BTreeMap<String, DirectoryResult>,
}

impl AnalysisRecord {
    pub fn assemble(state: PlanState, units: Vec<UnitRecord>) -> Self {
        let mut files = BTreeMap::new();
        let mut directories = BTreeMap::new();

        for unit in units {
            for file in unit.files {
                files.insert(file.path.clone(), file);
            }
            if let Some(summary) = unit.summary {
                directories.insert(summary.path.clone(), summary);
            }
        }

        Self {
            state,
            files,
            directories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> PlanState {
        PlanState::new(
            RepoCoords::new("acme/widget"),
            TechnologyProfile::unknown(),
            vec!["a.rs".to_string(), "src/b.rs".to_string()],
            vec!["src".to_string()],
            vec![
                WorkUnit {
                    directory: String::new(),
                    files: vec!["a.rs".to_string()],
                },
                WorkUnit {
                    directory: "src".to_string(),
                    files: vec!["src/b.rs".to_string()],
                },
            ],
        )
    }

    #[test]
    fn test_phase_transitions() {
        use AnalysisPhase::*;

        assert!(Initializing.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));
        assert!(Failed.can_transition_to(Processing));
        assert!(Completed.can_transition_to(Completed));

        assert!(!Completed.can_transition_to(Processing));
        assert!(!Processing.can_transition_to(Initializing));
        assert!(!Initializing.can_transition_to(Completed));
    }

    #[test]
    fn test_new_state_defaults() {
        let state = sample_state();

        assert_eq!(state.phase, AnalysisPhase::Initializing);
        assert_eq!(state.total_files, 2);
        assert_eq!(state.processed_files, 0);
        assert_eq!(state.batch_count(), 2);
        assert_eq!(state.current_unit, 0);
        assert!(state.error.is_none());
    }

    #[test]
    fn test_assemble_record_from_units() {
        let state = sample_state();
        let units = vec![UnitRecord {
            directory: "src".to_string(),
            files: vec![FileResult::fetch_error("src/b.rs", "gone")],
            summary: Some(DirectoryResult {
                path: "src".to_string(),
                summary: "Sources".to_string(),
                features: vec![],
                files_summarized: 1,
                summarized_at: Utc::now(),
            }),
        }];

        let record = AnalysisRecord::assemble(state, units);

        assert!(record.files.contains_key("src/b.rs"));
        assert!(record.directories.contains_key("src"));
    }

    #[test]
    fn test_state_round_trips_through_json() {
        let state = sample_state();
        let json = serde_json::to_string(&state).unwrap();
        let back: PlanState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
