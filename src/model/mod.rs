//! Data model for a repository analysis run
//!
//! Everything that reaches the store lives here: repository coordinates, the
//! detected technology profile, the work-unit partition, per-file and
//! per-directory results, the versioned plan state, and the final repository
//! analysis returned to the caller.

pub mod coords;
pub mod results;
pub mod state;
pub mod usage;

pub use coords::RepoCoords;
pub use results::{DirectoryResult, Feature, FileResult, RepositoryAnalysis, UnitRecord};
pub use state::{AnalysisPhase, AnalysisRecord, PlanState, TechnologyProfile, WorkUnit};
pub use usage::{StepUsage, TokenUsage};
