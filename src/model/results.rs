//! Per-file, per-directory, and repository-level analysis results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary of a single source file
///
/// Produced exactly once per file. A file whose content could not be fetched
/// still gets a result; its summary carries the error text so the rest of the
/// unit is not lost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileResult {
    pub path: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    pub summary: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exports: Option<Vec<String>>,

    pub summarized_at: DateTime<Utc>,
}

impl FileResult {
    /// Records a failed content fetch as a result so the unit can continue
    pub fn fetch_error(path: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            path: path.into(),
            language: None,
            summary: format!("Could not retrieve file content: {}", error),
            features: None,
            exports: None,
            summarized_at: Utc::now(),
        }
    }
}

/// Summary of one directory, derived from the file results of its work unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryResult {
    pub path: String,
    pub summary: String,
    pub features: Vec<String>,
    pub files_summarized: usize,
    pub summarized_at: DateTime<Utc>,
}

/// The persisted record for one work unit
///
/// `summary: None` means the unit's files have results but the directory
/// summary has not been produced yet; the root unit can legitimately sit in
/// that state until the aggregation step synthesizes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitRecord {
    pub directory: String,
    pub files: Vec<FileResult>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<DirectoryResult>,
}

impl UnitRecord {
    /// A unit counts as done only once its directory summary exists
    pub fn is_complete(&self) -> bool {
        self.summary.is_some()
    }
}

/// One named feature of the analyzed repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub description: String,

    #[serde(default)]
    pub related_files: Vec<String>,
}

/// The final repository-level analysis
///
/// Returned to the caller, not persisted as authoritative state; the plan
/// state reaching `Completed` is the authoritative marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryAnalysis {
    pub overview: String,
    pub features: Vec<Feature>,
    pub architecture: String,
    pub dependencies: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<Vec<String>>,

    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_result() {
        let result = FileResult::fetch_error("src/gone.rs", "connection reset");

        assert_eq!(result.path, "src/gone.rs");
        assert!(result.summary.contains("connection reset"));
        assert!(result.language.is_none());
    }

    #[test]
    fn test_unit_record_completeness() {
        let mut record = UnitRecord {
            directory: "src".to_string(),
            files: vec![],
            summary: None,
        };
        assert!(!record.is_complete());

        record.summary = Some(DirectoryResult {
            path: "src".to_string(),
            summary: "Core modules".to_string(),
            features: vec![],
            files_summarized: 0,
            summarized_at: Utc::now(),
        });
        assert!(record.is_complete());
    }

    #[test]
    fn test_analysis_serialization_omits_empty_endpoints() {
        let analysis = RepositoryAnalysis {
            overview: "A widget".to_string(),
            features: vec![],
            architecture: "Single crate".to_string(),
            dependencies: vec!["serde".to_string()],
            endpoints: None,
            generated_at: Utc::now(),
        };

        let json = serde_json::to_string(&analysis).unwrap();
        assert!(!json.contains("endpoints"));
    }
}
