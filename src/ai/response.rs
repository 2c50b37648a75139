//! Model response parsing
//!
//! Responses are expected to be a single JSON object but arrive with the
//! usual decorations (markdown fences, leading prose), so extraction is
//! tolerant before strict deserialization kicks in.

use chrono::Utc;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{DirectoryResult, Feature, FileResult, RepositoryAnalysis};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Response has no result for file {path}")]
    MissingFile { path: String },
}

/// Pulls the JSON object out of a possibly decorated response
pub fn extract_json_from_response(response: &str) -> Result<String, ParseError> {
    let trimmed = response.trim();

    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Ok(trimmed.to_string());
    }

    if trimmed.contains("```") {
        if let Some(json) = extract_from_markdown_block(trimmed) {
            return Ok(json);
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            return Ok(trimmed[start..=end].to_string());
        }
    }

    Err(ParseError::InvalidJson(
        "No JSON object found in response".to_string(),
    ))
}

fn extract_from_markdown_block(text: &str) -> Option<String> {
    let re = Regex::new(r"```(?:json)?\s*\n?([\s\S]*?)\n?```").ok()?;
    let captures = re.captures(text)?;
    let json = captures.get(1)?.as_str().trim();

    if json.starts_with('{') && json.ends_with('}') {
        Some(json.to_string())
    } else {
        None
    }
}

fn deserialize<'a, T: Deserialize<'a>>(json: &'a str) -> Result<T, ParseError> {
    serde_json::from_str(json).map_err(|e| {
        warn!("JSON parse error: {}", e);
        ParseError::InvalidJson(format!(
            "{}: {}",
            e,
            json.chars().take(120).collect::<String>()
        ))
    })
}

#[derive(Debug, Deserialize)]
struct WireFileResult {
    path: Option<String>,
    language: Option<String>,
    summary: Option<String>,
    #[serde(default)]
    features: Option<Vec<String>>,
    #[serde(default)]
    exports: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct WireDirectoryResult {
    summary: Option<String>,
    #[serde(default)]
    features: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WireUnitResponse {
    #[serde(default)]
    files: Vec<WireFileResult>,
    directory: Option<WireDirectoryResult>,
}

/// Parses the combined per-unit response
///
/// Every path in `expected_paths` must have a result; entries for unknown
/// paths are dropped with a warning.
pub fn parse_unit_response(
    response: &str,
    directory: &str,
    expected_paths: &[String],
) -> Result<(Vec<FileResult>, DirectoryResult), ParseError> {
    let json = extract_json_from_response(response)?;
    let wire: WireUnitResponse = deserialize(&json)?;

    let now = Utc::now();
    let mut files = Vec::with_capacity(expected_paths.len());

    for expected in expected_paths {
        let entry = wire
            .files
            .iter()
            .find(|f| f.path.as_deref() == Some(expected.as_str()))
            .ok_or_else(|| ParseError::MissingFile {
                path: expected.clone(),
            })?;

        files.push(FileResult {
            path: expected.clone(),
            language: entry.language.clone().filter(|l| !l.is_empty()),
            summary: entry
                .summary
                .clone()
                .ok_or_else(|| ParseError::MissingField(format!("files[{}].summary", expected)))?,
            features: entry.features.clone().filter(|f| !f.is_empty()),
            exports: entry.exports.clone().filter(|e| !e.is_empty()),
            summarized_at: now,
        });
    }

    let unknown = wire
        .files
        .iter()
        .filter(|f| {
            f.path
                .as_deref()
                .map(|p| !expected_paths.iter().any(|e| e == p))
                .unwrap_or(true)
        })
        .count();
    if unknown > 0 {
        warn!(unknown, directory, "Dropping results for unrequested paths");
    }

    let wire_dir = wire
        .directory
        .ok_or_else(|| ParseError::MissingField("directory".to_string()))?;

    let directory_result = DirectoryResult {
        path: directory.to_string(),
        summary: wire_dir
            .summary
            .ok_or_else(|| ParseError::MissingField("directory.summary".to_string()))?,
        features: wire_dir.features,
        files_summarized: files.len(),
        summarized_at: now,
    };

    debug!(
        directory,
        files = files.len(),
        "Parsed unit summarization response"
    );

    Ok((files, directory_result))
}

/// Parses a standalone directory-summary response
pub fn parse_directory_response(
    response: &str,
    directory: &str,
    files_summarized: usize,
) -> Result<DirectoryResult, ParseError> {
    let json = extract_json_from_response(response)?;
    let wire: WireDirectoryResult = deserialize(&json)?;

    Ok(DirectoryResult {
        path: directory.to_string(),
        summary: wire
            .summary
            .ok_or_else(|| ParseError::MissingField("summary".to_string()))?,
        features: wire.features,
        files_summarized,
        summarized_at: Utc::now(),
    })
}

#[derive(Debug, Deserialize)]
struct WireFeature {
    name: Option<String>,
    description: Option<String>,
    #[serde(default, alias = "relatedFiles")]
    related_files: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WireRepositoryAnalysis {
    overview: Option<String>,
    #[serde(default)]
    features: Vec<WireFeature>,
    architecture: Option<String>,
    #[serde(default)]
    dependencies: Vec<String>,
    #[serde(default)]
    endpoints: Option<Vec<String>>,
}

/// Parses the final repository-synthesis response
pub fn parse_repository_response(response: &str) -> Result<RepositoryAnalysis, ParseError> {
    let json = extract_json_from_response(response)?;
    let wire: WireRepositoryAnalysis = deserialize(&json)?;

    let features = wire
        .features
        .into_iter()
        .filter_map(|f| {
            let name = f.name?;
            Some(Feature {
                name,
                description: f.description.unwrap_or_default(),
                related_files: f.related_files,
            })
        })
        .collect();

    Ok(RepositoryAnalysis {
        overview: wire
            .overview
            .ok_or_else(|| ParseError::MissingField("overview".to_string()))?,
        features,
        architecture: wire
            .architecture
            .ok_or_else(|| ParseError::MissingField("architecture".to_string()))?,
        dependencies: wire.dependencies,
        endpoints: wire.endpoints.filter(|e| !e.is_empty()),
        generated_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT_RESPONSE: &str = r#"{
        "files": [
            {"path": "src/a.rs", "language": "Rust", "summary": "Defines a.", "features": ["math"], "exports": ["a"]},
            {"path": "src/b.rs", "language": "Rust", "summary": "Defines b."}
        ],
        "directory": {"summary": "Core sources.", "features": ["math"]}
    }"#;

    #[test]
    fn test_extract_plain_json() {
        let json = extract_json_from_response(r#"  {"a": 1}  "#).unwrap();
        assert_eq!(json, r#"{"a": 1}"#);
    }

    #[test]
    fn test_extract_from_fenced_block() {
        let response = "Here you go:\n```json\n{\"a\": 1}\n```\nDone.";
        let json = extract_json_from_response(response).unwrap();
        assert_eq!(json, r#"{"a": 1}"#);
    }

    #[test]
    fn test_extract_embedded_object() {
        let response = "The result is {\"a\": 1} as requested.";
        let json = extract_json_from_response(response).unwrap();
        assert_eq!(json, r#"{"a": 1}"#);
    }

    #[test]
    fn test_extract_rejects_no_json() {
        assert!(extract_json_from_response("no json here").is_err());
    }

    #[test]
    fn test_parse_unit_response() {
        let expected = vec!["src/a.rs".to_string(), "src/b.rs".to_string()];
        let (files, dir) = parse_unit_response(UNIT_RESPONSE, "src", &expected).unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path, "src/a.rs");
        assert_eq!(files[0].language.as_deref(), Some("Rust"));
        assert_eq!(files[0].exports.as_deref(), Some(&["a".to_string()][..]));
        assert!(files[1].features.is_none());

        assert_eq!(dir.path, "src");
        assert_eq!(dir.summary, "Core sources.");
        assert_eq!(dir.files_summarized, 2);
    }

    #[test]
    fn test_parse_unit_response_missing_file() {
        let expected = vec!["src/a.rs".to_string(), "src/missing.rs".to_string()];
        let result = parse_unit_response(UNIT_RESPONSE, "src", &expected);

        assert!(matches!(result, Err(ParseError::MissingFile { path }) if path == "src/missing.rs"));
    }

    #[test]
    fn test_parse_unit_response_drops_unrequested_paths() {
        let expected = vec!["src/a.rs".to_string()];
        let (files, _) = parse_unit_response(UNIT_RESPONSE, "src", &expected).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_parse_directory_response() {
        let response = r#"{"summary": "Root files.", "features": ["cli"]}"#;
        let dir = parse_directory_response(response, "", 4).unwrap();

        assert_eq!(dir.path, "");
        assert_eq!(dir.files_summarized, 4);
        assert_eq!(dir.features, vec!["cli".to_string()]);
    }

    #[test]
    fn test_parse_repository_response() {
        let response = r#"{
            "overview": "A widget library.",
            "features": [{"name": "Widgets", "description": "Draws widgets.", "relatedFiles": ["src/a.rs"]}],
            "architecture": "Single crate.",
            "dependencies": ["serde"],
            "endpoints": []
        }"#;

        let analysis = parse_repository_response(response).unwrap();

        assert_eq!(analysis.overview, "A widget library.");
        assert_eq!(analysis.features.len(), 1);
        assert_eq!(analysis.features[0].related_files, vec!["src/a.rs"]);
        // Empty endpoint list collapses to none
        assert!(analysis.endpoints.is_none());
    }

    #[test]
    fn test_parse_repository_response_missing_overview() {
        let response = r#"{"architecture": "Layers."}"#;
        assert!(matches!(
            parse_repository_response(response),
            Err(ParseError::MissingField(f)) if f == "overview"
        ));
    }
}
