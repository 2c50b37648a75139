//! Output formatting for analysis, plan, and status reports
//!
//! Each report renders as JSON, YAML, or human-readable text with a
//! consistent structure across formats.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{PlanState, RepositoryAnalysis, StepUsage, WorkUnit};

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format (human-friendly, version-control friendly)
    Yaml,
    /// Human-readable formatted text
    Human,
}

/// The full result of an analyze run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub locator: String,
    pub technology: String,
    pub platforms: Vec<String>,
    pub total_files: usize,
    pub batch_count: usize,
    pub analysis: RepositoryAnalysis,
    pub search_text: String,
    pub usage: StepUsage,
}

/// The batch plan a repository would be analyzed with
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanReport {
    pub technology: String,
    pub total_files: usize,
    pub total_directories: usize,
    pub units: Vec<WorkUnit>,
}

/// The stored state of a previous run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub locator: String,
    pub phase: String,
    pub technology: String,
    pub processed_files: usize,
    pub total_files: usize,
    pub current_unit: usize,
    pub batch_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl StatusReport {
    pub fn from_state(state: &PlanState) -> Self {
        Self {
            locator: state.repo.locator.clone(),
            phase: state.phase.to_string(),
            technology: state.technology.technology.clone(),
            processed_files: state.processed_files,
            total_files: state.total_files,
            current_unit: state.current_unit,
            batch_count: state.batch_count(),
            error: state.error.clone(),
            updated_at: state.updated_at,
        }
    }
}

/// Output formatter for CLI reports
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_analysis(&self, report: &AnalysisReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(report),
            OutputFormat::Yaml => to_yaml(report),
            OutputFormat::Human => Ok(self.format_analysis_human(report)),
        }
    }

    pub fn format_plan(&self, report: &PlanReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(report),
            OutputFormat::Yaml => to_yaml(report),
            OutputFormat::Human => Ok(self.format_plan_human(report)),
        }
    }

    pub fn format_status(&self, report: &StatusReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(report),
            OutputFormat::Yaml => to_yaml(report),
            OutputFormat::Human => Ok(self.format_status_human(report)),
        }
    }

    fn format_analysis_human(&self, report: &AnalysisReport) -> String {
        let mut output = String::new();

        output.push_str("\u{2713} Repository Analysis\n");
        output.push_str(&rule());

        output.push_str(&format!("Repository:  {}\n", report.locator));
        output.push_str(&format!("Technology:  {}\n", report.technology));
        if !report.platforms.is_empty() {
            output.push_str(&format!("Platforms:   {}\n", report.platforms.join(", ")));
        }
        output.push_str(&format!(
            "Scope:       {} files in {} units\n\n",
            report.total_files, report.batch_count
        ));

        output.push_str("Overview:\n");
        output.push_str(&format!("{}\n\n", report.analysis.overview));

        output.push_str("Architecture:\n");
        output.push_str(&format!("{}\n\n", report.analysis.architecture));

        if !report.analysis.features.is_empty() {
            output.push_str("Features:\n");
            for (i, feature) in report.analysis.features.iter().enumerate() {
                let is_last = i == report.analysis.features.len() - 1;
                let connector = if is_last { "\u{2514}" } else { "\u{251C}" };
                output.push_str(&format!(
                    "{}\u{2500} {}: {}\n",
                    connector, feature.name, feature.description
                ));
            }
            output.push('\n');
        }

        if !report.analysis.dependencies.is_empty() {
            output.push_str(&format!(
                "Dependencies: {}\n",
                report.analysis.dependencies.join(", ")
            ));
        }
        if let Some(ref endpoints) = report.analysis.endpoints {
            output.push_str(&format!("Endpoints:    {}\n", endpoints.join(", ")));
        }

        output.push_str(&format!(
            "\nUsage: {} AI calls, {} input + {} output tokens, ${:.4}\n",
            report.usage.ai_calls,
            report.usage.input_tokens,
            report.usage.output_tokens,
            report.usage.cost_usd
        ));

        output
    }

    fn format_plan_human(&self, report: &PlanReport) -> String {
        let mut output = String::new();

        output.push_str("Batch Plan\n");
        output.push_str(&rule());

        output.push_str(&format!("Technology:  {}\n", report.technology));
        output.push_str(&format!(
            "Scope:       {} files, {} directories, {} units\n\n",
            report.total_files,
            report.total_directories,
            report.units.len()
        ));

        for (index, unit) in report.units.iter().enumerate() {
            let shown = if unit.directory.is_empty() {
                "<root>"
            } else {
                unit.directory.as_str()
            };
            output.push_str(&format!(
                "Unit {:>3}: {} ({} files)\n",
                index,
                shown,
                unit.files.len()
            ));
        }

        output
    }

    fn format_status_human(&self, report: &StatusReport) -> String {
        let mut output = String::new();

        output.push_str("Run Status\n");
        output.push_str(&rule());

        output.push_str(&format!("Repository:  {}\n", report.locator));
        output.push_str(&format!("Phase:       {}\n", report.phase));
        output.push_str(&format!("Technology:  {}\n", report.technology));
        output.push_str(&format!(
            "Progress:    {}/{} files, unit {}/{}\n",
            report.processed_files, report.total_files, report.current_unit, report.batch_count
        ));
        output.push_str(&format!("Updated:     {}\n", report.updated_at.to_rfc3339()));
        if let Some(ref error) = report.error {
            output.push_str(&format!("\n\u{26A0} Last error: {}\n", error));
        }

        output
    }
}

fn rule() -> String {
    format!("{}\n\n", "\u{2501}".repeat(42))
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize report to JSON")
}

fn to_yaml<T: Serialize>(value: &T) -> Result<String> {
    serde_yaml::to_string(value).context("Failed to serialize report to YAML")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Feature;

    fn sample_report() -> AnalysisReport {
        AnalysisReport {
            locator: "acme/widget".to_string(),
            technology: "Rust".to_string(),
            platforms: vec!["Linux".to_string()],
            total_files: 12,
            batch_count: 4,
            analysis: RepositoryAnalysis {
                overview: "A widget service".to_string(),
                features: vec![Feature {
                    name: "Widgets".to_string(),
                    description: "CRUD for widgets".to_string(),
                    related_files: vec!["src/widgets.rs".to_string()],
                }],
                architecture: "Single binary".to_string(),
                dependencies: vec!["serde".to_string()],
                endpoints: None,
                generated_at: Utc::now(),
            },
            search_text: "acme/widget\nRust".to_string(),
            usage: StepUsage::default(),
        }
    }

    #[test]
    fn test_json_format_is_valid() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let output = formatter.format_analysis(&sample_report()).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["locator"], "acme/widget");
        assert_eq!(parsed["batchCount"], 4);
    }

    #[test]
    fn test_yaml_format_round_trips() {
        let formatter = OutputFormatter::new(OutputFormat::Yaml);
        let output = formatter.format_analysis(&sample_report()).unwrap();
        assert!(output.contains("locator: acme/widget"));
    }

    #[test]
    fn test_human_format_sections() {
        let formatter = OutputFormatter::new(OutputFormat::Human);
        let output = formatter.format_analysis(&sample_report()).unwrap();

        assert!(output.contains("Repository:  acme/widget"));
        assert!(output.contains("Overview:"));
        assert!(output.contains("Widgets: CRUD for widgets"));
    }

    #[test]
    fn test_plan_human_shows_root_marker() {
        let formatter = OutputFormatter::new(OutputFormat::Human);
        let report = PlanReport {
            technology: "Rust".to_string(),
            total_files: 2,
            total_directories: 1,
            units: vec![
                WorkUnit {
                    directory: String::new(),
                    files: vec!["a.rs".to_string()],
                },
                WorkUnit {
                    directory: "src".to_string(),
                    files: vec!["src/b.rs".to_string()],
                },
            ],
        };

        let output = formatter.format_plan(&report).unwrap();
        assert!(output.contains("<root>"));
        assert!(output.contains("src"));
    }

    #[test]
    fn test_status_shows_error_when_present() {
        let formatter = OutputFormatter::new(OutputFormat::Human);
        let report = StatusReport {
            locator: "acme/widget".to_string(),
            phase: "failed".to_string(),
            technology: "Rust".to_string(),
            processed_files: 3,
            total_files: 12,
            current_unit: 1,
            batch_count: 4,
            error: Some("model unreachable".to_string()),
            updated_at: Utc::now(),
        };

        let output = formatter.format_status(&report).unwrap();
        assert!(output.contains("model unreachable"));
    }
}
