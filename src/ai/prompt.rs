//! Prompt construction for the summarization calls
//!
//! Each builder produces a single user prompt instructing the model to
//! respond with one JSON object matching the shapes `response.rs` parses.

use super::summarizer::{DirectoryRequest, RepositoryRequest, UnitRequest};

pub const SYSTEM_PROMPT: &str = "You are an expert software engineer analyzing a source code \
    repository. Respond with valid JSON only, no prose outside the JSON object.";

pub struct PromptBuilder;

impl PromptBuilder {
    /// Prompt for the combined per-unit call: one result per file plus the
    /// directory summary
    pub fn build_unit_prompt(request: &UnitRequest) -> String {
        let directory = display_directory(&request.directory);

        let mut files_section = String::new();
        for file in &request.files {
            files_section.push_str(&format!(
                "### FILE: {}\n```\n{}\n```\n\n",
                file.path, file.content
            ));
        }

        format!(
            r#"Analyze every file of the directory `{directory}` in a {technology} repository.

{files_section}Respond with a single JSON object:
{{
  "files": [
    {{
      "path": "<exact path as given>",
      "language": "<programming language or null>",
      "summary": "<2-3 sentence summary of what the file does>",
      "features": ["<user-facing feature this file contributes to>"],
      "exports": ["<notable exported function/class/type>"]
    }}
  ],
  "directory": {{
    "summary": "<2-4 sentence summary of the directory's role>",
    "features": ["<feature implemented in this directory>"]
  }}
}}

Include exactly one entry in "files" for every file shown above, using the exact path."#,
            directory = directory,
            technology = request.technology.technology,
            files_section = files_section,
        )
    }

    /// Prompt for deriving a directory summary from existing file results
    pub fn build_directory_prompt(request: &DirectoryRequest) -> String {
        let directory = display_directory(&request.directory);

        let mut results_section = String::new();
        for file in &request.files {
            results_section.push_str(&format!("- {}: {}\n", file.path, file.summary));
        }

        format!(
            r#"The files of directory `{directory}` in a {technology} repository were summarized as:

{results_section}
Respond with a single JSON object:
{{
  "summary": "<2-4 sentence summary of the directory's role>",
  "features": ["<feature implemented in this directory>"]
}}"#,
            directory = directory,
            technology = request.technology.technology,
            results_section = results_section,
        )
    }

    /// Prompt for the final repository synthesis
    pub fn build_repository_prompt(request: &RepositoryRequest) -> String {
        let mut directories_section = String::new();
        for dir in &request.directories {
            directories_section.push_str(&format!(
                "### {}\n{}\n",
                display_directory(&dir.path),
                dir.summary
            ));
            if !dir.features.is_empty() {
                directories_section
                    .push_str(&format!("Features: {}\n", dir.features.join(", ")));
            }
            directories_section.push('\n');
        }

        let config_section = match (
            &request.technology.config_path,
            &request.technology.config_content,
        ) {
            (Some(path), Some(content)) => {
                format!("### Project configuration ({})\n```\n{}\n```\n\n", path, content)
            }
            _ => String::new(),
        };

        format!(
            r#"Synthesize a complete analysis of the repository `{locator}`.
Technology: {technology}. Target platforms: {platforms}.

{config_section}## Directory summaries

{directories_section}Respond with a single JSON object:
{{
  "overview": "<narrative overview of what the repository does>",
  "features": [
    {{
      "name": "<feature name>",
      "description": "<what it does>",
      "relatedFiles": ["<paths most relevant to this feature>"]
    }}
  ],
  "architecture": "<narrative describing structure and data flow>",
  "dependencies": ["<external libraries and services used>"],
  "endpoints": ["<API endpoint, if the repository exposes any>"]
}}

Omit "endpoints" if the repository exposes no API."#,
            locator = request.repo.locator,
            technology = request.technology.technology,
            platforms = if request.technology.platforms.is_empty() {
                "unknown".to_string()
            } else {
                request.technology.platforms.join(", ")
            },
            config_section = config_section,
            directories_section = directories_section,
        )
    }
}

fn display_directory(path: &str) -> &str {
    if path.is_empty() {
        "(repository root)"
    } else {
        path
    }
}
