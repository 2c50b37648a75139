//! Tracing-backed progress handler

use tracing::{error, info};

use super::handler::{ProgressEvent, ProgressHandler};

/// Emits each progress event as a structured log line
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::AnalysisStarted { locator } => {
                info!(locator = %locator, "Analysis started");
            }
            ProgressEvent::PlanReady {
                total_files,
                batch_count,
            } => {
                info!(total_files, batch_count, "Plan ready");
            }
            ProgressEvent::UnitStarted {
                unit_index,
                directory,
            } => {
                info!(unit_index, directory = %display_dir(directory), "Unit started");
            }
            ProgressEvent::UnitFinished {
                unit_index,
                directory,
                files_summarized,
                skipped,
            } => {
                info!(
                    unit_index,
                    directory = %display_dir(directory),
                    files_summarized,
                    skipped,
                    "Unit finished"
                );
            }
            ProgressEvent::SynthesisStarted { directories } => {
                info!(directories, "Final synthesis started");
            }
            ProgressEvent::Completed { total_files } => {
                info!(total_files, "Analysis completed");
            }
            ProgressEvent::Failed { error } => {
                error!(error = %error, "Analysis failed");
            }
        }
    }
}

fn display_dir(directory: &str) -> &str {
    if directory.is_empty() {
        "<root>"
    } else {
        directory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_handler_does_not_panic() {
        let handler = LoggingHandler;
        handler.on_progress(&ProgressEvent::UnitFinished {
            unit_index: 1,
            directory: String::new(),
            files_summarized: 2,
            skipped: false,
        });
        handler.on_progress(&ProgressEvent::Failed {
            error: "boom".to_string(),
        });
    }
}
