//! Terminal progress bar handler

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use super::handler::{ProgressEvent, ProgressHandler};

/// Renders progress events as an indicatif bar on stderr
///
/// Starts as a spinner until the plan is known, then becomes a bar with one
/// tick per work unit.
pub struct BarHandler {
    bar: ProgressBar,
}

impl BarHandler {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    fn switch_to_bar(&self, total: u64) {
        self.bar.disable_steady_tick();
        self.bar.set_length(total);
        self.bar.set_position(0);
        self.bar.set_style(
            ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
    }
}

impl Default for BarHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressHandler for BarHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::AnalysisStarted { locator } => {
                self.bar.set_message(format!("Planning analysis of {}", locator));
            }
            ProgressEvent::PlanReady {
                total_files,
                batch_count,
            } => {
                self.switch_to_bar(*batch_count as u64);
                self.bar
                    .set_message(format!("{} files in {} units", total_files, batch_count));
            }
            ProgressEvent::UnitStarted { directory, .. } => {
                let shown = if directory.is_empty() {
                    "<root>"
                } else {
                    directory.as_str()
                };
                self.bar.set_message(format!("Summarizing {}", shown));
            }
            ProgressEvent::UnitFinished { skipped, .. } => {
                self.bar.inc(1);
                if *skipped {
                    self.bar.set_message("Already done, skipped");
                }
            }
            ProgressEvent::SynthesisStarted { .. } => {
                self.bar.set_message("Synthesizing repository analysis");
            }
            ProgressEvent::Completed { total_files } => {
                self.bar
                    .finish_with_message(format!("Analyzed {} files", total_files));
            }
            ProgressEvent::Failed { error } => {
                self.bar.abandon_with_message(format!("Failed: {}", error));
            }
        }
    }
}
