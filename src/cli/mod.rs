pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{AnalyzeArgs, CleanArgs, CliArgs, Commands, PlanArgs, StatusArgs};
pub use output::{OutputFormat, OutputFormatter};
