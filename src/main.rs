use repolens::cli::commands::{CliArgs, Commands};
use repolens::cli::handlers::{handle_analyze, handle_clean, handle_plan, handle_status};
use repolens::util::{init_logging, parse_level, LoggingConfig};
use repolens::VERSION;

use clap::Parser;
use std::env;
use tracing::{debug, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("repolens v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Analyze(analyze_args) => handle_analyze(analyze_args, args.quiet).await,
        Commands::Plan(plan_args) => handle_plan(plan_args).await,
        Commands::Status(status_args) => handle_status(status_args).await,
        Commands::Clean(clean_args) => handle_clean(clean_args).await,
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let level = if let Some(level_str) = &args.log_level {
        parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        let level_str = env::var("REPOLENS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        parse_level(&level_str)
    };

    init_logging(LoggingConfig::with_level(level));
}
