use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// AI-powered repository analysis pipeline
#[derive(Parser, Debug)]
#[command(
    name = "repolens",
    about = "AI-powered repository analysis pipeline",
    version,
    author,
    long_about = "repolens walks a repository, partitions its files into per-directory \
                  work units, summarizes each unit with an OpenAI-compatible model, and \
                  aggregates the results bottom-up into a repository-level analysis. \
                  Interrupted runs resume from the persisted per-unit results."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Verbose output (debug logging)")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Analyze a repository end to end",
        long_about = "Plans, processes every work unit, and synthesizes the final analysis.\n\n\
                      Examples:\n  \
                      repolens analyze\n  \
                      repolens analyze /path/to/repo\n  \
                      repolens analyze --format json\n  \
                      repolens analyze --endpoint http://localhost:11434 --model qwen2.5-coder:7b"
    )]
    Analyze(AnalyzeArgs),

    #[command(
        about = "Show the batch plan without calling the model",
        long_about = "Filters the file inventory and prints the work-unit partition.\n\n\
                      Examples:\n  \
                      repolens plan\n  \
                      repolens plan /path/to/repo --format yaml"
    )]
    Plan(PlanArgs),

    #[command(about = "Show the stored state of a previous run")]
    Status(StatusArgs),

    #[command(about = "Delete the stored state and results of a previous run")]
    Clean(CleanArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct AnalyzeArgs {
    #[arg(
        value_name = "PATH",
        help = "Path to repository (defaults to current directory)"
    )]
    pub path: Option<PathBuf>,

    #[arg(
        long,
        value_name = "LOCATOR",
        help = "Repository identifier used for storage (defaults to the directory name)"
    )]
    pub locator: Option<String>,

    #[arg(
        long,
        value_name = "SUBPATH",
        help = "Analyze only this subdirectory of the repository"
    )]
    pub subpath: Option<String>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(long, value_name = "URL", help = "OpenAI-compatible endpoint URL")]
    pub endpoint: Option<String>,

    #[arg(short = 'm', long, value_name = "MODEL", help = "Model name to use")]
    pub model: Option<String>,

    #[arg(long, value_name = "SECONDS", help = "Request timeout in seconds")]
    pub timeout: Option<u64>,

    #[arg(long, value_name = "DIR", help = "Directory for persisted run state")]
    pub store_dir: Option<PathBuf>,

    #[arg(long, help = "Discard any previous results and start fresh")]
    pub no_resume: bool,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write output to file instead of stdout"
    )]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct PlanArgs {
    #[arg(
        value_name = "PATH",
        help = "Path to repository (defaults to current directory)"
    )]
    pub path: Option<PathBuf>,

    #[arg(
        long,
        value_name = "SUBPATH",
        help = "Plan only this subdirectory of the repository"
    )]
    pub subpath: Option<String>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct StatusArgs {
    #[arg(
        value_name = "PATH",
        help = "Path to repository (defaults to current directory)"
    )]
    pub path: Option<PathBuf>,

    #[arg(long, value_name = "LOCATOR", help = "Repository identifier")]
    pub locator: Option<String>,

    #[arg(long, value_name = "DIR", help = "Directory for persisted run state")]
    pub store_dir: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct CleanArgs {
    #[arg(
        value_name = "PATH",
        help = "Path to repository (defaults to current directory)"
    )]
    pub path: Option<PathBuf>,

    #[arg(long, value_name = "LOCATOR", help = "Repository identifier")]
    pub locator: Option<String>,

    #[arg(long, value_name = "DIR", help = "Directory for persisted run state")]
    pub store_dir: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
