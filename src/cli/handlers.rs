//! Command handlers
//!
//! Each handler wires the pipeline's collaborators, drives the action list
//! like a host engine would (one command per step, adopting the expanded
//! list after init), and renders the result. Handlers return process exit
//! codes; errors are reported on stderr.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use super::commands::{AnalyzeArgs, CleanArgs, PlanArgs, StatusArgs};
use super::output::{AnalysisReport, OutputFormatter, PlanReport, StatusReport};
use crate::ai::OpenAiSummarizer;
use crate::config::RepolensConfig;
use crate::content::{ContentSource, LocalContentSource};
use crate::model::{RepoCoords, StepUsage};
use crate::pipeline::{Pipeline, PipelineContext, StepOutput};
use crate::planner::{BatchPlan, FileFilter};
use crate::progress::{BarHandler, LoggingHandler, NoOpHandler, ProgressHandler};
use crate::store::{AnalysisStore, JsonFileStore};
use crate::taskgraph::{ActionEntry, AnalysisCommand};

pub async fn handle_analyze(args: &AnalyzeArgs, quiet: bool) -> i32 {
    match run_analyze(args, quiet).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            1
        }
    }
}

pub async fn handle_plan(args: &PlanArgs) -> i32 {
    match run_plan(args).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            1
        }
    }
}

pub async fn handle_status(args: &StatusArgs) -> i32 {
    match run_status(args).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            1
        }
    }
}

pub async fn handle_clean(args: &CleanArgs) -> i32 {
    match run_clean(args).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            1
        }
    }
}

async fn run_analyze(args: &AnalyzeArgs, quiet: bool) -> Result<()> {
    let path = resolve_path(args.path.as_deref());
    let repo = resolve_repo(&path, args.locator.as_deref(), args.subpath.as_deref());

    let mut config = RepolensConfig::default();
    if let Some(ref endpoint) = args.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(ref model) = args.model {
        config.model = model.clone();
    }
    if let Some(timeout) = args.timeout {
        config.request_timeout_secs = timeout;
    }
    if let Some(ref store_dir) = args.store_dir {
        config.store_dir = store_dir.clone();
    }

    let content = Arc::new(LocalContentSource::new(&path, config.max_file_bytes));
    let summarizer = Arc::new(OpenAiSummarizer::with_timeout(
        config.endpoint.clone(),
        config.model.clone(),
        config.api_key.clone(),
        std::time::Duration::from_secs(config.request_timeout_secs),
    ));
    let store: Arc<dyn AnalysisStore> = Arc::new(JsonFileStore::new(&config.store_dir));

    if args.no_resume {
        store
            .delete(&repo.storage_key())
            .await
            .context("Failed to discard previous results")?;
    }

    let progress: Arc<dyn ProgressHandler> = if quiet {
        Arc::new(NoOpHandler)
    } else if atty::is(atty::Stream::Stderr) {
        Arc::new(BarHandler::new())
    } else {
        Arc::new(LoggingHandler)
    };

    let pipeline = Pipeline::new(
        PipelineContext::new(content, summarizer, store, config).with_progress(progress),
    );

    let report = drive_analysis(&pipeline, repo).await?;

    let formatter = OutputFormatter::new(args.format.into());
    let rendered = formatter.format_analysis(&report)?;
    emit(&rendered, args.output.as_deref())?;

    Ok(())
}

/// Drives a full run the way a host engine would: execute the entry under
/// the cursor, adopt the expanded list when init returns one, stop after
/// the last entry.
async fn drive_analysis(pipeline: &Pipeline, repo: RepoCoords) -> Result<AnalysisReport> {
    let mut actions = vec![ActionEntry::analysis(
        0,
        AnalysisCommand::Init { repo: repo.clone() },
    )];
    let mut cursor = 0;

    let mut init_output = None;
    let mut summary_output = None;
    let mut usage = StepUsage::default();

    while cursor < actions.len() {
        let Some(command) = actions[cursor].as_analysis().cloned() else {
            debug!(index = cursor, "Skipping host-owned action entry");
            cursor += 1;
            continue;
        };

        match pipeline.execute(&command, &actions, cursor).await? {
            StepOutput::Init {
                output,
                actions: expanded,
            } => {
                init_output = Some(output);
                actions = expanded;
            }
            StepOutput::Process(output) => {
                accumulate(&mut usage, &output.usage);
            }
            StepOutput::Summary(output) => {
                accumulate(&mut usage, &output.usage);
                summary_output = Some(output);
            }
        }
        cursor += 1;
    }

    let init = init_output.context("Run finished without an init result")?;
    let summary = summary_output.context("Run finished without a summary result")?;

    Ok(AnalysisReport {
        locator: repo.locator,
        technology: init.technology,
        platforms: init.platforms,
        total_files: init.total_files,
        batch_count: init.batch_count,
        analysis: summary.analysis,
        search_text: summary.search_text,
        usage,
    })
}

async fn run_plan(args: &PlanArgs) -> Result<()> {
    let path = resolve_path(args.path.as_deref());
    let config = RepolensConfig::default();
    let content = LocalContentSource::new(&path, config.max_file_bytes);

    let subpath = args.subpath.as_deref();
    let technology = content
        .detect_technology(subpath)
        .await
        .context("Failed to detect technology")?;
    let raw_files = content
        .list_files(subpath)
        .await
        .context("Failed to list repository files")?;

    let plan = BatchPlan::build(&raw_files, &FileFilter::default());
    let report = PlanReport {
        technology: technology.technology,
        total_files: plan.files.len(),
        total_directories: plan.directories.len(),
        units: plan.units,
    };

    let formatter = OutputFormatter::new(args.format.into());
    println!("{}", formatter.format_plan(&report)?);
    Ok(())
}

async fn run_status(args: &StatusArgs) -> Result<()> {
    let path = resolve_path(args.path.as_deref());
    let repo = resolve_repo(&path, args.locator.as_deref(), None);
    let store = JsonFileStore::new(store_dir(args.store_dir.as_deref()));

    let versioned = store
        .read_state(&repo.storage_key())
        .await
        .context("Failed to read stored state")?
        .with_context(|| format!("No stored run found for '{}'", repo.locator))?;

    let report = StatusReport::from_state(&versioned.state);
    let formatter = OutputFormatter::new(args.format.into());
    println!("{}", formatter.format_status(&report)?);
    Ok(())
}

async fn run_clean(args: &CleanArgs) -> Result<()> {
    let path = resolve_path(args.path.as_deref());
    let repo = resolve_repo(&path, args.locator.as_deref(), None);
    let store = JsonFileStore::new(store_dir(args.store_dir.as_deref()));

    store
        .delete(&repo.storage_key())
        .await
        .context("Failed to delete stored run")?;

    println!("Removed stored run for '{}'", repo.locator);
    Ok(())
}

fn resolve_path(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Derives repository coordinates from the CLI arguments; the locator
/// defaults to the canonicalized directory name
fn resolve_repo(path: &Path, locator: Option<&str>, subpath: Option<&str>) -> RepoCoords {
    let locator = locator.map(str::to_string).unwrap_or_else(|| {
        path.canonicalize()
            .ok()
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    });

    match subpath {
        Some(sub) => RepoCoords::with_subpath(locator, sub),
        None => RepoCoords::new(locator),
    }
}

fn store_dir(arg: Option<&Path>) -> PathBuf {
    arg.map(Path::to_path_buf)
        .unwrap_or_else(|| RepolensConfig::default().store_dir)
}

fn accumulate(total: &mut StepUsage, step: &StepUsage) {
    total.input_tokens += step.input_tokens;
    total.output_tokens += step.output_tokens;
    total.cost_usd += step.cost_usd;
    total.ai_calls += step.ai_calls;
}

fn emit(rendered: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(file) => std::fs::write(file, rendered)
            .with_context(|| format!("Failed to write output to {}", file.display())),
        None => {
            println!("{}", rendered);
            Ok(())
        }
    }
}
