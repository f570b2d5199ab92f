mod report;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgGroup, Args, Parser, Subcommand};
use clinical_audit::{
    create_backend, AnalysisOrchestrator, BackendKind, InputNormalizer, OracleConfig, Phase, SchemaContract,
    Submission,
};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use logger_redacted::{init_tracing, LoggerConfig};
use tracing::debug;

/// CLARA clinical logic auditor
#[derive(Parser, Debug)]
#[command(name = "clara", version)]
#[command(about = "Audit doctor-patient consultations for cognitive biases in clinical reasoning")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze one consultation recording or transcript
    Analyze(AnalyzeArgs),
    /// Print the response schema sent to the reasoning oracle
    Schema,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("input").required(true).args(["audio", "transcript", "text"])))]
struct AnalyzeArgs {
    /// Audio recording of the consultation
    #[arg(long, value_name = "FILE")]
    audio: Option<PathBuf>,

    /// Plain-text transcript file
    #[arg(long, value_name = "FILE")]
    transcript: Option<PathBuf>,

    /// Transcript given inline
    #[arg(long)]
    text: Option<String>,

    /// Display name for the consultation
    #[arg(long)]
    title: Option<String>,

    /// Analyze through a running clara-server instead of calling the oracle directly
    #[arg(long, env = "CLARA_GATEWAY_URL", value_name = "URL")]
    gateway_url: Option<String>,

    /// Print the raw audit document instead of the report
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut logger = LoggerConfig::from_env(cli.verbose);
    if !cli.verbose {
        logger.log_level = "warn".to_string();
    }
    init_tracing(&logger, &["clara_cli", "clinical_audit"])?;

    match cli.command {
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(SchemaContract::response_schema())?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Analyze(args) => analyze(args).await,
    }
}

async fn build_submission(args: &AnalyzeArgs) -> Result<Submission> {
    let submission = if let Some(path) = &args.audio {
        Submission::audio_file(path)
    } else if let Some(path) = &args.transcript {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read transcript {}", path.display()))?;
        let label = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
        Submission::transcript(text).with_label(label)
    } else if let Some(text) = &args.text {
        Submission::transcript(text.clone())
    } else {
        anyhow::bail!("one of --audio, --transcript or --text is required");
    };

    Ok(match &args.title {
        Some(title) => submission.with_label(title.clone()),
        None => submission,
    })
}

fn spinner() -> Result<ProgressBar> {
    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg}")?);
    bar.enable_steady_tick(Duration::from_millis(120));
    Ok(bar)
}

async fn analyze(args: AnalyzeArgs) -> Result<ExitCode> {
    let config = OracleConfig::from_env().context("Invalid oracle configuration")?;
    let normalizer = InputNormalizer::new(config.max_audio_bytes);
    let kind = match &args.gateway_url {
        Some(base_url) => BackendKind::Remote {
            base_url: base_url.clone(),
        },
        None => BackendKind::Direct,
    };
    let backend = create_backend(&kind, config)?;
    let submission = build_submission(&args).await?;

    let mut orchestrator = AnalysisOrchestrator::new(backend, normalizer);
    debug!(backend = orchestrator.backend_name(), "Backend selected");

    let progress = spinner()?;
    let mut updates = orchestrator.subscribe();
    let watcher = {
        let progress = progress.clone();
        tokio::spawn(async move {
            let mut last = Phase::Idle;
            while updates.changed().await.is_ok() {
                let phase = updates.borrow_and_update().phase();
                if phase != last {
                    progress.println(format!("{} {}", "→".bright_blue(), phase.status_label()));
                    progress.set_message(phase.status_label());
                    last = phase;
                }
            }
        })
    };

    let session = orchestrator.run(submission).await?;
    // Dropping the orchestrator closes the snapshot channel and ends the watcher.
    drop(orchestrator);
    watcher.await.ok();
    progress.finish_and_clear();

    if args.json {
        if let Some(result) = session.result() {
            println!("{}", serde_json::to_string_pretty(result)?);
        } else {
            eprintln!("{}", session.failure_reason().unwrap_or_default().red());
        }
    } else {
        print!("{}", report::render(&session));
    }

    Ok(if session.phase() == Phase::Failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
