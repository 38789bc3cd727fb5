//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Report, Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use skinscan_analyzer::{HttpAnalyzer, normalize};
use skinscan_core::{BlobPublisher, Orchestrator, ProgressReporter, Stage};
use skinscan_shared::{
    AnalysisResult, AppConfig, PublishConfig, SessionId, SkinScanError, SourceFile, init_config,
    load_config,
};

use crate::report;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// skinscan: upload a face photo and get a skin analysis report.
#[derive(Parser)]
#[command(
    name = "skinscan",
    version,
    about = "Upload a face photo to object storage and run a remote skin analysis.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Upload an image and analyze it.
    Analyze {
        /// Image file to analyze.
        file: PathBuf,

        /// Declared media type (guessed from the extension by default).
        #[arg(long)]
        media_type: Option<String>,

        /// Print the canonical result as JSON instead of the report.
        #[arg(long)]
        json: bool,
    },

    /// Normalize a saved analyzer response without uploading anything.
    Normalize {
        /// JSON file holding the analyzer response (array or single payload).
        payload: PathBuf,

        /// Print the canonical result as JSON instead of the report.
        #[arg(long)]
        json: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "skinscan=info",
        1 => "skinscan=debug",
        _ => "skinscan=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so `--json` output stays clean.
    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Analyze {
            file,
            media_type,
            json,
        } => cmd_analyze(&file, media_type, json).await,
        Command::Normalize { payload, json } => cmd_normalize(&payload, json).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_analyze(file: &Path, media_type: Option<String>, json: bool) -> Result<()> {
    let config = load_config()?;

    let bytes = tokio::fs::read(file)
        .await
        .map_err(|e| SkinScanError::io(file, e))?;
    let media_type = media_type.unwrap_or_else(|| {
        mime_guess::from_path(file)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    });
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    info!(file = %file.display(), %media_type, "analyzing image");

    let store = skinscan_storage::create_store(&config).await?;
    let publisher = BlobPublisher::new(store, PublishConfig::from(&config));
    let analyzer = HttpAnalyzer::from_config(&config.analyzer)?;

    let reporter = Arc::new(CliProgress::new());
    let orchestrator = Orchestrator::new(publisher, Arc::new(analyzer)).with_progress(reporter.clone());

    let outcome = orchestrator
        .select_file(SourceFile::new(name, media_type, bytes))
        .await;
    reporter.finish();

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            let message = orchestrator
                .view()
                .error
                .unwrap_or_else(|| e.user_message());
            return Err(Report::new(e).wrap_err(message));
        }
    };

    let image = orchestrator.view().remote_address;
    print_result(&result, image.as_deref(), json)
}

async fn cmd_normalize(payload: &Path, json: bool) -> Result<()> {
    let content = tokio::fs::read_to_string(payload)
        .await
        .map_err(|e| SkinScanError::io(payload, e))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| eyre!("invalid JSON in {}: {e}", payload.display()))?;

    // Accept a saved endpoint response as well as a bare payload.
    let value = match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .next()
            .ok_or_else(|| eyre!("{} holds an empty result list", payload.display()))?,
        other => other,
    };

    let result = normalize(value)?;
    print_result(&result, None, json)
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

fn print_result(result: &AnalysisResult, image: Option<&str>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        print!("{}", report::render(result, image));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliProgress {
    fn stage(&self, _session: SessionId, stage: Stage) {
        let message = match stage {
            Stage::Validating => "Checking image",
            Stage::Uploading => "Uploading",
            Stage::Uploaded => "Uploaded",
            Stage::Analyzing => "Analyzing skin",
            Stage::Complete => "Done",
            Stage::Idle | Stage::Failed(_) => return,
        };
        self.spinner
            .set_message(format!("[{:>3}%] {message}", stage.progress_percent()));
    }

    fn published(&self, _session: SessionId, remote_address: &str) {
        self.spinner.println(format!("  Image: {remote_address}"));
    }

    fn failed(&self, _session: SessionId, _error: &SkinScanError) {
        self.spinner.finish_and_clear();
    }

    fn done(&self, _session: SessionId, _result: &AnalysisResult) {
        self.spinner.finish_and_clear();
    }
}
