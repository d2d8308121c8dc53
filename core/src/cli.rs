use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::runner::{self, write_payload};

#[derive(Parser)]
#[command(name = "safe-eval")]
#[command(about = "Run a user script once and print its result as JSON", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides SAFE_EVAL_CONFIG_PATH)
    #[arg(long)]
    pub config: Option<String>,

    /// Directory holding the scope and script files (overrides DATA_DIR)
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Log filter for stderr diagnostics, e.g. "debug"
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Parse process arguments and run one evaluation
pub fn run_cli() -> Result<ExitCode> {
    let cli = Cli::parse();
    run_cli_with_args(cli)
}

/// Run with explicit arguments (first element is the program name)
pub fn run_cli_from_args(args: Vec<String>) -> Result<ExitCode> {
    let cli = Cli::parse_from(args);
    run_cli_with_args(cli)
}

fn run_cli_with_args(cli: Cli) -> Result<ExitCode> {
    // A missing .env is normal
    let _ = dotenvy::dotenv();

    let config = Config::builder()
        .config_path(cli.config.map(PathBuf::from))
        .data_dir(cli.data_dir.map(PathBuf::from))
        .log_level(cli.log_level.clone())
        .build();

    let config = match config {
        Ok(config) => config,
        Err(err) => {
            init_logging(cli.log_level.as_deref().unwrap_or("warn"));
            warn!(error = %err, "Invalid configuration");
            emit(&json!({ "error": format!("Invalid configuration: {}", err) }))?;
            return Ok(ExitCode::FAILURE);
        }
    };

    init_logging(&config.log_level);
    debug!(
        data_dir = %config.data_dir.display(),
        max_call_depth = config.max_call_depth,
        "Configuration loaded"
    );

    let (payload, code) = match runner::evaluate(&config) {
        Ok(result) => {
            info!(success = result.is_success(), "Evaluation finished");
            (result.to_payload(), result.exit_code())
        }
        Err(err) => {
            warn!(error = %err, "Script unavailable");
            (json!({ "error": err.to_string() }), 1)
        }
    };

    emit(&payload)?;
    Ok(ExitCode::from(code))
}

/// Diagnostics go to stderr; stdout carries only the result payload
fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn emit(payload: &JsonValue) -> Result<()> {
    let mut stdout = io::stdout().lock();
    write_payload(&mut stdout, payload)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}
