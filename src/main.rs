//! Command-line interface for mqtt-sim
//!
//! # Usage Examples
//!
//! ## Validate
//! ```bash
//! mqtt-sim validate -c streams.yaml
//! ```
//!
//! ## Run
//! ```bash
//! # Publish until interrupted, table output on a terminal
//! mqtt-sim run -c streams.yaml
//!
//! # Reproducible 30 second run that stops at the first failure
//! mqtt-sim run -c streams.yaml --seed 42 --duration 30 --fail-fast --output log
//! ```
//!
//! ## Exit Codes
//! - 0: run completed
//! - 1: stopped by `--fail-fast`, or an unexpected error
//! - 2: configuration validation error
//! - 3: configuration load error
//! - 4: payload build error
//! - 5: broker connection or publish error
//! - 6: runtime error
//! - 130: interrupted

use clap::{Args, Parser, Subcommand};
use mqtt_sim::logging::{self, DEFAULT_LOG_DIR};
use mqtt_sim::render::create_renderer;
use mqtt_sim::{format_summary, prepare_simulation, validate_config_file, OutputMode};
use sim_core::SimError;
use sim_mqtt::MqttBrokerAdapter;
use sim_runtime::RuntimeResult;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "mqtt-sim")]
#[command(about = "Simulate MQTT traffic from a declarative stream configuration")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate a configuration, then print its summary
    Validate {
        /// Path to the configuration file (YAML, or JSON by extension)
        #[arg(long, short = 'c')]
        config: PathBuf,
    },

    /// Publish every configured stream until done or interrupted
    Run(RunArgs),

    /// Print the version
    Version,
}

#[derive(Args, Clone, Debug)]
struct RunArgs {
    /// Path to the configuration file (YAML, or JSON by extension)
    #[arg(long, short = 'c')]
    config: PathBuf,

    /// Base seed for deterministic payloads (same seed = same payloads)
    #[arg(long, env = "MQTT_SIM_SEED")]
    seed: Option<u64>,

    /// Stop after this many seconds
    #[arg(long)]
    duration: Option<f64>,

    /// Stop at the first stream failure
    #[arg(long)]
    fail_fast: bool,

    /// Console output
    #[arg(long, value_enum, default_value_t = OutputMode::Auto)]
    output: OutputMode,

    /// Debug logging, and per-publish lines in log output
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Directory for the log file
    #[arg(long, env = "MQTT_SIM_LOG_DIR", default_value = DEFAULT_LOG_DIR)]
    log_dir: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Validate { config } => match validate_config_file(&config) {
            Ok(summary) => {
                println!("{}", format_summary(&summary));
                0
            }
            Err(e) => report_error(&e),
        },
        Commands::Run(args) => {
            if let Err(e) = logging::init_logging(&args.log_dir, args.verbose) {
                eprintln!("Error: {e:#}");
                std::process::exit(1);
            }
            match run(args).await {
                Ok(result) => result.exit_code,
                Err(e) => report_error(&e),
            }
        }
        Commands::Version => {
            println!("mqtt-sim {}", env!("CARGO_PKG_VERSION"));
            0
        }
    };

    std::process::exit(code);
}

async fn run(args: RunArgs) -> Result<RuntimeResult, SimError> {
    let duration = parse_duration(args.duration)?;

    let prepared = prepare_simulation(&args.config, args.seed)?;
    info!("{}", format_summary(&prepared.summary));

    let renderer = create_renderer(args.output, args.verbose);
    let engine = prepared
        .into_engine(MqttBrokerAdapter::factory(), renderer)
        .with_fail_fast(args.fail_fast)
        .with_duration(duration);

    engine.run_until(interrupt()).await
}

fn parse_duration(seconds: Option<f64>) -> Result<Option<Duration>, SimError> {
    let Some(seconds) = seconds else {
        return Ok(None);
    };
    match Duration::try_from_secs_f64(seconds) {
        Ok(d) if !d.is_zero() => Ok(Some(d)),
        _ => Err(SimError::validation(vec![format!(
            "duration: must be a positive number of seconds, got {seconds}"
        )])),
    }
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed.
async fn interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Unable to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Ctrl-C received");
}

fn report_error(e: &SimError) -> i32 {
    let code = e.exit_code();
    if code >= 5 {
        error!(kind = e.kind(), "{e}");
    } else {
        warn!(kind = e.kind(), "{e}");
    }

    eprintln!("Error: {e}");
    if let SimError::ConfigValidation { errors, .. } = e {
        for message in errors.iter().skip(1) {
            eprintln!("  - {message}");
        }
    }
    code
}
