//! # Delay Queue CLI
//!
//! Command-line interface for the delay queue service.
//!
//! This module provides CLI commands for:
//! - Pushing jobs for registered handlers
//! - Popping ready jobs
//! - Finishing and deleting jobs
//! - Inspecting the resolved configuration

pub mod config;

use clap::{Parser, Subcommand};
use delay_queue_client::{DelayQueueClient, DelayQueueError, Job, JobBody, JobId, Topic};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use config::{CliConfig, ConfigError, LoggingConfig, ServerConfig};

// ============================================================================
// CLI Structure
// ============================================================================

/// Delay queue CLI - push, pop and acknowledge delayed jobs
#[derive(Parser)]
#[command(name = "delay-queue")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Client for the delay queue service")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "DELAY_QUEUE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Delay queue server address (overrides configuration)
    #[arg(short, long)]
    pub server: Option<String>,

    /// Request timeout in seconds (overrides configuration)
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Logging level (overrides configuration)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long)]
    pub json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Add a job to the delay queue
    Push {
        /// Topic the job belongs to
        #[arg(long)]
        topic: String,

        /// Handler identifier; must be listed in the configured handlers
        #[arg(long)]
        handler: String,

        /// Job id (random when omitted)
        #[arg(long)]
        id: Option<String>,

        /// Seconds until the job becomes ready
        #[arg(short, long, default_value = "0")]
        delay: u64,

        /// Seconds a popped job may stay unfinished before re-delivery
        #[arg(long)]
        ttr: Option<u64>,

        /// Job body as a JSON object
        #[arg(short, long)]
        body: Option<String>,
    },

    /// Take one ready job from the given topics
    Pop {
        /// Topics to poll, in priority order
        #[arg(required = true)]
        topics: Vec<String>,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Acknowledge a processed job
    Finish {
        /// Job id
        id: String,
    },

    /// Remove a job from the queue
    Delete {
        /// Job id
        id: String,
    },

    /// Validate and show the resolved configuration
    Config,
}

/// Output format options
#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

// ============================================================================
// CLI Error Types
// ============================================================================

/// CLI-specific errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Delay queue error: {0}")]
    Client(#[from] DelayQueueError),

    #[error("Invalid argument: {arg} - {message}")]
    InvalidArgument { arg: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => 1,
            Self::Client(_) => 2,
            Self::InvalidArgument { .. } => 4,
            Self::Io(_) => 5,
        }
    }

    fn invalid_argument(arg: &str, message: impl ToString) -> Self {
        Self::InvalidArgument {
            arg: arg.to_string(),
            message: message.to_string(),
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

/// Main CLI entry point
pub async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();

    let config = load_configuration(&cli)?;

    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    initialize_logging(level, cli.json_logs || config.logging.json_format)?;

    let output = execute_command(cli.command, &config).await?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", output)?;
    Ok(())
}

/// Load configuration, apply command-line overrides and validate the result.
pub fn load_configuration(cli: &Cli) -> Result<CliConfig, ConfigError> {
    let config = CliConfig::load(cli.config.as_deref())?
        .with_overrides(cli.server.clone(), cli.timeout);
    config.validate()?;
    Ok(config)
}

/// Initialize logging. `RUST_LOG` takes precedence over `level`.
fn initialize_logging(level: &str, json: bool) -> Result<(), CliError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| CliError::invalid_argument("log-level", e))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    result.map_err(|e| CliError::invalid_argument("log-level", e))
}

// ============================================================================
// Command Implementations
// ============================================================================

/// Execute a command and return the text to print.
pub async fn execute_command(command: Commands, config: &CliConfig) -> Result<String, CliError> {
    match command {
        Commands::Push {
            topic,
            handler,
            id,
            delay,
            ttr,
            body,
        } => {
            let job = build_job(&topic, id.as_deref(), delay, ttr, body.as_deref())?;
            let client = build_client(config)?;

            info!(topic = %job.topic(), job_id = %job.id(), handler = %handler, "Pushing job");
            client.enqueue(&handler, &job).await?;

            Ok(format!("pushed job {}", job.id()))
        }
        Commands::Pop { topics, format } => {
            let topics = topics
                .iter()
                .map(|t| Topic::new(t.as_str()))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| CliError::invalid_argument("topics", e))?;
            let client = build_client(config)?;

            let Some(job) = client.dequeue(&topics).await? else {
                return Ok("no job".to_string());
            };

            match format {
                OutputFormat::Json => serde_json::to_string_pretty(&job)
                    .map_err(|e| CliError::invalid_argument("format", e)),
                OutputFormat::Text => Ok(format!(
                    "id={} handler={} body={}",
                    job.id,
                    job.handler,
                    serde_json::Value::Object(job.body)
                )),
            }
        }
        Commands::Finish { id } => {
            let id = parse_job_id(&id)?;
            build_client(config)?.finish(&id).await?;
            Ok(format!("finished job {}", id))
        }
        Commands::Delete { id } => {
            let id = parse_job_id(&id)?;
            build_client(config)?.delete(&id).await?;
            Ok(format!("deleted job {}", id))
        }
        Commands::Config => serde_json::to_string_pretty(config)
            .map_err(|e| CliError::invalid_argument("config", e)),
    }
}

fn build_client(config: &CliConfig) -> Result<DelayQueueClient, CliError> {
    let registry = config.handler_registry()?;
    let client = DelayQueueClient::builder(Arc::new(registry))
        .config(config.client_config())
        .build()?;
    Ok(client)
}

fn build_job(
    topic: &str,
    id: Option<&str>,
    delay: u64,
    ttr: Option<u64>,
    body: Option<&str>,
) -> Result<Job, CliError> {
    let topic = Topic::new(topic).map_err(|e| CliError::invalid_argument("topic", e))?;

    let mut job = Job::new(topic).with_delay(Duration::from_secs(delay));
    if let Some(id) = id {
        job = job.with_id(parse_job_id(id)?);
    }
    if let Some(ttr) = ttr {
        job = job.with_ttr(Duration::from_secs(ttr));
    }
    if let Some(body) = body {
        let body: JobBody = serde_json::from_str(body)
            .map_err(|e| CliError::invalid_argument("body", format!("expected a JSON object: {}", e)))?;
        job = job.with_body(body);
    }

    Ok(job)
}

fn parse_job_id(id: &str) -> Result<JobId, CliError> {
    id.parse().map_err(|e| CliError::invalid_argument("id", e))
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
