//! ragcheck CLI: validate generated answers against their grounding.
//!
//! Runs one validation per invocation and prints the report, or inspects
//! configuration and the audit log.

mod commands;
mod render;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};
use uuid::Uuid;

/// ragcheck: grounded-output verification for RAG answers
#[derive(Parser, Debug)]
#[command(name = "ragcheck", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (its `.ragcheck/config.toml` is loaded)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Configuration file path (replaces user and workspace config)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Validate a generated answer against its grounding
    #[command(group(
        clap::ArgGroup::new("source")
            .required(true)
            .args(["grounding", "passages"])
    ))]
    Validate {
        /// The question the answer responds to
        #[arg(short, long)]
        prompt: String,

        /// The generated answer, or @path to read it from a file
        #[arg(short, long)]
        output: String,

        /// Plain-text grounding document
        #[arg(short, long)]
        grounding: Option<PathBuf>,

        /// JSONL file of passages ({"id": .., "text": .., ...metadata})
        #[arg(long)]
        passages: Option<PathBuf>,

        /// Metadata filter applied to the passages (key=value)
        #[arg(long, requires = "passages")]
        filter: Option<String>,

        /// Maximum number of passages to retrieve
        #[arg(long, requires = "passages")]
        limit: Option<usize>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Inspect the audit log
    Audit {
        #[command(subcommand)]
        action: AuditAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
}

#[derive(clap::Subcommand, Debug)]
enum AuditAction {
    /// Print audit records, grouped by validation
    Show {
        /// Only records of this validation
        #[arg(long)]
        id: Option<Uuid>,

        /// Only the last N validations
        #[arg(short = 'n', long)]
        last: Option<usize>,

        /// Audit log to read (defaults to the configured path)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    // JSON file layer for structured logging
    let log_dir = ragcheck_core::config::default_log_dir();
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "ragcheck.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let config = commands::load(&workspace, cli.config.as_deref())?;
    commands::handle_command(cli.command, config, &workspace, cli.quiet).await
}
