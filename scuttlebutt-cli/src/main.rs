//! Scuttlebutt CLI: run Fisher-style research from the terminal or serve it over HTTP.

mod commands;
mod markdown;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Scuttlebutt: stakeholder research scored against Fisher's fifteen points
#[derive(Parser, Debug)]
#[command(name = "scuttlebutt", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (holds `.scuttlebutt/config.toml`)
    #[arg(short, long, global = true, default_value = ".")]
    workspace: PathBuf,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Markdown,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Research one company and print its fifteen-point report
    Research {
        /// Company name, e.g. "Apple Inc."
        company: String,
        /// Ticker symbol; used as the report symbol when given
        #[arg(short, long)]
        ticker: Option<String>,
        /// Records kept per stakeholder bucket
        #[arg(long)]
        max_results: Option<usize>,
        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Report format
        #[arg(short, long, value_enum, default_value = "markdown")]
        format: OutputFormat,
        /// Reject out-of-range ratings and duplicate criteria
        #[arg(long)]
        strict: bool,
    },
    /// Serve the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Return on equity from the latest SEC filings
    Roe {
        /// Ticker symbol, e.g. AAPL
        symbol: String,
    },
    /// List the fifteen Fisher criteria
    Criteria,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default `.scuttlebutt/config.toml` in the workspace
    Init,
    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(EnvFilter::new(filter));

    // JSON file layer for structured logging
    let log_dir = directories::ProjectDirs::from("dev", "scuttlebutt", "scuttlebutt")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "scuttlebutt.log");
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

    commands::handle_command(cli.command, &workspace).await
}
