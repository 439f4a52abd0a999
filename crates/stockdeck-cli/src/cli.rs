//! CLI argument definitions for stockdeck.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `report` | Aggregate one ticker and print the result |
//! | `export` | Aggregate one ticker and write its tables as CSV |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--strict` | `false` | Treat section errors as failures |
//! | `--timeout-ms` | `15000` | Per-request timeout in ms |
//! | `--sequential` | `false` | Fetch optional sections one after another |
//! | `--verbose` | `false` | Debug logging on stderr |
//!
//! # Examples
//!
//! ```bash
//! stockdeck report AAPL --start 2024-01-01 --end 2024-06-30 --format table
//! stockdeck export MSFT --start 2023-01-01 --end 2023-12-31 --out-dir ./out
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use stockdeck_core::http_client::DEFAULT_TIMEOUT_MS;

/// Stock data aggregation from Yahoo Finance, Alpha Vantage and Polygon.io.
#[derive(Debug, Parser)]
#[command(
    name = "stockdeck",
    author,
    version,
    about = "Aggregate prices, statements and news for one ticker"
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Exit with code 5 when any section failed.
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// Per-request timeout budget in milliseconds.
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Fetch actions, statements and news one after another.
    #[arg(long, global = true, default_value_t = false)]
    pub sequential: bool,

    /// Log provider calls at debug level (overrides RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Alpha Vantage API key.
    #[arg(
        long,
        global = true,
        env = "STOCKDECK_ALPHAVANTAGE_API_KEY",
        hide_env_values = true
    )]
    pub alphavantage_key: Option<String>,

    /// Polygon.io API key.
    #[arg(
        long,
        global = true,
        env = "STOCKDECK_POLYGON_API_KEY",
        hide_env_values = true
    )]
    pub polygon_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain-text summary for terminal display.
    Table,
    /// Single JSON envelope.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch, normalize and print every section for a ticker.
    ///
    /// # Examples
    ///
    ///   stockdeck report AAPL --start 2024-01-01 --end 2024-06-30
    ///   stockdeck report IBM --start 2023-01-01 --end 2023-12-31 --ma-window 50 --format table
    Report(RequestArgs),

    /// Write the price, action and statement tables as CSV files.
    ///
    /// Failed sections are skipped; the rest are still written.
    ///
    /// # Examples
    ///
    ///   stockdeck export AAPL --start 2024-01-01 --end 2024-06-30 --out-dir ./data
    Export(ExportArgs),
}

/// Ticker request shared by every command.
#[derive(Debug, Args)]
pub struct RequestArgs {
    /// Ticker symbol (e.g., AAPL, BRK.B).
    pub symbol: String,

    /// First day of the range, YYYY-MM-DD.
    #[arg(long)]
    pub start: String,

    /// Last day of the range, YYYY-MM-DD.
    #[arg(long)]
    pub end: String,

    /// Moving-average window in trading days (5-50).
    #[arg(long, default_value_t = 20)]
    pub ma_window: usize,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Directory the CSV files are written to; created when missing.
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
}
