//! Faro CLI binary.
//!
//! Provides a command-line interface for the faro rolling factor model.

mod cmd;
mod config;
mod data;

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::config::BacktestArgs;

#[derive(Parser)]
#[command(name = "faro")]
#[command(about = "Rolling PCA factor model with regime-adaptive allocation", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable tables
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the walk-forward backtest on price files
    Run {
        /// Ticker symbols
        #[arg(short = 's', long, value_delimiter = ',', required = true)]
        tickers: Vec<String>,

        /// Directory with one <TICKER>.csv per symbol
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        #[command(flatten)]
        backtest: BacktestArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Write the per-date result frame as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the walk-forward backtest on synthetic returns
    Simulate {
        /// Number of assets
        #[arg(long, default_value = "10")]
        assets: usize,

        /// Number of return rows
        #[arg(long, default_value = "500")]
        rows: usize,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,

        #[command(flatten)]
        backtest: BacktestArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Write the per-date result frame as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fit one decomposition on the latest window and print diagnostics
    Decompose {
        /// Ticker symbols
        #[arg(short = 's', long, value_delimiter = ',', required = true)]
        tickers: Vec<String>,

        /// Directory with one <TICKER>.csv per symbol
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Rows in the window
        #[arg(short, long, default_value = "252")]
        window: usize,

        /// Number of factors to keep
        #[arg(short = 'k', long, default_value = "3")]
        components: usize,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let _ = dotenvy::dotenv();
    init_tracing(cli.verbose, cli.log_json);

    match cli.command {
        Commands::Run {
            tickers,
            data_dir,
            backtest,
            format,
            output,
        } => {
            cmd::run::run_backtest(&tickers, data_dir, &backtest, format, output.as_deref())?;
        }
        Commands::Simulate {
            assets,
            rows,
            seed,
            backtest,
            format,
            output,
        } => {
            cmd::simulate::run_simulation(assets, rows, seed, &backtest, format, output.as_deref())?;
        }
        Commands::Decompose {
            tickers,
            data_dir,
            window,
            components,
            format,
        } => {
            cmd::decompose::show_decomposition(&tickers, data_dir, window, components, format)?;
        }
    }

    Ok(())
}

/// Install the global subscriber: `RUST_LOG` if set, else `info` (`debug`
/// with `--verbose`). Logs go to stderr so results on stdout stay clean.
fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
