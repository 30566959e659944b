mod commands;
mod config;
mod input;
mod output;
mod provider;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::anchors::AnchorsArgs;
use commands::dual_momentum::DualMomentumArgs;
use commands::eligibility::EligibilityArgs;
use commands::momentum::MomentumArgs;
use commands::rank::RankArgs;
use commands::returns::ReturnsArgs;
use commands::rolling::RollingArgs;

/// Rank mutual funds and ETFs by the consistency of their returns
#[derive(Parser)]
#[command(
    name = "fundrank",
    version,
    about = "Rank mutual funds and ETFs by the consistency of their returns",
    long_about = "Aligns NAV histories on yearly month-end anchor dates, computes \
                  rolling, CAGR and trailing returns with decimal precision, and ranks \
                  funds by top-N consistency or benchmark outperformance."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate yearly anchor dates
    Anchors(AnchorsArgs),
    /// Rank funds by year-on-year consistency, CAGR horizons or benchmark outperformance
    Rank(RankArgs),
    /// Returns of one fund, over anchors or between two dates
    Returns(ReturnsArgs),
    /// Daily N-year trailing returns of one fund
    Rolling(RollingArgs),
    /// Filter funds by history length and fund size
    Eligibility(EligibilityArgs),
    /// Sharpe-based momentum ranking
    Momentum(MomentumArgs),
    /// Monthly rotation into the fund with the strongest blended momentum
    DualMomentum(DualMomentumArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Anchors(args) => commands::anchors::run_anchors(args),
        Commands::Rank(args) => commands::rank::run_rank(args),
        Commands::Returns(args) => commands::returns::run_returns(args),
        Commands::Rolling(args) => commands::rolling::run_rolling(args),
        Commands::Eligibility(args) => commands::eligibility::run_eligibility(args),
        Commands::Momentum(args) => commands::momentum::run_momentum(args),
        Commands::DualMomentum(args) => commands::dual_momentum::run_dual_momentum(args),
        Commands::Version => {
            println!("fundrank {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
