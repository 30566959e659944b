use clap::Args;
use fund_rank_core::momentum::{
    rank_composite_momentum, rank_momentum, CompositeConfig, CompositeInput, MomentumConfig,
    MomentumInput,
};
use fund_rank_core::presentation::{RankingTable, TableStyle};
use rust_decimal::Decimal;
use serde_json::Value;

use super::{fetch_all, with_table};
use crate::input;

/// Arguments for Sharpe-based momentum ranking
#[derive(Args)]
pub struct MomentumArgs {
    /// Path to a MomentumInput (or CompositeInput with --composite) JSON document
    #[arg(long)]
    pub input: Option<String>,

    /// Directory holding `<id>.json` price histories
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Comma-separated ids to rank
    #[arg(long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Drop series this fraction or more below their high (e.g. 0.25)
    #[arg(long, conflicts_with = "composite")]
    pub max_distance_from_high: Option<Decimal>,

    /// Rank on weighted ranks of 3M Sharpe, 6M Sharpe and 1M return instead
    #[arg(long)]
    pub composite: bool,

    /// Number of leaders reported by --composite
    #[arg(long, requires = "composite")]
    pub top_n: Option<usize>,
}

pub fn run_momentum(args: MomentumArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if args.composite {
        return run_composite(args);
    }
    let mut missing: Vec<String> = Vec::new();
    let mut momentum_input = match input::read_document::<MomentumInput>(&args.input)? {
        Some(doc) => doc,
        None => {
            let (series, absent) = fetch_all(&args.data_dir, &args.symbols)?;
            missing = absent;
            MomentumInput {
                series,
                config: MomentumConfig::default(),
            }
        }
    };
    if let Some(d) = args.max_distance_from_high {
        momentum_input.config.max_distance_from_high = d;
    }

    let mut output = rank_momentum(&momentum_input)?;
    for id in missing {
        output.warnings.push(format!("No price data for '{}'", id));
    }
    let table = RankingTable::from_momentum(&output.result, &TableStyle::default());
    with_table(&output, &table)
}

fn run_composite(args: MomentumArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut missing: Vec<String> = Vec::new();
    let mut composite_input = match input::read_document::<CompositeInput>(&args.input)? {
        Some(doc) => doc,
        None => {
            let (series, absent) = fetch_all(&args.data_dir, &args.symbols)?;
            missing = absent;
            CompositeInput {
                series,
                config: CompositeConfig::default(),
            }
        }
    };
    if let Some(n) = args.top_n {
        composite_input.config.top_n = n;
    }

    let mut output = rank_composite_momentum(&composite_input)?;
    for id in missing {
        output.warnings.push(format!("No price data for '{}'", id));
    }
    let table = RankingTable::from_composite(&output.result, &TableStyle::default());
    with_table(&output, &table)
}
