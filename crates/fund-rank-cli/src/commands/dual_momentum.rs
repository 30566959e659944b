use clap::Args;
use fund_rank_core::dual_momentum::{self, DualMomentumConfig, DualMomentumInput};
use fund_rank_core::presentation::format_percent;
use rust_decimal::Decimal;
use serde_json::Value;

use super::{fetch_all, with_table, DisplayTable};
use crate::input;

/// Arguments for the dual momentum rotation
#[derive(Args)]
pub struct DualMomentumArgs {
    /// Path to a DualMomentumInput JSON document (or pipe it on stdin)
    #[arg(long)]
    pub input: Option<String>,

    /// Directory holding `<id>.json` price histories
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Comma-separated ids to rotate between (at least two)
    #[arg(long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Long lookback in months
    #[arg(long)]
    pub long_months: Option<usize>,

    /// Short lookback in months
    #[arg(long)]
    pub short_months: Option<usize>,
}

pub fn run_dual_momentum(args: DualMomentumArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut dual_input = match input::read_document::<DualMomentumInput>(&args.input)? {
        Some(doc) => doc,
        None => {
            let (series, missing) = fetch_all(&args.data_dir, &args.symbols)?;
            if !missing.is_empty() {
                return Err(format!("No price data for {}", missing.join(", ")).into());
            }
            DualMomentumInput {
                series,
                config: DualMomentumConfig::default(),
            }
        }
    };
    if let Some(m) = args.long_months {
        dual_input.config.long_months = m;
    }
    if let Some(m) = args.short_months {
        dual_input.config.short_months = m;
    }

    let output = dual_momentum::run_dual_momentum(&dual_input)?;
    let price = |v: Option<Decimal>| v.map(|v| v.round_dp(4).to_string()).unwrap_or_default();
    let table = DisplayTable {
        headers: ["Month", "Held", "NAV at Buy", "NAV at Sell", "Trade Return", "Equity"]
            .iter()
            .map(|h| h.to_string())
            .collect(),
        rows: output
            .result
            .months
            .iter()
            .map(|m| {
                vec![
                    m.month.format("%Y-%m").to_string(),
                    m.held.clone(),
                    price(Some(m.nav_buy)),
                    price(m.nav_sell),
                    m.trade_return
                        .map(|r| format_percent(r, 2))
                        .unwrap_or_default(),
                    m.equity.round_dp(4).to_string(),
                ]
            })
            .collect(),
    };
    with_table(&output, &table)
}
