use chrono::NaiveDate;
use clap::Args;
use fund_rank_core::presentation::format_percent;
use fund_rank_core::returns::trailing_window_returns;
use serde_json::Value;

use super::{with_table, DisplayTable, SeriesSource};

/// Arguments for daily N-year trailing returns
#[derive(Args)]
pub struct RollingArgs {
    #[command(flatten)]
    pub source: SeriesSource,

    /// Window length in years
    #[arg(long, default_value_t = 1)]
    pub years: u32,

    /// First calendar day of the forward-filled series (default: first observation)
    #[arg(long)]
    pub from: Option<NaiveDate>,
}

pub fn run_rolling(args: RollingArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let series = args.source.load()?;
    let from = match args.from {
        Some(d) => d,
        None => series
            .first()
            .map(|p| p.date)
            .ok_or_else(|| format!("Series '{}' is empty", series.id()))?,
    };

    let output = trailing_window_returns(&series, args.years, from)?;
    let table = DisplayTable {
        headers: vec!["Date".to_string(), format!("{}Y Return", args.years)],
        rows: output
            .points
            .iter()
            .map(|p| vec![p.date.to_string(), format_percent(p.value, 2)])
            .collect(),
    };
    with_table(&output, &table)
}
