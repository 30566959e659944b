use chrono::NaiveDate;
use clap::Args;
use fund_rank_core::calendar::{compute_anchors, yearly_anchors};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::today;
use crate::config::DEFAULT_ANCHOR_COUNT;

/// Arguments for anchor-date generation
#[derive(Args)]
pub struct AnchorsArgs {
    /// Anchors start at the last working day of the month before this date (default: today)
    #[arg(long)]
    pub reference_date: Option<NaiveDate>,

    /// Use this date as the first anchor instead of deriving it
    #[arg(long, conflicts_with = "reference_date")]
    pub start: Option<NaiveDate>,

    /// Number of anchor dates
    #[arg(long, default_value_t = DEFAULT_ANCHOR_COUNT, allow_hyphen_values = true)]
    pub count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct AnchorsOutput {
    first_anchor: Option<NaiveDate>,
    anchors: Vec<NaiveDate>,
    periods: Vec<String>,
}

pub fn run_anchors(args: AnchorsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let anchors = match args.start {
        Some(start) => yearly_anchors(start, args.count)?,
        None => compute_anchors(args.reference_date.unwrap_or_else(today), args.count)?,
    };

    let output = AnchorsOutput {
        first_anchor: anchors.most_recent(),
        anchors: anchors.dates().to_vec(),
        periods: anchors
            .consecutive_periods()
            .iter()
            .map(|p| p.label())
            .collect(),
    };
    Ok(serde_json::to_value(output)?)
}
