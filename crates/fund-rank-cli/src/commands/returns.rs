use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use fund_rank_core::calendar::compute_anchors;
use fund_rank_core::presentation::format_percent;
use fund_rank_core::resolver::ResolutionPolicy;
use fund_rank_core::returns::{
    cagr_with, horizon_returns, period_return, rolling_returns, ElapsedBasis, PeriodValue,
    ReturnRecord,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{today, with_table, DisplayTable, SeriesSource};
use crate::config::DEFAULT_ANCHOR_COUNT;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PolicyArg {
    AsOf,
    NearestFollowing,
}

impl From<PolicyArg> for ResolutionPolicy {
    fn from(p: PolicyArg) -> Self {
        match p {
            PolicyArg::AsOf => ResolutionPolicy::AsOf,
            PolicyArg::NearestFollowing => ResolutionPolicy::NearestFollowing,
        }
    }
}

/// Arguments for point-to-point and anchored returns of one fund
#[derive(Args)]
pub struct ReturnsArgs {
    #[command(flatten)]
    pub source: SeriesSource,

    /// Period start; with --end computes a single return
    #[arg(long, requires = "end")]
    pub start: Option<NaiveDate>,

    /// Period end
    #[arg(long, requires = "start")]
    pub end: Option<NaiveDate>,

    /// Price lookup policy for --start/--end
    #[arg(long, value_enum, default_value = "as-of")]
    pub policy: PolicyArg,

    /// Also report CAGR for --start/--end
    #[arg(long)]
    pub cagr: bool,

    /// Measure CAGR between the requested dates instead of the resolved ones
    #[arg(long)]
    pub requested_dates: bool,

    /// Number of anchor dates when no --start/--end is given
    #[arg(long, default_value_t = DEFAULT_ANCHOR_COUNT)]
    pub count: i64,

    /// Anchors start at the last working day of the month before this date
    #[arg(long)]
    pub reference_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SinglePeriodOutput {
    series_id: String,
    simple: ReturnRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    cagr: Option<Option<ReturnRecord>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AnchoredOutput {
    series_id: String,
    name: String,
    anchors: Vec<NaiveDate>,
    rolling: Vec<PeriodValue>,
    horizons: Vec<PeriodValue>,
}

pub fn run_returns(args: ReturnsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let series = args.source.load()?;
    let elapsed = if args.requested_dates {
        ElapsedBasis::RequestedDates
    } else {
        ElapsedBasis::ResolvedDates
    };

    if let (Some(start), Some(end)) = (args.start, args.end) {
        let simple = period_return(&series, start, end, args.policy.into())?;
        let cagr = if args.cagr {
            Some(cagr_with(&series, start, end, elapsed)?)
        } else {
            None
        };
        let output = SinglePeriodOutput {
            series_id: series.id().to_string(),
            simple,
            cagr,
        };
        return Ok(serde_json::to_value(output)?);
    }

    let anchors = compute_anchors(args.reference_date.unwrap_or_else(today), args.count)?;
    let rolling = rolling_returns(&series, &anchors)?;
    let horizons = horizon_returns(&series, &anchors, elapsed)?;

    let render = |v: &PeriodValue| match v.value() {
        Some(r) => format_percent(r, 2),
        None => "N/A".to_string(),
    };
    let table = DisplayTable {
        headers: vec![
            "Period".to_string(),
            "Return".to_string(),
            "Horizon".to_string(),
            "CAGR".to_string(),
        ],
        rows: rolling
            .iter()
            .zip(horizons.iter())
            .map(|(r, h)| {
                vec![
                    r.period().label(),
                    render(r),
                    h.period().label(),
                    render(h),
                ]
            })
            .collect(),
    };

    let output = AnchoredOutput {
        series_id: series.id().to_string(),
        name: series.display_name().to_string(),
        anchors: anchors.dates().to_vec(),
        rolling,
        horizons,
    };
    with_table(&output, &table)
}
