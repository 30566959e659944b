use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use fund_rank_core::calendar::compute_anchors;
use fund_rank_core::eligibility::{filter_eligible, EligibilityCandidate, EligibilityCriteria, ExcludedFund};
use fund_rank_core::presentation::{RankingTable, TableStyle};
use fund_rank_core::provider::{collect_entities, PriceHistoryProvider};
use fund_rank_core::ranking::{
    rank_funds, EntityInput, Methodology, RankingInput, TieHandling, UnscoredPlacement,
};
use fund_rank_core::returns::ElapsedBasis;
use serde_json::Value;

use super::{today, with_table};
use crate::config::{RankConfig, DEFAULT_ANCHOR_COUNT};
use crate::input;
use crate::provider::DirectoryProvider;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MethodologyArg {
    /// Top-N appearances across consecutive yearly periods
    Yoy,
    /// Top-N appearances across CAGR horizons
    Cagr,
    /// Periods beaten against the benchmark
    Outperformance,
}

impl From<MethodologyArg> for Methodology {
    fn from(m: MethodologyArg) -> Self {
        match m {
            MethodologyArg::Yoy => Methodology::YearOnYearConsistency,
            MethodologyArg::Cagr => Methodology::MultiYearPerformance,
            MethodologyArg::Outperformance => Methodology::BenchmarkOutperformance,
        }
    }
}

/// Arguments for fund ranking
#[derive(Args)]
pub struct RankArgs {
    /// Path to a complete RankingInput JSON document (or pipe it on stdin)
    #[arg(long, conflicts_with = "config")]
    pub input: Option<String>,

    /// Path to a run config (.json, .yaml, .yml)
    #[arg(long)]
    pub config: Option<String>,

    /// Ranking methodology
    #[arg(long, value_enum)]
    pub methodology: Option<MethodologyArg>,

    /// Directory holding `<id>.json` price histories
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Comma-separated fund ids
    #[arg(long, value_delimiter = ',')]
    pub funds: Vec<String>,

    /// Benchmark id
    #[arg(long)]
    pub benchmark: Option<String>,

    /// Number of top cells marked per period
    #[arg(long)]
    pub top_n: Option<usize>,

    /// Mark exactly N cells per period even when values tie
    #[arg(long)]
    pub strict_ties: bool,

    /// Leave funds without usable data unranked instead of ranking them last
    #[arg(long)]
    pub exclude_unscored: bool,

    /// Measure CAGR horizons between the requested anchor dates
    #[arg(long)]
    pub requested_dates: bool,

    /// Number of anchor dates
    #[arg(long)]
    pub count: Option<i64>,

    /// Anchors start at the last working day of the month before this date
    #[arg(long)]
    pub reference_date: Option<NaiveDate>,

    /// Drop funds with less history than this before ranking
    #[arg(long)]
    pub min_history_days: Option<i64>,
}

impl RankArgs {
    fn as_config(&self) -> RankConfig {
        RankConfig {
            methodology: self.methodology.map(Methodology::from),
            top_n: self.top_n,
            ties: self.strict_ties.then_some(TieHandling::Strict),
            unscored: self.exclude_unscored.then_some(UnscoredPlacement::Exclude),
            elapsed_basis: self.requested_dates.then_some(ElapsedBasis::RequestedDates),
            anchor_count: self.count,
            reference_date: self.reference_date,
            data_dir: self.data_dir.clone(),
            funds: self.funds.clone(),
            benchmark: self.benchmark.clone(),
            eligibility: self.min_history_days.map(|days| EligibilityCriteria {
                min_history_days: days,
                min_fund_size: None,
            }),
            fund_sizes: Default::default(),
        }
    }
}

pub fn run_rank(args: RankArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let flags = args.as_config();

    let (ranking_input, excluded) = if args.config.is_none() {
        match input::read_document::<RankingInput>(&args.input)? {
            Some(doc) => (apply_overrides(doc, &flags), Vec::new()),
            None => build_input(flags)?,
        }
    } else {
        build_input(RankConfig::load(&args.config)?.merge(flags))?
    };

    let mut output = rank_funds(&ranking_input)?;
    for e in &excluded {
        output
            .warnings
            .push(format!("Excluded '{}': {}", e.id, e.reason.describe()));
    }
    let table = RankingTable::from_output(&output.result, &TableStyle::default());

    let mut value = with_table(&output, &table)?;
    if let Value::Object(ref mut map) = value {
        map.insert("excluded".to_string(), serde_json::to_value(&excluded)?);
    }
    Ok(value)
}

/// Flags take precedence over a document read from --input or stdin.
fn apply_overrides(mut doc: RankingInput, flags: &RankConfig) -> RankingInput {
    if let Some(m) = flags.methodology {
        doc.methodology = m;
    }
    if let Some(n) = flags.top_n {
        doc.top_n = n;
    }
    if let Some(t) = flags.ties {
        doc.ties = t;
    }
    if let Some(u) = flags.unscored {
        doc.unscored = u;
    }
    if let Some(e) = flags.elapsed_basis {
        doc.elapsed_basis = e;
    }
    doc
}

fn build_input(
    config: RankConfig,
) -> Result<(RankingInput, Vec<ExcludedFund>), Box<dyn std::error::Error>> {
    let data_dir = config
        .data_dir
        .as_ref()
        .ok_or("--data-dir is required (or provide --input / --config)")?;
    if config.funds.is_empty() {
        return Err("--funds is required (or list funds in --config)".into());
    }
    let provider = DirectoryProvider::new(data_dir)?;

    let mut funds = collect_entities(&provider, &config.funds);
    let mut excluded = Vec::new();
    if let Some(criteria) = &config.eligibility {
        let candidates = funds
            .into_iter()
            .map(|entity| EligibilityCandidate {
                fund_size: config.fund_sizes.get(&entity.id).copied(),
                entity,
            })
            .collect();
        let report = filter_eligible(candidates, criteria)?;
        funds = report.eligible;
        excluded = report.excluded;
    }

    let benchmark = match &config.benchmark {
        Some(id) => Some(match provider.fetch(id)? {
            Some(series) => EntityInput::from_series(series),
            None => EntityInput::no_data(id.clone()),
        }),
        None => None,
    };

    let anchors = compute_anchors(
        config.reference_date.unwrap_or_else(today),
        config.anchor_count.unwrap_or(DEFAULT_ANCHOR_COUNT),
    )?;

    let input = RankingInput {
        funds,
        benchmark,
        anchors,
        methodology: config
            .methodology
            .unwrap_or(Methodology::YearOnYearConsistency),
        top_n: config.top_n.unwrap_or(fund_rank_core::ranking::DEFAULT_TOP_N),
        ties: config.ties.unwrap_or_default(),
        unscored: config.unscored.unwrap_or_default(),
        elapsed_basis: config.elapsed_basis.unwrap_or_default(),
    };
    Ok((input, excluded))
}
