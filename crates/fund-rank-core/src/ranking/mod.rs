//! Ranking engine.
//!
//! A run moves through fixed stages: the input is validated, each entity's
//! period values are computed from its price series, funds are scored under
//! the chosen methodology, and finally ordered and ranked. Formatting the
//! result is left to [`crate::presentation`].
//!
//! Ordering is deterministic. Funds are stable-sorted by score, so funds with
//! equal scores keep the order they had in `RankingInput::funds`.

pub mod consistency;
pub mod outperformance;
pub mod top_n;

use std::cmp::Ordering;
use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar::{AnchorDateSequence, AnchorPeriod};
use crate::error::{FundRankError, MissingReason};
use crate::returns::{horizon_returns, rolling_returns, ElapsedBasis, PeriodValue};
use crate::types::*;
use crate::FundRankResult;

pub use outperformance::{summarize_outperformance, OutperformanceSummary, CONSISTENT_OUTPERFORMER_SHARE};
pub use top_n::{mark_top_n, TieHandling};

pub const DEFAULT_TOP_N: usize = 10;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Methodology {
    /// Top-N appearances across consecutive yearly periods.
    YearOnYearConsistency,
    /// Top-N appearances across CAGR horizons ending at the latest anchor.
    MultiYearPerformance,
    /// Periods beaten against a benchmark, then average margin.
    BenchmarkOutperformance,
}

impl Methodology {
    pub fn description(&self) -> &'static str {
        match self {
            Methodology::YearOnYearConsistency => {
                "Year-on-Year Consistency (top-N appearances over consecutive anchor periods)"
            }
            Methodology::MultiYearPerformance => {
                "Multi-Year Performance (top-N appearances over CAGR horizons)"
            }
            Methodology::BenchmarkOutperformance => {
                "Benchmark Outperformance (periods outperformed, then average outperformance)"
            }
        }
    }
}

/// Where funds with no usable data go in the final order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnscoredPlacement {
    /// After every scored fund, with a rank.
    #[default]
    RankLast,
    /// After every scored fund, without a rank.
    Exclude,
}

/// One fund or benchmark as handed to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityInput {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `None` when the price provider had nothing for this id.
    #[serde(default)]
    pub series: Option<PriceSeries>,
}

impl EntityInput {
    pub fn from_series(series: PriceSeries) -> Self {
        Self {
            id: series.id().to_string(),
            name: series.name().map(str::to_string),
            series: Some(series),
        }
    }

    pub fn no_data(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            series: None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or_else(|| self.series.as_ref().and_then(|s| s.name()))
            .unwrap_or(&self.id)
    }
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingInput {
    pub funds: Vec<EntityInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<EntityInput>,
    pub anchors: AnchorDateSequence,
    pub methodology: Methodology,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default)]
    pub ties: TieHandling,
    #[serde(default)]
    pub unscored: UnscoredPlacement,
    /// Elapsed-time basis for CAGR horizons.
    #[serde(default)]
    pub elapsed_basis: ElapsedBasis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Fund,
    Benchmark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataStatus {
    Scored,
    /// The provider returned nothing.
    NoData,
    /// A series exists but no period could be computed.
    AllPeriodsMissing,
}

/// One period value of one entity, with its scoring annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodCell {
    pub value: PeriodValue,
    /// Top-N mark, or "beat the benchmark" under outperformance.
    pub highlighted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benchmark_value: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outperformance: Option<Rate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Score {
    TopNCount {
        count: u32,
    },
    Outperformance {
        periods_outperformed: u32,
        periods_compared: u32,
        average_outperformance: Option<Rate>,
        consistent_outperformer: bool,
    },
    /// No data to score, or a benchmark row.
    Unscored,
}

impl Score {
    /// Better scores sort first.
    fn compare(&self, other: &Score) -> Ordering {
        match (self, other) {
            (Score::TopNCount { count: a }, Score::TopNCount { count: b }) => b.cmp(a),
            (
                Score::Outperformance {
                    periods_outperformed: ca,
                    average_outperformance: aa,
                    ..
                },
                Score::Outperformance {
                    periods_outperformed: cb,
                    average_outperformance: ab,
                    ..
                },
            ) => cb.cmp(ca).then_with(|| ab.cmp(aa)),
            (Score::Unscored, Score::Unscored) => Ordering::Equal,
            (Score::Unscored, _) => Ordering::Greater,
            (_, Score::Unscored) => Ordering::Less,
            _ => Ordering::Equal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntity {
    pub id: String,
    pub name: String,
    pub kind: EntityKind,
    pub periods: Vec<PeriodCell>,
    pub score: Score,
    pub status: DataStatus,
    /// Always `None` for benchmarks.
    pub rank: Option<u32>,
}

impl RankedEntity {
    pub fn missing_periods(&self) -> usize {
        self.periods.iter().filter(|c| c.value.value().is_none()).count()
    }
}

/// Column header for one period, in anchor generation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodHeader {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingOutput {
    pub methodology: Methodology,
    pub top_n: usize,
    pub ties: TieHandling,
    pub anchors: AnchorDateSequence,
    pub periods: Vec<PeriodHeader>,
    /// Funds in final order: scored funds by rank, then unscored ones.
    pub funds: Vec<RankedEntity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<RankedEntity>,
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Score and rank every fund in `input`.
///
/// Per-period failures become missing cells and never abort the run. Only
/// configuration problems are returned as errors, before any scoring.
pub fn score_funds(input: &RankingInput) -> FundRankResult<RankingOutput> {
    validate_ranking_input(input)?;

    let mut warnings: Vec<String> = Vec::new();
    let periods = match input.methodology {
        Methodology::MultiYearPerformance => input.anchors.horizon_periods(),
        Methodology::YearOnYearConsistency | Methodology::BenchmarkOutperformance => {
            input.anchors.consecutive_periods()
        }
    };

    // Data collection
    let mut funds = Vec::with_capacity(input.funds.len());
    for fund in &input.funds {
        funds.push(build_entity(input, fund, EntityKind::Fund, &periods, &mut warnings)?);
    }
    let benchmark = match &input.benchmark {
        Some(b) => Some(build_entity(input, b, EntityKind::Benchmark, &periods, &mut warnings)?),
        None => None,
    };
    if input.methodology == Methodology::BenchmarkOutperformance {
        if let Some(bench) = benchmark.as_ref().filter(|b| b.status != DataStatus::Scored) {
            return Err(FundRankError::InvalidArgument {
                field: "benchmark".into(),
                reason: format!("No period could be computed for benchmark '{}'", bench.id),
            });
        }
    }

    // Scoring
    match input.methodology {
        Methodology::YearOnYearConsistency | Methodology::MultiYearPerformance => {
            consistency::score_top_n_appearances(&mut funds, periods.len(), input.top_n, input.ties);
        }
        Methodology::BenchmarkOutperformance => {
            if let Some(bench) = &benchmark {
                outperformance::score_against_benchmark(&mut funds, bench);
            }
        }
    }

    let funds = order_and_rank(funds, input.unscored);

    tracing::info!(
        methodology = ?input.methodology,
        funds = funds.len(),
        ranked = funds.iter().filter(|f| f.rank.is_some()).count(),
        periods = periods.len(),
        "ranking complete"
    );

    Ok(RankingOutput {
        methodology: input.methodology,
        top_n: input.top_n,
        ties: input.ties,
        anchors: input.anchors.clone(),
        periods: period_headers(input.methodology, &periods),
        funds,
        benchmark,
        warnings,
    })
}

/// [`score_funds`] wrapped in the standard computation envelope.
pub fn rank_funds(input: &RankingInput) -> FundRankResult<ComputationOutput<RankingOutput>> {
    let start = Instant::now();
    let output = score_funds(input)?;
    let warnings = output.warnings.clone();

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        input.methodology.description(),
        &serde_json::json!({
            "top_n": input.top_n,
            "ties": input.ties,
            "unscored": input.unscored,
            "elapsed_basis": input.elapsed_basis,
            "anchor_count": input.anchors.len(),
            "price_resolution": "as_of",
            "tie_break": "input order",
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

fn validate_ranking_input(input: &RankingInput) -> FundRankResult<()> {
    if input.top_n == 0 {
        return Err(FundRankError::InvalidArgument {
            field: "top_n".into(),
            reason: "Top-N must be at least 1".into(),
        });
    }
    if input.anchors.len() < 2 {
        return Err(FundRankError::InsufficientHistory(format!(
            "At least 2 anchor dates required, got {}",
            input.anchors.len()
        )));
    }
    if input.methodology == Methodology::BenchmarkOutperformance {
        match &input.benchmark {
            None => {
                return Err(FundRankError::InvalidArgument {
                    field: "benchmark".into(),
                    reason: "Benchmark outperformance ranking requires a benchmark".into(),
                })
            }
            Some(b) if b.series.is_none() => {
                return Err(FundRankError::InvalidArgument {
                    field: "benchmark".into(),
                    reason: format!("No price data for benchmark '{}'", b.id),
                })
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn build_entity(
    input: &RankingInput,
    entity: &EntityInput,
    kind: EntityKind,
    periods: &[AnchorPeriod],
    warnings: &mut Vec<String>,
) -> FundRankResult<RankedEntity> {
    let (values, status) = match &entity.series {
        None => {
            tracing::warn!(id = %entity.id, "no price data");
            warnings.push(format!("No price data for '{}'", entity.id));
            let values = periods
                .iter()
                .map(|p| PeriodValue::missing(*p, MissingReason::NoData))
                .collect();
            (values, DataStatus::NoData)
        }
        Some(series) => {
            let values = match input.methodology {
                Methodology::MultiYearPerformance => {
                    horizon_returns(series, &input.anchors, input.elapsed_basis)?
                }
                Methodology::YearOnYearConsistency | Methodology::BenchmarkOutperformance => {
                    rolling_returns(series, &input.anchors)?
                }
            };
            let missing = values.iter().filter(|v| v.value().is_none()).count();
            let status = if missing == values.len() {
                warnings.push(format!("No period could be computed for '{}'", entity.id));
                DataStatus::AllPeriodsMissing
            } else {
                if missing > 0 {
                    warnings.push(format!(
                        "'{}': {missing} of {} periods missing",
                        entity.id,
                        values.len()
                    ));
                }
                DataStatus::Scored
            };
            (values, status)
        }
    };

    Ok(RankedEntity {
        id: entity.id.clone(),
        name: entity.display_name().to_string(),
        kind,
        periods: values
            .into_iter()
            .map(|value| PeriodCell {
                value,
                highlighted: false,
                benchmark_value: None,
                outperformance: None,
            })
            .collect(),
        score: Score::Unscored,
        status,
        rank: None,
    })
}

fn order_and_rank(funds: Vec<RankedEntity>, unscored: UnscoredPlacement) -> Vec<RankedEntity> {
    let (mut scored, rest): (Vec<_>, Vec<_>) = funds
        .into_iter()
        .partition(|f| f.status == DataStatus::Scored);

    // sort_by is stable, equal scores keep input order
    scored.sort_by(|a, b| a.score.compare(&b.score));

    let mut ordered = scored;
    ordered.extend(rest);

    let mut next_rank = 1u32;
    for fund in ordered.iter_mut() {
        let ranked = fund.status == DataStatus::Scored || unscored == UnscoredPlacement::RankLast;
        fund.rank = ranked.then_some(next_rank);
        if ranked {
            next_rank += 1;
        }
    }
    ordered
}

fn period_headers(methodology: Methodology, periods: &[AnchorPeriod]) -> Vec<PeriodHeader> {
    periods
        .iter()
        .map(|p| PeriodHeader {
            start: p.start,
            end: p.end,
            label: match methodology {
                Methodology::MultiYearPerformance => horizon_label(p),
                _ => p.label(),
            },
        })
        .collect()
}

/// "3Y" for a horizon of about three years.
fn horizon_label(period: &AnchorPeriod) -> String {
    let days = (period.end - period.start).num_days();
    let years = Decimal::from(days) / crate::returns::DAYS_PER_YEAR;
    format!("{}Y", years.round())
}
