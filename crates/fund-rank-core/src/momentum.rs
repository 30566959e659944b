//! Sharpe-based momentum ranking.
//!
//! For every series the trailing Sharpe ratio is computed over several
//! observation windows. Each window's Sharpe values are standardised across
//! the whole universe, and a series' momentum score is the mean of its
//! available z-scores. Series trading too far below their high are dropped
//! before ranking but still reported.

use std::time::Instant;

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FundRankError;
use crate::types::*;
use crate::FundRankResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A trailing window measured in observations, not calendar days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MomentumWindow {
    pub label: String,
    pub observations: usize,
}

impl MomentumWindow {
    pub fn new(label: impl Into<String>, observations: usize) -> Self {
        Self {
            label: label.into(),
            observations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MomentumConfig {
    /// Longest first; the longest window also bounds the high lookback.
    #[serde(default = "default_windows")]
    pub windows: Vec<MomentumWindow>,
    #[serde(default = "default_annualisation_factor")]
    pub annualisation_factor: u32,
    /// Series whose last price is this fraction (or more) below the high
    /// are filtered out.
    #[serde(default = "default_max_distance_from_high")]
    pub max_distance_from_high: Decimal,
}

fn default_windows() -> Vec<MomentumWindow> {
    vec![
        MomentumWindow::new("1Y", 365),
        MomentumWindow::new("9M", 189),
        MomentumWindow::new("6M", 126),
        MomentumWindow::new("3M", 63),
    ]
}

fn default_annualisation_factor() -> u32 {
    252
}

fn default_max_distance_from_high() -> Decimal {
    dec!(0.25)
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            windows: default_windows(),
            annualisation_factor: default_annualisation_factor(),
            max_distance_from_high: default_max_distance_from_high(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MomentumInput {
    pub series: Vec<PriceSeries>,
    #[serde(default)]
    pub config: MomentumConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MomentumScore {
    pub id: String,
    pub name: String,
    /// Per window, in config order. 2dp.
    pub sharpe: Vec<Option<Decimal>>,
    pub z_scores: Vec<Option<Decimal>>,
    pub distance_from_high: Option<Rate>,
    pub score: Option<Decimal>,
    pub rank: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MomentumOutput {
    pub windows: Vec<String>,
    /// Kept series, best score first. Series without a score come last.
    pub ranked: Vec<MomentumScore>,
    /// Series dropped by the distance-from-high filter.
    pub filtered: Vec<MomentumScore>,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

pub fn rank_momentum(input: &MomentumInput) -> FundRankResult<ComputationOutput<MomentumOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let config = &input.config;

    validate_momentum_input(input)?;

    let lookback = config
        .windows
        .iter()
        .map(|w| w.observations)
        .max()
        .unwrap_or_default();
    let annualisation = Decimal::from(config.annualisation_factor)
        .sqrt()
        .unwrap_or(Decimal::ZERO);

    let mut scores: Vec<MomentumScore> = input
        .series
        .iter()
        .map(|s| {
            let prices = trailing_prices(s, lookback);
            let sharpe = config
                .windows
                .iter()
                .map(|w| {
                    let tail = &prices[prices.len().saturating_sub(w.observations)..];
                    sharpe_ratio(tail, annualisation).map(|v| v.round_dp(2))
                })
                .collect::<Vec<_>>();
            if sharpe.iter().all(Option::is_none) {
                warnings.push(format!("'{}': no Sharpe ratio could be computed", s.id()));
            }
            MomentumScore {
                id: s.id().to_string(),
                name: s.display_name().to_string(),
                sharpe,
                z_scores: Vec::new(),
                distance_from_high: distance_from_high(&prices),
                score: None,
                rank: None,
            }
        })
        .collect();

    // Standardise each window across the whole universe, before filtering.
    for w in 0..config.windows.len() {
        let column: Vec<Option<Decimal>> = scores.iter().map(|s| s.sharpe[w]).collect();
        for (score, z) in scores.iter_mut().zip(z_scores(&column)) {
            score.z_scores.push(z.map(|v| v.round_dp(2)));
        }
    }

    let (mut ranked, filtered): (Vec<_>, Vec<_>) = scores.into_iter().partition(|s| {
        s.distance_from_high
            .is_some_and(|d| d < config.max_distance_from_high)
    });

    for s in ranked.iter_mut() {
        let available: Vec<Decimal> = s.z_scores.iter().flatten().copied().collect();
        s.score = if available.is_empty() {
            None
        } else {
            Some((available.iter().sum::<Decimal>() / Decimal::from(available.len() as u64)).round_dp(2))
        };
    }

    // stable: equal scores keep input order, missing scores last
    ranked.sort_by(|a, b| match (a.score, b.score) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    for (i, s) in ranked.iter_mut().enumerate() {
        s.rank = s.score.map(|_| (i + 1) as u32);
    }

    if !filtered.is_empty() {
        warnings.push(format!(
            "{} series filtered: {}% or more below their high",
            filtered.len(),
            (config.max_distance_from_high * dec!(100)).normalize()
        ));
    }
    tracing::info!(
        ranked = ranked.len(),
        filtered = filtered.len(),
        "momentum ranking complete"
    );

    let output = MomentumOutput {
        windows: config.windows.iter().map(|w| w.label.clone()).collect(),
        ranked,
        filtered,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Momentum ranking (mean z-score of trailing Sharpe ratios, distance-from-high filter)",
        &serde_json::json!({
            "windows": config.windows,
            "annualisation_factor": config.annualisation_factor,
            "max_distance_from_high": config.max_distance_from_high.to_string(),
            "std_dev_sharpe": "sample",
            "std_dev_z_score": "population",
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn validate_momentum_input(input: &MomentumInput) -> FundRankResult<()> {
    let config = &input.config;
    if config.windows.is_empty() {
        return Err(FundRankError::InvalidArgument {
            field: "windows".into(),
            reason: "At least one momentum window required".into(),
        });
    }
    if let Some(w) = config.windows.iter().find(|w| w.observations < 2) {
        return Err(FundRankError::InvalidArgument {
            field: "windows".into(),
            reason: format!("Window '{}' needs at least 2 observations", w.label),
        });
    }
    if config.annualisation_factor == 0 {
        return Err(FundRankError::InvalidArgument {
            field: "annualisation_factor".into(),
            reason: "Annualisation factor must be positive".into(),
        });
    }
    if config.max_distance_from_high <= Decimal::ZERO {
        return Err(FundRankError::InvalidArgument {
            field: "max_distance_from_high".into(),
            reason: "Distance from high must be positive".into(),
        });
    }
    Ok(())
}

/// The last `n` prices, oldest first.
fn trailing_prices(series: &PriceSeries, n: usize) -> Vec<Price> {
    let mut prices: Vec<Price> = series.iter().rev().take(n).map(|p| p.price).collect();
    prices.reverse();
    prices
}

/// Simple returns between consecutive prices. A zero previous price yields
/// no return for that step.
fn simple_returns(prices: &[Price]) -> Vec<Rate> {
    prices
        .windows(2)
        .filter_map(|w| w[1].checked_div(w[0]))
        .map(|ratio| ratio - Decimal::ONE)
        .collect()
}

/// Annualised Sharpe ratio of daily returns with zero risk-free rate.
///
/// `None` with fewer than two returns or zero volatility.
pub fn sharpe_ratio(prices: &[Price], annualisation: Decimal) -> Option<Decimal> {
    let returns = simple_returns(prices);
    if returns.len() < 2 {
        return None;
    }
    let n = Decimal::from(returns.len() as u64);
    let mean = returns.iter().sum::<Decimal>() / n;
    let sum_sq: Decimal = returns.iter().map(|r| (r - mean) * (r - mean)).sum();
    let std = (sum_sq / (n - Decimal::ONE)).sqrt()?;
    if std.is_zero() {
        return None;
    }
    mean.checked_div(std)?.checked_mul(annualisation)
}

/// Population z-scores; missing inputs stay missing. All `None` when the
/// column has no spread.
pub fn z_scores(values: &[Option<Decimal>]) -> Vec<Option<Decimal>> {
    let present: Vec<Decimal> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return vec![None; values.len()];
    }
    let n = Decimal::from(present.len() as u64);
    let mean = present.iter().sum::<Decimal>() / n;
    let variance = present.iter().map(|v| (v - mean) * (v - mean)).sum::<Decimal>() / n;
    let std = match variance.sqrt() {
        Some(s) if !s.is_zero() => s,
        _ => return vec![None; values.len()],
    };
    values.iter().map(|v| v.map(|v| (v - mean) / std)).collect()
}

/// `(high - last) / high` over the given prices.
fn distance_from_high(prices: &[Price]) -> Option<Rate> {
    let high = prices.iter().max().copied()?;
    let last = prices.last().copied()?;
    if high.is_zero() {
        return None;
    }
    (high - last).checked_div(high)
}

// ---------------------------------------------------------------------------
// Composite momentum
// ---------------------------------------------------------------------------

/// Daily returns behind the short Sharpe ratio (about three months).
pub const SHORT_SHARPE_RETURNS: usize = 63;
/// Daily returns behind the long Sharpe ratio (about six months).
pub const LONG_SHARPE_RETURNS: usize = 126;
/// Observations spanned by the one-month return.
pub const ONE_MONTH_OBSERVATIONS: usize = 21;

/// Weights applied to the per-metric ranks. Lower composite is better.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeConfig {
    #[serde(default = "default_composite_top_n")]
    pub top_n: usize,
    #[serde(default = "default_weight_3m")]
    pub weight_3m_sharpe: Decimal,
    #[serde(default = "default_weight_6m")]
    pub weight_6m_sharpe: Decimal,
    #[serde(default = "default_weight_1m")]
    pub weight_1m_return: Decimal,
    #[serde(default = "default_annualisation_factor")]
    pub annualisation_factor: u32,
}

fn default_composite_top_n() -> usize {
    5
}

fn default_weight_3m() -> Decimal {
    dec!(0.3)
}

fn default_weight_6m() -> Decimal {
    dec!(0.4)
}

fn default_weight_1m() -> Decimal {
    dec!(0.3)
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            top_n: default_composite_top_n(),
            weight_3m_sharpe: default_weight_3m(),
            weight_6m_sharpe: default_weight_6m(),
            weight_1m_return: default_weight_1m(),
            annualisation_factor: default_annualisation_factor(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeInput {
    pub series: Vec<PriceSeries>,
    #[serde(default)]
    pub config: CompositeConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeScore {
    pub id: String,
    pub name: String,
    pub sharpe_3m: Option<Decimal>,
    pub sharpe_6m: Option<Decimal>,
    pub return_1m: Option<Rate>,
    /// 1 is best; ties share the average of their positions.
    pub rank_3m: Option<Decimal>,
    pub rank_6m: Option<Decimal>,
    pub rank_1m: Option<Decimal>,
    /// Weighted sum of the three ranks. `None` if any metric is missing.
    pub score: Option<Decimal>,
    pub rank: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeOutput {
    /// Every series, best composite first, unscored last.
    pub ranked: Vec<CompositeScore>,
    /// Ids of the best `top_n` scored series.
    pub top: Vec<String>,
}

/// Rank-weighted blend of 3-month Sharpe, 6-month Sharpe and 1-month return.
pub fn rank_composite_momentum(
    input: &CompositeInput,
) -> FundRankResult<ComputationOutput<CompositeOutput>> {
    let start = Instant::now();
    let config = &input.config;
    let mut warnings: Vec<String> = Vec::new();

    validate_composite_config(config)?;

    let annualisation = Decimal::from(config.annualisation_factor)
        .sqrt()
        .unwrap_or(Decimal::ZERO);

    let mut scores: Vec<CompositeScore> = input
        .series
        .iter()
        .map(|s| {
            let short = trailing_prices(s, SHORT_SHARPE_RETURNS + 1);
            let long = trailing_prices(s, LONG_SHARPE_RETURNS + 1);
            CompositeScore {
                id: s.id().to_string(),
                name: s.display_name().to_string(),
                sharpe_3m: sharpe_ratio(&short, annualisation),
                sharpe_6m: sharpe_ratio(&long, annualisation),
                return_1m: one_month_return(s),
                rank_3m: None,
                rank_6m: None,
                rank_1m: None,
                score: None,
                rank: None,
            }
        })
        .collect();

    let rank_3m = descending_ranks(&scores.iter().map(|s| s.sharpe_3m).collect::<Vec<_>>());
    let rank_6m = descending_ranks(&scores.iter().map(|s| s.sharpe_6m).collect::<Vec<_>>());
    let rank_1m = descending_ranks(&scores.iter().map(|s| s.return_1m).collect::<Vec<_>>());

    for (i, s) in scores.iter_mut().enumerate() {
        s.rank_3m = rank_3m[i];
        s.rank_6m = rank_6m[i];
        s.rank_1m = rank_1m[i];
        s.score = match (s.rank_3m, s.rank_6m, s.rank_1m) {
            (Some(r3), Some(r6), Some(r1)) => Some(
                config.weight_3m_sharpe * r3
                    + config.weight_6m_sharpe * r6
                    + config.weight_1m_return * r1,
            ),
            _ => {
                warnings.push(format!("'{}': not enough history for a composite score", s.id));
                None
            }
        };
    }

    // stable: equal composites keep input order, unscored last
    scores.sort_by(|a, b| match (a.score, b.score) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    for (i, s) in scores.iter_mut().enumerate() {
        s.rank = s.score.map(|_| (i + 1) as u32);
    }

    let top = scores
        .iter()
        .filter(|s| s.score.is_some())
        .take(config.top_n)
        .map(|s| s.id.clone())
        .collect();

    tracing::info!(series = scores.len(), "composite momentum complete");

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Composite momentum (weighted ranks of 3M Sharpe, 6M Sharpe and 1M return)",
        config,
        warnings,
        elapsed,
        CompositeOutput {
            ranked: scores,
            top,
        },
    ))
}

fn validate_composite_config(config: &CompositeConfig) -> FundRankResult<()> {
    if config.top_n == 0 {
        return Err(FundRankError::InvalidArgument {
            field: "top_n".into(),
            reason: "Top-N must be at least 1".into(),
        });
    }
    let weights = [
        config.weight_3m_sharpe,
        config.weight_6m_sharpe,
        config.weight_1m_return,
    ];
    if weights.iter().any(|w| *w < Decimal::ZERO) {
        return Err(FundRankError::InvalidArgument {
            field: "weights".into(),
            reason: "Composite weights must be non-negative".into(),
        });
    }
    if config.annualisation_factor == 0 {
        return Err(FundRankError::InvalidArgument {
            field: "annualisation_factor".into(),
            reason: "Annualisation factor must be positive".into(),
        });
    }
    Ok(())
}

/// Last price against the price `ONE_MONTH_OBSERVATIONS - 1` steps earlier.
/// Needs more than `ONE_MONTH_OBSERVATIONS` observations.
fn one_month_return(series: &PriceSeries) -> Option<Rate> {
    if series.len() <= ONE_MONTH_OBSERVATIONS {
        return None;
    }
    let prices = trailing_prices(series, ONE_MONTH_OBSERVATIONS);
    let last = prices.last()?;
    let base = prices.first()?;
    Some(last.checked_div(*base)? - Decimal::ONE)
}

/// Rank 1 for the largest value. Ties share the mean of their positions;
/// missing values stay unranked.
pub fn descending_ranks(values: &[Option<Decimal>]) -> Vec<Option<Decimal>> {
    let mut present: Vec<(usize, Decimal)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .collect();
    present.sort_by(|a, b| b.1.cmp(&a.1));

    let mut ranks = vec![None; values.len()];
    let mut pos = 0;
    while pos < present.len() {
        let mut end = pos;
        while end + 1 < present.len() && present[end + 1].1 == present[pos].1 {
            end += 1;
        }
        // positions pos..=end are 1-based pos+1 ..= end+1
        let shared = Decimal::from((pos + end + 2) as u64) / dec!(2);
        for (i, _) in &present[pos..=end] {
            ranks[*i] = Some(shared);
        }
        pos = end + 1;
    }
    ranks
}
