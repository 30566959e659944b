//! Dual momentum rotation between a small set of funds.
//!
//! Each month every fund is scored on a weighted blend of its long and short
//! lookback returns over month-end closes. The strategy holds, for the next
//! month, whichever fund scored best, and reports the resulting trade ledger
//! and equity curve.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use chrono::{Datelike, NaiveDate};
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

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DualMomentumConfig {
    #[serde(default = "default_long_months")]
    pub long_months: usize,
    #[serde(default = "default_short_months")]
    pub short_months: usize,
    #[serde(default = "default_half")]
    pub long_weight: Decimal,
    #[serde(default = "default_half")]
    pub short_weight: Decimal,
}

fn default_long_months() -> usize {
    12
}

fn default_short_months() -> usize {
    6
}

fn default_half() -> Decimal {
    dec!(0.5)
}

impl Default for DualMomentumConfig {
    fn default() -> Self {
        Self {
            long_months: default_long_months(),
            short_months: default_short_months(),
            long_weight: default_half(),
            short_weight: default_half(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DualMomentumInput {
    pub series: Vec<PriceSeries>,
    #[serde(default)]
    pub config: DualMomentumConfig,
}

/// Scores at one month-end, in `tickers` order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySignal {
    pub month: NaiveDate,
    pub scores: Vec<Decimal>,
    pub best: String,
}

/// One month of holding. `nav_sell` is set on the last month of each holding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingMonth {
    pub month: NaiveDate,
    pub held: String,
    pub nav_buy: Price,
    pub nav_sell: Option<Price>,
    pub trade_return: Option<Rate>,
    pub monthly_return: Rate,
    pub equity: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DualMomentumOutput {
    pub tickers: Vec<String>,
    pub signals: Vec<MonthlySignal>,
    pub months: Vec<HoldingMonth>,
    pub final_equity: Decimal,
    pub cagr: Option<Rate>,
    pub max_drawdown: Option<Rate>,
    pub switches: u32,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

pub fn run_dual_momentum(
    input: &DualMomentumInput,
) -> FundRankResult<ComputationOutput<DualMomentumOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let config = &input.config;

    validate_dual_momentum_input(input)?;

    let tickers: Vec<String> = input.series.iter().map(|s| s.id().to_string()).collect();
    let closes: Vec<BTreeMap<NaiveDate, Price>> =
        input.series.iter().map(month_end_closes).collect();

    let mut common: BTreeSet<NaiveDate> = closes[0].keys().copied().collect();
    for c in &closes[1..] {
        common.retain(|m| c.contains_key(m));
    }
    let dropped = closes.iter().map(BTreeMap::len).max().unwrap_or(0) - common.len();
    if dropped > 0 {
        warnings.push(format!("{dropped} month(s) not shared by every fund were dropped"));
    }

    let months: Vec<NaiveDate> = common.into_iter().collect();
    // prices[fund][row]
    let prices: Vec<Vec<Price>> = closes
        .iter()
        .map(|c| months.iter().filter_map(|m| c.get(m).copied()).collect())
        .collect();

    // Rows where every fund has a score, with the index of the best fund.
    let lag = config.long_months.max(config.short_months);
    let mut rows: Vec<(usize, usize)> = Vec::new();
    let mut signals: Vec<MonthlySignal> = Vec::new();
    for row in lag..months.len() {
        let scores: Option<Vec<Decimal>> = prices
            .iter()
            .map(|p| {
                let long = lookback_return(p, row, config.long_months)?;
                let short = lookback_return(p, row, config.short_months)?;
                Some(config.long_weight * long + config.short_weight * short)
            })
            .collect();
        let Some(scores) = scores else {
            warnings.push(format!("{}: a fund has a zero close, month skipped", months[row]));
            continue;
        };
        let best = best_index(&scores);
        rows.push((row, best));
        signals.push(MonthlySignal {
            month: months[row],
            scores,
            best: tickers[best].clone(),
        });
    }

    if rows.len() < 2 {
        return Err(FundRankError::InsufficientHistory(format!(
            "{} scored month(s); at least 2 are needed to hold a position",
            rows.len()
        )));
    }

    let mut ledger: Vec<HoldingMonth> = Vec::with_capacity(rows.len() - 1);
    let mut current: Option<usize> = None;
    let mut nav_buy = Decimal::ZERO;
    let mut equity = Decimal::ONE;
    let mut switches = 0u32;
    for k in 1..rows.len() {
        let (prev_row, signal) = rows[k - 1];
        let (row, _) = rows[k];
        if current != Some(signal) {
            if let (Some(held), Some(last)) = (current, ledger.last_mut()) {
                close_trade(last, prices[held][prev_row]);
                switches += 1;
            }
            current = Some(signal);
            nav_buy = prices[signal][prev_row];
        }
        let monthly_return = prices[signal][row]
            .checked_div(prices[signal][prev_row])
            .ok_or_else(|| FundRankError::DegenerateBasis {
                context: format!("monthly return of '{}' at {}", tickers[signal], months[row]),
            })?
            - Decimal::ONE;
        equity *= Decimal::ONE + monthly_return;
        ledger.push(HoldingMonth {
            month: months[row],
            held: tickers[signal].clone(),
            nav_buy,
            nav_sell: None,
            trade_return: None,
            monthly_return,
            equity,
        });
    }
    if let (Some(held), Some(last)) = (current, ledger.last_mut()) {
        close_trade(last, prices[held][rows[rows.len() - 1].0]);
    }

    let cagr = annualised_growth(equity, ledger.len());
    let max_drawdown = max_drawdown(&ledger.iter().map(|m| m.equity).collect::<Vec<_>>());

    tracing::info!(
        funds = tickers.len(),
        months = ledger.len(),
        switches,
        "dual momentum complete"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Dual momentum rotation (weighted long and short lookback returns, month-end closes)",
        config,
        warnings,
        elapsed,
        DualMomentumOutput {
            tickers,
            signals,
            months: ledger,
            final_equity: equity,
            cagr,
            max_drawdown,
            switches,
        },
    ))
}

fn validate_dual_momentum_input(input: &DualMomentumInput) -> FundRankResult<()> {
    let config = &input.config;
    if input.series.len() < 2 {
        return Err(FundRankError::InvalidArgument {
            field: "series".into(),
            reason: "Dual momentum needs at least two funds".into(),
        });
    }
    let mut seen = BTreeSet::new();
    for s in &input.series {
        if !seen.insert(s.id()) {
            return Err(FundRankError::InvalidArgument {
                field: "series".into(),
                reason: format!("Fund '{}' appears more than once", s.id()),
            });
        }
    }
    if config.long_months == 0 || config.short_months == 0 {
        return Err(FundRankError::InvalidArgument {
            field: "months".into(),
            reason: "Lookback months must be at least 1".into(),
        });
    }
    if config.long_weight < Decimal::ZERO || config.short_weight < Decimal::ZERO {
        return Err(FundRankError::InvalidArgument {
            field: "weights".into(),
            reason: "Lookback weights must be non-negative".into(),
        });
    }
    if (config.long_weight + config.short_weight).is_zero() {
        return Err(FundRankError::InvalidArgument {
            field: "weights".into(),
            reason: "At least one lookback weight must be positive".into(),
        });
    }
    Ok(())
}

/// Last close of each calendar month, keyed by the first of that month.
fn month_end_closes(series: &PriceSeries) -> BTreeMap<NaiveDate, Price> {
    let mut closes = BTreeMap::new();
    for point in series.iter() {
        if let Some(month) = point.date.with_day(1) {
            closes.insert(month, point.price);
        }
    }
    closes
}

/// `p[row] / p[row - months] - 1`; `None` on a zero base or short history.
fn lookback_return(prices: &[Price], row: usize, months: usize) -> Option<Rate> {
    let base = prices.get(row.checked_sub(months)?)?;
    Some(prices.get(row)?.checked_div(*base)? - Decimal::ONE)
}

/// Highest score; the first fund wins ties.
fn best_index(scores: &[Decimal]) -> usize {
    let mut best = 0;
    for (i, s) in scores.iter().enumerate() {
        if *s > scores[best] {
            best = i;
        }
    }
    best
}

fn close_trade(month: &mut HoldingMonth, nav_sell: Price) {
    month.nav_sell = Some(nav_sell);
    month.trade_return = nav_sell
        .checked_div(month.nav_buy)
        .map(|ratio| ratio - Decimal::ONE);
}

/// `equity^(12 / months) - 1`.
fn annualised_growth(equity: Decimal, months: usize) -> Option<Rate> {
    if months == 0 || equity <= Decimal::ZERO {
        return None;
    }
    let exponent = dec!(12).checked_div(Decimal::from(months as u64))?;
    Some(equity.checked_powd(exponent)? - Decimal::ONE)
}

/// Largest fall from the running peak, over the highest peak reached.
pub fn max_drawdown(equity: &[Decimal]) -> Option<Rate> {
    let mut peak = *equity.first()?;
    let mut worst = Decimal::ZERO;
    for e in equity {
        peak = peak.max(*e);
        worst = worst.max(peak - *e);
    }
    worst.checked_div(peak)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monthly(id: &str, prices: &[Decimal]) -> PriceSeries {
        PriceSeries::new(
            id,
            prices.iter().enumerate().map(|(i, p)| {
                let date = NaiveDate::from_ymd_opt(2024, i as u32 + 1, 28).unwrap();
                (date, *p)
            }),
        )
        .unwrap()
    }

    fn one_month_config() -> DualMomentumConfig {
        DualMomentumConfig {
            long_months: 1,
            short_months: 1,
            ..DualMomentumConfig::default()
        }
    }

    #[test]
    fn test_rotates_into_stronger_fund() {
        let input = DualMomentumInput {
            series: vec![
                monthly("A", &[dec!(100), dec!(110), dec!(121), dec!(121), dec!(121)]),
                monthly("B", &[dec!(100), dec!(100), dec!(100), dec!(110), dec!(121)]),
            ],
            config: one_month_config(),
        };
        let out = run_dual_momentum(&input).unwrap().result;

        let held: Vec<&str> = out.months.iter().map(|m| m.held.as_str()).collect();
        assert_eq!(held, vec!["A", "A", "B"]);
        assert_eq!(out.switches, 1);

        // the A trade closes at the switch month's close
        assert_eq!(out.months[0].nav_sell, None);
        assert_eq!(out.months[1].nav_buy, dec!(110));
        assert_eq!(out.months[1].nav_sell, Some(dec!(121)));
        assert_eq!(out.months[1].trade_return, Some(dec!(0.1)));
        // the final holding closes at the last close
        assert_eq!(out.months[2].nav_buy, dec!(110));
        assert_eq!(out.months[2].nav_sell, Some(dec!(121)));

        assert_eq!(out.final_equity, dec!(1.21));
        assert_eq!(out.max_drawdown, Some(Decimal::ZERO));
        let cagr = out.cagr.unwrap();
        assert!((cagr - dec!(1.14358881)).abs() < dec!(0.000001), "cagr {cagr}");
    }

    #[test]
    fn test_drawdown_and_tie_break() {
        let input = DualMomentumInput {
            series: vec![
                monthly(
                    "A",
                    &[dec!(100), dec!(110), dec!(121), dec!(108.9), dec!(108.9)],
                ),
                monthly("B", &[dec!(100); 5]),
            ],
            config: one_month_config(),
        };
        let out = run_dual_momentum(&input).unwrap().result;

        // last signal is a 0 / 0 tie, which goes to the first fund
        assert_eq!(out.signals.last().unwrap().best, "A");
        let held: Vec<&str> = out.months.iter().map(|m| m.held.as_str()).collect();
        assert_eq!(held, vec!["A", "A", "B"]);
        assert_eq!(out.months[1].trade_return, Some(dec!(-0.01)));
        assert_eq!(out.final_equity, dec!(0.99));
        assert_eq!(out.max_drawdown, Some(dec!(0.1)));
    }

    #[test]
    fn test_last_close_of_month_wins() {
        let mut points: Vec<(NaiveDate, Decimal)> = (1..=5)
            .map(|m| (NaiveDate::from_ymd_opt(2024, m, 28).unwrap(), dec!(100)))
            .collect();
        points.push((NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(), dec!(1)));
        let series = PriceSeries::new("A", points).unwrap();

        let closes = month_end_closes(&series);
        assert_eq!(closes.len(), 5);
        assert_eq!(
            closes.get(&NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
            Some(&dec!(100))
        );
    }

    #[test]
    fn test_unshared_months_are_dropped() {
        let short = PriceSeries::new(
            "B",
            (2..=5).map(|m| (NaiveDate::from_ymd_opt(2024, m, 28).unwrap(), dec!(100))),
        )
        .unwrap();
        let input = DualMomentumInput {
            series: vec![
                monthly("A", &[dec!(100), dec!(101), dec!(102), dec!(103), dec!(104)]),
                short,
            ],
            config: one_month_config(),
        };
        let out = run_dual_momentum(&input).unwrap();
        assert_eq!(
            out.result.signals[0].month,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert!(out.warnings.iter().any(|w| w.contains("not shared")));
    }

    #[test]
    fn test_rejects_single_fund_and_short_history() {
        let single = DualMomentumInput {
            series: vec![monthly("A", &[dec!(100); 5])],
            config: DualMomentumConfig::default(),
        };
        assert!(matches!(
            run_dual_momentum(&single),
            Err(FundRankError::InvalidArgument { .. })
        ));

        // a 12-month lookback over 12 month-ends scores nothing
        let short = DualMomentumInput {
            series: vec![monthly("A", &[dec!(100); 12]), monthly("B", &[dec!(100); 12])],
            config: DualMomentumConfig::default(),
        };
        assert!(matches!(
            run_dual_momentum(&short),
            Err(FundRankError::InsufficientHistory(_))
        ));
    }

    #[test]
    fn test_max_drawdown_uses_highest_peak() {
        let dd = max_drawdown(&[dec!(1), dec!(2), dec!(1.5), dec!(2.5)]).unwrap();
        assert_eq!(dd, dec!(0.2));
        assert_eq!(max_drawdown(&[]), None);
    }
}
