use std::ops::Bound;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calendar::{AnchorDateSequence, AnchorPeriod};
use crate::error::{FundRankError, MissingReason};
use crate::resolver::{resolve_price, ResolutionPolicy, ResolvedPrice};
use crate::types::{Price, PriceSeries, Rate, Years};
use crate::FundRankResult;

/// Day-count denominator for elapsed years.
pub const DAYS_PER_YEAR: Decimal = dec!(365.25);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnBasis {
    Simple,
    Cagr,
}

/// Which pair of dates measures elapsed time for CAGR.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElapsedBasis {
    /// Dates of the prices actually used.
    #[default]
    ResolvedDates,
    /// The requested anchor dates.
    RequestedDates,
}

/// A return over one period, as an exact fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnRecord {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub value: Rate,
    pub basis: ReturnBasis,
    /// Date of the starting price used (may precede `period_start`).
    pub start_price_date: NaiveDate,
    pub end_price_date: NaiveDate,
}

/// One slot of a return sequence: a value or the reason it is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PeriodValue {
    Available(ReturnRecord),
    Missing {
        period_start: NaiveDate,
        period_end: NaiveDate,
        reason: MissingReason,
    },
}

impl PeriodValue {
    pub fn missing(period: AnchorPeriod, reason: MissingReason) -> Self {
        PeriodValue::Missing {
            period_start: period.start,
            period_end: period.end,
            reason,
        }
    }

    pub fn value(&self) -> Option<Rate> {
        match self {
            PeriodValue::Available(r) => Some(r.value),
            PeriodValue::Missing { .. } => None,
        }
    }

    pub fn missing_reason(&self) -> Option<MissingReason> {
        match self {
            PeriodValue::Available(_) => None,
            PeriodValue::Missing { reason, .. } => Some(*reason),
        }
    }

    pub fn period(&self) -> AnchorPeriod {
        match self {
            PeriodValue::Available(r) => AnchorPeriod {
                start: r.period_start,
                end: r.period_end,
            },
            PeriodValue::Missing {
                period_start,
                period_end,
                ..
            } => AnchorPeriod {
                start: *period_start,
                end: *period_end,
            },
        }
    }
}

/// `(end / start) - 1`. A zero or negative start is a degenerate basis.
pub fn simple_return(start_price: Price, end_price: Price) -> FundRankResult<Rate> {
    if start_price <= Decimal::ZERO {
        return Err(FundRankError::DegenerateBasis {
            context: format!("simple return with starting price {start_price}"),
        });
    }
    let ratio = end_price
        .checked_div(start_price)
        .ok_or_else(|| FundRankError::DegenerateBasis {
            context: format!("simple return {end_price} / {start_price} out of range"),
        })?;
    Ok(ratio - Decimal::ONE)
}

/// Point-to-point return between two dates, each resolved independently.
pub fn period_return(
    series: &PriceSeries,
    start: NaiveDate,
    end: NaiveDate,
    policy: ResolutionPolicy,
) -> FundRankResult<ReturnRecord> {
    let start_px = resolve_price(series, start, policy)?;
    let end_px = resolve_price(series, end, policy)?;
    let value = simple_return(start_px.price, end_px.price).map_err(|_| {
        FundRankError::DegenerateBasis {
            context: format!(
                "period return for '{}' from price dated {}",
                series.id(),
                start_px.date
            ),
        }
    })?;
    Ok(record(start, end, value, ReturnBasis::Simple, &start_px, &end_px))
}

/// Compound annual growth rate between two dates.
///
/// Elapsed time is measured between the resolved price dates. Returns
/// `Ok(None)` when that span is not positive: the history is too short for
/// the horizon, which is different from a 0% return.
pub fn cagr(series: &PriceSeries, start: NaiveDate, end: NaiveDate) -> FundRankResult<Option<ReturnRecord>> {
    cagr_with(series, start, end, ElapsedBasis::ResolvedDates)
}

/// CAGR with an explicit choice of elapsed-time basis.
pub fn cagr_with(
    series: &PriceSeries,
    start: NaiveDate,
    end: NaiveDate,
    elapsed: ElapsedBasis,
) -> FundRankResult<Option<ReturnRecord>> {
    let start_px = resolve_price(series, start, ResolutionPolicy::AsOf)?;
    let end_px = resolve_price(series, end, ResolutionPolicy::AsOf)?;

    if start_px.price <= Decimal::ZERO {
        return Err(FundRankError::DegenerateBasis {
            context: format!(
                "CAGR for '{}' from price dated {}",
                series.id(),
                start_px.date
            ),
        });
    }

    let days = match elapsed {
        ElapsedBasis::ResolvedDates => (end_px.date - start_px.date).num_days(),
        ElapsedBasis::RequestedDates => (end - start).num_days(),
    };
    let years: Years = Decimal::from(days) / DAYS_PER_YEAR;
    if years <= Decimal::ZERO {
        return Ok(None);
    }

    let ratio = end_px
        .price
        .checked_div(start_px.price)
        .ok_or_else(|| FundRankError::DegenerateBasis {
            context: format!("CAGR for '{}': price ratio out of range", series.id()),
        })?;
    let growth = if ratio.is_zero() {
        Decimal::ZERO
    } else {
        ratio
            .checked_powd(Decimal::ONE / years)
            .ok_or_else(|| FundRankError::DegenerateBasis {
                context: format!("CAGR for '{}': growth factor out of range", series.id()),
            })?
    };

    Ok(Some(record(
        start,
        end,
        growth - Decimal::ONE,
        ReturnBasis::Cagr,
        &start_px,
        &end_px,
    )))
}

/// Simple returns between consecutive anchors, in anchor order.
///
/// A period that cannot be resolved becomes `PeriodValue::Missing`; the
/// other periods are unaffected.
pub fn rolling_returns(
    series: &PriceSeries,
    anchors: &AnchorDateSequence,
) -> FundRankResult<Vec<PeriodValue>> {
    require_two_anchors(anchors)?;
    Ok(anchors
        .consecutive_periods()
        .into_iter()
        .map(|period| {
            match period_return(series, period.start, period.end, ResolutionPolicy::AsOf) {
                Ok(r) => PeriodValue::Available(r),
                Err(e) => missing_period(series, period, &e),
            }
        })
        .collect())
}

/// CAGR from every older anchor to the most recent one (1-year, 2-year, …).
pub fn horizon_returns(
    series: &PriceSeries,
    anchors: &AnchorDateSequence,
    elapsed: ElapsedBasis,
) -> FundRankResult<Vec<PeriodValue>> {
    require_two_anchors(anchors)?;
    Ok(anchors
        .horizon_periods()
        .into_iter()
        .map(
            |period| match cagr_with(series, period.start, period.end, elapsed) {
                Ok(Some(r)) => PeriodValue::Available(r),
                Ok(None) => {
                    let e = FundRankError::InsufficientHistory(format!(
                        "no elapsed time between resolved prices for {}",
                        period.label()
                    ));
                    missing_period(series, period, &e)
                }
                Err(e) => missing_period(series, period, &e),
            },
        )
        .collect())
}

fn require_two_anchors(anchors: &AnchorDateSequence) -> FundRankResult<()> {
    if anchors.len() < 2 {
        return Err(FundRankError::InsufficientHistory(format!(
            "At least 2 anchor dates required, got {}",
            anchors.len()
        )));
    }
    Ok(())
}

fn missing_period(series: &PriceSeries, period: AnchorPeriod, err: &FundRankError) -> PeriodValue {
    tracing::warn!(series = series.id(), period = %period.label(), "{err}");
    PeriodValue::missing(period, err.missing_reason())
}

fn record(
    start: NaiveDate,
    end: NaiveDate,
    value: Rate,
    basis: ReturnBasis,
    start_px: &ResolvedPrice,
    end_px: &ResolvedPrice,
) -> ReturnRecord {
    ReturnRecord {
        period_start: start,
        period_end: end,
        value,
        basis,
        start_price_date: start_px.date,
        end_price_date: end_px.date,
    }
}

// ---------------------------------------------------------------------------
// Trailing window returns
// ---------------------------------------------------------------------------

/// One day of an N-year trailing return series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailingReturnPoint {
    pub date: NaiveDate,
    pub value: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailingWindowReturns {
    pub series_id: String,
    pub years: u32,
    pub from: NaiveDate,
    pub points: Vec<TrailingReturnPoint>,
    /// Days dropped because the earlier price was zero.
    pub skipped_degenerate: usize,
}

/// Daily N-year returns on a forward-filled calendar.
///
/// Every calendar day from `from` onward carries the last known price. For
/// each day `d` whose `years * 365`-day lookback also lies on or after the
/// first filled day, the value is `price(d) / price(d - lookback) - 1`.
pub fn trailing_window_returns(
    series: &PriceSeries,
    years: u32,
    from: NaiveDate,
) -> FundRankResult<TrailingWindowReturns> {
    if years == 0 {
        return Err(FundRankError::InvalidArgument {
            field: "years".into(),
            reason: "Trailing window must be at least one year".into(),
        });
    }
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return Err(FundRankError::InsufficientHistory(format!(
            "series '{}' is empty",
            series.id()
        )));
    };
    if last.date < from {
        return Err(FundRankError::InsufficientHistory(format!(
            "series '{}' has no data on or after {from}",
            series.id()
        )));
    }

    let out_of_range = || FundRankError::InvalidArgument {
        field: "years".into(),
        reason: format!("A {years}-year window from {from} leaves the supported calendar range"),
    };
    let lag = Duration::try_days(i64::from(years) * 365).ok_or_else(out_of_range)?;
    let base = from.max(first.date);
    let mut day = base.checked_add_signed(lag).ok_or_else(out_of_range)?;
    let mut points = Vec::new();
    let mut skipped_degenerate = 0;

    while day <= last.date {
        let then_date = day.checked_sub_signed(lag).ok_or_else(out_of_range)?;
        let now = series.latest_between(Bound::Unbounded, day);
        let then = series.latest_between(Bound::Unbounded, then_date);
        if let (Some(now), Some(then)) = (now, then) {
            match simple_return(then.price, now.price) {
                Ok(value) => points.push(TrailingReturnPoint { date: day, value }),
                Err(_) => skipped_degenerate += 1,
            }
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }

    if skipped_degenerate > 0 {
        tracing::warn!(
            series = series.id(),
            skipped = skipped_degenerate,
            "trailing returns skipped days with a zero starting price"
        );
    }

    Ok(TrailingWindowReturns {
        series_id: series.id().to_string(),
        years,
        from,
        points,
        skipped_degenerate,
    })
}
