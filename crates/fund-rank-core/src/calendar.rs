//! Anchor-date generation.
//!
//! Anchors are the endpoints of the return periods a ranking run compares.
//! They are spaced one calendar year apart, pinned to month ends and nudged
//! back onto Monday–Friday. Exchange holidays are not modelled here; the
//! resolver absorbs them when it looks up prices.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::FundRankError;
use crate::FundRankResult;

/// Validated construction of a calendar date.
pub fn date_from_ymd(year: i32, month: u32, day: u32) -> FundRankResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| FundRankError::InvalidArgument {
        field: "date".into(),
        reason: format!("{year:04}-{month:02}-{day:02} is not a valid calendar date"),
    })
}

pub fn is_working_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Last calendar day of `month` in `year` (28, 29, 30 or 31).
pub fn last_day_of_month(year: i32, month: u32) -> FundRankResult<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    date_from_ymd(next_year, next_month, 1)?
        .pred_opt()
        .ok_or_else(|| out_of_range(year, month))
}

/// Last Monday–Friday of the month before `date`'s month.
pub fn last_working_day_before(date: NaiveDate) -> FundRankResult<NaiveDate> {
    let mut day = date
        .with_day(1)
        .and_then(|first| first.pred_opt())
        .ok_or_else(|| out_of_range(date.year(), date.month()))?;
    while !is_working_day(day) {
        day = day
            .pred_opt()
            .ok_or_else(|| out_of_range(day.year(), day.month()))?;
    }
    Ok(day)
}

/// `count` anchors, most recent first.
///
/// The first anchor is `start` itself. Each following anchor is the last day
/// of the same month one year earlier, moved back one day from a Saturday or
/// two from a Sunday.
pub fn yearly_anchors(start: NaiveDate, count: i64) -> FundRankResult<AnchorDateSequence> {
    if count < 0 {
        return Err(FundRankError::InvalidArgument {
            field: "count".into(),
            reason: format!("Anchor count must be non-negative, got {count}"),
        });
    }

    // The count is caller-controlled; the calendar range bounds the loop.
    let mut dates = Vec::new();
    let mut current = start;
    for i in 0..count {
        dates.push(current);
        if i + 1 == count {
            break;
        }
        let month_end = last_day_of_month(current.year() - 1, current.month())?;
        current = match month_end.weekday() {
            Weekday::Sat => month_end - Duration::days(1),
            Weekday::Sun => month_end - Duration::days(2),
            _ => month_end,
        };
    }

    Ok(AnchorDateSequence {
        dates,
        order: AnchorOrder::Descending,
    })
}

/// Anchors counted back from the last working day of the month before
/// `reference_date`.
pub fn compute_anchors(reference_date: NaiveDate, count: i64) -> FundRankResult<AnchorDateSequence> {
    let start = last_working_day_before(reference_date)?;
    yearly_anchors(start, count)
}

fn out_of_range(year: i32, month: u32) -> FundRankError {
    FundRankError::InvalidArgument {
        field: "date".into(),
        reason: format!("{year:04}-{month:02} is outside the supported calendar range"),
    }
}

// ---------------------------------------------------------------------------
// Anchor sequences
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorOrder {
    /// Most recent first, the order `yearly_anchors` generates.
    Descending,
    Ascending,
}

/// A measurement period between two anchors. `start` is always the earlier
/// date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnchorPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl AnchorPeriod {
    fn between(a: NaiveDate, b: NaiveDate) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn label(&self) -> String {
        format!("{} to {}", self.start, self.end)
    }
}

/// Strictly monotonic anchor dates with an explicit direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<NaiveDate>", into = "Vec<NaiveDate>")]
pub struct AnchorDateSequence {
    dates: Vec<NaiveDate>,
    order: AnchorOrder,
}

impl AnchorDateSequence {
    /// Accepts strictly increasing or strictly decreasing dates.
    pub fn new(dates: Vec<NaiveDate>) -> FundRankResult<Self> {
        if dates.len() < 2 {
            return Ok(Self {
                dates,
                order: AnchorOrder::Descending,
            });
        }
        let order = if dates[0] > dates[1] {
            AnchorOrder::Descending
        } else {
            AnchorOrder::Ascending
        };
        let monotonic = dates.windows(2).all(|w| match order {
            AnchorOrder::Descending => w[0] > w[1],
            AnchorOrder::Ascending => w[0] < w[1],
        });
        if !monotonic {
            return Err(FundRankError::InvalidArgument {
                field: "anchors".into(),
                reason: "Anchor dates must be strictly increasing or strictly decreasing".into(),
            });
        }
        Ok(Self { dates, order })
    }

    pub fn order(&self) -> AnchorOrder {
        self.order
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn most_recent(&self) -> Option<NaiveDate> {
        match self.order {
            AnchorOrder::Descending => self.dates.first().copied(),
            AnchorOrder::Ascending => self.dates.last().copied(),
        }
    }

    /// Same dates, opposite direction.
    pub fn reversed(&self) -> Self {
        let mut dates = self.dates.clone();
        dates.reverse();
        let order = match (self.dates.len() < 2, self.order) {
            (true, _) => AnchorOrder::Descending,
            (false, AnchorOrder::Descending) => AnchorOrder::Ascending,
            (false, AnchorOrder::Ascending) => AnchorOrder::Descending,
        };
        Self { dates, order }
    }

    /// Periods between anchors `i` and `i + 1`, in sequence order.
    pub fn consecutive_periods(&self) -> Vec<AnchorPeriod> {
        self.dates
            .windows(2)
            .map(|w| AnchorPeriod::between(w[0], w[1]))
            .collect()
    }

    /// The most recent anchor paired with every other anchor, in sequence
    /// order. For descending anchors that is the 1-year horizon first.
    pub fn horizon_periods(&self) -> Vec<AnchorPeriod> {
        let Some(end) = self.most_recent() else {
            return Vec::new();
        };
        self.dates
            .iter()
            .filter(|d| **d != end)
            .map(|d| AnchorPeriod::between(*d, end))
            .collect()
    }
}

impl TryFrom<Vec<NaiveDate>> for AnchorDateSequence {
    type Error = FundRankError;

    fn try_from(dates: Vec<NaiveDate>) -> Result<Self, Self::Error> {
        AnchorDateSequence::new(dates)
    }
}

impl From<AnchorDateSequence> for Vec<NaiveDate> {
    fn from(seq: AnchorDateSequence) -> Self {
        seq.dates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_last_working_day_skips_saturday() {
        // 2025-05-31 is a Saturday
        assert_eq!(last_working_day_before(d(2025, 6, 15)).unwrap(), d(2025, 5, 30));
    }

    #[test]
    fn test_last_working_day_skips_sunday() {
        // 2024-03-31 is a Sunday
        assert_eq!(last_working_day_before(d(2024, 4, 10)).unwrap(), d(2024, 3, 29));
    }

    #[test]
    fn test_last_working_day_crosses_year() {
        assert_eq!(last_working_day_before(d(2025, 1, 5)).unwrap(), d(2024, 12, 31));
    }

    #[test]
    fn test_last_day_of_month_february() {
        assert_eq!(last_day_of_month(2024, 2).unwrap(), d(2024, 2, 29));
        assert_eq!(last_day_of_month(2023, 2).unwrap(), d(2023, 2, 28));
        assert_eq!(last_day_of_month(2023, 12).unwrap(), d(2023, 12, 31));
    }

    #[test]
    fn test_anchors_leap_year() {
        let a = yearly_anchors(d(2024, 2, 29), 3).unwrap();
        assert_eq!(a.dates(), &[d(2024, 2, 29), d(2023, 2, 28), d(2022, 2, 28)]);
    }

    #[test]
    fn test_anchors_weekend_adjustment() {
        // 2025-05-31 Saturday -> Friday 30th
        let a = yearly_anchors(d(2026, 5, 29), 2).unwrap();
        assert_eq!(a.dates()[1], d(2025, 5, 30));
        // 2024-03-31 Sunday -> Friday 29th
        let a = yearly_anchors(d(2025, 3, 31), 2).unwrap();
        assert_eq!(a.dates()[1], d(2024, 3, 29));
    }

    #[test]
    fn test_anchor_count_and_working_days() {
        let a = compute_anchors(d(2025, 6, 15), 10).unwrap();
        assert_eq!(a.len(), 10);
        assert_eq!(a.order(), AnchorOrder::Descending);
        assert!(a.dates().iter().all(|x| is_working_day(*x)));
        for w in a.dates().windows(2) {
            let gap = (w[0] - w[1]).num_days();
            assert!((362..=368).contains(&gap), "gap {gap} between {} and {}", w[0], w[1]);
        }
    }

    #[test]
    fn test_zero_count_is_empty() {
        assert!(yearly_anchors(d(2025, 5, 30), 0).unwrap().is_empty());
    }

    #[test]
    fn test_negative_count_rejected() {
        assert!(matches!(
            yearly_anchors(d(2025, 5, 30), -1),
            Err(FundRankError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_unbounded_count_stops_at_calendar_range() {
        assert!(matches!(
            yearly_anchors(d(2024, 5, 31), i64::MAX),
            Err(FundRankError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_invalid_date_rejected() {
        assert!(date_from_ymd(2023, 2, 29).is_err());
        assert!(date_from_ymd(2024, 2, 29).is_ok());
    }

    #[test]
    fn test_sequence_rejects_non_monotonic() {
        let r = AnchorDateSequence::new(vec![d(2024, 1, 1), d(2022, 1, 1), d(2023, 1, 1)]);
        assert!(r.is_err());
        let r = AnchorDateSequence::new(vec![d(2024, 1, 1), d(2024, 1, 1)]);
        assert!(r.is_err());
    }

    #[test]
    fn test_consecutive_periods_start_is_earlier() {
        let a = AnchorDateSequence::new(vec![d(2024, 1, 1), d(2023, 1, 1), d(2022, 1, 1)]).unwrap();
        let p = a.consecutive_periods();
        assert_eq!(p.len(), 2);
        assert_eq!(p[0], AnchorPeriod { start: d(2023, 1, 1), end: d(2024, 1, 1) });
        assert_eq!(p[1], AnchorPeriod { start: d(2022, 1, 1), end: d(2023, 1, 1) });

        let asc = a.reversed();
        assert_eq!(asc.order(), AnchorOrder::Ascending);
        assert_eq!(asc.consecutive_periods()[0].start, d(2022, 1, 1));
    }

    #[test]
    fn test_horizon_periods_share_end() {
        let a = AnchorDateSequence::new(vec![d(2024, 1, 1), d(2023, 1, 1), d(2022, 1, 1)]).unwrap();
        let h = a.horizon_periods();
        assert_eq!(h.len(), 2);
        assert!(h.iter().all(|p| p.end == d(2024, 1, 1)));
        assert_eq!(h[0].start, d(2023, 1, 1));
        assert_eq!(h[1].start, d(2022, 1, 1));
    }

    #[test]
    fn test_sequence_serde_validates() {
        let bad = r#"["2024-01-01","2025-01-01","2023-01-01"]"#;
        assert!(serde_json::from_str::<AnchorDateSequence>(bad).is_err());
        let good = r#"["2024-01-01","2023-01-01"]"#;
        let seq: AnchorDateSequence = serde_json::from_str(good).unwrap();
        assert_eq!(seq.most_recent(), Some(d(2024, 1, 1)));
    }
}
