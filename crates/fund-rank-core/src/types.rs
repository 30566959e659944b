use std::collections::BTreeMap;
use std::ops::Bound;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::FundRankError;
use crate::FundRankResult;

/// A NAV or closing price. Never negative inside a `PriceSeries`.
pub type Price = Decimal;

/// Returns expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Year fractions
pub type Years = Decimal;

/// One dated observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: Price,
}

/// Price history for a single fund or benchmark, ordered by date.
///
/// Dates are unique and prices are non-negative. Gaps for weekends and
/// holidays are expected and left to the resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PriceSeriesRecord", into = "PriceSeriesRecord")]
pub struct PriceSeries {
    id: String,
    name: Option<String>,
    points: BTreeMap<NaiveDate, Price>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PriceSeriesRecord {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series, rejecting duplicate dates and negative prices.
    pub fn new(
        id: impl Into<String>,
        points: impl IntoIterator<Item = (NaiveDate, Price)>,
    ) -> FundRankResult<Self> {
        let id = id.into();
        let mut map = BTreeMap::new();
        for (date, price) in points {
            if price < Decimal::ZERO {
                return Err(FundRankError::InvalidArgument {
                    field: "price".into(),
                    reason: format!("Negative price {price} for '{id}' on {date}"),
                });
            }
            if map.insert(date, price).is_some() {
                return Err(FundRankError::InvalidArgument {
                    field: "date".into(),
                    reason: format!("Duplicate date {date} in series '{id}'"),
                });
            }
        }
        Ok(Self {
            id,
            name: None,
            points: map,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name if known, otherwise the identifier.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, date: NaiveDate) -> Option<Price> {
        self.points.get(&date).copied()
    }

    pub fn first(&self) -> Option<PricePoint> {
        self.points
            .iter()
            .next()
            .map(|(d, p)| PricePoint { date: *d, price: *p })
    }

    pub fn last(&self) -> Option<PricePoint> {
        self.points
            .iter()
            .next_back()
            .map(|(d, p)| PricePoint { date: *d, price: *p })
    }

    /// Latest observation with `from <= date <= to`.
    pub fn latest_between(&self, from: Bound<NaiveDate>, to: NaiveDate) -> Option<PricePoint> {
        self.points
            .range((from, Bound::Included(to)))
            .next_back()
            .map(|(d, p)| PricePoint { date: *d, price: *p })
    }

    /// Calendar days between the first and last observation.
    pub fn span_days(&self) -> i64 {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => (last.date - first.date).num_days(),
            _ => 0,
        }
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = PricePoint> + '_ {
        self.points
            .iter()
            .map(|(d, p)| PricePoint { date: *d, price: *p })
    }
}

impl TryFrom<PriceSeriesRecord> for PriceSeries {
    type Error = FundRankError;

    fn try_from(record: PriceSeriesRecord) -> Result<Self, Self::Error> {
        let series = PriceSeries::new(
            record.id,
            record.points.into_iter().map(|p| (p.date, p.price)),
        )?;
        Ok(match record.name {
            Some(name) => series.with_name(name),
            None => series,
        })
    }
}

impl From<PriceSeries> for PriceSeriesRecord {
    fn from(series: PriceSeries) -> Self {
        let points = series.iter().collect();
        PriceSeriesRecord {
            id: series.id,
            name: series.name,
            points,
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_series_sorted_regardless_of_input_order() {
        let s = PriceSeries::new(
            "F1",
            vec![(d(2023, 1, 9), dec!(110)), (d(2023, 1, 2), dec!(100))],
        )
        .unwrap();
        assert_eq!(s.first().unwrap().date, d(2023, 1, 2));
        assert_eq!(s.last().unwrap().price, dec!(110));
        assert_eq!(s.span_days(), 7);
    }

    #[test]
    fn test_duplicate_date_rejected() {
        let r = PriceSeries::new(
            "F1",
            vec![(d(2023, 1, 2), dec!(100)), (d(2023, 1, 2), dec!(101))],
        );
        assert!(matches!(r, Err(FundRankError::InvalidArgument { .. })));
    }

    #[test]
    fn test_negative_price_rejected() {
        let r = PriceSeries::new("F1", vec![(d(2023, 1, 2), dec!(-1))]);
        assert!(r.is_err());
    }

    #[test]
    fn test_zero_price_is_stored() {
        let s = PriceSeries::new("F1", vec![(d(2023, 1, 2), Decimal::ZERO)]).unwrap();
        assert_eq!(s.get(d(2023, 1, 2)), Some(Decimal::ZERO));
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let s = PriceSeries::new("119598", Vec::new()).unwrap();
        assert_eq!(s.display_name(), "119598");
        let s = s.with_name("Blue Chip Fund");
        assert_eq!(s.display_name(), "Blue Chip Fund");
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"{"id":"F1","points":[
            {"date":"2023-01-02","price":"100"},
            {"date":"2023-01-02","price":"101"}]}"#;
        assert!(serde_json::from_str::<PriceSeries>(json).is_err());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let s = PriceSeries::new("F1", vec![(d(2023, 1, 2), dec!(100.5))])
            .unwrap()
            .with_name("Fund One");
        let json = serde_json::to_string(&s).unwrap();
        let back: PriceSeries = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
