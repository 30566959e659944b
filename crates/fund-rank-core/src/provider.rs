//! Price history sources.
//!
//! The engine never fetches data. Callers build one provider, pass it by
//! reference to [`collect_entities`], and feed the result to the ranking
//! engine.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::FundRankError;
use crate::ranking::EntityInput;
use crate::types::PriceSeries;
use crate::FundRankResult;

/// Source of price history by identifier.
pub trait PriceHistoryProvider {
    /// `Ok(None)` means the provider has no data for `id`, which is not the
    /// same as an empty series.
    fn fetch(&self, id: &str) -> FundRankResult<Option<PriceSeries>>;
}

/// Provider over series already held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    series: HashMap<String, PriceSeries>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, series: PriceSeries) {
        self.series.insert(series.id().to_string(), series);
    }

    pub fn with(mut self, series: PriceSeries) -> Self {
        self.insert(series);
        self
    }
}

impl PriceHistoryProvider for InMemoryProvider {
    fn fetch(&self, id: &str) -> FundRankResult<Option<PriceSeries>> {
        Ok(self.series.get(id).cloned())
    }
}

/// Fetch every id, in order. A failed fetch becomes a no-data entity and a
/// warning instead of an error, so the fund still shows up in the ranking.
pub fn collect_entities<P>(provider: &P, ids: &[String]) -> Vec<EntityInput>
where
    P: PriceHistoryProvider + ?Sized,
{
    ids.iter()
        .map(|id| match provider.fetch(id) {
            Ok(Some(series)) => EntityInput {
                id: id.clone(),
                name: series.name().map(str::to_string),
                series: Some(series),
            },
            Ok(None) => {
                tracing::warn!(id = %id, "provider has no data");
                EntityInput::no_data(id.clone())
            }
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "fetch failed, treating as no data");
                EntityInput::no_data(id.clone())
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// mfapi.in documents
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct MfapiDocument {
    #[serde(default)]
    meta: MfapiMeta,
    data: Vec<MfapiNav>,
}

#[derive(Debug, Default, Deserialize)]
struct MfapiMeta {
    #[serde(default)]
    scheme_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MfapiNav {
    date: String,
    nav: String,
}

/// Parse an mfapi.in NAV history document:
/// `{"meta": {"scheme_name": ..}, "data": [{"date": "dd-mm-yyyy", "nav": ".."}]}`.
///
/// Rows come newest first; if a date repeats, the first row wins.
pub fn parse_mfapi_history(id: &str, doc: &serde_json::Value) -> FundRankResult<PriceSeries> {
    let doc = MfapiDocument::deserialize(doc)?;

    let mut points: Vec<(NaiveDate, Decimal)> = Vec::with_capacity(doc.data.len());
    let mut seen = std::collections::HashSet::new();
    for row in doc.data {
        let date = NaiveDate::parse_from_str(&row.date, "%d-%m-%Y").map_err(|e| {
            FundRankError::InvalidArgument {
                field: "date".into(),
                reason: format!("'{}' in history for '{id}': {e}", row.date),
            }
        })?;
        let nav = Decimal::from_str(row.nav.trim()).map_err(|e| FundRankError::InvalidArgument {
            field: "nav".into(),
            reason: format!("'{}' on {date} for '{id}': {e}", row.nav),
        })?;
        if !seen.insert(date) {
            tracing::debug!(id, %date, "duplicate NAV row skipped");
            continue;
        }
        points.push((date, nav));
    }

    let series = PriceSeries::new(id, points)?;
    Ok(match doc.meta.scheme_name {
        Some(name) => series.with_name(name),
        None => series,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_parse_mfapi_document() {
        let doc = json!({
            "meta": {"scheme_name": "SBI Blue Chip Fund", "scheme_code": 119598},
            "data": [
                {"date": "03-01-2024", "nav": "80.12340"},
                {"date": "02-01-2024", "nav": "79.50000"}
            ],
            "status": "SUCCESS"
        });
        let s = parse_mfapi_history("119598", &doc).unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.name(), Some("SBI Blue Chip Fund"));
        assert_eq!(s.first().unwrap().price, dec!(79.5));
        assert_eq!(s.last().unwrap().date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
    }

    #[test]
    fn test_parse_rejects_bad_nav() {
        let doc = json!({"data": [{"date": "03-01-2024", "nav": "n/a"}]});
        assert!(matches!(
            parse_mfapi_history("X", &doc),
            Err(FundRankError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_parse_empty_history_is_empty_series() {
        let doc = json!({"meta": {}, "data": []});
        let s = parse_mfapi_history("X", &doc).unwrap();
        assert!(s.is_empty());
    }

    #[test]
    fn test_duplicate_rows_keep_first() {
        let doc = json!({"data": [
            {"date": "03-01-2024", "nav": "10"},
            {"date": "03-01-2024", "nav": "11"}
        ]});
        let s = parse_mfapi_history("X", &doc).unwrap();
        assert_eq!(s.len(), 1);
        assert_eq!(s.last().unwrap().price, dec!(10));
    }

    struct FailingProvider;

    impl PriceHistoryProvider for FailingProvider {
        fn fetch(&self, id: &str) -> FundRankResult<Option<PriceSeries>> {
            Err(FundRankError::InvalidArgument {
                field: "id".into(),
                reason: format!("unreadable '{id}'"),
            })
        }
    }

    #[test]
    fn test_collect_entities_keeps_failures() {
        let ids = vec!["A".to_string(), "B".to_string()];
        let entities = collect_entities(&FailingProvider, &ids);
        assert_eq!(entities.len(), 2);
        assert!(entities.iter().all(|e| e.series.is_none()));
    }

    #[test]
    fn test_in_memory_provider() {
        let p = InMemoryProvider::new().with(
            PriceSeries::new("A", vec![(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), dec!(1))])
                .unwrap(),
        );
        assert!(p.fetch("A").unwrap().is_some());
        assert!(p.fetch("Z").unwrap().is_none());
        let entities = collect_entities(&p, &["A".to_string(), "Z".to_string()]);
        assert!(entities[0].series.is_some());
        assert!(entities[1].series.is_none());
    }
}
