use chrono::{Duration, NaiveDate};
use fund_rank_core::calendar::compute_anchors;
use fund_rank_core::eligibility::{filter_eligible, EligibilityCandidate, EligibilityCriteria, ExclusionReason};
use fund_rank_core::provider::{collect_entities, parse_mfapi_history, InMemoryProvider};
use fund_rank_core::ranking::{score_funds, DataStatus, Methodology, RankingInput};
use fund_rank_core::PriceSeries;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Daily series from `from` for `days` days, compounding `daily` per day.
fn daily(id: &str, from: NaiveDate, days: i64, daily: Decimal) -> PriceSeries {
    let mut price = dec!(100);
    let points = (0..days).map(|i| {
        let p = (from + Duration::days(i), price.round_dp(6));
        price *= Decimal::ONE + daily;
        p
    });
    PriceSeries::new(id, points.collect::<Vec<_>>()).unwrap()
}

#[test]
fn test_provider_to_ranking() {
    let provider = InMemoryProvider::new()
        .with(daily("FAST", d(2018, 1, 1), 2700, dec!(0.0005)))
        .with(daily("SLOW", d(2018, 1, 1), 2700, dec!(0.0002)))
        .with(daily("YOUNG", d(2023, 1, 1), 500, dec!(0.001)));
    let ids: Vec<String> = ["SLOW", "FAST", "YOUNG", "MISSING"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let entities = collect_entities(&provider, &ids);

    let candidates = entities
        .into_iter()
        .map(|entity| EligibilityCandidate {
            entity,
            fund_size: Some(dec!(5000)),
        })
        .collect();
    let report = filter_eligible(candidates, &EligibilityCriteria::default()).unwrap();
    assert_eq!(report.eligible_ids(), vec!["SLOW", "FAST"]);
    assert_eq!(report.excluded.len(), 2);
    assert!(matches!(report.excluded[0].reason, ExclusionReason::ShortHistory { .. }));
    assert_eq!(report.excluded[1].reason, ExclusionReason::NoData);

    let input = RankingInput {
        funds: report.eligible,
        benchmark: None,
        anchors: compute_anchors(d(2025, 6, 15), 5).unwrap(),
        methodology: Methodology::YearOnYearConsistency,
        top_n: 1,
        ties: Default::default(),
        unscored: Default::default(),
        elapsed_basis: Default::default(),
    };
    let out = score_funds(&input).unwrap();
    assert_eq!(out.funds[0].id, "FAST");
    assert!(out.funds.iter().all(|f| f.status == DataStatus::Scored));
}

#[test]
fn test_ranking_input_from_json() {
    let doc = json!({
        "meta": {"scheme_name": "Flexi Cap"},
        "data": [
            {"date": "02-01-2024", "nav": "121.0"},
            {"date": "02-01-2023", "nav": "110.0"}
        ]
    });
    let series = parse_mfapi_history("101", &doc).unwrap();
    let input: RankingInput = serde_json::from_value(json!({
        "funds": [
            {"id": "101", "series": series},
            {"id": "202"}
        ],
        "anchors": ["2024-01-02", "2023-01-02"],
        "methodology": "year_on_year_consistency"
    }))
    .unwrap();
    assert_eq!(input.top_n, 10);

    let out = score_funds(&input).unwrap();
    assert_eq!(out.funds[0].name, "Flexi Cap");
    assert_eq!(out.funds[0].periods[0].value.value(), Some(dec!(0.1)));
    assert_eq!(out.funds[1].status, DataStatus::NoData);
}
