#![cfg(feature = "momentum")]

use chrono::{Duration, NaiveDate};
use fund_rank_core::dual_momentum::{run_dual_momentum, DualMomentumInput};
use fund_rank_core::momentum::{rank_composite_momentum, CompositeInput};
use fund_rank_core::provider::{InMemoryProvider, PriceHistoryProvider};
use fund_rank_core::PriceSeries;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Daily series compounding `growth`, alternately nudged up and down by `wobble`.
fn daily(id: &str, from: NaiveDate, days: i64, growth: Decimal, wobble: Decimal) -> PriceSeries {
    let mut trend = dec!(100);
    let points = (0..days).map(|i| {
        let nudge = if i % 2 == 0 { wobble } else { -wobble };
        let p = (from + Duration::days(i), (trend * (Decimal::ONE + nudge)).round_dp(6));
        trend *= Decimal::ONE + growth;
        p
    });
    PriceSeries::new(id, points.collect::<Vec<_>>()).unwrap()
}

#[test]
fn test_composite_from_json_with_partial_config() {
    let series = vec![
        daily("WEAK", d(2024, 1, 1), 200, dec!(0.0005), dec!(0.01)),
        daily("FLAT", d(2024, 1, 1), 200, Decimal::ZERO, Decimal::ZERO),
        daily("STRONG", d(2024, 1, 1), 200, dec!(0.002), dec!(0.01)),
    ];
    let input: CompositeInput = serde_json::from_value(json!({
        "series": series,
        "config": {"top_n": 1}
    }))
    .unwrap();
    assert_eq!(input.config.weight_6m_sharpe, dec!(0.4));

    let out = rank_composite_momentum(&input).unwrap().result;
    let order: Vec<&str> = out.ranked.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(order, vec!["STRONG", "WEAK", "FLAT"]);
    assert_eq!(out.top, vec!["STRONG".to_string()]);

    // a flat series has no Sharpe, so no composite, but still a 1M rank
    let flat = &out.ranked[2];
    assert_eq!(flat.sharpe_3m, None);
    assert_eq!(flat.rank_1m, Some(dec!(3)));
    assert_eq!(flat.score, None);
}

#[test]
fn test_dual_momentum_from_provider() {
    let provider = InMemoryProvider::new()
        .with(daily("SLOW", d(2018, 1, 1), 900, dec!(0.0002), Decimal::ZERO))
        .with(daily("FAST", d(2018, 1, 1), 900, dec!(0.0005), Decimal::ZERO));
    let series = ["SLOW", "FAST"]
        .iter()
        .map(|id| provider.fetch(id).unwrap().unwrap())
        .collect();

    let input = DualMomentumInput {
        series,
        config: Default::default(),
    };
    let out = run_dual_momentum(&input).unwrap().result;

    // January 2018 to June 2020 is 30 month-ends; 12 are spent on lookback
    assert_eq!(out.signals.len(), 18);
    assert_eq!(out.months.len(), 17);
    assert!(out.months.iter().all(|m| m.held == "FAST"));
    assert_eq!(out.switches, 0);
    assert_eq!(out.max_drawdown, Some(Decimal::ZERO));

    let last = out.months.last().unwrap();
    assert!(last.nav_sell.is_some());
    assert!(out.months[..16].iter().all(|m| m.nav_sell.is_none()));

    let cagr = out.cagr.unwrap();
    assert!(cagr > dec!(0.15) && cagr < dec!(0.25), "cagr {cagr}");
}
