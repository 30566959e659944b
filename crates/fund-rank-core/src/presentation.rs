//! String tables for ranking results.
//!
//! The engine works on exact fractions and `Option`s; this is the only layer
//! that turns them into percentages, glyphs and "N/A" markers.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::ranking::{DataStatus, Methodology, PeriodCell, RankedEntity, RankingOutput, Score};
use crate::types::Rate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStyle {
    pub highlight_marker: String,
    pub benchmark_marker: String,
    pub missing: String,
    pub decimals: u32,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            highlight_marker: "🥇".to_string(),
            benchmark_marker: "📊".to_string(),
            missing: "N/A".to_string(),
            decimals: 2,
        }
    }
}

/// `0.1234` -> `"12.34%"`.
pub fn format_percent(value: Rate, decimals: u32) -> String {
    let pct = (value * dec!(100)).round_dp(decimals);
    format!("{:.*}%", decimals as usize, pct)
}

/// Headers plus rows of display strings, ready for any tabular writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RankingTable {
    /// Columns: name, rank, one per period in anchor order, then the
    /// methodology's summary columns. Benchmark row last.
    pub fn from_output(output: &RankingOutput, style: &TableStyle) -> Self {
        let mut headers = vec!["Name".to_string(), "Rank".to_string()];
        headers.extend(output.periods.iter().map(|p| p.label.clone()));
        headers.extend(summary_headers(output.methodology).iter().map(|h| h.to_string()));

        let mut rows: Vec<Vec<String>> = output
            .funds
            .iter()
            .map(|f| fund_row(f, output.methodology, style))
            .collect();
        if let Some(bench) = &output.benchmark {
            rows.push(benchmark_row(bench, output.methodology, style));
        }

        Self { headers, rows }
    }

    #[cfg(feature = "momentum")]
    pub fn from_momentum(output: &crate::momentum::MomentumOutput, style: &TableStyle) -> Self {
        let mut headers = vec!["Name".to_string(), "Rank".to_string()];
        headers.extend(output.windows.iter().map(|w| format!("{w} Sharpe")));
        headers.extend(output.windows.iter().map(|w| format!("{w} Z")));
        headers.push("From High".to_string());
        headers.push("Score".to_string());

        let number = |v: Option<Decimal>| match v {
            Some(v) => format!("{:.2}", v.round_dp(2)),
            None => style.missing.clone(),
        };

        let rows = output
            .ranked
            .iter()
            .map(|s| {
                let mut row = vec![
                    s.name.clone(),
                    s.rank.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string()),
                ];
                row.extend(s.sharpe.iter().map(|v| number(*v)));
                row.extend(s.z_scores.iter().map(|v| number(*v)));
                row.push(
                    s.distance_from_high
                        .map(|d| format_percent(d, style.decimals))
                        .unwrap_or_else(|| style.missing.clone()),
                );
                row.push(number(s.score));
                row
            })
            .collect();

        Self { headers, rows }
    }

    #[cfg(feature = "momentum")]
    pub fn from_composite(output: &crate::momentum::CompositeOutput, style: &TableStyle) -> Self {
        let headers = [
            "Name", "Rank", "3M Sharpe", "6M Sharpe", "1M Return", "3M Rank", "6M Rank",
            "1M Rank", "Score",
        ]
        .iter()
        .map(|h| h.to_string())
        .collect();

        let number = |v: Option<Decimal>| match v {
            Some(v) => format!("{:.2}", v.round_dp(2)),
            None => style.missing.clone(),
        };

        let rows = output
            .ranked
            .iter()
            .map(|s| {
                vec![
                    s.name.clone(),
                    s.rank.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string()),
                    number(s.sharpe_3m),
                    number(s.sharpe_6m),
                    s.return_1m
                        .map(|r| format_percent(r, style.decimals))
                        .unwrap_or_else(|| style.missing.clone()),
                    number(s.rank_3m),
                    number(s.rank_6m),
                    number(s.rank_1m),
                    number(s.score),
                ]
            })
            .collect();

        Self { headers, rows }
    }
}

fn summary_headers(methodology: Methodology) -> &'static [&'static str] {
    match methodology {
        Methodology::YearOnYearConsistency | Methodology::MultiYearPerformance => &["Top-N Count"],
        Methodology::BenchmarkOutperformance => &["Periods Outperformed", "Avg Outperformance"],
    }
}

fn fund_row(fund: &RankedEntity, methodology: Methodology, style: &TableStyle) -> Vec<String> {
    let name = match &fund.score {
        Score::Outperformance {
            consistent_outperformer: true,
            ..
        } => format!("{} {}", style.highlight_marker, fund.name),
        _ => fund.name.clone(),
    };
    let rank = fund.rank.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string());

    let mut row = vec![name, rank];
    row.extend(fund.periods.iter().map(|c| cell(c, style)));

    match (&fund.score, methodology) {
        (Score::TopNCount { count }, _) => row.push(count.to_string()),
        (
            Score::Outperformance {
                periods_outperformed,
                average_outperformance,
                ..
            },
            _,
        ) => {
            row.push(format!("{periods_outperformed}/{}", fund.periods.len()));
            row.push(
                average_outperformance
                    .map(|a| format_percent(a, style.decimals))
                    .unwrap_or_else(|| style.missing.clone()),
            );
        }
        (Score::Unscored, m) => {
            let reason = match fund.status {
                DataStatus::NoData => "No data",
                _ => style.missing.as_str(),
            };
            row.extend(summary_headers(m).iter().map(|_| reason.to_string()));
        }
    }
    row
}

fn benchmark_row(bench: &RankedEntity, methodology: Methodology, style: &TableStyle) -> Vec<String> {
    let mut row = vec![
        format!("{} {}", style.benchmark_marker, bench.name),
        "Benchmark".to_string(),
    ];
    row.extend(bench.periods.iter().map(|c| cell(c, style)));
    row.extend(summary_headers(methodology).iter().map(|_| String::new()));
    row
}

fn cell(c: &PeriodCell, style: &TableStyle) -> String {
    match c.value.value() {
        None => style.missing.clone(),
        Some(v) if c.highlighted => {
            format!("{} {}", style.highlight_marker, format_percent(v, style.decimals))
        }
        Some(v) => format_percent(v, style.decimals),
    }
}
