use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{DataStatus, RankedEntity, Score};
use crate::types::Rate;

/// Share of all periods a fund must beat the benchmark in to count as a
/// consistent outperformer.
pub const CONSISTENT_OUTPERFORMER_SHARE: Decimal = dec!(0.70);

/// Fund-vs-benchmark comparison over aligned periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutperformanceSummary {
    /// `fund - benchmark` per period, `None` where either side is missing.
    pub per_period: Vec<Option<Rate>>,
    pub periods_outperformed: u32,
    pub periods_compared: u32,
    /// Mean over compared periods only. Missing periods are not zeros.
    pub average: Option<Rate>,
    pub consistent: bool,
}

pub fn summarize_outperformance(fund: &[Option<Rate>], benchmark: &[Option<Rate>]) -> OutperformanceSummary {
    let total = fund.len().max(benchmark.len());
    let per_period: Vec<Option<Rate>> = (0..total)
        .map(|i| {
            let f = fund.get(i).copied().flatten()?;
            let b = benchmark.get(i).copied().flatten()?;
            Some(f - b)
        })
        .collect();

    let compared: Vec<Rate> = per_period.iter().flatten().copied().collect();
    let periods_outperformed = compared.iter().filter(|o| **o > Decimal::ZERO).count() as u32;
    let average = if compared.is_empty() {
        None
    } else {
        Some(compared.iter().sum::<Decimal>() / Decimal::from(compared.len() as u64))
    };
    let consistent = total > 0
        && Decimal::from(periods_outperformed)
            >= CONSISTENT_OUTPERFORMER_SHARE * Decimal::from(total as u64);

    OutperformanceSummary {
        per_period,
        periods_outperformed,
        periods_compared: compared.len() as u32,
        average,
        consistent,
    }
}

/// Fill benchmark values and outperformance into every fund cell, highlight
/// the periods where the fund beat the benchmark, and score scored funds.
pub(super) fn score_against_benchmark(funds: &mut [RankedEntity], benchmark: &RankedEntity) {
    let bench_values: Vec<Option<Rate>> =
        benchmark.periods.iter().map(|c| c.value.value()).collect();

    for fund in funds.iter_mut() {
        let fund_values: Vec<Option<Rate>> = fund.periods.iter().map(|c| c.value.value()).collect();
        let summary = summarize_outperformance(&fund_values, &bench_values);

        for (i, cell) in fund.periods.iter_mut().enumerate() {
            cell.benchmark_value = bench_values.get(i).copied().flatten();
            cell.outperformance = summary.per_period.get(i).copied().flatten();
            cell.highlighted = cell.outperformance.is_some_and(|o| o > Decimal::ZERO);
        }

        if fund.status == DataStatus::Scored {
            fund.score = Score::Outperformance {
                periods_outperformed: summary.periods_outperformed,
                periods_compared: summary.periods_compared,
                average_outperformance: summary.average,
                consistent_outperformer: summary.consistent,
            };
        }
    }
}
