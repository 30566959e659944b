use chrono::NaiveDate;
use fund_rank_core::calendar::AnchorDateSequence;
use fund_rank_core::presentation::{RankingTable, TableStyle};
use fund_rank_core::ranking::{
    rank_funds, score_funds, DataStatus, EntityInput, EntityKind, Methodology, RankingInput,
    Score, TieHandling, UnscoredPlacement,
};
use fund_rank_core::returns::ElapsedBasis;
use fund_rank_core::{FundRankError, MissingReason, PriceSeries};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn entity(id: &str, points: &[(NaiveDate, Decimal)]) -> EntityInput {
    EntityInput::from_series(PriceSeries::new(id, points.to_vec()).unwrap())
}

fn one_year(id: &str, start: Decimal, end: Decimal) -> EntityInput {
    entity(id, &[(d(2023, 1, 2), start), (d(2024, 1, 2), end)])
}

fn input(funds: Vec<EntityInput>, anchors: Vec<NaiveDate>, methodology: Methodology) -> RankingInput {
    RankingInput {
        funds,
        benchmark: None,
        anchors: AnchorDateSequence::new(anchors).unwrap(),
        methodology,
        top_n: 10,
        ties: TieHandling::IncludeAll,
        unscored: UnscoredPlacement::RankLast,
        elapsed_basis: ElapsedBasis::ResolvedDates,
    }
}

fn ids(out: &fund_rank_core::ranking::RankingOutput) -> Vec<&str> {
    out.funds.iter().map(|f| f.id.as_str()).collect()
}

// ---------------------------------------------------------------------------
// Year-on-year consistency
// ---------------------------------------------------------------------------

#[test]
fn test_top_n_ties_are_all_marked() {
    let mut inp = input(
        vec![
            one_year("A", dec!(100), dec!(105)),
            one_year("B", dec!(100), dec!(105)),
            one_year("C", dec!(100), dec!(101)),
        ],
        vec![d(2024, 1, 2), d(2023, 1, 2)],
        Methodology::YearOnYearConsistency,
    );
    inp.top_n = 2;
    let out = score_funds(&inp).unwrap();

    assert_eq!(ids(&out), vec!["A", "B", "C"]);
    assert_eq!(out.funds[0].score, Score::TopNCount { count: 1 });
    assert_eq!(out.funds[1].score, Score::TopNCount { count: 1 });
    assert_eq!(out.funds[2].score, Score::TopNCount { count: 0 });
    assert_eq!(
        out.funds.iter().map(|f| f.rank).collect::<Vec<_>>(),
        vec![Some(1), Some(2), Some(3)]
    );
}

#[test]
fn test_tie_break_follows_input_order() {
    let mut inp = input(
        vec![
            one_year("C", dec!(100), dec!(101)),
            one_year("B", dec!(100), dec!(105)),
            one_year("A", dec!(100), dec!(105)),
        ],
        vec![d(2024, 1, 2), d(2023, 1, 2)],
        Methodology::YearOnYearConsistency,
    );
    inp.top_n = 2;
    let out = score_funds(&inp).unwrap();
    assert_eq!(ids(&out), vec!["B", "A", "C"]);
}

#[test]
fn test_strict_ties_cap_marks() {
    let mut inp = input(
        vec![
            one_year("A", dec!(100), dec!(105)),
            one_year("B", dec!(100), dec!(105)),
            one_year("C", dec!(100), dec!(101)),
        ],
        vec![d(2024, 1, 2), d(2023, 1, 2)],
        Methodology::YearOnYearConsistency,
    );
    inp.top_n = 1;

    let inclusive = score_funds(&inp).unwrap();
    assert!(inclusive.funds[0].periods[0].highlighted);
    assert!(inclusive.funds[1].periods[0].highlighted);

    inp.ties = TieHandling::Strict;
    let strict = score_funds(&inp).unwrap();
    assert!(strict.funds[0].periods[0].highlighted);
    assert!(!strict.funds[1].periods[0].highlighted);
    assert_eq!(strict.funds[1].score, Score::TopNCount { count: 0 });
}

#[test]
fn test_partial_history_still_scored() {
    // "NEW" has no price before 2023-01-02, so its older period is missing
    let anchors = vec![d(2024, 1, 2), d(2023, 1, 2), d(2022, 1, 3)];
    let mut inp = input(
        vec![
            entity(
                "OLD",
                &[(d(2022, 1, 3), dec!(100)), (d(2023, 1, 2), dec!(110)), (d(2024, 1, 2), dec!(115))],
            ),
            entity("NEW", &[(d(2023, 1, 2), dec!(10)), (d(2024, 1, 2), dec!(13))]),
        ],
        anchors,
        Methodology::YearOnYearConsistency,
    );
    inp.top_n = 1;
    let out = score_funds(&inp).unwrap();

    assert_eq!(ids(&out), vec!["OLD", "NEW"]);
    let new = &out.funds[1];
    assert_eq!(new.status, DataStatus::Scored);
    assert_eq!(new.periods[0].value.value(), Some(dec!(0.3)));
    assert_eq!(
        new.periods[1].value.missing_reason(),
        Some(MissingReason::NoPriceBeforeDate)
    );
    assert_eq!(new.score, Score::TopNCount { count: 1 });
    assert_eq!(out.funds[0].score, Score::TopNCount { count: 1 });
    assert!(out.warnings.iter().any(|w| w.contains("NEW")));
}

#[test]
fn test_all_missing_fund_ranked_last_or_excluded() {
    let mut inp = input(
        vec![
            // history ends before every anchor pair can resolve
            entity("STALE", &[(d(2024, 1, 2), dec!(10))]),
            one_year("A", dec!(100), dec!(103)),
        ],
        vec![d(2024, 1, 2), d(2023, 1, 2)],
        Methodology::YearOnYearConsistency,
    );
    let out = score_funds(&inp).unwrap();
    assert_eq!(ids(&out), vec!["A", "STALE"]);
    assert_eq!(out.funds[1].status, DataStatus::AllPeriodsMissing);
    assert_eq!(out.funds[1].score, Score::Unscored);
    assert_eq!(out.funds[1].rank, Some(2));

    inp.unscored = UnscoredPlacement::Exclude;
    let out = score_funds(&inp).unwrap();
    assert_eq!(ids(&out), vec!["A", "STALE"]);
    assert_eq!(out.funds[1].rank, None);
}

#[test]
fn test_benchmark_row_is_unranked_and_unmarked() {
    let mut inp = input(
        vec![one_year("A", dec!(100), dec!(105))],
        vec![d(2024, 1, 2), d(2023, 1, 2)],
        Methodology::YearOnYearConsistency,
    );
    inp.benchmark = Some(one_year("NIFTY", dec!(100), dec!(150)));
    let out = score_funds(&inp).unwrap();

    let bench = out.benchmark.as_ref().unwrap();
    assert_eq!(bench.kind, EntityKind::Benchmark);
    assert_eq!(bench.rank, None);
    assert!(!bench.periods[0].highlighted);
    // the benchmark does not take a top-N slot
    assert!(out.funds[0].periods[0].highlighted);
    assert_eq!(out.funds.len(), 1);
}

// ---------------------------------------------------------------------------
// Multi-year performance
// ---------------------------------------------------------------------------

#[test]
fn test_multi_year_uses_fixed_end_anchor() {
    let anchors = vec![d(2024, 1, 2), d(2023, 1, 2), d(2022, 1, 3)];
    let mut inp = input(
        vec![
            entity(
                "STEADY",
                &[(d(2022, 1, 3), dec!(100)), (d(2023, 1, 2), dec!(110)), (d(2024, 1, 2), dec!(121))],
            ),
            entity(
                "LATE",
                &[(d(2022, 1, 3), dec!(100)), (d(2023, 1, 2), dec!(90)), (d(2024, 1, 2), dec!(112))],
            ),
        ],
        anchors,
        Methodology::MultiYearPerformance,
    );
    inp.top_n = 1;
    let out = score_funds(&inp).unwrap();

    assert_eq!(out.periods.len(), 2);
    assert_eq!(out.periods[0].label, "1Y");
    assert_eq!(out.periods[1].label, "2Y");
    assert!(out.periods.iter().all(|p| p.end == d(2024, 1, 2)));

    // LATE wins the 1-year horizon (24.4%), STEADY the 2-year one (10% vs ~5.8%)
    assert_eq!(ids(&out), vec!["STEADY", "LATE"]);
    assert_eq!(out.funds[0].score, Score::TopNCount { count: 1 });
    assert_eq!(out.funds[1].score, Score::TopNCount { count: 1 });
    assert!(out.funds[1].periods[0].highlighted);
    assert!(out.funds[0].periods[1].highlighted);
}

// ---------------------------------------------------------------------------
// Benchmark outperformance
// ---------------------------------------------------------------------------

fn outperformance_input() -> RankingInput {
    let anchors = vec![d(2024, 1, 2), d(2023, 1, 2), d(2022, 1, 3)];
    let mut inp = input(
        vec![
            // +10% then -2% (most recent period first)
            entity(
                "FUND",
                &[(d(2022, 1, 3), dec!(100)), (d(2023, 1, 2), dec!(98)), (d(2024, 1, 2), dec!(107.8))],
            ),
            entity(
                "LAGGARD",
                &[(d(2022, 1, 3), dec!(100)), (d(2023, 1, 2), dec!(90)), (d(2024, 1, 2), dec!(91))],
            ),
        ],
        anchors,
        Methodology::BenchmarkOutperformance,
    );
    // +8% then -1%
    inp.benchmark = Some(entity(
        "BENCH",
        &[(d(2022, 1, 3), dec!(100)), (d(2023, 1, 2), dec!(99)), (d(2024, 1, 2), dec!(106.92))],
    ));
    inp
}

#[test]
fn test_outperformance_count_and_average() {
    let out = score_funds(&outperformance_input()).unwrap();
    let fund = &out.funds[0];
    assert_eq!(fund.id, "FUND");
    assert_eq!(fund.periods[0].outperformance, Some(dec!(0.02)));
    assert_eq!(fund.periods[1].outperformance, Some(dec!(-0.01)));
    assert_eq!(fund.periods[0].benchmark_value, Some(dec!(0.08)));
    assert_eq!(
        fund.score,
        Score::Outperformance {
            periods_outperformed: 1,
            periods_compared: 2,
            average_outperformance: Some(dec!(0.005)),
            consistent_outperformer: false,
        }
    );
    assert_eq!(fund.rank, Some(1));
    assert_eq!(out.funds[1].rank, Some(2));
}

#[test]
fn test_outperformance_requires_benchmark() {
    let mut inp = outperformance_input();
    inp.benchmark = None;
    assert!(score_funds(&inp).is_err());
}

#[test]
fn test_outperformance_rejects_benchmark_without_periods() {
    let mut inp = input(
        vec![
            one_year("LOSER", dec!(100), dec!(90)),
            one_year("WINNER", dec!(100), dec!(150)),
        ],
        vec![d(2024, 1, 2), d(2023, 1, 2)],
        Methodology::BenchmarkOutperformance,
    );
    inp.benchmark = Some(EntityInput::from_series(PriceSeries::new("BENCH", Vec::new()).unwrap()));
    assert!(matches!(
        score_funds(&inp),
        Err(FundRankError::InvalidArgument { .. })
    ));

    // the same benchmark is only a missing row under the other methodologies
    inp.methodology = Methodology::YearOnYearConsistency;
    inp.top_n = 1;
    let out = score_funds(&inp).unwrap();
    assert_eq!(ids(&out), vec!["WINNER", "LOSER"]);
    assert_eq!(out.benchmark.unwrap().status, DataStatus::AllPeriodsMissing);
}

#[test]
fn test_outperformance_tie_broken_by_average() {
    let anchors = vec![d(2024, 1, 2), d(2023, 1, 2)];
    let mut inp = input(
        vec![
            one_year("SMALL_EDGE", dec!(100), dec!(106)),
            one_year("BIG_EDGE", dec!(100), dec!(120)),
        ],
        anchors,
        Methodology::BenchmarkOutperformance,
    );
    inp.benchmark = Some(one_year("BENCH", dec!(100), dec!(105)));
    let out = score_funds(&inp).unwrap();
    assert_eq!(ids(&out), vec!["BIG_EDGE", "SMALL_EDGE"]);
}

// ---------------------------------------------------------------------------
// Determinism and rendering
// ---------------------------------------------------------------------------

#[test]
fn test_idempotent_output() {
    let inp = outperformance_input();
    let first = serde_json::to_string(&score_funds(&inp).unwrap()).unwrap();
    let second = serde_json::to_string(&score_funds(&inp).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_table_column_order() {
    let anchors = vec![d(2024, 1, 2), d(2023, 1, 2), d(2022, 1, 3)];
    let mut inp = input(
        vec![
            entity(
                "A",
                &[(d(2022, 1, 3), dec!(100)), (d(2023, 1, 2), dec!(110)), (d(2024, 1, 2), dec!(121))],
            ),
            EntityInput::no_data("GONE"),
        ],
        anchors,
        Methodology::YearOnYearConsistency,
    );
    inp.benchmark = Some(entity(
        "NIFTY",
        &[(d(2022, 1, 3), dec!(100)), (d(2023, 1, 2), dec!(105)), (d(2024, 1, 2), dec!(110.25))],
    ));
    let out = score_funds(&inp).unwrap();
    let table = RankingTable::from_output(&out, &TableStyle::default());

    assert_eq!(
        table.headers,
        vec![
            "Name",
            "Rank",
            "2023-01-02 to 2024-01-02",
            "2022-01-03 to 2023-01-02",
            "Top-N Count"
        ]
    );
    assert_eq!(table.rows[0], vec!["A", "1", "🥇 10.00%", "🥇 10.00%", "2"]);
    assert_eq!(table.rows[1], vec!["GONE", "2", "N/A", "N/A", "No data"]);
    assert_eq!(table.rows[2], vec!["📊 NIFTY", "Benchmark", "5.00%", "5.00%", ""]);
}

#[test]
fn test_rank_funds_carries_warnings() {
    let inp = input(
        vec![one_year("A", dec!(100), dec!(105)), EntityInput::no_data("GONE")],
        vec![d(2024, 1, 2), d(2023, 1, 2)],
        Methodology::YearOnYearConsistency,
    );
    let out = rank_funds(&inp).unwrap();
    assert_eq!(out.warnings, out.result.warnings);
    assert!(out.warnings.iter().any(|w| w.contains("GONE")));
}
