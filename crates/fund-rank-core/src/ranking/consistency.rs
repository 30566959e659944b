use super::top_n::{mark_top_n, TieHandling};
use super::{DataStatus, RankedEntity, Score};
use crate::types::Rate;

/// Mark the top-N cells of every period column and score each fund by how
/// many of its cells were marked.
///
/// Used for both year-on-year consistency (consecutive periods) and
/// multi-year performance (horizon CAGRs); only the cell values differ.
pub(super) fn score_top_n_appearances(
    funds: &mut [RankedEntity],
    period_count: usize,
    top_n: usize,
    ties: TieHandling,
) {
    for column in 0..period_count {
        let values: Vec<Option<Rate>> = funds
            .iter()
            .map(|f| f.periods.get(column).and_then(|c| c.value.value()))
            .collect();
        let marks = mark_top_n(&values, top_n, ties);
        for (fund, marked) in funds.iter_mut().zip(marks) {
            if let Some(cell) = fund.periods.get_mut(column) {
                cell.highlighted = marked;
            }
        }
    }

    for fund in funds.iter_mut() {
        if fund.status == DataStatus::Scored {
            let count = fund.periods.iter().filter(|c| c.highlighted).count() as u32;
            fund.score = Score::TopNCount { count };
        }
    }
}
