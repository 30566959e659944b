use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What happens when several values tie at the N-th place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieHandling {
    /// Every value equal to the N-th largest is marked, so more than N
    /// cells can be marked.
    #[default]
    IncludeAll,
    /// Exactly N cells; among equal values the earlier input wins.
    Strict,
}

/// Flag the `n` largest values of one column. `None` cells are never marked.
pub fn mark_top_n(values: &[Option<Decimal>], n: usize, ties: TieHandling) -> Vec<bool> {
    let mut marks = vec![false; values.len()];
    if n == 0 {
        return marks;
    }

    let mut ranked: Vec<(usize, Decimal)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .collect();
    if ranked.is_empty() {
        return marks;
    }
    // stable: equal values keep input order
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    match ties {
        TieHandling::IncludeAll => {
            let threshold = ranked[n.min(ranked.len()) - 1].1;
            for (i, v) in &ranked {
                if *v >= threshold {
                    marks[*i] = true;
                }
            }
        }
        TieHandling::Strict => {
            for (i, _) in ranked.iter().take(n) {
                marks[*i] = true;
            }
        }
    }
    marks
}
