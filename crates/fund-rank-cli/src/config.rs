use std::collections::BTreeMap;

use chrono::NaiveDate;
use fund_rank_core::eligibility::EligibilityCriteria;
use fund_rank_core::ranking::{Methodology, TieHandling, UnscoredPlacement};
use fund_rank_core::returns::ElapsedBasis;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::input;

pub const DEFAULT_ANCHOR_COUNT: i64 = 10;

/// Settings for a `rank` run, loaded from `.json` or `.yaml` and then
/// overridden by command-line flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RankConfig {
    pub methodology: Option<Methodology>,
    pub top_n: Option<usize>,
    pub ties: Option<TieHandling>,
    pub unscored: Option<UnscoredPlacement>,
    pub elapsed_basis: Option<ElapsedBasis>,
    pub anchor_count: Option<i64>,
    /// Anchors start at the last working day of the month before this date.
    pub reference_date: Option<NaiveDate>,
    pub data_dir: Option<String>,
    pub funds: Vec<String>,
    pub benchmark: Option<String>,
    /// Applied before ranking when present.
    pub eligibility: Option<EligibilityCriteria>,
    /// Fund size by id, for the minimum-size check.
    pub fund_sizes: BTreeMap<String, Decimal>,
}

impl RankConfig {
    pub fn load(path: &Option<String>) -> Result<Self, Box<dyn std::error::Error>> {
        match path {
            Some(p) => input::file::read_config(p),
            None => Ok(Self::default()),
        }
    }

    /// `Some` values in `other` replace the ones here; a non-empty fund list
    /// replaces the configured one.
    pub fn merge(mut self, other: RankConfig) -> Self {
        self.methodology = other.methodology.or(self.methodology);
        self.top_n = other.top_n.or(self.top_n);
        self.ties = other.ties.or(self.ties);
        self.unscored = other.unscored.or(self.unscored);
        self.elapsed_basis = other.elapsed_basis.or(self.elapsed_basis);
        self.anchor_count = other.anchor_count.or(self.anchor_count);
        self.reference_date = other.reference_date.or(self.reference_date);
        self.data_dir = other.data_dir.or(self.data_dir);
        if !other.funds.is_empty() {
            self.funds = other.funds;
        }
        self.benchmark = other.benchmark.or(self.benchmark);
        self.eligibility = other.eligibility.or(self.eligibility);
        self.fund_sizes.extend(other.fund_sizes);
        self
    }
}
