//! Upstream fund filter: minimum history length and minimum fund size.
//!
//! The ranking engine never applies these thresholds itself. Callers run
//! the filter first and hand the eligible set to `score_funds`, while the
//! excluded list keeps every dropped fund visible with its reason.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::FundRankError;
use crate::ranking::EntityInput;
use crate::FundRankResult;

/// About five years of calendar days.
pub const DEFAULT_MIN_HISTORY_DAYS: i64 = 1825;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityCriteria {
    #[serde(default = "default_min_history_days")]
    pub min_history_days: i64,
    /// Minimum fund size (AUM) in the caller's unit; `None` disables the check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_fund_size: Option<Decimal>,
}

fn default_min_history_days() -> i64 {
    DEFAULT_MIN_HISTORY_DAYS
}

impl Default for EligibilityCriteria {
    fn default() -> Self {
        Self {
            min_history_days: DEFAULT_MIN_HISTORY_DAYS,
            min_fund_size: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityCandidate {
    pub entity: EntityInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fund_size: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ExclusionReason {
    NoData,
    ShortHistory { days: i64 },
    /// `size` is `None` when the fund size was not reported.
    BelowMinimumSize { size: Option<Decimal> },
}

impl ExclusionReason {
    pub fn describe(&self) -> String {
        match self {
            ExclusionReason::NoData => "no price data".to_string(),
            ExclusionReason::ShortHistory { days } => format!("only {days} days of history"),
            ExclusionReason::BelowMinimumSize { size: Some(size) } => {
                format!("fund size {size} below minimum")
            }
            ExclusionReason::BelowMinimumSize { size: None } => "fund size unknown".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedFund {
    pub id: String,
    #[serde(flatten)]
    pub reason: ExclusionReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityReport {
    /// Eligible funds in input order.
    pub eligible: Vec<EntityInput>,
    pub excluded: Vec<ExcludedFund>,
}

impl EligibilityReport {
    pub fn eligible_ids(&self) -> Vec<&str> {
        self.eligible.iter().map(|e| e.id.as_str()).collect()
    }
}

/// Split candidates into eligible and excluded funds. The first failing
/// check decides the reason, in the order data, history, size.
pub fn filter_eligible(
    candidates: Vec<EligibilityCandidate>,
    criteria: &EligibilityCriteria,
) -> FundRankResult<EligibilityReport> {
    validate_criteria(criteria)?;

    let mut eligible = Vec::new();
    let mut excluded = Vec::new();

    for candidate in candidates {
        match check(&candidate, criteria) {
            None => eligible.push(candidate.entity),
            Some(reason) => {
                tracing::debug!(id = %candidate.entity.id, reason = %reason.describe(), "fund excluded");
                excluded.push(ExcludedFund {
                    id: candidate.entity.id,
                    reason,
                });
            }
        }
    }

    if !excluded.is_empty() {
        tracing::info!(
            eligible = eligible.len(),
            excluded = excluded.len(),
            "eligibility filter applied"
        );
    }

    Ok(EligibilityReport { eligible, excluded })
}

fn check(candidate: &EligibilityCandidate, criteria: &EligibilityCriteria) -> Option<ExclusionReason> {
    let Some(series) = &candidate.entity.series else {
        return Some(ExclusionReason::NoData);
    };
    if series.is_empty() {
        return Some(ExclusionReason::NoData);
    }
    let days = series.span_days();
    if days < criteria.min_history_days {
        return Some(ExclusionReason::ShortHistory { days });
    }
    if let Some(min) = criteria.min_fund_size {
        match candidate.fund_size {
            Some(size) if size >= min => {}
            size => return Some(ExclusionReason::BelowMinimumSize { size }),
        }
    }
    None
}

fn validate_criteria(criteria: &EligibilityCriteria) -> FundRankResult<()> {
    if criteria.min_history_days < 0 {
        return Err(FundRankError::InvalidArgument {
            field: "min_history_days".into(),
            reason: "Minimum history must be non-negative".into(),
        });
    }
    if criteria.min_fund_size.is_some_and(|s| s < Decimal::ZERO) {
        return Err(FundRankError::InvalidArgument {
            field: "min_fund_size".into(),
            reason: "Minimum fund size must be non-negative".into(),
        });
    }
    Ok(())
}
