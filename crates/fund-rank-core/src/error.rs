use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FundRankError {
    #[error("Invalid argument: {field} — {reason}")]
    InvalidArgument { field: String, reason: String },

    #[error("No price for '{series}' on or before {date}")]
    NoPriceBeforeDate { series: String, date: NaiveDate },

    #[error("No price for '{series}' within {window_days} days before {date}")]
    NoPriceInRange {
        series: String,
        date: NaiveDate,
        window_days: i64,
    },

    #[error("Degenerate basis in {context}: starting price must be positive")]
    DegenerateBasis { context: String },

    #[error("Insufficient history: {0}")]
    InsufficientHistory(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl FundRankError {
    /// The missing-value reason a per-period failure is recorded under.
    pub fn missing_reason(&self) -> MissingReason {
        match self {
            FundRankError::NoPriceBeforeDate { .. } => MissingReason::NoPriceBeforeDate,
            FundRankError::NoPriceInRange { .. } => MissingReason::NoPriceInRange,
            FundRankError::DegenerateBasis { .. } => MissingReason::DegenerateBasis,
            FundRankError::InsufficientHistory(_) => MissingReason::InsufficientHistory,
            FundRankError::InvalidArgument { .. } | FundRankError::SerializationError(_) => {
                MissingReason::InvalidData
            }
        }
    }
}

impl From<serde_json::Error> for FundRankError {
    fn from(e: serde_json::Error) -> Self {
        FundRankError::SerializationError(e.to_string())
    }
}

/// Why a period (or a whole entity) has no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingReason {
    NoPriceBeforeDate,
    NoPriceInRange,
    DegenerateBasis,
    InsufficientHistory,
    InvalidData,
    /// The price provider returned nothing for this entity.
    NoData,
}

impl MissingReason {
    pub fn describe(&self) -> &'static str {
        match self {
            MissingReason::NoPriceBeforeDate => "no price on or before the period date",
            MissingReason::NoPriceInRange => "no price inside the lookback window",
            MissingReason::DegenerateBasis => "zero or negative starting price",
            MissingReason::InsufficientHistory => "history too short for this horizon",
            MissingReason::InvalidData => "invalid price data",
            MissingReason::NoData => "no data from provider",
        }
    }
}
