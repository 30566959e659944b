pub mod calendar;
pub mod error;
pub mod resolver;
pub mod returns;
pub mod types;

#[cfg(feature = "ranking")]
pub mod ranking;

#[cfg(feature = "ranking")]
pub mod presentation;

#[cfg(feature = "ranking")]
pub mod provider;

#[cfg(feature = "eligibility")]
pub mod eligibility;

#[cfg(feature = "momentum")]
pub mod momentum;

#[cfg(feature = "momentum")]
pub mod dual_momentum;

pub use error::{FundRankError, MissingReason};
pub use types::*;

/// Standard result type for all fund-rank operations
pub type FundRankResult<T> = Result<T, FundRankError>;
