use std::ops::Bound;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::FundRankError;
use crate::types::{Price, PriceSeries};
use crate::FundRankResult;

/// How far back `NearestFollowing` may look for a substitute price.
pub const NEAREST_FOLLOWING_WINDOW_DAYS: i64 = 10;

/// Lookup policy for a price at a target date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPolicy {
    /// Latest observation on or before the target, however old.
    #[default]
    AsOf,
    /// Exact observation, else the latest one inside
    /// `NEAREST_FOLLOWING_WINDOW_DAYS` before the target.
    NearestFollowing,
}

/// A price found for a requested date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPrice {
    pub requested: NaiveDate,
    pub date: NaiveDate,
    pub price: Price,
    /// True when `date` differs from `requested`.
    pub substituted: bool,
}

/// Resolve the effective price of `series` at `target`.
pub fn resolve_price(
    series: &PriceSeries,
    target: NaiveDate,
    policy: ResolutionPolicy,
) -> FundRankResult<ResolvedPrice> {
    match policy {
        ResolutionPolicy::AsOf => series
            .latest_between(Bound::Unbounded, target)
            .map(|p| resolved(target, p.date, p.price))
            .ok_or_else(|| FundRankError::NoPriceBeforeDate {
                series: series.id().to_string(),
                date: target,
            }),
        ResolutionPolicy::NearestFollowing => {
            if let Some(price) = series.get(target) {
                return Ok(resolved(target, target, price));
            }
            let floor = match target.checked_sub_signed(Duration::days(NEAREST_FOLLOWING_WINDOW_DAYS)) {
                Some(floor) => Bound::Included(floor),
                None => Bound::Unbounded,
            };
            let point = series
                .latest_between(floor, target)
                .ok_or_else(|| FundRankError::NoPriceInRange {
                    series: series.id().to_string(),
                    date: target,
                    window_days: NEAREST_FOLLOWING_WINDOW_DAYS,
                })?;
            tracing::debug!(
                series = series.id(),
                requested = %target,
                used = %point.date,
                "exact date missing, substituted closest prior trading day"
            );
            Ok(resolved(target, point.date, point.price))
        }
    }
}

fn resolved(requested: NaiveDate, date: NaiveDate, price: Price) -> ResolvedPrice {
    ResolvedPrice {
        requested,
        date,
        price,
        substituted: requested != date,
    }
}
