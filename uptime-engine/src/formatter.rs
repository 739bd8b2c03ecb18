//! Result formatting
//!
//! - `*_last_hour` → integer minutes
//! - `*_last_day` / `*_last_week` → hours, 2 decimal places
//!
//! Hours are computed with `rust_decimal` and rounded half away from zero
//! (counts are never negative, so this is plain round-half-up):
//! `37 min → 0.6166… h → 0.62`.

use rust_decimal::prelude::*;
use serde::{Serialize, Serializer};

use crate::sweep::UptimeTally;

/// Decimal places for hour-scaled fields
const HOUR_DECIMAL_PLACES: u32 = 2;

/// Minutes → hours, rounded to exactly 2 decimal places
pub fn minutes_to_hours(minutes: i64) -> Decimal {
    let mut hours = (Decimal::from(minutes) / Decimal::from(60))
        .round_dp_with_strategy(HOUR_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
    // Keep trailing zeros: 90 min → 1.50, not 1.5
    hours.rescale(HOUR_DECIMAL_PLACES);
    hours
}

fn serialize_hours<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&format_args!("{value:.2}"))
}

/// One report row.
///
/// Field names and units are the published report schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalculationResult {
    pub store_id: String,
    pub uptime_last_hour: i64,
    #[serde(serialize_with = "serialize_hours")]
    pub uptime_last_day: Decimal,
    #[serde(serialize_with = "serialize_hours")]
    pub uptime_last_week: Decimal,
    pub downtime_last_hour: i64,
    #[serde(serialize_with = "serialize_hours")]
    pub downtime_last_day: Decimal,
    #[serde(serialize_with = "serialize_hours")]
    pub downtime_last_week: Decimal,
}

impl CalculationResult {
    pub fn from_tally(store_id: impl Into<String>, tally: &UptimeTally) -> Self {
        Self {
            store_id: store_id.into(),
            uptime_last_hour: tally.last_hour.uptime_minutes,
            uptime_last_day: minutes_to_hours(tally.last_day.uptime_minutes),
            uptime_last_week: minutes_to_hours(tally.last_week.uptime_minutes),
            downtime_last_hour: tally.last_hour.downtime_minutes,
            downtime_last_day: minutes_to_hours(tally.last_day.downtime_minutes),
            downtime_last_week: minutes_to_hours(tally.last_week.downtime_minutes),
        }
    }
}
