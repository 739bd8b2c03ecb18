//! Status observations and last-known-status extrapolation

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Store status reported by a poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    Active,
    Inactive,
}

impl StoreStatus {
    /// Status assumed before the first observation
    pub const DEFAULT: StoreStatus = StoreStatus::Inactive;

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreStatus::Active => "active",
            StoreStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreStatus {
    type Err = EngineError;

    /// Case-insensitive, surrounding whitespace ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(StoreStatus::Active),
            "inactive" => Ok(StoreStatus::Inactive),
            other => Err(EngineError::Validation(format!(
                "Unknown store status: {other}"
            ))),
        }
    }
}

/// A single status poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub status: StoreStatus,
}

impl Observation {
    pub fn new(timestamp: DateTime<Utc>, status: StoreStatus) -> Self {
        Self { timestamp, status }
    }
}

/// Status in effect at `t`: the latest observation with `timestamp <= t`.
///
/// `observations` must be sorted by timestamp; among equal timestamps the
/// last one wins. Before the first observation the status is
/// [`StoreStatus::DEFAULT`].
pub fn status_at(observations: &[Observation], t: DateTime<Utc>) -> StoreStatus {
    let idx = observations.partition_point(|o| o.timestamp <= t);
    match idx {
        0 => StoreStatus::DEFAULT,
        i => observations[i - 1].status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 24, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_status_case_insensitive() {
        assert_eq!(" Active ".parse::<StoreStatus>().unwrap(), StoreStatus::Active);
        assert_eq!("INACTIVE".parse::<StoreStatus>().unwrap(), StoreStatus::Inactive);
        assert!("closed".parse::<StoreStatus>().is_err());
    }

    #[test]
    fn test_status_before_first_observation_is_default() {
        let obs = vec![Observation::new(t0(), StoreStatus::Active)];
        assert_eq!(status_at(&obs, t0() - Duration::seconds(1)), StoreStatus::Inactive);
        assert_eq!(status_at(&[], t0()), StoreStatus::Inactive);
    }

    #[test]
    fn test_extrapolation_between_observations() {
        let t1 = t0() + Duration::minutes(30);
        let obs = vec![
            Observation::new(t0(), StoreStatus::Active),
            Observation::new(t1, StoreStatus::Inactive),
        ];

        assert_eq!(status_at(&obs, t0()), StoreStatus::Active);
        assert_eq!(status_at(&obs, t1 - Duration::nanoseconds(1)), StoreStatus::Active);
        assert_eq!(status_at(&obs, t1), StoreStatus::Inactive);
        assert_eq!(status_at(&obs, t1 + Duration::days(3)), StoreStatus::Inactive);
    }

    #[test]
    fn test_equal_timestamps_last_wins() {
        let obs = vec![
            Observation::new(t0(), StoreStatus::Inactive),
            Observation::new(t0(), StoreStatus::Active),
        ];
        assert_eq!(status_at(&obs, t0()), StoreStatus::Active);
    }
}
