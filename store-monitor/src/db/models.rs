//! Database Models
//!
//! Row types for the store monitor tables plus their insert payloads.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uptime_engine::{Observation, RawBusinessRule, StoreStatus};

use crate::utils::time::from_micros;

/// Store entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Store {
    pub id: String,
    pub timezone_str: String,
}

/// Status poll row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StatusPoll {
    pub id: i64,
    pub store_id: String,
    /// UTC micros
    pub timestamp_utc: i64,
    pub status: String,
}

impl StatusPoll {
    /// `None` when the stored row cannot be interpreted
    pub fn to_observation(&self) -> Option<Observation> {
        let timestamp = from_micros(self.timestamp_utc)?;
        let status = self.status.parse::<StoreStatus>().ok()?;
        Some(Observation::new(timestamp, status))
    }
}

/// Status poll insert payload
#[derive(Debug, Clone)]
pub struct StatusPollCreate {
    pub store_id: String,
    pub timestamp: DateTime<Utc>,
    pub status: StoreStatus,
}

/// Business hour row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BusinessHour {
    pub id: i64,
    pub store_id: String,
    /// 0 = Monday
    pub day_of_week: i64,
    pub start_time_local: String,
    pub end_time_local: String,
}

impl BusinessHour {
    pub fn to_rule(&self) -> RawBusinessRule {
        RawBusinessRule::new(
            self.day_of_week,
            self.start_time_local.clone(),
            self.end_time_local.clone(),
        )
    }
}

/// Business hour insert payload
#[derive(Debug, Clone)]
pub struct BusinessHourCreate {
    pub store_id: String,
    pub day_of_week: i64,
    pub start_time_local: String,
    pub end_time_local: String,
}

/// Report lifecycle: PENDING → RUNNING → COMPLETE | FAILED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Pending,
    Running,
    Complete,
    Failed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "PENDING",
            ReportStatus::Running => "RUNNING",
            ReportStatus::Complete => "COMPLETE",
            ReportStatus::Failed => "FAILED",
        }
    }

    /// Job not yet finished
    pub fn is_in_progress(&self) -> bool {
        matches!(self, ReportStatus::Pending | ReportStatus::Running)
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Report entity
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Report {
    pub id: String,
    pub store_id: String,
    pub status: ReportStatus,
    /// Unix millis
    pub created_at: i64,
    pub completed_at: Option<i64>,
    pub report_file_path: Option<String>,
}
