//! CSV ingestion
//!
//! Loads the three input files into SQLite, in this order:
//!
//! | Step | File | Effect |
//! |------|------|--------|
//! | 1 | timezones.csv | upsert `store(id, timezone_str)` |
//! | 2 | menu_hours.csv | replace the rules of every store in the file |
//! | 3 | store_status.csv | replace all polls, record the max timestamp as reference |
//!
//! Bad rows are skipped with a warning; a missing file skips its step.
//! The whole run is one transaction: a failure leaves the previous data and
//! reference instant untouched.

mod business_hours;
mod status_polls;
mod timezones;

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::core::Config;
use crate::db::repository::{RepoError, system_state};

pub use business_hours::load_business_hours;
pub use status_polls::load_status_polls;
pub use timezones::load_timezones;

/// Ingestion error types
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

pub type IngestionResult<T> = Result<T, IngestionError>;

/// Rows per status-poll insert batch
pub const POLL_BATCH_SIZE: usize = 10_000;

/// Outcome of one step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepSummary {
    /// Rows written
    pub loaded: u64,
    /// Rows rejected
    pub skipped: u64,
    /// Stores created on the fly with the default timezone
    pub stores_created: u64,
    /// Input file was absent
    pub missing: bool,
}

impl StepSummary {
    fn missing() -> Self {
        Self {
            missing: true,
            ..Default::default()
        }
    }
}

/// Outcome of a full ingestion run
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestionSummary {
    pub timezones: StepSummary,
    pub business_hours: StepSummary,
    pub status_polls: StepSummary,
    /// Max poll timestamp, now the batch reference instant
    pub reference_time: Option<DateTime<Utc>>,
}

/// Run all three steps against the files named in `config`, atomically
pub async fn run_full_ingestion(
    pool: &SqlitePool,
    config: &Config,
) -> IngestionResult<IngestionSummary> {
    let default_tz = config.default_timezone.as_str();
    let mut tx = pool.begin().await.map_err(RepoError::from)?;

    tracing::info!(file = %config.timezone_csv, "Loading timezones");
    let timezones = load_timezones(&mut tx, Path::new(&config.timezone_csv), default_tz).await?;

    tracing::info!(file = %config.business_hours_csv, "Loading business hours");
    let business_hours =
        load_business_hours(&mut tx, Path::new(&config.business_hours_csv), default_tz).await?;

    tracing::info!(file = %config.status_csv, "Loading status polls");
    let (status_polls, max_timestamp) =
        load_status_polls(&mut tx, Path::new(&config.status_csv), default_tz).await?;

    match max_timestamp {
        Some(reference) => system_state::set_reference_time(&mut tx, reference).await?,
        None => tracing::error!("No valid poll timestamps found, reference time not updated"),
    }

    // 出错时 tx 被 drop 自动回滚，旧数据保持不变
    tx.commit().await.map_err(RepoError::from)?;
    if let Some(reference) = max_timestamp {
        tracing::info!(reference = %reference.to_rfc3339(), "Reference time updated");
    }

    Ok(IngestionSummary {
        timezones,
        business_hours,
        status_polls,
        reference_time: max_timestamp,
    })
}

/// CSV reader with trimmed fields; `None` (logged) when the file is missing
fn open_reader(path: &Path) -> IngestionResult<Option<csv::Reader<File>>> {
    if !path.exists() {
        tracing::error!(file = %path.display(), "Input file not found, skipping");
        return Ok(None);
    }
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    Ok(Some(reader))
}

/// Canonical (lowercase, hyphenated) store id, or `None` for malformed ids
fn parse_store_id(raw: &str, context: &str) -> Option<String> {
    match uuid::Uuid::parse_str(raw.trim()) {
        Ok(id) => Some(id.to_string()),
        Err(e) => {
            tracing::warn!(store_id = %raw, context, error = %e, "Invalid store id, skipping row");
            None
        }
    }
}
