//! System State Repository
//!
//! Key/value rows; currently only the batch reference instant.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use super::{RepoError, RepoResult};
use crate::utils::time::{format_reference, parse_reference};

const REFERENCE_TIME_KEY: &str = "reference_time_utc";

/// Reference instant written by the last ingestion, if any
pub async fn get_reference_time(pool: &SqlitePool) -> RepoResult<Option<DateTime<Utc>>> {
    let raw: Option<String> = sqlx::query_scalar("SELECT value FROM system_state WHERE key = ?")
        .bind(REFERENCE_TIME_KEY)
        .fetch_optional(pool)
        .await?;

    raw.map(|value| {
        parse_reference(&value).ok_or_else(|| {
            RepoError::Validation(format!("Stored reference time is not RFC 3339: {value}"))
        })
    })
    .transpose()
}

pub async fn set_reference_time(
    conn: &mut SqliteConnection,
    instant: DateTime<Utc>,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO system_state (key, value) VALUES (?1, ?2) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(REFERENCE_TIME_KEY)
    .bind(format_reference(instant))
    .execute(&mut *conn)
    .await?;
    Ok(())
}
