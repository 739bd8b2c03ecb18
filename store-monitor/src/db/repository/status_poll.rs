//! Status Poll Repository

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use super::RepoResult;
use crate::db::models::{StatusPoll, StatusPollCreate};
use crate::utils::time::to_micros;

/// Remove every poll; ingestion always reloads the full file
pub async fn delete_all(conn: &mut SqliteConnection) -> RepoResult<u64> {
    let result = sqlx::query("DELETE FROM store_status_poll")
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Insert a batch on the caller's connection; row order is preserved in `id`
pub async fn insert_batch(conn: &mut SqliteConnection, polls: &[StatusPollCreate]) -> RepoResult<u64> {
    for poll in polls {
        sqlx::query(
            "INSERT INTO store_status_poll (store_id, timestamp_utc, status) VALUES (?1, ?2, ?3)",
        )
        .bind(&poll.store_id)
        .bind(to_micros(poll.timestamp))
        .bind(poll.status.as_str())
        .execute(&mut *conn)
        .await?;
    }
    Ok(polls.len() as u64)
}

/// Polls of one store in `[from, to]`, ordered by timestamp then ingestion order
pub async fn find_in_range(
    pool: &SqlitePool,
    store_id: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> RepoResult<Vec<StatusPoll>> {
    let polls = sqlx::query_as::<_, StatusPoll>(
        "SELECT id, store_id, timestamp_utc, status FROM store_status_poll WHERE store_id = ? AND timestamp_utc >= ? AND timestamp_utc <= ? ORDER BY timestamp_utc ASC, id ASC",
    )
    .bind(store_id)
    .bind(to_micros(from))
    .bind(to_micros(to))
    .fetch_all(pool)
    .await?;
    Ok(polls)
}
