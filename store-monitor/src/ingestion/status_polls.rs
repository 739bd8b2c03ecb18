//! store_status.csv → `store_status_poll`

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqliteConnection;
use uptime_engine::StoreStatus;

use super::{IngestionResult, POLL_BATCH_SIZE, StepSummary, open_reader, parse_store_id};
use crate::db::models::StatusPollCreate;
use crate::db::repository::{status_poll, store};
use crate::utils::time::parse_poll_timestamp;

#[derive(Debug, Deserialize)]
struct StatusRecord {
    store_id: String,
    status: String,
    timestamp_utc: String,
}

fn to_poll(record: &StatusRecord, store_id: String) -> Option<StatusPollCreate> {
    let status = record.status.parse::<StoreStatus>().ok()?;
    let timestamp = parse_poll_timestamp(&record.timestamp_utc)?;
    Some(StatusPollCreate {
        store_id,
        timestamp,
        status,
    })
}

/// Write one batch, creating its unknown stores first
async fn flush(
    conn: &mut SqliteConnection,
    batch: &mut Vec<StatusPollCreate>,
    default_tz: &str,
    summary: &mut StepSummary,
) -> IngestionResult<()> {
    if batch.is_empty() {
        return Ok(());
    }
    let ids: Vec<String> = batch
        .iter()
        .map(|p| p.store_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    summary.stores_created += store::ensure_exist(conn, &ids, default_tz).await?;
    summary.loaded += status_poll::insert_batch(conn, batch).await?;
    tracing::debug!(rows = batch.len(), total = summary.loaded, "Inserted poll batch");
    batch.clear();
    Ok(())
}

/// Replace all polls with the file's valid rows.
///
/// Runs on the caller's transaction; nothing is visible until it commits.
/// Returns the step summary and the maximum accepted timestamp.
pub async fn load_status_polls(
    conn: &mut SqliteConnection,
    path: &Path,
    default_tz: &str,
) -> IngestionResult<(StepSummary, Option<DateTime<Utc>>)> {
    let Some(mut reader) = open_reader(path)? else {
        return Ok((StepSummary::missing(), None));
    };

    let deleted = status_poll::delete_all(conn).await?;
    tracing::warn!(deleted, "Deleted existing poll records before re-ingestion");

    let mut summary = StepSummary::default();
    let mut max_timestamp: Option<DateTime<Utc>> = None;
    let mut batch = Vec::with_capacity(POLL_BATCH_SIZE);

    for (line, record) in reader.deserialize::<StatusRecord>().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(line = line + 2, error = %e, "Malformed status row, skipping");
                summary.skipped += 1;
                continue;
            }
        };
        let Some(id) = parse_store_id(&record.store_id, "status polls") else {
            summary.skipped += 1;
            continue;
        };
        let Some(poll) = to_poll(&record, id) else {
            tracing::warn!(
                line = line + 2,
                status = %record.status,
                timestamp = %record.timestamp_utc,
                "Invalid status or timestamp, skipping"
            );
            summary.skipped += 1;
            continue;
        };

        max_timestamp = max_timestamp.max(Some(poll.timestamp));
        batch.push(poll);
        if batch.len() >= POLL_BATCH_SIZE {
            flush(conn, &mut batch, default_tz, &mut summary).await?;
        }
    }
    flush(conn, &mut batch, default_tz, &mut summary).await?;

    tracing::info!(
        loaded = summary.loaded,
        skipped = summary.skipped,
        stores_created = summary.stores_created,
        "Status polls loaded"
    );
    Ok((summary, max_timestamp))
}
