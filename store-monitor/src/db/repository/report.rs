//! Report Repository

use sqlx::SqlitePool;

use super::{RepoError, RepoResult};
use crate::db::models::{Report, ReportStatus};
use crate::utils::time::now_millis;

const SELECT_REPORT: &str =
    "SELECT id, store_id, status, created_at, completed_at, report_file_path FROM report";

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> RepoResult<Option<Report>> {
    let report = sqlx::query_as::<_, Report>(&format!("{SELECT_REPORT} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(report)
}

/// Create a PENDING report for `store_id`
pub async fn create(pool: &SqlitePool, id: &str, store_id: &str) -> RepoResult<Report> {
    sqlx::query("INSERT INTO report (id, store_id, status, created_at) VALUES (?1, ?2, ?3, ?4)")
        .bind(id)
        .bind(store_id)
        .bind(ReportStatus::Pending)
        .bind(now_millis())
        .execute(pool)
        .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create report".into()))
}

/// PENDING → RUNNING
pub async fn mark_running(pool: &SqlitePool, id: &str) -> RepoResult<()> {
    let rows = sqlx::query("UPDATE report SET status = ?1 WHERE id = ?2 AND status = ?3")
        .bind(ReportStatus::Running)
        .bind(id)
        .bind(ReportStatus::Pending)
        .execute(pool)
        .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Report {id} not found or not pending"
        )));
    }
    Ok(())
}

/// RUNNING → COMPLETE, recording where the CSV was written
pub async fn mark_complete(pool: &SqlitePool, id: &str, file_path: &str) -> RepoResult<()> {
    let rows = sqlx::query(
        "UPDATE report SET status = ?1, completed_at = ?2, report_file_path = ?3 WHERE id = ?4 AND status = ?5",
    )
    .bind(ReportStatus::Complete)
    .bind(now_millis())
    .bind(file_path)
    .bind(id)
    .bind(ReportStatus::Running)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Report {id} not found or not running"
        )));
    }
    Ok(())
}

/// Any unfinished state → FAILED. Finished reports are left as they are.
pub async fn mark_failed(pool: &SqlitePool, id: &str) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE report SET status = ?1, completed_at = ?2 WHERE id = ?3 AND status IN (?4, ?5)",
    )
    .bind(ReportStatus::Failed)
    .bind(now_millis())
    .bind(id)
    .bind(ReportStatus::Pending)
    .bind(ReportStatus::Running)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Fail every unfinished report created before `created_before` (millis);
/// their jobs died with the previous process
pub async fn fail_unfinished(pool: &SqlitePool, created_before: i64) -> RepoResult<u64> {
    let rows = sqlx::query(
        "UPDATE report SET status = ?1, completed_at = ?2 WHERE status IN (?3, ?4) AND created_at < ?5",
    )
    .bind(ReportStatus::Failed)
    .bind(now_millis())
    .bind(ReportStatus::Pending)
    .bind(ReportStatus::Running)
    .bind(created_before)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected())
}
