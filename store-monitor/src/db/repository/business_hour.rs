//! Business Hour Repository

use sqlx::{SqliteConnection, SqlitePool};

use super::RepoResult;
use crate::db::models::{BusinessHour, BusinessHourCreate};

/// Replace all rules of `store_ids` with `rows`.
///
/// Stores listed in `store_ids` but absent from `rows` end up with no rules
/// (the 24/7 default).
pub async fn replace_for_stores(
    conn: &mut SqliteConnection,
    store_ids: &[String],
    rows: &[BusinessHourCreate],
) -> RepoResult<u64> {
    for store_id in store_ids {
        sqlx::query("DELETE FROM business_hour WHERE store_id = ?")
            .bind(store_id)
            .execute(&mut *conn)
            .await?;
    }

    for row in rows {
        sqlx::query(
            "INSERT INTO business_hour (store_id, day_of_week, start_time_local, end_time_local) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&row.store_id)
        .bind(row.day_of_week)
        .bind(&row.start_time_local)
        .bind(&row.end_time_local)
        .execute(&mut *conn)
        .await?;
    }

    Ok(rows.len() as u64)
}

pub async fn find_by_store(pool: &SqlitePool, store_id: &str) -> RepoResult<Vec<BusinessHour>> {
    let rows = sqlx::query_as::<_, BusinessHour>(
        "SELECT id, store_id, day_of_week, start_time_local, end_time_local FROM business_hour WHERE store_id = ? ORDER BY day_of_week, start_time_local, id",
    )
    .bind(store_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
