//! Store Repository

use super::RepoResult;
use crate::db::models::Store;
use sqlx::{SqliteConnection, SqlitePool};

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> RepoResult<Option<Store>> {
    let store = sqlx::query_as::<_, Store>("SELECT id, timezone_str FROM store WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(store)
}

/// Insert or overwrite the timezone of each store
pub async fn upsert_timezones(conn: &mut SqliteConnection, stores: &[Store]) -> RepoResult<u64> {
    let mut affected = 0;
    for store in stores {
        affected += sqlx::query(
            "INSERT INTO store (id, timezone_str) VALUES (?1, ?2) ON CONFLICT(id) DO UPDATE SET timezone_str = excluded.timezone_str",
        )
        .bind(&store.id)
        .bind(&store.timezone_str)
        .execute(&mut *conn)
        .await?
        .rows_affected();
    }
    Ok(affected)
}

/// Create the stores that do not exist yet with `default_timezone`.
///
/// Existing stores are left untouched. Returns the number created.
pub async fn ensure_exist(
    conn: &mut SqliteConnection,
    ids: &[String],
    default_timezone: &str,
) -> RepoResult<u64> {
    let mut created = 0;
    for id in ids {
        created += sqlx::query("INSERT OR IGNORE INTO store (id, timezone_str) VALUES (?1, ?2)")
            .bind(id)
            .bind(default_timezone)
            .execute(&mut *conn)
            .await?
            .rows_affected();
    }
    Ok(created)
}

pub async fn count(pool: &SqlitePool) -> RepoResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM store")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
