//! timezones.csv → `store`

use std::path::Path;

use serde::Deserialize;
use sqlx::SqliteConnection;

use super::{IngestionResult, StepSummary, open_reader, parse_store_id};
use crate::db::models::Store;
use crate::db::repository::store;

#[derive(Debug, Deserialize)]
struct TimezoneRecord {
    store_id: String,
    #[serde(default)]
    timezone_str: Option<String>,
}

/// Zone to persist for a raw CSV value: itself when valid, otherwise the default
fn effective_zone(store_id: &str, raw: Option<&str>, default_tz: &str) -> String {
    match raw.map(str::trim).filter(|z| !z.is_empty()) {
        Some(zone) if uptime_engine::parse_zone(zone).is_ok() => zone.to_string(),
        Some(zone) => {
            tracing::warn!(store_id, zone, default = default_tz, "Invalid timezone, using default");
            default_tz.to_string()
        }
        None => default_tz.to_string(),
    }
}

pub async fn load_timezones(
    conn: &mut SqliteConnection,
    path: &Path,
    default_tz: &str,
) -> IngestionResult<StepSummary> {
    let Some(mut reader) = open_reader(path)? else {
        return Ok(StepSummary::missing());
    };

    let mut summary = StepSummary::default();
    let mut stores = Vec::new();

    for (line, record) in reader.deserialize::<TimezoneRecord>().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(line = line + 2, error = %e, "Malformed timezone row, skipping");
                summary.skipped += 1;
                continue;
            }
        };
        let Some(id) = parse_store_id(&record.store_id, "timezones") else {
            summary.skipped += 1;
            continue;
        };
        let timezone_str = effective_zone(&id, record.timezone_str.as_deref(), default_tz);
        stores.push(Store { id, timezone_str });
    }

    summary.loaded = store::upsert_timezones(conn, &stores).await?;
    tracing::info!(loaded = summary.loaded, skipped = summary.skipped, "Timezones loaded");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_zone() {
        assert_eq!(effective_zone("s", Some("Asia/Tokyo"), "UTC"), "Asia/Tokyo");
        assert_eq!(effective_zone("s", Some("Moon/Base"), "UTC"), "UTC");
        assert_eq!(effective_zone("s", Some("  "), "UTC"), "UTC");
        assert_eq!(effective_zone("s", None, "America/Chicago"), "America/Chicago");
    }
}
