//! menu_hours.csv → `business_hour`

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;
use sqlx::SqliteConnection;
use uptime_engine::RawBusinessRule;

use super::{IngestionResult, StepSummary, open_reader, parse_store_id};
use crate::db::models::BusinessHourCreate;
use crate::db::repository::{business_hour, store};

#[derive(Debug, Deserialize)]
struct BusinessHourRecord {
    store_id: String,
    #[serde(rename = "dayOfWeek", alias = "day_of_week")]
    day_of_week: i64,
    start_time_local: String,
    end_time_local: String,
}

impl BusinessHourRecord {
    fn to_rule(&self) -> RawBusinessRule {
        RawBusinessRule::new(
            self.day_of_week,
            self.start_time_local.as_str(),
            self.end_time_local.as_str(),
        )
    }
}

pub async fn load_business_hours(
    conn: &mut SqliteConnection,
    path: &Path,
    default_tz: &str,
) -> IngestionResult<StepSummary> {
    let Some(mut reader) = open_reader(path)? else {
        return Ok(StepSummary::missing());
    };

    let mut summary = StepSummary::default();
    let mut store_ids = BTreeSet::new();
    let mut rows = Vec::new();

    for (line, record) in reader.deserialize::<BusinessHourRecord>().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(line = line + 2, error = %e, "Malformed business hour row, skipping");
                summary.skipped += 1;
                continue;
            }
        };
        let Some(id) = parse_store_id(&record.store_id, "business hours") else {
            summary.skipped += 1;
            continue;
        };
        // Store counts as present even if all its rows are invalid
        store_ids.insert(id.clone());

        // 与报告计算走同一校验，入库的行一定能被 resolve 接受
        match record.to_rule().to_interval() {
            Ok(interval) => rows.push(BusinessHourCreate {
                store_id: id,
                day_of_week: i64::from(interval.weekday()),
                start_time_local: interval.start().to_string(),
                end_time_local: interval.end().to_string(),
            }),
            Err(e) => {
                tracing::warn!(store_id = %id, line = line + 2, error = %e, "Invalid business hour, skipping");
                summary.skipped += 1;
            }
        }
    }

    let store_ids: Vec<String> = store_ids.into_iter().collect();
    summary.stores_created = store::ensure_exist(conn, &store_ids, default_tz).await?;
    summary.loaded = business_hour::replace_for_stores(conn, &store_ids, &rows).await?;

    tracing::info!(
        loaded = summary.loaded,
        skipped = summary.skipped,
        stores = store_ids.len(),
        stores_created = summary.stores_created,
        "Business hours loaded"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(day: i64, start: &str, end: &str) -> BusinessHourRecord {
        BusinessHourRecord {
            store_id: "s".into(),
            day_of_week: day,
            start_time_local: start.into(),
            end_time_local: end.into(),
        }
    }

    #[test]
    fn test_record_accepts_crossing_rows() {
        let interval = record(4, "20:00:00", "02:00:00").to_rule().to_interval().unwrap();
        assert!(interval.crosses_midnight());
        assert_eq!(interval.start().to_string(), "20:00:00");
    }

    #[test]
    fn test_record_normalises_short_times() {
        let interval = record(0, "09:30", "17:00").to_rule().to_interval().unwrap();
        assert_eq!(interval.start().to_string(), "09:30:00");
        assert_eq!(interval.end().to_string(), "17:00:00");
    }

    #[test]
    fn test_record_rejects_what_resolve_rejects() {
        for bad in [
            record(7, "09:00:00", "17:00:00"),
            record(-1, "09:00:00", "17:00:00"),
            record(1, "nine", "17:00:00"),
            record(1, "24:00:00", "02:00:00"),
        ] {
            let rule = bad.to_rule();
            assert!(rule.to_interval().is_err());
            assert!(uptime_engine::resolve(std::slice::from_ref(&rule)).is_err());
        }
    }
}
