//! 时间工具函数
//!
//! 轮询时间戳统一以 UTC 微秒 (`i64`) 存储，
//! 报告的 created_at / completed_at 使用毫秒。

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Accepted `timestamp_utc` layouts besides RFC 3339
const POLL_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f UTC", "%Y-%m-%d %H:%M:%S%.f"];

/// 解析轮询时间戳
///
/// 支持 `2023-01-22 12:09:39.388884 UTC`、无后缀的同格式 (视为 UTC) 以及 RFC 3339
pub fn parse_poll_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    POLL_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
}

/// UTC 时间 → 微秒
pub fn to_micros(instant: DateTime<Utc>) -> i64 {
    instant.timestamp_micros()
}

/// 微秒 → UTC 时间
pub fn from_micros(micros: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
}

/// 当前时间 (毫秒)
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// 参考时间的持久化格式 (RFC 3339，保留小数秒)
pub fn format_reference(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub fn parse_reference(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
