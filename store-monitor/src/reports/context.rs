//! Per-job calculation input

use chrono::{DateTime, TimeDelta, Utc};
use sqlx::SqlitePool;
use uptime_engine::{LOOKBACK_MINUTES, RawBusinessRule, StoreContext};

use super::{ReportError, ReportResult};
use crate::core::Config;
use crate::db::repository::{business_hour, status_poll, store};

/// Load everything the engine needs for one store.
///
/// Observations are fetched from `reference − 7d − POLL_FETCH_BUFFER_HOURS`
/// so the status in force at the start of the week window is known.
pub async fn build_context(
    pool: &SqlitePool,
    store_id: &str,
    reference: DateTime<Utc>,
    config: &Config,
) -> ReportResult<StoreContext> {
    let store = store::find_by_id(pool, store_id)
        .await?
        .ok_or_else(|| ReportError::StoreNotFound(store_id.to_string()))?;

    let zone =
        uptime_engine::resolve_zone(Some(store.timezone_str.as_str()), &config.default_timezone)?;

    let rules: Vec<RawBusinessRule> = business_hour::find_by_store(pool, store_id)
        .await?
        .iter()
        .map(|row| row.to_rule())
        .collect();
    let calendar = uptime_engine::resolve(&rules)?;

    let buffer_hours = config.poll_fetch_buffer_hours.max(0);
    let from = TimeDelta::try_hours(buffer_hours)
        .and_then(|buffer| buffer.checked_add(&TimeDelta::minutes(LOOKBACK_MINUTES)))
        .and_then(|span| reference.checked_sub_signed(span))
        .ok_or_else(|| {
            ReportError::Internal(format!(
                "Poll fetch window out of range: {buffer_hours}h buffer before {reference}"
            ))
        })?;
    let polls = status_poll::find_in_range(pool, store_id, from, reference).await?;

    let fetched = polls.len();
    let observations: Vec<_> = polls.iter().filter_map(|p| p.to_observation()).collect();
    if observations.len() < fetched {
        tracing::warn!(
            store_id,
            dropped = fetched - observations.len(),
            "Unreadable poll rows ignored"
        );
    }

    tracing::debug!(
        store_id,
        zone = zone.name(),
        rules = rules.len(),
        observations = observations.len(),
        "Store context loaded"
    );

    Ok(StoreContext {
        store_id: store.id,
        timezone: zone.name().to_string(),
        calendar,
        observations,
    })
}
