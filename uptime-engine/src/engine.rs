//! Calculation entry point

use chrono::{DateTime, Utc};

use crate::calendar::BusinessCalendar;
use crate::error::{EngineError, EngineResult};
use crate::formatter::CalculationResult;
use crate::observation::Observation;
use crate::sweep::sweep;
use crate::timezone::parse_zone;

/// Everything one calculation needs, assembled by the caller
#[derive(Debug, Clone)]
pub struct StoreContext {
    pub store_id: String,
    /// IANA zone id; the caller has already applied its default
    pub timezone: String,
    pub calendar: BusinessCalendar,
    /// Ascending by timestamp
    pub observations: Vec<Observation>,
}

/// Compute the report row for one store at a fixed reference instant.
///
/// `reference` is the batch-wide "now", never wall-clock time.
pub fn calculate(context: &StoreContext, reference: DateTime<Utc>) -> EngineResult<CalculationResult> {
    let zone = parse_zone(&context.timezone)?;

    if let Some(pair) = context
        .observations
        .windows(2)
        .find(|w| w[0].timestamp > w[1].timestamp)
    {
        return Err(EngineError::Validation(format!(
            "Observations for store {} are not ordered: {} after {}",
            context.store_id, pair[1].timestamp, pair[0].timestamp
        )));
    }

    let tally = sweep(&context.calendar, &zone, &context.observations, reference);

    tracing::debug!(
        store_id = %context.store_id,
        zone = %zone,
        observations = context.observations.len(),
        intervals = context.calendar.interval_count(),
        "Uptime calculated"
    );

    Ok(CalculationResult::from_tally(context.store_id.clone(), &tally))
}
