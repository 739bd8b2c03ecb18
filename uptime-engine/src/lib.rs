//! # uptime-engine
//!
//! Store uptime/downtime calculation - pure computation only.
//!
//! ## Scope
//!
//! This crate handles HOW uptime is computed:
//! - Timezone conversion (IANA zones, DST aware)
//! - Business calendar resolution (multi-interval days, midnight crossing, 24/7 default)
//! - Interval sweep over sparse status observations
//! - Result formatting (minutes for the last hour, hours for day/week)
//!
//! Where the inputs come from (database, CSV) and where the result goes
//! (report files, HTTP) stays in application code → store-monitor.
//!
//! ## Example
//!
//! ```ignore
//! use uptime_engine::{calculate, resolve, Observation, StoreContext, StoreStatus};
//!
//! let context = StoreContext {
//!     store_id: "8419537941919820732".into(),
//!     timezone: "America/Chicago".into(),
//!     calendar: resolve(&[])?, // no rules → 24/7
//!     observations: vec![Observation::new(reference - Duration::minutes(90), StoreStatus::Active)],
//! };
//!
//! let result = calculate(&context, reference)?;
//! assert_eq!(result.uptime_last_hour, 60);
//! ```

mod calendar;
mod engine;
mod error;
mod formatter;
mod observation;
mod sweep;
mod timezone;

// Re-exports
pub use calendar::{BusinessCalendar, BusinessInterval, RawBusinessRule, TimeOfDay, is_open, resolve};
pub use engine::{StoreContext, calculate};
pub use error::{EngineError, EngineResult};
pub use formatter::{CalculationResult, minutes_to_hours};
pub use observation::{Observation, StoreStatus, status_at};
pub use sweep::{LOOKBACK_MINUTES, TrailingWindow, UptimeTally, WindowTotals, sweep};
pub use timezone::{LocalTime, local_time, parse_zone, resolve_zone};

/// Re-export of the timezone type used across the public API
pub use chrono_tz::Tz;
