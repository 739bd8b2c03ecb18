//! Interval sweep
//!
//! Splits the trailing week into segments on which nothing can change
//! (store status, business openness, UTC offset), then counts how many
//! minute samples of each window fall into each segment.
//!
//! # Sampling grid
//!
//! A window of `N` minutes is the set of samples `reference - k min` for
//! `k = 1..=N`. A sample is counted as uptime/downtime when the store is open
//! at its local time, according to the status in effect at that instant.
//! The sweep yields exactly the counts of that per-minute loop, in time
//! proportional to the number of segments instead of the number of minutes.
//!
//! # Cut points
//!
//! ```text
//!  reference - 168h                                          reference
//!  |----|------|-----------|--|-------------|------|--------------|
//!       ^obs   ^open edge     ^DST           ^obs   ^close edge
//! ```

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::calendar::BusinessCalendar;
use crate::observation::{Observation, StoreStatus, status_at};
use crate::timezone::{LocalTime, instants_at_local, local_dates_around, offset_transitions};

/// Longest trailing window, in minutes (168h)
pub const LOOKBACK_MINUTES: i64 = 7 * 24 * 60;

const NANOS_PER_MINUTE: i128 = 60_000_000_000;

/// Trailing windows ending at the reference time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrailingWindow {
    LastHour,
    LastDay,
    LastWeek,
}

impl TrailingWindow {
    pub const ALL: [TrailingWindow; 3] = [
        TrailingWindow::LastHour,
        TrailingWindow::LastDay,
        TrailingWindow::LastWeek,
    ];

    pub fn minutes(&self) -> i64 {
        match self {
            TrailingWindow::LastHour => 60,
            TrailingWindow::LastDay => 24 * 60,
            TrailingWindow::LastWeek => LOOKBACK_MINUTES,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::minutes(self.minutes())
    }
}

/// Uptime/downtime minutes within one window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowTotals {
    pub uptime_minutes: i64,
    pub downtime_minutes: i64,
}

impl WindowTotals {
    /// Minutes the store was open (up + down)
    pub fn open_minutes(&self) -> i64 {
        self.uptime_minutes + self.downtime_minutes
    }

    fn add(&mut self, status: StoreStatus, minutes: i64) {
        match status {
            StoreStatus::Active => self.uptime_minutes += minutes,
            StoreStatus::Inactive => self.downtime_minutes += minutes,
        }
    }
}

/// Totals for all three windows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UptimeTally {
    pub last_hour: WindowTotals,
    pub last_day: WindowTotals,
    pub last_week: WindowTotals,
}

impl UptimeTally {
    pub fn get(&self, window: TrailingWindow) -> WindowTotals {
        match window {
            TrailingWindow::LastHour => self.last_hour,
            TrailingWindow::LastDay => self.last_day,
            TrailingWindow::LastWeek => self.last_week,
        }
    }

    fn get_mut(&mut self, window: TrailingWindow) -> &mut WindowTotals {
        match window {
            TrailingWindow::LastHour => &mut self.last_hour,
            TrailingWindow::LastDay => &mut self.last_day,
            TrailingWindow::LastWeek => &mut self.last_week,
        }
    }
}

/// Distance from `t` back to `reference`, in nanoseconds (`t <= reference`)
fn nanos_before(reference: DateTime<Utc>, t: DateTime<Utc>) -> i128 {
    let delta = reference - t;
    delta.num_seconds() as i128 * 1_000_000_000 + delta.subsec_nanos() as i128
}

/// Sorted, deduplicated instants in `[start, end]` where the tallied
/// quantity may change.
fn cut_points(
    calendar: &BusinessCalendar,
    zone: &Tz,
    observations: &[Observation],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<DateTime<Utc>> {
    let mut points = vec![start, end];

    points.extend(observations.iter().map(|o| o.timestamp));

    for date in local_dates_around(zone, start, end) {
        let weekday = date_weekday(date);
        for edge in calendar.edges_on(weekday) {
            points.extend(instants_at_local(zone, date, edge));
        }
    }

    points.extend(offset_transitions(zone, start, end));

    points.retain(|p| *p >= start && *p <= end);
    points.sort_unstable();
    points.dedup();
    points
}

fn date_weekday(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_monday() as u8
}

/// Tally uptime/downtime for the three trailing windows ending at `reference`.
///
/// `observations` must be sorted by timestamp (ties resolved by position,
/// last wins).
pub fn sweep(
    calendar: &BusinessCalendar,
    zone: &Tz,
    observations: &[Observation],
    reference: DateTime<Utc>,
) -> UptimeTally {
    let start = reference - TrailingWindow::LastWeek.duration();
    let points = cut_points(calendar, zone, observations, start, reference);

    let mut tally = UptimeTally::default();

    for segment in points.windows(2) {
        let (a, b) = (segment[0], segment[1]);
        // Samples inside [a, b) are k in (kb, ka]
        let ka = nanos_before(reference, a) / NANOS_PER_MINUTE;
        let kb = nanos_before(reference, b) / NANOS_PER_MINUTE;
        if ka <= kb {
            continue;
        }

        // Nothing changes inside the segment, so one sample decides it
        let sample = reference - Duration::minutes(ka as i64);
        let local = LocalTime::at(sample, zone);
        if !calendar.is_open(local.weekday, local.time) {
            continue;
        }
        let status = status_at(observations, sample);

        for window in TrailingWindow::ALL {
            let n = window.minutes() as i128;
            let count = ka.min(n) - kb.min(n);
            if count > 0 {
                tally.get_mut(window).add(status, count as i64);
            }
        }
    }

    tracing::trace!(
        segments = points.len().saturating_sub(1),
        week_up = tally.last_week.uptime_minutes,
        week_down = tally.last_week.downtime_minutes,
        "Sweep finished"
    );

    tally
}
