//! Business Calendar Resolver
//!
//! Turns raw per-weekday open/close rules into a [`BusinessCalendar`] and
//! answers "is the store open at this local weekday/time".
//!
//! # Rules
//!
//! | Case | Meaning |
//! |------|---------|
//! | no rules at all | open 24/7 (one `[00:00, 24:00)` interval per weekday) |
//! | `start < end` | open `[start, end)` on the declared weekday |
//! | `start > end` | crosses midnight: `[start, 24:00)` + `[00:00, end)` next weekday |
//! | `start == end` | zero-length, always closed |
//!
//! Weekdays are numbered 0 = Monday … 6 = Sunday. Overlapping intervals are
//! kept as-is; [`is_open`] is a logical OR so overlap never double counts.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

const SECONDS_PER_DAY: u32 = 86_400;

/// Number of weekdays in a calendar
pub const DAYS_PER_WEEK: u8 = 7;

/// Local wall-clock time, whole seconds since midnight (`00:00:00 ..= 24:00:00`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u32);

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);
    /// `24:00:00`, only valid as an interval end
    pub const END_OF_DAY: TimeOfDay = TimeOfDay(SECONDS_PER_DAY);

    pub fn from_hms(hour: u32, min: u32, sec: u32) -> Option<Self> {
        if min > 59 || sec > 59 {
            return None;
        }
        let secs = hour * 3600 + min * 60 + sec;
        (secs <= SECONDS_PER_DAY).then_some(TimeOfDay(secs))
    }

    /// Sub-second precision is truncated; edges are whole seconds so the
    /// `[start, end)` comparison is unaffected.
    pub fn from_naive(time: NaiveTime) -> Self {
        TimeOfDay(time.num_seconds_from_midnight())
    }

    pub fn seconds(&self) -> u32 {
        self.0
    }

    /// `None` for [`TimeOfDay::END_OF_DAY`]
    pub fn to_naive(&self) -> Option<NaiveTime> {
        NaiveTime::from_num_seconds_from_midnight_opt(self.0, 0)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m, s) = (self.0 / 3600, (self.0 % 3600) / 60, self.0 % 60);
        write!(f, "{h:02}:{m:02}:{s:02}")
    }
}

impl FromStr for TimeOfDay {
    type Err = EngineError;

    /// Accepts `HH:MM:SS`, `HH:MM`, and `24:00[:00]`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "24:00" || s == "24:00:00" {
            return Ok(TimeOfDay::END_OF_DAY);
        }
        NaiveTime::parse_from_str(s, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
            .map(TimeOfDay::from_naive)
            .map_err(|_| EngineError::Validation(format!("Invalid time of day: '{s}'")))
    }
}

/// One open interval declared for a weekday
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessInterval {
    weekday: u8,
    start: TimeOfDay,
    end: TimeOfDay,
}

impl BusinessInterval {
    pub fn new(weekday: u8, start: TimeOfDay, end: TimeOfDay) -> EngineResult<Self> {
        if weekday >= DAYS_PER_WEEK {
            return Err(EngineError::Validation(format!(
                "Weekday out of range (0-6): {weekday}"
            )));
        }
        if start == TimeOfDay::END_OF_DAY {
            return Err(EngineError::Validation(format!(
                "Interval on weekday {weekday} cannot start at 24:00"
            )));
        }
        Ok(Self { weekday, start, end })
    }

    /// `[00:00, 24:00)` on `weekday`
    pub fn full_day(weekday: u8) -> EngineResult<Self> {
        Self::new(weekday, TimeOfDay::MIDNIGHT, TimeOfDay::END_OF_DAY)
    }

    pub fn weekday(&self) -> u8 {
        self.weekday
    }

    pub fn start(&self) -> TimeOfDay {
        self.start
    }

    pub fn end(&self) -> TimeOfDay {
        self.end
    }

    /// Interval spills into the following weekday
    pub fn crosses_midnight(&self) -> bool {
        self.start > self.end
    }

    /// Open test for the interval's own weekday
    fn covers_same_day(&self, time: TimeOfDay) -> bool {
        if self.crosses_midnight() {
            time >= self.start
        } else {
            self.start <= time && time < self.end
        }
    }

    /// Open test for the weekday after the declared one
    fn covers_next_day(&self, time: TimeOfDay) -> bool {
        self.crosses_midnight() && time < self.end
    }
}

/// Raw business-hour rule as stored upstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBusinessRule {
    /// 0 = Monday … 6 = Sunday
    pub day_of_week: i64,
    pub start_time_local: String,
    pub end_time_local: String,
}

impl RawBusinessRule {
    pub fn new(day_of_week: i64, start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            day_of_week,
            start_time_local: start.into(),
            end_time_local: end.into(),
        }
    }

    /// Validate the rule: weekday in `0..=6`, both times parseable.
    ///
    /// Ingestion and [`resolve`] both go through here.
    pub fn to_interval(&self) -> EngineResult<BusinessInterval> {
        let weekday = u8::try_from(self.day_of_week)
            .ok()
            .filter(|d| *d < DAYS_PER_WEEK)
            .ok_or_else(|| {
                EngineError::Validation(format!(
                    "Weekday out of range (0-6): {}",
                    self.day_of_week
                ))
            })?;
        let start: TimeOfDay = self.start_time_local.parse()?;
        let end: TimeOfDay = self.end_time_local.parse()?;
        BusinessInterval::new(weekday, start, end)
    }
}

/// Weekday → intervals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessCalendar {
    days: [Vec<BusinessInterval>; DAYS_PER_WEEK as usize],
}

impl BusinessCalendar {
    /// The 24/7 default
    pub fn always_open() -> Self {
        Self {
            days: std::array::from_fn(|d| {
                vec![BusinessInterval {
                    weekday: d as u8,
                    start: TimeOfDay::MIDNIGHT,
                    end: TimeOfDay::END_OF_DAY,
                }]
            }),
        }
    }

    /// Calendar made of exactly these intervals.
    ///
    /// No 24/7 fallback here: an empty iterator yields a store that is never open.
    pub fn from_intervals(intervals: impl IntoIterator<Item = BusinessInterval>) -> Self {
        let mut days: [Vec<BusinessInterval>; DAYS_PER_WEEK as usize] =
            std::array::from_fn(|_| Vec::new());
        for interval in intervals {
            days[interval.weekday as usize].push(interval);
        }
        Self { days }
    }

    pub fn intervals_on(&self, weekday: u8) -> &[BusinessInterval] {
        self.days
            .get(weekday as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn interval_count(&self) -> usize {
        self.days.iter().map(Vec::len).sum()
    }

    pub fn is_open(&self, weekday: u8, time: TimeOfDay) -> bool {
        if weekday >= DAYS_PER_WEEK {
            return false;
        }
        let previous = (weekday + DAYS_PER_WEEK - 1) % DAYS_PER_WEEK;

        self.intervals_on(weekday)
            .iter()
            .any(|i| i.covers_same_day(time))
            || self
                .intervals_on(previous)
                .iter()
                .any(|i| i.covers_next_day(time))
    }

    /// Local times on `weekday` where openness may change, sorted, below 24:00.
    ///
    /// Midnight is always included: it is where the previous day's spill-over
    /// pieces begin and where the weekday itself changes.
    pub(crate) fn edges_on(&self, weekday: u8) -> Vec<TimeOfDay> {
        let previous = (weekday + DAYS_PER_WEEK - 1) % DAYS_PER_WEEK;
        let mut edges = vec![TimeOfDay::MIDNIGHT];

        for interval in self.intervals_on(weekday) {
            edges.push(interval.start);
            if !interval.crosses_midnight() {
                edges.push(interval.end);
            }
        }
        for interval in self.intervals_on(previous) {
            if interval.crosses_midnight() {
                edges.push(interval.end);
            }
        }

        edges.retain(|e| *e < TimeOfDay::END_OF_DAY);
        edges.sort_unstable();
        edges.dedup();
        edges
    }
}

/// Build a calendar from raw rules.
///
/// Empty input → 24/7 default. Any malformed rule fails the whole
/// resolution so a calculation never runs on a partial calendar.
pub fn resolve(rules: &[RawBusinessRule]) -> EngineResult<BusinessCalendar> {
    if rules.is_empty() {
        tracing::debug!("No business hours found, assuming 24/7");
        return Ok(BusinessCalendar::always_open());
    }

    let intervals = rules
        .iter()
        .map(RawBusinessRule::to_interval)
        .collect::<EngineResult<Vec<_>>>()?;

    Ok(BusinessCalendar::from_intervals(intervals))
}

/// Free-function form of [`BusinessCalendar::is_open`]
pub fn is_open(calendar: &BusinessCalendar, weekday: u8, time: TimeOfDay) -> bool {
    calendar.is_open(weekday, time)
}
