//! Timezone conversion
//!
//! UTC instant → local weekday/time for an IANA zone, plus the two helpers
//! the sweep needs to stay DST-correct: every UTC instant a local wall-clock
//! time maps to, and every offset transition inside a UTC range.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::calendar::TimeOfDay;
use crate::error::{EngineError, EngineResult};

/// Offset sampling step when scanning for transitions.
///
/// Real zones never change offset twice within this span.
const TRANSITION_SCAN_STEP_SECS: i64 = 6 * 3600;

/// Parse an IANA zone identifier (e.g. `America/Chicago`)
pub fn parse_zone(zone_id: &str) -> EngineResult<Tz> {
    let trimmed = zone_id.trim();
    trimmed
        .parse::<Tz>()
        .map_err(|_| EngineError::Configuration(format!("Unknown timezone: '{trimmed}'")))
}

/// Store zone, or `default_zone` when the store's is missing or unknown.
///
/// Only an unusable `default_zone` is an error.
pub fn resolve_zone(zone_id: Option<&str>, default_zone: &str) -> EngineResult<Tz> {
    match zone_id.map(str::trim).filter(|z| !z.is_empty()) {
        Some(id) => match parse_zone(id) {
            Ok(tz) => Ok(tz),
            Err(_) => {
                tracing::warn!(zone = %id, default = %default_zone, "Unknown store timezone, using default");
                parse_zone(default_zone)
            }
        },
        None => parse_zone(default_zone),
    }
}

/// Local weekday (0 = Monday) and wall-clock time of an instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalTime {
    pub weekday: u8,
    pub time: TimeOfDay,
}

impl LocalTime {
    pub fn at(instant: DateTime<Utc>, zone: &Tz) -> Self {
        let local = instant.with_timezone(zone);
        Self {
            weekday: local.weekday().num_days_from_monday() as u8,
            time: TimeOfDay::from_naive(local.time()),
        }
    }
}

/// Convert a UTC instant to local weekday/time in `zone_id`
pub fn local_time(instant: DateTime<Utc>, zone_id: &str) -> EngineResult<LocalTime> {
    let zone = parse_zone(zone_id)?;
    Ok(LocalTime::at(instant, &zone))
}

/// Every UTC instant at which `zone` reads `date time`.
///
/// Empty inside a spring-forward gap, two instants inside a fall-back overlap.
pub(crate) fn instants_at_local(zone: &Tz, date: NaiveDate, time: TimeOfDay) -> Vec<DateTime<Utc>> {
    let Some(naive_time) = time.to_naive() else {
        return Vec::new();
    };
    match zone.from_local_datetime(&date.and_time(naive_time)) {
        LocalResult::Single(dt) => vec![dt.with_timezone(&Utc)],
        LocalResult::Ambiguous(earlier, later) => {
            vec![earlier.with_timezone(&Utc), later.with_timezone(&Utc)]
        }
        LocalResult::None => Vec::new(),
    }
}

fn offset_secs(zone: &Tz, unix_secs: i64) -> Option<i32> {
    let instant = DateTime::<Utc>::from_timestamp(unix_secs, 0)?;
    Some(
        zone.offset_from_utc_datetime(&instant.naive_utc())
            .fix()
            .local_minus_utc(),
    )
}

/// UTC offset changes in `[start, end]`, each reported as the first whole
/// second carrying the new offset.
pub(crate) fn offset_transitions(
    zone: &Tz,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<DateTime<Utc>> {
    let mut transitions = Vec::new();
    let (first, last) = (start.timestamp(), end.timestamp());
    if last <= first {
        return transitions;
    }

    let Some(mut prev_offset) = offset_secs(zone, first) else {
        return transitions;
    };
    let mut prev = first;

    while prev < last {
        let next = (prev + TRANSITION_SCAN_STEP_SECS).min(last);
        let Some(next_offset) = offset_secs(zone, next) else {
            break;
        };

        if next_offset != prev_offset {
            // Invariant: lo carries the old offset, hi the new one
            let (mut lo, mut hi) = (prev, next);
            while hi - lo > 1 {
                let mid = lo + (hi - lo) / 2;
                match offset_secs(zone, mid) {
                    Some(o) if o == prev_offset => lo = mid,
                    _ => hi = mid,
                }
            }
            if let Some(at) = DateTime::<Utc>::from_timestamp(hi, 0) {
                transitions.push(at);
            }
        }

        prev = next;
        prev_offset = next_offset;
    }

    transitions
}

/// Whole days covered, padded by one local day on each side
pub(crate) fn local_dates_around(
    zone: &Tz,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> impl Iterator<Item = NaiveDate> {
    let first = start.with_timezone(zone).date_naive() - Duration::days(1);
    let last = end.with_timezone(zone).date_naive() + Duration::days(1);
    first.iter_days().take_while(move |d| *d <= last)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_parse_zone() {
        assert_eq!(parse_zone("America/Chicago").unwrap(), Tz::America__Chicago);
        assert_eq!(parse_zone(" Asia/Kolkata ").unwrap(), Tz::Asia__Kolkata);
        assert!(matches!(
            parse_zone("Mars/Olympus_Mons"),
            Err(EngineError::Configuration(_))
        ));
    }

    #[test]
    fn test_resolve_zone_falls_back_to_default() {
        assert_eq!(
            resolve_zone(Some("Not/AZone"), "America/Chicago").unwrap(),
            Tz::America__Chicago
        );
        assert_eq!(resolve_zone(None, "UTC").unwrap(), Tz::UTC);
        assert_eq!(resolve_zone(Some(""), "UTC").unwrap(), Tz::UTC);
        assert_eq!(
            resolve_zone(Some("Europe/Berlin"), "UTC").unwrap(),
            Tz::Europe__Berlin
        );
        assert!(matches!(
            resolve_zone(Some("Not/AZone"), "Also/Bad"),
            Err(EngineError::Configuration(_))
        ));
    }

    #[test]
    fn test_local_time_crosses_date_line() {
        // 2023-01-24 is a Tuesday; 03:00 UTC is still Monday evening in Chicago
        let local = local_time(utc(2023, 1, 24, 3, 0), "America/Chicago").unwrap();
        assert_eq!(local.weekday, 0);
        assert_eq!(local.time, TimeOfDay::from_hms(21, 0, 0).unwrap());
    }

    #[test]
    fn test_local_time_follows_dst() {
        // CST (UTC-6) before the switch, CDT (UTC-5) after
        let winter = local_time(utc(2023, 3, 11, 18, 0), "America/Chicago").unwrap();
        let summer = local_time(utc(2023, 3, 13, 18, 0), "America/Chicago").unwrap();
        assert_eq!(winter.time, TimeOfDay::from_hms(12, 0, 0).unwrap());
        assert_eq!(summer.time, TimeOfDay::from_hms(13, 0, 0).unwrap());
    }

    #[test]
    fn test_instants_at_local_gap_and_overlap() {
        let zone = Tz::America__Chicago;

        let gap = instants_at_local(
            &zone,
            NaiveDate::from_ymd_opt(2023, 3, 12).unwrap(),
            TimeOfDay::from_hms(2, 30, 0).unwrap(),
        );
        assert!(gap.is_empty());

        let overlap = instants_at_local(
            &zone,
            NaiveDate::from_ymd_opt(2023, 11, 5).unwrap(),
            TimeOfDay::from_hms(1, 30, 0).unwrap(),
        );
        assert_eq!(overlap, vec![utc(2023, 11, 5, 6, 30), utc(2023, 11, 5, 7, 30)]);

        let plain = instants_at_local(
            &zone,
            NaiveDate::from_ymd_opt(2023, 1, 24).unwrap(),
            TimeOfDay::from_hms(9, 0, 0).unwrap(),
        );
        assert_eq!(plain, vec![utc(2023, 1, 24, 15, 0)]);
    }

    #[test]
    fn test_offset_transitions_found_to_the_second() {
        let zone = Tz::America__Chicago;
        let spring = offset_transitions(&zone, utc(2023, 3, 10, 0, 0), utc(2023, 3, 14, 0, 0));
        assert_eq!(spring, vec![utc(2023, 3, 12, 8, 0)]);

        let fall = offset_transitions(&zone, utc(2023, 11, 1, 0, 0), utc(2023, 11, 8, 0, 0));
        assert_eq!(fall, vec![utc(2023, 11, 5, 7, 0)]);

        let none = offset_transitions(&zone, utc(2023, 1, 17, 0, 0), utc(2023, 1, 24, 0, 0));
        assert!(none.is_empty());
    }

    #[test]
    fn test_fixed_zone_has_no_transitions() {
        let found = offset_transitions(&Tz::Asia__Kolkata, utc(2023, 3, 1, 0, 0), utc(2023, 12, 1, 0, 0));
        assert!(found.is_empty());
    }

    #[test]
    fn test_local_dates_are_padded() {
        let dates: Vec<_> =
            local_dates_around(&Tz::UTC, utc(2023, 1, 24, 12, 0), utc(2023, 1, 25, 12, 0)).collect();
        assert_eq!(dates.first(), NaiveDate::from_ymd_opt(2023, 1, 23).as_ref());
        assert_eq!(dates.last(), NaiveDate::from_ymd_opt(2023, 1, 26).as_ref());
        assert_eq!(dates.len(), 4);
    }
}
