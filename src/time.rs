//! Wall-clock normalization and working-hours scoring.
//!
//! Pure functions, no system clock access. Daylight-saving edges resolve
//! deterministically: a wall time erased by a spring-forward gap maps to the
//! first valid instant after the gap, and an ambiguous fall-back time maps
//! to the earlier of its two instants.

use chrono::offset::LocalResult;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::poll::EngineError;

/// Longest wall-clock gap worth probing across, in minutes. The tz database
/// tops out at whole skipped calendar days (e.g. Pacific/Kiritimati, 1994).
const GAP_SEARCH_MINUTES: i64 = 48 * 60;

/// Resolve an IANA zone identifier, rejecting anything the tz database
/// does not know. Callers must not fall back to UTC on failure.
pub fn parse_zone(zone: &str) -> Result<Tz, EngineError> {
    zone.parse().map_err(|_| EngineError::InvalidTimeZone {
        zone: zone.to_string(),
    })
}

/// Convert a (date, local time, zone) triple to the absolute instant it
/// names, applying the zone's UTC offset as observed on that date.
///
/// # Examples
/// ```
/// use chrono::{NaiveDate, NaiveTime};
/// use meetsync_engine::time::to_instant;
///
/// // February in Chicago is CST (UTC-6)
/// let instant = to_instant(
///     NaiveDate::from_ymd_opt(2024, 2, 20).unwrap(),
///     NaiveTime::from_hms_opt(23, 59, 0).unwrap(),
///     "America/Chicago",
/// )
/// .unwrap();
///
/// assert_eq!(instant.to_rfc3339(), "2024-02-21T05:59:00+00:00");
/// ```
///
/// # Errors
/// `EngineError::InvalidTimeZone` if the identifier is not in the tz
/// database.
pub fn to_instant(
    date: NaiveDate,
    local_time: NaiveTime,
    time_zone: &str,
) -> Result<DateTime<Utc>, EngineError> {
    let tz = parse_zone(time_zone)?;
    Ok(resolve_local(date.and_time(local_time), tz))
}

fn resolve_local(local: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    let mut probe = local;

    for _ in 0..=GAP_SEARCH_MINUTES {
        match tz.from_local_datetime(&probe) {
            LocalResult::Single(instant) => return instant.with_timezone(&Utc),
            LocalResult::Ambiguous(earlier, _) => return earlier.with_timezone(&Utc),
            LocalResult::None => probe = probe + Duration::minutes(1),
        }
    }

    // No zone skips more than GAP_SEARCH_MINUTES of wall clock; unreachable
    // with a real tz database.
    Utc.from_utc_datetime(&probe)
}

/// Score how reasonable `instant` is as a meeting time for someone living
/// in `tz`, on a [0, 1] scale keyed off their local hour of day:
///
/// - 09:00–16:59 → 1.0 (core working hours)
/// - 07:00–08:59 or 17:00–18:59 → 0.6 (shoulder)
/// - 06:00–06:59 or 19:00–21:59 → 0.3 (early / evening)
/// - otherwise → 0.0 (late night)
///
/// Weekends are deliberately not treated specially; the curve depends on
/// hour of day only.
///
/// # Examples
/// ```
/// use chrono::{NaiveDate, NaiveTime};
/// use chrono_tz::Tz;
/// use meetsync_engine::time::{to_instant, working_hours_score};
///
/// let ten_am_utc = to_instant(
///     NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
///     NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
///     "UTC",
/// )
/// .unwrap();
///
/// assert_eq!(working_hours_score(ten_am_utc, Tz::UTC), 1.0);
/// // 10:00 UTC is 02:00 in Los Angeles
/// assert_eq!(
///     working_hours_score(ten_am_utc, "America/Los_Angeles".parse().unwrap()),
///     0.0
/// );
/// ```
pub fn working_hours_score(instant: DateTime<Utc>, tz: Tz) -> f64 {
    f64::from(working_hours_band(instant, tz)) / 10.0
}

/// The curve in exact tenths. Averaging over a group sums these integer
/// bands and divides once, so the result cannot drift with the order the
/// responses arrive in.
pub(crate) fn working_hours_band(instant: DateTime<Utc>, tz: Tz) -> u32 {
    match instant.with_timezone(&tz).hour() {
        9..=16 => 10,
        7..=8 | 17..=18 => 6,
        6 | 19..=21 => 3,
        _ => 0,
    }
}
