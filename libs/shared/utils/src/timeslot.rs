use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Timelike, Utc, Weekday};
use regex::Regex;

/// Same-day bookings must start at least this many minutes in the future.
pub const BOOKING_BUFFER_MINUTES: i64 = 30;

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());
static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}:\d{2}$").unwrap());

/// Parse a `YYYY-MM-DD` calendar date, rejecting anything else.
pub fn parse_date_param(raw: &str) -> Result<NaiveDate, String> {
    if !DATE_RE.is_match(raw) {
        return Err(format!("Invalid date '{}', expected YYYY-MM-DD", raw));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| format!("Invalid date '{}'", raw))
}

/// Parse an `HH:MM` time of day, rejecting anything else.
pub fn parse_time_param(raw: &str) -> Result<NaiveTime, String> {
    if !TIME_RE.is_match(raw) {
        return Err(format!("Invalid time '{}', expected HH:MM", raw));
    }
    NaiveTime::parse_from_str(raw, "%H:%M").map_err(|_| format!("Invalid time '{}'", raw))
}

/// Weekday index with 0 = Sunday .. 6 = Saturday, derived from the civil
/// date alone. The same convention decides which weekday's rule applies
/// and whether a query date is "today".
pub fn weekday_index(date: NaiveDate) -> i32 {
    match date.weekday() {
        Weekday::Sun => 0,
        Weekday::Mon => 1,
        Weekday::Tue => 2,
        Weekday::Wed => 3,
        Weekday::Thu => 4,
        Weekday::Fri => 5,
        Weekday::Sat => 6,
    }
}

fn minute_of_day(t: NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}

/// Step from `start` towards `end` in `slot_minutes` increments. A slot is
/// generated whenever its START is before `end`; whether it would finish
/// inside the window is deliberately not checked.
pub fn expand_window(start: NaiveTime, end: NaiveTime, slot_minutes: u32) -> Vec<NaiveTime> {
    let mut slots = Vec::new();
    if slot_minutes == 0 {
        return slots;
    }

    let end_min = minute_of_day(end);
    let mut cur = minute_of_day(start);
    while cur < end_min {
        slots.push(NaiveTime::from_hms_opt(cur / 60, cur % 60, 0).unwrap());
        cur += slot_minutes;
    }
    slots
}

/// True when a slot on `date` starts inside the look-ahead buffer relative
/// to `now`. Slots landing exactly on the cutoff are still bookable.
pub fn starts_too_soon(date: NaiveDate, slot: NaiveTime, now: DateTime<Utc>) -> bool {
    let cutoff = now + Duration::minutes(BOOKING_BUFFER_MINUTES);
    date.and_time(slot).and_utc() < cutoff
}

/// Render a slot as the wire format `HH:MM`.
pub fn format_slot(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}
