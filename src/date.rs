//! Date-key helpers pinned to UTC+9.
//!
//! Every calendar computation in the crate goes through this module so that
//! host-local dates never leak into stored date keys. A date key is the
//! canonical `YYYY-MM-DD` string for one calendar day in UTC+9.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, SecondsFormat, Utc};

const OFFSET_SECS: i32 = 9 * 3600;

fn offset() -> FixedOffset {
    FixedOffset::east_opt(OFFSET_SECS).expect("UTC+9 is a valid offset")
}

/// Strict structural check: exactly `YYYY-MM-DD`, digits zero-padded.
///
/// chrono's `%m`/`%d` accept unpadded fields, which would let keys like
/// `2024-5-1` slip into storage and break prefix-based month matching.
fn parse_key(key: &str) -> Option<NaiveDate> {
    let bytes = key.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    for (i, b) in bytes.iter().enumerate() {
        if i != 4 && i != 7 && !b.is_ascii_digit() {
            return None;
        }
    }
    NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()
}

fn key_for(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Today's date key, independent of the host timezone.
#[must_use]
pub fn today() -> String {
    to_date_key(Utc::now())
}

/// Date key for an arbitrary instant.
#[must_use]
pub fn to_date_key(instant: DateTime<Utc>) -> String {
    key_for(instant.with_timezone(&offset()).date_naive())
}

/// Midnight of the given date key, as an instant at UTC+9.
///
/// `None` for malformed keys; validate with [`is_valid`] first when the
/// input comes from outside the crate.
#[must_use]
pub fn parse(key: &str) -> Option<DateTime<FixedOffset>> {
    parse_key(key)?
        .and_hms_opt(0, 0, 0)?
        .and_local_timezone(offset())
        .single()
}

/// True iff `key` is structurally `YYYY-MM-DD` and a real calendar date.
#[must_use]
pub fn is_valid(key: &str) -> bool {
    parse_key(key).is_some()
}

/// First and last date key of a month, leap years included.
#[must_use]
pub fn month_range(year: i32, month: u32) -> Option<(String, String)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let last = next_first.pred_opt()?;
    Some((key_for(first), key_for(last)))
}

/// Sunday-to-Saturday date keys bounding the week containing `key`.
#[must_use]
pub fn week_range(key: &str) -> Option<(String, String)> {
    let date = parse_key(key)?;
    let back = i64::from(date.weekday().num_days_from_sunday());
    let start = date - Duration::days(back);
    let end = start + Duration::days(6);
    Some((key_for(start), key_for(end)))
}

/// Display form `YYYY年M月D日`, month and day without leading zeros.
///
/// Malformed keys are returned unchanged.
#[must_use]
pub fn format_display(key: &str) -> String {
    match parse_key(key) {
        Some(date) => format!("{}年{}月{}日", date.year(), date.month(), date.day()),
        None => key.to_string(),
    }
}

/// Absolute day count between two date keys, order-independent.
#[must_use]
pub fn days_between(a: &str, b: &str) -> Option<i64> {
    let a = parse_key(a)?;
    let b = parse_key(b)?;
    Some((a - b).num_days().abs())
}

/// Current instant at UTC+9 as an RFC 3339 string, for record stamping.
///
/// A single offset keeps timestamps lexicographically comparable.
#[must_use]
pub fn now_timestamp() -> String {
    Utc::now()
        .with_timezone(&offset())
        .to_rfc3339_opts(SecondsFormat::Millis, false)
}
