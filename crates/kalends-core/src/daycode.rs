//! Canonical day codes.
//!
//! A day code is the zero-padded `YYYYMMDD` string that identifies a
//! calendar date everywhere in the crate: grid cells carry one, and
//! the event bucketing pass joins events to cells through it.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::CalendarError;

pub const DAYCODE_PATTERN: &str = "%Y%m%d";

/// An 8-digit `YYYYMMDD` key for a calendar date.
///
/// Only constructible from a [`NaiveDate`] or by validated parsing,
/// so a held `DayCode` always names a real date.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayCode(String);

impl DayCode {
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format(DAYCODE_PATTERN).to_string())
    }

    /// Parses an 8-digit day code.
    ///
    /// # Errors
    ///
    /// [`CalendarError::BadDayCode`] if the input is not exactly 8
    /// ASCII digits, [`CalendarError::BadCalendarDate`] if the digits
    /// do not form a valid proleptic-Gregorian date.
    pub fn parse(input: &str) -> Result<Self, CalendarError> {
        if input.len() != 8 || !input.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CalendarError::BadDayCode {
                input: input.to_string(),
            });
        }
        NaiveDate::parse_from_str(input, DAYCODE_PATTERN).map_err(|_| {
            CalendarError::BadCalendarDate {
                input: input.to_string(),
            }
        })?;
        Ok(Self(input.to_string()))
    }

    /// The date this code names. Exact left inverse of [`from_date`]:
    /// `DayCode::from_date(d).to_date() == d` for every date with a
    /// four-digit year.
    ///
    /// [`from_date`]: DayCode::from_date
    pub fn to_date(&self) -> NaiveDate {
        NaiveDate::parse_from_str(&self.0, DAYCODE_PATTERN)
            .expect("day codes are validated on construction")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DayCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Four-digit year code for a date.
pub fn year_code(date: NaiveDate) -> String {
    format!("{:04}", date.year())
}

/// Converts a UTC epoch-seconds timestamp to a date-time in the
/// working timezone. Timestamps outside chrono's representable range
/// collapse to the Unix epoch.
pub fn date_from_epoch_seconds(ts: i64, tz: Tz) -> DateTime<Tz> {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .unwrap_or_default()
        .with_timezone(&tz)
}

/// The day code a timestamp falls on in the working timezone.
pub fn day_code_from_epoch_seconds(ts: i64, tz: Tz) -> DayCode {
    DayCode::from_date(date_from_epoch_seconds(ts, tz).date_naive())
}

/// Epoch seconds for local midnight of `date` in `tz`.
///
/// Ambiguous wall times (fall-back) resolve to the earliest instant;
/// nonexistent ones (spring-forward across midnight) slide to the
/// first valid hour.
pub fn local_midnight_ts(date: NaiveDate, tz: Tz) -> i64 {
    let naive = date
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid wall-clock time");
    match tz.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => dt.timestamp(),
        chrono::LocalResult::Ambiguous(first, second) => first.min(second).timestamp(),
        chrono::LocalResult::None => {
            // Midnight was skipped by a DST transition; walk forward.
            for hour in 1..=3 {
                let candidate = naive + chrono::Duration::hours(hour);
                if let chrono::LocalResult::Single(dt) = tz.from_local_datetime(&candidate) {
                    return dt.timestamp();
                }
            }
            Utc.from_utc_datetime(&naive).timestamp()
        }
    }
}
