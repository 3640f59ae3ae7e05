//! Date expressions accepted on the command line.
//!
//! `parse_month_expr` picks the month to display; `parse_event_time`
//! reads event start/end times for `kalends add`.

use anyhow::{Context, anyhow};
use chrono::{DateTime, Datelike, LocalResult, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;

/// Resolves a month expression against today's date.
///
/// Accepted: `today`/`this`, `next`, `prev`/`last`, month names
/// (`march`, `mar` — this year if the month is current or upcoming,
/// else next year), `YYYY-MM`, `YYYYMM`, and a bare 4-digit year
/// (January of that year).
#[tracing::instrument(fields(input = input))]
pub fn parse_month_expr(input: &str, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    let token = input.trim();
    let lower = token.to_ascii_lowercase();

    match lower.as_str() {
        "today" | "this" | "now" => return Ok(today),
        "next" => {
            return today
                .checked_add_months(Months::new(1))
                .ok_or_else(|| anyhow!("cannot step past the supported date range"));
        }
        "prev" | "last" => {
            return today
                .checked_sub_months(Months::new(1))
                .ok_or_else(|| anyhow!("cannot step past the supported date range"));
        }
        _ => {}
    }

    if let Some(month) = parse_month_name(&lower) {
        let year = if month < today.month() {
            today.year() + 1
        } else {
            today.year()
        };
        return first_of(year, month);
    }

    let numeric_re = Regex::new(r"^(?P<year>\d{4})-?(?P<month>\d{2})$")
        .map_err(|e| anyhow!("internal regex compile failure: {e}"))?;
    if let Some(caps) = numeric_re.captures(token) {
        let year: i32 = caps
            .name("year")
            .map(|m| m.as_str())
            .ok_or_else(|| anyhow!("missing year"))?
            .parse()
            .context("invalid year")?;
        let month: u32 = caps
            .name("month")
            .map(|m| m.as_str())
            .ok_or_else(|| anyhow!("missing month"))?
            .parse()
            .context("invalid month")?;
        return first_of(year, month);
    }

    if token.len() == 4 && token.chars().all(|c| c.is_ascii_digit()) {
        let year: i32 = token.parse().context("invalid 4-digit year")?;
        return first_of(year, 1);
    }

    Err(anyhow!("unrecognized month expression: {input}")).with_context(|| {
        "supported forms: today/this, next, prev/last, month names \
         (e.g. march), YYYY-MM, YYYYMM, 4-digit year"
    })
}

/// Parses an event time into epoch seconds in the working timezone.
///
/// Accepted: raw epoch seconds, RFC3339, `YYYY-MM-DDTHH:MM`,
/// `YYYY-MM-DD HH:MM`, and `YYYY-MM-DD` (local midnight).
pub fn parse_event_time(input: &str, tz: Tz) -> anyhow::Result<i64> {
    let token = input.trim();

    if let Ok(ts) = token.parse::<i64>() {
        return Ok(ts);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(token) {
        return Ok(dt.with_timezone(&Utc).timestamp());
    }

    for fmt in ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(token, fmt) {
            return Ok(to_utc_in_zone(ndt, tz, fmt)?.timestamp());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(token, "%Y-%m-%d") {
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| anyhow!("failed to construct midnight for date"))?;
        return Ok(to_utc_in_zone(midnight, tz, "date")?.timestamp());
    }

    Err(anyhow!("unrecognized event time: {input}")).with_context(|| {
        "supported forms: epoch seconds, RFC3339, YYYY-MM-DDTHH:MM, \
         YYYY-MM-DD HH:MM, YYYY-MM-DD"
    })
}

fn to_utc_in_zone(local: NaiveDateTime, tz: Tz, context: &str) -> anyhow::Result<DateTime<Utc>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(first, second) => {
            tracing::warn!(
                context,
                first = %first,
                second = %second,
                "ambiguous local datetime; using earliest"
            );
            Ok(first.min(second).with_timezone(&Utc))
        }
        LocalResult::None => Err(anyhow!(
            "local datetime does not exist in the working timezone: {context}"
        )),
    }
}

fn first_of(year: i32, month: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| anyhow!("invalid year/month: {year:04}-{month:02}"))
}

fn parse_month_name(token: &str) -> Option<u32> {
    match token.trim() {
        "january" | "jan" => Some(1),
        "february" | "feb" => Some(2),
        "march" | "mar" => Some(3),
        "april" | "apr" => Some(4),
        "may" => Some(5),
        "june" | "jun" => Some(6),
        "july" | "jul" => Some(7),
        "august" | "aug" => Some(8),
        "september" | "sep" | "sept" => Some(9),
        "october" | "oct" => Some(10),
        "november" | "nov" => Some(11),
        "december" | "dec" => Some(12),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, 24).expect("valid date")
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn keywords() {
        assert_eq!(parse_month_expr("today", today()).expect("parse"), today());
        assert_eq!(
            parse_month_expr("next", today()).expect("parse"),
            date(2024, 9, 24)
        );
        assert_eq!(
            parse_month_expr("prev", today()).expect("parse"),
            date(2024, 7, 24)
        );
    }

    #[test]
    fn month_step_clamps_the_day() {
        let end_of_month = date(2024, 8, 31);
        assert_eq!(
            parse_month_expr("next", end_of_month).expect("parse"),
            date(2024, 9, 30)
        );
    }

    #[test]
    fn month_names_resolve_nearest_forward() {
        // March has passed in August, so it means next year.
        assert_eq!(
            parse_month_expr("march", today()).expect("parse"),
            date(2025, 3, 1)
        );
        // August itself and later months stay in the current year.
        assert_eq!(
            parse_month_expr("aug", today()).expect("parse"),
            date(2024, 8, 1)
        );
        assert_eq!(
            parse_month_expr("December", today()).expect("parse"),
            date(2024, 12, 1)
        );
    }

    #[test]
    fn numeric_forms() {
        assert_eq!(
            parse_month_expr("2024-03", today()).expect("parse"),
            date(2024, 3, 1)
        );
        assert_eq!(
            parse_month_expr("202403", today()).expect("parse"),
            date(2024, 3, 1)
        );
        assert_eq!(
            parse_month_expr("2026", today()).expect("parse"),
            date(2026, 1, 1)
        );
    }

    #[test]
    fn rejects_nonsense() {
        assert!(parse_month_expr("2024-13", today()).is_err());
        assert!(parse_month_expr("someday", today()).is_err());
        assert!(parse_month_expr("20240", today()).is_err());
    }

    #[test]
    fn event_times() {
        assert_eq!(
            parse_event_time("1709596800", chrono_tz::UTC).expect("parse"),
            1_709_596_800
        );
        assert_eq!(
            parse_event_time("2024-03-05", chrono_tz::UTC).expect("parse"),
            1_709_596_800
        );
        assert_eq!(
            parse_event_time("2024-03-05 08:00", chrono_tz::UTC).expect("parse"),
            1_709_625_600
        );
        assert_eq!(
            parse_event_time("2024-03-05T00:00:00Z", chrono_tz::UTC).expect("parse"),
            1_709_596_800
        );
        assert!(parse_event_time("sometime", chrono_tz::UTC).is_err());
    }
}
