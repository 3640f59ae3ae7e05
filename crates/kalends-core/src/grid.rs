//! Monthly grid construction.
//!
//! A month view is a fixed 6x7 grid of 42 cells: the trailing days of
//! the previous month, every day of the target month, then leading
//! days of the following month. [`build_skeleton`] computes the bare
//! grid; [`attach_events`] overlays events onto it by day code.

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate};
use chrono_tz::Tz;
use tracing::warn;

use crate::daycode::{DayCode, date_from_epoch_seconds, local_midnight_ts};
use crate::error::CalendarError;
use crate::event::Event;
use crate::weekday;

pub const ROW_COUNT: usize = 6;
pub const COLUMN_COUNT: usize = 7;
pub const DAYS_CNT: usize = ROW_COUNT * COLUMN_COUNT;

/// Days fetched before the target date when querying events.
pub const FETCH_LEAD_DAYS: i64 = 7;
/// Days fetched after the target date when querying events.
pub const FETCH_TRAIL_DAYS: i64 = 43;

/// Longest event span the bucketing pass will walk day-by-day.
/// Anything longer is treated as corrupt data and capped.
pub const MAX_EVENT_SPAN_DAYS: i64 = 731;

/// One cell of the month grid. Immutable once built; attaching events
/// produces new cells rather than mutating existing ones.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthDay {
    /// Day-of-month label shown in the cell, 1..=31.
    pub value: u32,
    /// True only for cells of the requested month.
    pub is_this_month: bool,
    /// True when this cell's date equals the `now` the grid was built
    /// against.
    pub is_today: bool,
    /// Canonical `YYYYMMDD` key, the join point for events.
    pub code: DayCode,
    /// ISO week-of-year containing this date.
    pub week_of_year: u32,
    /// Events falling on this day, in the order they were supplied.
    pub events: Vec<Event>,
    /// Fixed index into the 6x7 grid, 0..=41.
    pub index_on_month_view: usize,
    /// Derived from the grid column alone: Saturday and Sunday
    /// columns under the Monday-first layout.
    pub is_weekend: bool,
}

/// Builds the 42-cell skeleton for the month containing `target`.
///
/// `now` is the date used for today-detection; callers capture it
/// once per build so repeated builds are deterministic. Cells carry
/// empty event lists.
pub fn build_skeleton(target: NaiveDate, now: NaiveDate) -> Vec<MonthDay> {
    let today_code = DayCode::from_date(now);
    let first_of_month = first_day_of_month(target);
    let lead_offset = weekday::column_of(first_of_month.weekday()) as usize;

    let curr_month_days = days_in_month(target.year(), target.month());
    let (prev_year, prev_month) = month_before(target.year(), target.month());
    let (next_year, next_month) = month_after(target.year(), target.month());
    let prev_month_days = days_in_month(prev_year, prev_month);

    let mut days = Vec::with_capacity(DAYS_CNT);
    let mut value = prev_month_days - lead_offset as u32 + 1;
    let mut is_this_month = false;
    let mut year = prev_year;
    let mut month = prev_month;

    for i in 0..DAYS_CNT {
        if i < lead_offset {
            is_this_month = false;
            year = prev_year;
            month = prev_month;
        } else if i == lead_offset {
            value = 1;
            is_this_month = true;
            year = target.year();
            month = target.month();
        } else if value == curr_month_days + 1 {
            // Transition into the following month. The counter resets
            // here once and then only increments; with at most 14
            // trailing cells it cannot outrun any month.
            value = 1;
            is_this_month = false;
            year = next_year;
            month = next_month;
        }

        let is_today = is_today_clamped(year, month, value, &today_code);
        let date = NaiveDate::from_ymd_opt(year, month, value)
            .expect("grid day numbers stay within their month");

        days.push(MonthDay {
            value,
            is_this_month,
            is_today,
            code: DayCode::from_date(date),
            week_of_year: date.iso_week().week(),
            events: Vec::new(),
            index_on_month_view: i,
            is_weekend: weekday::is_weekend_column((i % COLUMN_COUNT) as u32),
        });
        value += 1;
    }

    days
}

/// Overlays `events` onto a skeleton, returning a new sequence.
///
/// Every event is appended to the bucket of every day code from its
/// start day to its end day inclusive, so a three-day event shows up
/// in three cells. Bucket order is the supply order of `events`.
/// Malformed ranges never escape: an event ending before it starts
/// becomes a single-day event, and spans beyond
/// [`MAX_EVENT_SPAN_DAYS`] are capped, both with a warning.
pub fn attach_events(days: &[MonthDay], events: &[Event], tz: Tz) -> Vec<MonthDay> {
    let mut buckets: HashMap<DayCode, Vec<Event>> = HashMap::new();

    for event in events {
        let start = date_from_epoch_seconds(event.start_ts, tz).date_naive();
        let mut end = date_from_epoch_seconds(event.end_ts, tz).date_naive();

        if end < start {
            warn!(
                title = %event.title,
                start_ts = event.start_ts,
                end_ts = event.end_ts,
                "event ends before it starts; bucketing start day only"
            );
            end = start;
        }

        let span = (end - start).num_days();
        if span > MAX_EVENT_SPAN_DAYS {
            let cap = CalendarError::EventSpan {
                start_code: DayCode::from_date(start).to_string(),
                end_code: DayCode::from_date(end).to_string(),
                days: span,
                max: MAX_EVENT_SPAN_DAYS,
            };
            warn!(title = %event.title, error = %cap, "capping event span");
            end = start + Duration::days(MAX_EVENT_SPAN_DAYS);
        }

        let mut current = start;
        loop {
            buckets
                .entry(DayCode::from_date(current))
                .or_default()
                .push(event.clone());
            if current == end {
                break;
            }
            current = current
                .succ_opt()
                .expect("capped event walk stays in range");
        }
    }

    days.iter()
        .map(|day| {
            let events = buckets.get(&day.code).cloned().unwrap_or_default();
            MonthDay {
                events,
                ..day.clone()
            }
        })
        .collect()
}

/// Human-readable month label: the month name, with the year appended
/// only when it differs from the current year.
pub fn month_label(target: NaiveDate, now: NaiveDate) -> String {
    let month = target.format("%B").to_string();
    if target.year() == now.year() {
        month
    } else {
        format!("{month} {}", target.year())
    }
}

/// Epoch-second window to fetch events for: 7 days before to 43 days
/// after the target date, at local midnight in the working timezone.
/// Wide enough to cover every lead and trail cell of the grid.
pub fn fetch_range(target: NaiveDate, tz: Tz) -> (i64, i64) {
    let start = local_midnight_ts(target - Duration::days(FETCH_LEAD_DAYS), tz);
    let end = local_midnight_ts(target + Duration::days(FETCH_TRAIL_DAYS), tz);
    (start, end)
}

fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).expect("day 1 exists in every month")
}

pub(crate) fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1).expect("month is 1..=12");
    let (next_year, next_month) = month_after(year, month);
    let next_first = NaiveDate::from_ymd_opt(next_year, next_month, 1).expect("month is 1..=12");
    (next_first - first).num_days() as u32
}

fn month_before(year: i32, month: u32) -> (i32, u32) {
    if month == 1 { (year - 1, 12) } else { (year, month - 1) }
}

fn month_after(year: i32, month: u32) -> (i32, u32) {
    if month == 12 { (year + 1, 1) } else { (year, month + 1) }
}

/// Today-comparison with a clamp: a day number past the end of the
/// month being checked is pulled back to that month's last day before
/// comparing, so boundary cells always compare against a real date.
fn is_today_clamped(year: i32, month: u32, value: u32, today_code: &DayCode) -> bool {
    let max_day = days_in_month(year, month);
    let day = value.min(max_day);
    let date = NaiveDate::from_ymd_opt(year, month, day).expect("clamped day is valid");
    DayCode::from_date(date) == *today_code
}
