//! Typed errors for the calendar core.

/// Errors produced by day-code parsing, weekday conversion and the
/// event bucketing pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    /// The input is not exactly 8 ASCII digits.
    #[error("malformed day code: {input:?} (expected 8 digits, YYYYMMDD)")]
    BadDayCode {
        /// The rejected input text.
        input: String,
    },

    /// The input is 8 digits but does not name a real calendar date,
    /// e.g. `20240230`.
    #[error("day code {input:?} is not a valid calendar date")]
    BadCalendarDate {
        /// The rejected input text.
        input: String,
    },

    /// A Monday-first grid column index outside 0..=6. This is a
    /// caller contract violation, not a runtime condition.
    #[error("invalid day-of-week index: {index} (must be 0..=6, Monday first)")]
    InvalidDayOfWeekIndex {
        /// The out-of-range index.
        index: u32,
    },

    /// An event range too long to bucket day-by-day. Reported via
    /// logging and recovered by capping; never propagated.
    #[error("event spans {days} days ({start_code}..{end_code}); capping at {max} days")]
    EventSpan {
        /// Day code of the event start.
        start_code: String,
        /// Day code of the event end.
        end_code: String,
        /// The uncapped span length in days.
        days: i64,
        /// The applied cap.
        max: i64,
    },
}
