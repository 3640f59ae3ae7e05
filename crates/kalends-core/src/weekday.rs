//! Monday-first weekday numbering.
//!
//! The month grid is laid out with Monday in column 0 and Sunday in
//! column 6. These helpers convert between that column index and
//! [`chrono::Weekday`], replacing ad-hoc day-number juggling at the
//! grid boundary.

use chrono::Weekday;

use crate::error::CalendarError;

/// Grid column (0 = Monday .. 6 = Sunday) for a weekday.
pub fn column_of(weekday: Weekday) -> u32 {
    weekday.num_days_from_monday()
}

/// Weekday occupying a grid column.
///
/// # Errors
///
/// [`CalendarError::InvalidDayOfWeekIndex`] for indices outside
/// 0..=6; that is a programming error at the call site, surfaced as a
/// typed error so boundary code can assert on it.
pub fn weekday_of_column(index: u32) -> Result<Weekday, CalendarError> {
    match index {
        0 => Ok(Weekday::Mon),
        1 => Ok(Weekday::Tue),
        2 => Ok(Weekday::Wed),
        3 => Ok(Weekday::Thu),
        4 => Ok(Weekday::Fri),
        5 => Ok(Weekday::Sat),
        6 => Ok(Weekday::Sun),
        _ => Err(CalendarError::InvalidDayOfWeekIndex { index }),
    }
}

/// True for the Saturday and Sunday columns.
pub fn is_weekend_column(index: u32) -> bool {
    index % 7 == 5 || index % 7 == 6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_round_trip() {
        for index in 0..7 {
            let weekday = weekday_of_column(index).expect("valid column");
            assert_eq!(column_of(weekday), index);
        }
    }

    #[test]
    fn monday_is_column_zero_sunday_is_six() {
        assert_eq!(column_of(Weekday::Mon), 0);
        assert_eq!(column_of(Weekday::Sun), 6);
    }

    #[test]
    fn out_of_range_column_is_rejected() {
        assert_eq!(
            weekday_of_column(7),
            Err(CalendarError::InvalidDayOfWeekIndex { index: 7 })
        );
    }

    #[test]
    fn weekend_columns() {
        let weekends: Vec<u32> = (0..7).filter(|&i| is_weekend_column(i)).collect();
        assert_eq!(weekends, vec![5, 6]);
        // Positions past the first week reduce modulo 7.
        assert!(is_weekend_column(12));
        assert!(is_weekend_column(41));
        assert!(!is_weekend_column(35));
    }
}
