use chrono::{Datelike, Duration, Months, NaiveDate};

pub fn month_start(date: NaiveDate) -> NaiveDate {
    // day 1 exists in every month
    date.with_day(1).unwrap()
}

pub fn month_end(date: NaiveDate) -> NaiveDate {
    add_months(month_start(date), 1) - Duration::days(1)
}

/// Shifts a date by whole months, clamping the day when the target month is
/// shorter (Jan 31 + 1 month = Feb 28/29).
pub fn add_months(date: NaiveDate, delta: i32) -> NaiveDate {
    if delta >= 0 {
        date + Months::new(delta as u32)
    } else {
        date - Months::new(delta.unsigned_abs())
    }
}
