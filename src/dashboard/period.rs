use std::fmt::Display;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use clap::ValueEnum;

use crate::utils::time::{add_months, month_end, month_start};

/// The time window used to filter and bucket data for display.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ViewType {
    Week,
    Month,
    Year,
    All,
}

impl Display for ViewType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewType::Week => write!(f, "week"),
            ViewType::Month => write!(f, "month"),
            ViewType::Year => write!(f, "year"),
            ViewType::All => write!(f, "all"),
        }
    }
}

/// Inclusive day-precision window a dashboard view queries and renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodRange {
    pub view: ViewType,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PeriodRange {
    pub fn label(&self) -> String {
        match self.view {
            ViewType::Week => format!(
                "{} - {}",
                self.start.format("%b %-d"),
                self.end.format("%b %-d, %Y")
            ),
            ViewType::Month => self.start.format("%B %Y").to_string(),
            ViewType::Year => self.start.format("%Y").to_string(),
            ViewType::All => "All Time".to_string(),
        }
    }
}

/// Computes the window containing `reference`. Weeks are Monday-anchored;
/// the all-time view runs from the earliest representable date to `today`.
pub fn resolve_period(view: ViewType, reference: NaiveDate, today: NaiveDate) -> PeriodRange {
    let (start, end) = match view {
        ViewType::Week => {
            let week = reference.week(Weekday::Mon);
            (week.first_day(), week.last_day())
        }
        ViewType::Month => (month_start(reference), month_end(reference)),
        ViewType::Year => (
            NaiveDate::from_ymd_opt(reference.year(), 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(reference.year(), 12, 31).unwrap(),
        ),
        ViewType::All => (NaiveDate::MIN, today),
    };
    PeriodRange { view, start, end }
}

/// Moves the reference date by `delta` units of the view granularity.
/// The all-time view has no navigation.
pub fn step_reference(view: ViewType, reference: NaiveDate, delta: i32) -> NaiveDate {
    match view {
        ViewType::Week => reference + Duration::weeks(delta as i64),
        ViewType::Month => add_months(reference, delta),
        ViewType::Year => add_months(reference, delta.saturating_mul(12)),
        ViewType::All => reference,
    }
}
