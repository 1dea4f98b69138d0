//! crates/study_desk_core/src/calendar.rs
//!
//! Calendar math used by the month view. Events are stored in append order;
//! grouping them by day happens here, at read time.

use crate::domain::CalendarEvent;
use chrono::{Datelike, Duration, Local, NaiveDate};

/// Every day shown on a month page: whole weeks, Sunday through Saturday,
/// from the week holding the 1st to the week holding the last day.
///
/// Returns `None` for an invalid year/month pair.
pub fn month_grid(year: i32, month: u32) -> Option<Vec<NaiveDate>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let last = next_first.pred_opt()?;

    let start = first - Duration::days(i64::from(first.weekday().num_days_from_sunday()));
    let end = last + Duration::days(i64::from(6 - last.weekday().num_days_from_sunday()));

    Some(start.iter_days().take_while(|day| *day <= end).collect())
}

/// Events falling on `day`, in stored order.
pub fn events_on<'a>(events: &'a [CalendarEvent], day: NaiveDate) -> Vec<&'a CalendarEvent> {
    events.iter().filter(|e| e.date.date() == day).collect()
}

pub fn is_today(day: NaiveDate) -> bool {
    day == Local::now().date_naive()
}
