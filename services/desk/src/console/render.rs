//! services/desk/src/console/render.rs
//!
//! Plain-text rendering of store snapshots.

use chrono::{Datelike, NaiveDate};
use study_desk_core::calendar;
use study_desk_core::{CalendarEvent, Session, StudyFile, User};

pub fn session_line(session: &Session, user: Option<&User>) -> String {
    match user {
        Some(user) => format!(
            "{} ({}, {}) on {}",
            user.full_name, user.username, user.role, session.current_view
        ),
        None => "not logged in".to_string(),
    }
}

pub fn files(files: &[StudyFile]) -> String {
    if files.is_empty() {
        return "no files".to_string();
    }
    files
        .iter()
        .map(|f| {
            format!(
                "{}  {:<32} {:<14} {:>9}  {}",
                f.id,
                f.name,
                f.category.as_str(),
                f.size,
                f.upload_date.format("%Y-%m-%d %H:%M")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn events(events: &[CalendarEvent]) -> String {
    if events.is_empty() {
        return "no events".to_string();
    }
    events.iter().map(event).collect::<Vec<_>>().join("\n")
}

pub fn event(e: &CalendarEvent) -> String {
    let mut line = format!(
        "{}  [{}] {} {:<5} {}",
        e.id,
        if e.completed { "x" } else { " " },
        e.date.format("%Y-%m-%d %H:%M"),
        e.event_type.as_str(),
        e.title
    );
    if let Some(description) = &e.description {
        line.push_str(" - ");
        line.push_str(description);
    }
    line
}

pub fn users(users: &[User]) -> String {
    users
        .iter()
        .map(|u| format!("{}  {:<16} {:<8} {}", u.id, u.username, u.role.as_str(), u.full_name))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A month page: one row per week, Sunday first. Days outside the month are
/// dimmed with dots, days with events carry a `*`, and today is bracketed.
pub fn month(year: i32, month: u32, events: &[CalendarEvent]) -> Option<String> {
    let grid = calendar::month_grid(year, month)?;
    let title = NaiveDate::from_ymd_opt(year, month, 1)?.format("%B %Y").to_string();

    let mut out = format!("{:^35}\n Sun  Mon  Tue  Wed  Thu  Fri  Sat", title);
    for week in grid.chunks(7) {
        out.push('\n');
        for day in week {
            let label = if day.month() == month {
                format!("{:>2}", day.day())
            } else {
                " .".to_string()
            };
            let marker = if calendar::events_on(events, *day).is_empty() { ' ' } else { '*' };
            let cell = if calendar::is_today(*day) {
                format!("[{}]{}", label, marker)
            } else {
                format!(" {} {}", label, marker)
            };
            out.push_str(&cell);
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_desk_core::EventType;
    use uuid::Uuid;

    #[test]
    fn month_page_marks_event_days() {
        let event = CalendarEvent {
            id: Uuid::new_v4(),
            title: "Exam".to_string(),
            date: NaiveDate::from_ymd_opt(2099, 3, 4)
                .and_then(|d| d.and_hms_opt(9, 0, 0))
                .unwrap(),
            event_type: EventType::Exam,
            description: None,
            completed: false,
        };
        let page = month(2099, 3, &[event]).unwrap();
        let lines: Vec<&str> = page.lines().collect();

        assert!(lines[0].contains("March 2099"));
        // March 2099 starts on a Sunday, so the 4th is the fourth cell of the first week.
        assert!(lines[2].contains(" 4 *"));
        assert!(lines[2].contains(" 1  "));
        assert!(month(2099, 0, &[]).is_none());
    }

    #[test]
    fn completed_events_are_checked() {
        let mut e = CalendarEvent {
            id: Uuid::nil(),
            title: "Read".to_string(),
            date: NaiveDate::from_ymd_opt(2099, 1, 1)
                .and_then(|d| d.and_hms_opt(8, 0, 0))
                .unwrap(),
            event_type: EventType::Study,
            description: Some("chapter 4".to_string()),
            completed: true,
        };
        assert!(event(&e).contains("[x] 2099-01-01 08:00 study Read - chapter 4"));
        e.completed = false;
        assert!(event(&e).contains("[ ] "));
    }
}
