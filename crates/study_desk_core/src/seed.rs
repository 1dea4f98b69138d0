//! crates/study_desk_core/src/seed.rs
//!
//! The fixed data set used when nothing usable is stored for a collection.

use crate::domain::{CalendarEvent, EventType, FileCategory, Role, StudyFile, User};
use chrono::{Duration, Local, NaiveDateTime, Timelike, Utc};
use uuid::Uuid;

/// Username of the distinguished admin account. It can never be deleted.
pub const PROTECTED_USERNAME: &str = "admin";

pub fn users() -> Vec<User> {
    vec![
        User {
            id: Uuid::from_u128(1),
            username: PROTECTED_USERNAME.to_string(),
            password: "0933".to_string(),
            role: Role::Admin,
            full_name: "System Administrator".to_string(),
        },
        User {
            id: Uuid::from_u128(2),
            username: "student1".to_string(),
            password: "password".to_string(),
            role: Role::Student,
            full_name: "Jane Doe".to_string(),
        },
    ]
}

pub fn files() -> Vec<StudyFile> {
    let now = Utc::now();
    vec![
        StudyFile {
            id: Uuid::from_u128(101),
            name: "Calculus_Syllabus.pdf".to_string(),
            category: FileCategory::Reference,
            upload_date: now,
            size: "245 KB".to_string(),
            url: "#".to_string(),
            mime_type: "application/pdf".to_string(),
        },
        StudyFile {
            id: Uuid::from_u128(102),
            name: "Physics_Lab_Report_1.docx".to_string(),
            category: FileCategory::Assignment,
            upload_date: now - Duration::days(1),
            size: "1.2 MB".to_string(),
            url: "#".to_string(),
            mime_type:
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
                    .to_string(),
        },
    ]
}

pub fn events() -> Vec<CalendarEvent> {
    let now = local_now();
    vec![
        CalendarEvent {
            id: Uuid::from_u128(201),
            title: "Linear Algebra Exam".to_string(),
            date: now + Duration::days(2),
            event_type: EventType::Exam,
            description: Some("Final exam for Math 202".to_string()),
            completed: false,
        },
        CalendarEvent {
            id: Uuid::from_u128(202),
            title: "Computer Science 101".to_string(),
            date: now,
            event_type: EventType::Class,
            description: Some("Lecture Hall B".to_string()),
            completed: false,
        },
    ]
}

/// Current local wall-clock time, truncated to whole seconds so it survives
/// the stored date format unchanged.
fn local_now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}
