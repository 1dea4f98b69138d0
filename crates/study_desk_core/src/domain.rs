//! crates/study_desk_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any storage or serialization format.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Returned when a stored or typed-in label does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

//=========================================================================================
// Users
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Student => "student",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "student" => Ok(Role::Student),
            other => Err(UnknownVariant::new("role", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An account in the local user table. Passwords are kept as plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password: String,
    pub role: Role,
    pub full_name: String,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Input for creating a user; the id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub full_name: String,
}

//=========================================================================================
// Files
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FileCategory {
    #[default]
    Assignment,
    LectureNotes,
    Reference,
    ExamPaper,
}

impl FileCategory {
    pub const ALL: [FileCategory; 4] = [
        FileCategory::Assignment,
        FileCategory::LectureNotes,
        FileCategory::Reference,
        FileCategory::ExamPaper,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Assignment => "Assignment",
            FileCategory::LectureNotes => "Lecture Notes",
            FileCategory::Reference => "Reference",
            FileCategory::ExamPaper => "Exam Paper",
        }
    }
}

impl FromStr for FileCategory {
    type Err = UnknownVariant;

    /// Accepts the display label, ignoring case and treating `-`/`_` as spaces,
    /// so `lecture-notes` works as well as `Lecture Notes`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace(['-', '_'], " ").to_lowercase();
        FileCategory::ALL
            .into_iter()
            .find(|c| c.as_str().to_lowercase() == normalized)
            .ok_or_else(|| UnknownVariant::new("file category", s))
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file uploaded by the user. `url` is an opaque blob reference that is only
/// valid for the lifetime of the process that created it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyFile {
    pub id: Uuid,
    pub name: String,
    pub category: FileCategory,
    pub upload_date: DateTime<Utc>,
    pub size: String,
    pub url: String,
    pub mime_type: String,
}

/// Narrows a file listing the way the dashboard search box and category chips do.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    pub search: Option<String>,
    pub category: Option<FileCategory>,
}

impl FileFilter {
    pub fn matches(&self, file: &StudyFile) -> bool {
        let matches_search = match &self.search {
            Some(term) => file.name.to_lowercase().contains(&term.to_lowercase()),
            None => true,
        };
        let matches_category = self.category.map_or(true, |c| c == file.category);
        matches_search && matches_category
    }
}

//=========================================================================================
// Calendar
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Class,
    Exam,
    Study,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Class => "class",
            EventType::Exam => "exam",
            EventType::Study => "study",
        }
    }
}

impl FromStr for EventType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "class" => Ok(EventType::Class),
            "exam" => Ok(EventType::Exam),
            "study" => Ok(EventType::Study),
            other => Err(UnknownVariant::new("event type", other)),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A calendar entry. `date` is local wall-clock time with no zone attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub id: Uuid,
    pub title: String,
    pub date: NaiveDateTime,
    pub event_type: EventType,
    pub description: Option<String>,
    pub completed: bool,
}

/// Input for creating an event; id and completion are set by the store.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub date: NaiveDateTime,
    pub event_type: EventType,
    pub description: Option<String>,
}

//=========================================================================================
// Session
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum View {
    #[default]
    Login,
    Dashboard,
    Calendar,
    Admin,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            View::Login => "login",
            View::Dashboard => "dashboard",
            View::Calendar => "calendar",
            View::Admin => "admin",
        }
    }
}

impl FromStr for View {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(View::Login),
            "dashboard" => Ok(View::Dashboard),
            "calendar" => Ok(View::Calendar),
            "admin" => Ok(View::Admin),
            other => Err(UnknownVariant::new("view", other)),
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who is logged in and which screen they are on.
/// `current_user_id` is a lookup key into the user collection, not ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Session {
    pub current_user_id: Option<Uuid>,
    pub current_view: View,
}

impl Session {
    pub fn logged_out() -> Self {
        Self::default()
    }

    pub fn is_logged_in(&self) -> bool {
        self.current_user_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_loose_labels() {
        assert_eq!("lecture-notes".parse::<FileCategory>(), Ok(FileCategory::LectureNotes));
        assert_eq!("Exam Paper".parse::<FileCategory>(), Ok(FileCategory::ExamPaper));
        assert_eq!("exam_paper".parse::<FileCategory>(), Ok(FileCategory::ExamPaper));
        assert!("syllabus".parse::<FileCategory>().is_err());
    }

    #[test]
    fn filter_combines_search_and_category() {
        let file = StudyFile {
            id: Uuid::new_v4(),
            name: "Calculus_Syllabus.pdf".to_string(),
            category: FileCategory::Reference,
            upload_date: Utc::now(),
            size: "245 KB".to_string(),
            url: "#".to_string(),
            mime_type: "application/pdf".to_string(),
        };

        let by_name = FileFilter {
            search: Some("calculus".to_string()),
            category: None,
        };
        assert!(by_name.matches(&file));

        let wrong_category = FileFilter {
            search: Some("calculus".to_string()),
            category: Some(FileCategory::Assignment),
        };
        assert!(!wrong_category.matches(&file));

        assert!(FileFilter::default().matches(&file));
    }
}
