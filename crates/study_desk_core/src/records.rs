//! crates/study_desk_core/src/records.rs
//!
//! "Impure" persisted record structs and the codec between them and the domain.
//!
//! Dates are never handed to serde as native values: they are written as strings
//! and explicitly revived on load. Every record of a collection goes through
//! revival, and a single bad record fails the whole collection.

use crate::domain::{CalendarEvent, StudyFile, UnknownVariant, User};
use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Wall-clock format used for event dates.
pub const EVENT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Why a stored value could not be turned back into domain data.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("field '{field}' holds an unreadable date '{value}'")]
    InvalidDate { field: &'static str, value: String },
    #[error(transparent)]
    UnknownVariant(#[from] UnknownVariant),
    #[error("id {0} appears more than once")]
    DuplicateId(Uuid),
}

/// Maps one domain entity to its stored shape and back.
pub trait Record: Serialize + DeserializeOwned {
    type Domain;

    fn from_domain(item: &Self::Domain) -> Self;
    fn into_domain(self) -> Result<Self::Domain, DecodeError>;
    fn id(&self) -> Uuid;
}

/// Serializes a whole collection into one stored value.
pub fn encode_collection<R: Record>(items: &[R::Domain]) -> Result<String, serde_json::Error> {
    let records: Vec<R> = items.iter().map(R::from_domain).collect();
    serde_json::to_string(&records)
}

/// Parses a stored collection and revives every record.
pub fn decode_collection<R: Record>(raw: &str) -> Result<Vec<R::Domain>, DecodeError> {
    let records: Vec<R> = serde_json::from_str(raw)?;
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .map(|record| {
            if !seen.insert(record.id()) {
                return Err(DecodeError::DuplicateId(record.id()));
            }
            record.into_domain()
        })
        .collect()
}

//=========================================================================================
// Date revival
//=========================================================================================

fn encode_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn revive_timestamp(field: &'static str, raw: &str) -> Result<DateTime<Utc>, DecodeError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DecodeError::InvalidDate {
            field,
            value: raw.to_string(),
        })
}

pub fn encode_event_date(value: &NaiveDateTime) -> String {
    value.format(EVENT_DATE_FORMAT).to_string()
}

/// Accepts the wall-clock format we write, and also zoned ISO-8601 strings
/// (as a browser's `Date#toJSON` produces), which are shifted into local time.
pub fn revive_event_date(raw: &str) -> Result<NaiveDateTime, DecodeError> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, EVENT_DATE_FORMAT) {
        return Ok(naive);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Local).naive_local())
        .map_err(|_| DecodeError::InvalidDate {
            field: "date",
            value: raw.to_string(),
        })
}

//=========================================================================================
// Records
//=========================================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    id: Uuid,
    username: String,
    #[serde(default)]
    password: String,
    role: String,
    full_name: String,
}

impl Record for UserRecord {
    type Domain = User;

    fn from_domain(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            password: user.password.clone(),
            role: user.role.as_str().to_string(),
            full_name: user.full_name.clone(),
        }
    }

    fn into_domain(self) -> Result<User, DecodeError> {
        Ok(User {
            id: self.id,
            username: self.username,
            password: self.password,
            role: self.role.parse()?,
            full_name: self.full_name,
        })
    }

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    id: Uuid,
    name: String,
    category: String,
    upload_date: String,
    size: String,
    url: String,
    #[serde(rename = "type")]
    mime_type: String,
}

impl Record for FileRecord {
    type Domain = StudyFile;

    fn from_domain(file: &StudyFile) -> Self {
        Self {
            id: file.id,
            name: file.name.clone(),
            category: file.category.as_str().to_string(),
            upload_date: encode_timestamp(&file.upload_date),
            size: file.size.clone(),
            url: file.url.clone(),
            mime_type: file.mime_type.clone(),
        }
    }

    fn into_domain(self) -> Result<StudyFile, DecodeError> {
        Ok(StudyFile {
            id: self.id,
            upload_date: revive_timestamp("uploadDate", &self.upload_date)?,
            category: self.category.parse()?,
            name: self.name,
            size: self.size,
            url: self.url,
            mime_type: self.mime_type,
        })
    }

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    id: Uuid,
    title: String,
    date: String,
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    completed: bool,
}

impl Record for EventRecord {
    type Domain = CalendarEvent;

    fn from_domain(event: &CalendarEvent) -> Self {
        Self {
            id: event.id,
            title: event.title.clone(),
            date: encode_event_date(&event.date),
            event_type: event.event_type.as_str().to_string(),
            description: event.description.clone(),
            completed: event.completed,
        }
    }

    fn into_domain(self) -> Result<CalendarEvent, DecodeError> {
        Ok(CalendarEvent {
            id: self.id,
            date: revive_event_date(&self.date)?,
            event_type: self.event_type.parse()?,
            title: self.title,
            description: self.description,
            completed: self.completed,
        })
    }

    fn id(&self) -> Uuid {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventType, FileCategory, Role};
    use chrono::{NaiveDate, Timelike};

    fn event_at(day: u32, hour: u32, minute: u32) -> CalendarEvent {
        CalendarEvent {
            id: Uuid::new_v4(),
            title: "Linear Algebra Exam".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, day)
                .and_then(|d| d.and_hms_opt(hour, minute, 0))
                .unwrap(),
            event_type: EventType::Exam,
            description: Some("Final exam for Math 202".to_string()),
            completed: false,
        }
    }

    #[test]
    fn event_dates_survive_a_round_trip() {
        let events = vec![event_at(1, 9, 30), event_at(14, 23, 59), event_at(31, 0, 0)];

        let raw = encode_collection::<EventRecord>(&events).unwrap();
        let revived = decode_collection::<EventRecord>(&raw).unwrap();

        assert_eq!(revived.len(), events.len());
        for (before, after) in events.iter().zip(&revived) {
            assert_eq!(before.date.date(), after.date.date());
            assert_eq!(before.date.hour(), after.date.hour());
            assert_eq!(before.date.minute(), after.date.minute());
        }
        assert_eq!(revived, events);
    }

    #[test]
    fn event_dates_are_stored_as_strings() {
        let raw = encode_collection::<EventRecord>(&[event_at(5, 8, 15)]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["date"], "2026-03-05T08:15:00");
        assert_eq!(value[0]["type"], "exam");
    }

    #[test]
    fn zoned_iso_dates_are_revived() {
        let revived = revive_event_date("2026-03-05T08:15:00.000Z").unwrap();
        let expected = DateTime::parse_from_rfc3339("2026-03-05T08:15:00Z")
            .unwrap()
            .with_timezone(&Local)
            .naive_local();
        assert_eq!(revived, expected);
    }

    #[test]
    fn unreadable_date_fails_the_whole_collection() {
        let raw = r#"[
            {"id":"6f1f0d5e-8d40-4f0e-9a55-3c1c5f0e8a01","title":"ok","date":"2026-03-05T08:15:00","type":"study","completed":false},
            {"id":"6f1f0d5e-8d40-4f0e-9a55-3c1c5f0e8a02","title":"bad","date":"next tuesday","type":"study","completed":false}
        ]"#;
        let err = decode_collection::<EventRecord>(raw).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidDate { field: "date", .. }));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let user = User {
            id: Uuid::new_v4(),
            username: "student1".to_string(),
            password: "password".to_string(),
            role: Role::Student,
            full_name: "Jane Doe".to_string(),
        };
        let raw = encode_collection::<UserRecord>(&[user.clone(), user.clone()]).unwrap();
        let err = decode_collection::<UserRecord>(&raw).unwrap_err();
        assert!(matches!(err, DecodeError::DuplicateId(id) if id == user.id));
    }

    #[test]
    fn file_records_keep_the_browser_field_names() {
        let file = StudyFile {
            id: Uuid::new_v4(),
            name: "notes.pdf".to_string(),
            category: FileCategory::LectureNotes,
            upload_date: Utc::now(),
            size: "2.0 KB".to_string(),
            url: "blob:study-desk/x".to_string(),
            mime_type: "application/pdf".to_string(),
        };
        let raw = encode_collection::<FileRecord>(&[file.clone()]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["category"], "Lecture Notes");
        assert_eq!(value[0]["type"], "application/pdf");
        assert!(value[0]["uploadDate"].is_string());

        let revived = decode_collection::<FileRecord>(&raw).unwrap();
        // Stored timestamps keep millisecond precision.
        assert_eq!(
            revived[0].upload_date.timestamp_millis(),
            file.upload_date.timestamp_millis()
        );
    }

    #[test]
    fn unknown_role_is_a_decode_failure() {
        let raw = r#"[{"id":"6f1f0d5e-8d40-4f0e-9a55-3c1c5f0e8a01","username":"x","password":"y","role":"professor","fullName":"X"}]"#;
        let err = decode_collection::<UserRecord>(raw).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownVariant(_)));
    }
}
