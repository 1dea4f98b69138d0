pub mod calendar;
pub mod domain;
pub mod error;
pub mod ports;
pub mod records;
pub mod seed;
pub mod store;

pub use domain::{
    CalendarEvent, EventType, FileCategory, FileFilter, NewEvent, NewUser, Role, Session,
    StudyFile, User, View,
};
pub use error::{AuthFailure, NavigationRefused, StoreError, StoreResult, ValidationFailure};
pub use ports::{BlobStore, KeyValueStore, PortError, PortResult};
pub use store::{StoreChange, StoreConfig, StudyStore};
