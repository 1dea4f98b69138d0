//! crates/study_desk_core/src/store.rs
//!
//! The session & entity store: owns users, files, events and the session,
//! mirrors every successful mutation into a `KeyValueStore`, and rebuilds all
//! of it from that store at startup.
//!
//! Each collection sits behind its own lock. A mutation keeps the write lock
//! for the whole compute, persist, replace sequence, so writes to one
//! collection are serialized and readers never see a half-applied change.
//! When both are needed, the user lock is always taken before the session lock.

use crate::calendar;
use crate::domain::{
    CalendarEvent, FileCategory, FileFilter, NewEvent, NewUser, Session, StudyFile, User, View,
};
use crate::error::{AuthFailure, NavigationRefused, StoreError, StoreResult, ValidationFailure};
use crate::ports::{BlobStore, KeyValueStore, PortError};
use crate::records::{self, EventRecord, FileRecord, Record, UserRecord};
use crate::seed;
use bytes::Bytes;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Storage keys, one per collection plus two for the session.
pub mod keys {
    pub const USERS: &str = "users";
    pub const FILES: &str = "files";
    pub const EVENTS: &str = "events";
    pub const SESSION_USER: &str = "session_user";
    pub const CURRENT_VIEW: &str = "current_view";
}

pub const MIN_USERNAME_LEN: usize = 3;

/// Tunables for a `StudyStore`.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// How long `authenticate` waits before answering, standing in for a network round trip.
    pub auth_delay: Duration,
    /// Buffer size of the change notification channel.
    pub channel_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            auth_delay: Duration::from_millis(500),
            channel_capacity: 64,
        }
    }
}

/// Which collection a successful mutation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    Users,
    Files,
    Events,
    Session,
}

//=========================================================================================
// The Store
//=========================================================================================

pub struct StudyStore {
    config: StoreConfig,
    storage: Arc<dyn KeyValueStore>,
    blobs: Arc<dyn BlobStore>,
    users: RwLock<Vec<User>>,
    files: RwLock<Vec<StudyFile>>,
    events: RwLock<Vec<CalendarEvent>>,
    session: RwLock<Session>,
    changes: broadcast::Sender<StoreChange>,
}

impl StudyStore {
    /// Loads every collection from `storage`, falling back to seed data for any
    /// collection that is missing or cannot be decoded, then validates the
    /// persisted session against the loaded users.
    pub async fn load(
        config: StoreConfig,
        storage: Arc<dyn KeyValueStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        let users = load_collection::<UserRecord>(storage.as_ref(), keys::USERS, seed::users).await;
        let files = load_collection::<FileRecord>(storage.as_ref(), keys::FILES, seed::files).await;
        let events =
            load_collection::<EventRecord>(storage.as_ref(), keys::EVENTS, seed::events).await;

        let stored_session = load_session(storage.as_ref()).await;
        let session = restore_session(stored_session, &users);
        if session != stored_session {
            // Best effort: the in-memory session is already correct.
            if let Err(e) = write_session(storage.as_ref(), &session).await {
                warn!("Failed to persist the repaired session: {}", e);
            }
        }
        info!(
            users = users.len(),
            files = files.len(),
            events = events.len(),
            view = %session.current_view,
            "Study store loaded"
        );

        let (changes, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            config,
            storage,
            blobs,
            users: RwLock::new(users),
            files: RwLock::new(files),
            events: RwLock::new(events),
            session: RwLock::new(session),
            changes,
        }
    }

    /// Registers a listener that is told about every successful mutation.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    fn notify(&self, change: StoreChange) {
        // No listeners is fine.
        let _ = self.changes.send(change);
    }

    //=====================================================================================
    // Session
    //=====================================================================================

    /// Checks a username/password pair after the configured delay.
    ///
    /// Usernames containing `@` are refused immediately. The delay can be cut
    /// short through `cancel`, in which case the session is left untouched.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
        cancel: &CancellationToken,
    ) -> StoreResult<User> {
        if username.contains('@') {
            return Err(AuthFailure::MalformedUsername.into());
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Login for '{}' cancelled", username);
                return Err(AuthFailure::Cancelled.into());
            }
            _ = tokio::time::sleep(self.config.auth_delay) => {}
        }

        let users = self.users.read().await;
        let user = users
            .iter()
            .find(|u| u.username == username && u.password == password)
            .cloned()
            .ok_or_else(|| {
                warn!("Rejected login for '{}'", username);
                AuthFailure::InvalidCredentials
            })?;

        let mut session = self.session.write().await;
        let next = Session {
            current_user_id: Some(user.id),
            current_view: View::Dashboard,
        };
        self.commit_session(&mut session, next).await?;
        info!("User '{}' logged in", user.username);
        Ok(user)
    }

    /// Ends the session. This cannot fail: if storage refuses the write, the
    /// in-memory session is still cleared and the failure is only logged.
    pub async fn logout(&self) {
        let mut session = self.session.write().await;
        if *session == Session::logged_out() {
            return;
        }
        self.clear_session(&mut session).await;
        info!("Logged out");
    }

    /// Moves the logged-in user to another view.
    pub async fn navigate(&self, target: View) -> StoreResult<Session> {
        let users = self.users.read().await;
        let mut session = self.session.write().await;

        let user = session
            .current_user_id
            .and_then(|id| users.iter().find(|u| u.id == id))
            .ok_or(NavigationRefused::NotAuthenticated)?;
        match target {
            View::Login => return Err(NavigationRefused::UseLogout.into()),
            View::Admin if !user.is_admin() => {
                warn!("User '{}' tried to open the admin portal", user.username);
                return Err(NavigationRefused::AdminOnly.into());
            }
            _ => {}
        }

        if session.current_view != target {
            let next = Session {
                current_view: target,
                ..*session
            };
            self.commit_session(&mut session, next).await?;
        }
        Ok(*session)
    }

    pub async fn session(&self) -> Session {
        *self.session.read().await
    }

    pub async fn current_user(&self) -> Option<User> {
        let users = self.users.read().await;
        let session = self.session.read().await;
        session
            .current_user_id
            .and_then(|id| users.iter().find(|u| u.id == id).cloned())
    }

    async fn commit_session(&self, slot: &mut Session, next: Session) -> StoreResult<()> {
        write_session(self.storage.as_ref(), &next)
            .await
            .map_err(|e| {
                error!("Failed to persist session: {}", e);
                StoreError::Persistence(e)
            })?;
        *slot = next;
        self.notify(StoreChange::Session);
        Ok(())
    }

    /// Clears the session in memory whether or not storage accepts the write.
    async fn clear_session(&self, slot: &mut Session) {
        let next = Session::logged_out();
        if let Err(e) = write_session(self.storage.as_ref(), &next).await {
            warn!("Failed to persist logout, stored session is stale: {}", e);
        }
        *slot = next;
        self.notify(StoreChange::Session);
    }

    //=====================================================================================
    // Users (admin only)
    //=====================================================================================

    pub async fn list_users(&self) -> StoreResult<Vec<User>> {
        let users = self.users.read().await;
        let session = self.session.read().await;
        require_admin(&users, &session)?;
        Ok(users.clone())
    }

    pub async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().await;
        {
            let session = self.session.read().await;
            require_admin(&users, &session)?;
        }

        if new_user.username.chars().count() < MIN_USERNAME_LEN {
            return Err(ValidationFailure::UsernameTooShort {
                min: MIN_USERNAME_LEN,
            }
            .into());
        }
        if new_user.username.contains('@') {
            return Err(ValidationFailure::MalformedUsername.into());
        }
        if users.iter().any(|u| u.username == new_user.username) {
            return Err(ValidationFailure::DuplicateUsername(new_user.username).into());
        }

        let user = User {
            id: fresh_id(|id| users.iter().any(|u| u.id == id)),
            username: new_user.username,
            password: new_user.password,
            role: new_user.role,
            full_name: new_user.full_name,
        };
        let mut next = users.clone();
        next.push(user.clone());
        self.commit::<UserRecord>(keys::USERS, &mut users, next).await?;
        self.notify(StoreChange::Users);
        info!("Created {} account '{}'", user.role, user.username);
        Ok(user)
    }

    /// Removes a user. Unknown ids and the protected `admin` account are
    /// silently left alone. Deleting the logged-in user also logs them out.
    pub async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let mut session = self.session.write().await;
        require_admin(&users, &session)?;

        let Some(target) = users.iter().find(|u| u.id == id) else {
            return Ok(());
        };
        if target.username == seed::PROTECTED_USERNAME {
            info!("Ignoring request to delete the protected '{}' account", target.username);
            return Ok(());
        }

        let deleting_self = session.current_user_id == Some(id);
        let next: Vec<User> = users.iter().filter(|u| u.id != id).cloned().collect();
        self.commit::<UserRecord>(keys::USERS, &mut users, next).await?;
        self.notify(StoreChange::Users);

        // The session must never outlive its user, even if it cannot be saved.
        if deleting_self {
            self.clear_session(&mut session).await;
            info!("Deleted the logged-in account, logged out");
        }
        Ok(())
    }

    //=====================================================================================
    // Files
    //=====================================================================================

    /// Registers an uploaded file, newest first.
    pub async fn upload_file(
        &self,
        data: Bytes,
        name: &str,
        mime_type: &str,
        size_bytes: u64,
    ) -> StoreResult<StudyFile> {
        let url = self.blobs.create_reference(data, mime_type).await?;

        let mut files = self.files.write().await;
        let file = StudyFile {
            id: fresh_id(|id| files.iter().any(|f| f.id == id)),
            name: name.to_string(),
            category: FileCategory::default(),
            upload_date: Utc::now(),
            size: format_size(size_bytes),
            url,
            mime_type: mime_type.to_string(),
        };
        let next: Vec<StudyFile> = std::iter::once(file.clone())
            .chain(files.iter().cloned())
            .collect();
        if let Err(e) = self.commit::<FileRecord>(keys::FILES, &mut files, next).await {
            self.release_blob(&file.url).await;
            return Err(e);
        }
        self.notify(StoreChange::Files);
        debug!("Uploaded '{}' ({})", file.name, file.size);
        Ok(file)
    }

    /// Files are created as `Assignment`; this changes that afterwards.
    pub async fn set_file_category(
        &self,
        id: Uuid,
        category: FileCategory,
    ) -> StoreResult<Option<StudyFile>> {
        let mut files = self.files.write().await;
        let Some(current) = files.iter().find(|f| f.id == id) else {
            return Ok(None);
        };
        if current.category == category {
            return Ok(Some(current.clone()));
        }

        let next: Vec<StudyFile> = files
            .iter()
            .map(|f| {
                let mut f = f.clone();
                if f.id == id {
                    f.category = category;
                }
                f
            })
            .collect();
        let updated = next.iter().find(|f| f.id == id).cloned();
        self.commit::<FileRecord>(keys::FILES, &mut files, next).await?;
        self.notify(StoreChange::Files);
        Ok(updated)
    }

    /// Removes a file and releases its blob. Unknown ids are a no-op.
    pub async fn delete_file(&self, id: Uuid) -> StoreResult<()> {
        let removed = {
            let mut files = self.files.write().await;
            let Some(removed) = files.iter().find(|f| f.id == id).cloned() else {
                return Ok(());
            };
            let next: Vec<StudyFile> = files.iter().filter(|f| f.id != id).cloned().collect();
            self.commit::<FileRecord>(keys::FILES, &mut files, next).await?;
            removed
        };
        self.release_blob(&removed.url).await;
        self.notify(StoreChange::Files);
        Ok(())
    }

    pub async fn files(&self) -> Vec<StudyFile> {
        self.files.read().await.clone()
    }

    pub async fn find_files(&self, filter: &FileFilter) -> Vec<StudyFile> {
        self.files
            .read()
            .await
            .iter()
            .filter(|f| filter.matches(f))
            .cloned()
            .collect()
    }

    async fn release_blob(&self, url: &str) {
        if let Err(e) = self.blobs.release(url).await {
            warn!("Failed to release blob {}: {}", url, e);
        }
    }

    //=====================================================================================
    // Events
    //=====================================================================================

    /// Appends a new, not yet completed event.
    pub async fn create_event(&self, new_event: NewEvent) -> StoreResult<CalendarEvent> {
        let title = new_event.title.trim();
        if title.is_empty() {
            return Err(ValidationFailure::EmptyTitle.into());
        }

        let mut events = self.events.write().await;
        let event = CalendarEvent {
            id: fresh_id(|id| events.iter().any(|e| e.id == id)),
            title: title.to_string(),
            date: new_event.date,
            event_type: new_event.event_type,
            description: new_event
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            completed: false,
        };
        let mut next = events.clone();
        next.push(event.clone());
        self.commit::<EventRecord>(keys::EVENTS, &mut events, next).await?;
        self.notify(StoreChange::Events);
        Ok(event)
    }

    pub async fn delete_event(&self, id: Uuid) -> StoreResult<()> {
        let mut events = self.events.write().await;
        if !events.iter().any(|e| e.id == id) {
            return Ok(());
        }
        let next: Vec<CalendarEvent> = events.iter().filter(|e| e.id != id).cloned().collect();
        self.commit::<EventRecord>(keys::EVENTS, &mut events, next).await?;
        self.notify(StoreChange::Events);
        Ok(())
    }

    /// Flips `completed`. Returns the updated event, or `None` for an unknown id.
    pub async fn toggle_event_completion(&self, id: Uuid) -> StoreResult<Option<CalendarEvent>> {
        let mut events = self.events.write().await;
        if !events.iter().any(|e| e.id == id) {
            return Ok(None);
        }
        let next: Vec<CalendarEvent> = events
            .iter()
            .map(|e| {
                let mut e = e.clone();
                if e.id == id {
                    e.completed = !e.completed;
                }
                e
            })
            .collect();
        let updated = next.iter().find(|e| e.id == id).cloned();
        self.commit::<EventRecord>(keys::EVENTS, &mut events, next).await?;
        self.notify(StoreChange::Events);
        Ok(updated)
    }

    pub async fn events(&self) -> Vec<CalendarEvent> {
        self.events.read().await.clone()
    }

    pub async fn events_on(&self, day: NaiveDate) -> Vec<CalendarEvent> {
        let events = self.events.read().await;
        calendar::events_on(&events, day).into_iter().cloned().collect()
    }

    //=====================================================================================
    // Persistence
    //=====================================================================================

    /// Writes `next` to storage and only then swaps it into `slot`.
    async fn commit<R: Record>(
        &self,
        key: &'static str,
        slot: &mut Vec<R::Domain>,
        next: Vec<R::Domain>,
    ) -> StoreResult<()> {
        let raw = records::encode_collection::<R>(&next)
            .map_err(|e| PortError::Unexpected(format!("failed to encode {}: {}", key, e)))?;
        self.storage.set(key, &raw).await.map_err(|e| {
            error!("Failed to persist '{}': {}", key, e);
            StoreError::Persistence(e)
        })?;
        *slot = next;
        Ok(())
    }
}

/// Kilobytes to one decimal place, e.g. `2048` becomes `"2.0 KB"`.
pub fn format_size(size_bytes: u64) -> String {
    format!("{:.1} KB", size_bytes as f64 / 1024.0)
}

fn fresh_id(taken: impl Fn(Uuid) -> bool) -> Uuid {
    loop {
        let id = Uuid::new_v4();
        if !taken(id) {
            return id;
        }
    }
}

fn require_admin(users: &[User], session: &Session) -> StoreResult<()> {
    let is_admin = session
        .current_user_id
        .and_then(|id| users.iter().find(|u| u.id == id))
        .is_some_and(User::is_admin);
    if is_admin {
        Ok(())
    } else {
        Err(StoreError::Forbidden)
    }
}

//=========================================================================================
// Loading helpers
//=========================================================================================

async fn load_collection<R: Record>(
    storage: &dyn KeyValueStore,
    key: &str,
    seed: fn() -> Vec<R::Domain>,
) -> Vec<R::Domain> {
    match storage.get(key).await {
        Ok(Some(raw)) => match records::decode_collection::<R>(&raw) {
            Ok(items) => items,
            Err(e) => {
                warn!("Stored '{}' could not be decoded, using seed data: {}", key, e);
                seed()
            }
        },
        Ok(None) => {
            debug!("Nothing stored for '{}', using seed data", key);
            seed()
        }
        Err(e) => {
            warn!("Failed to read '{}', using seed data: {}", key, e);
            seed()
        }
    }
}

async fn load_session(storage: &dyn KeyValueStore) -> Session {
    let current_user_id = match storage.get(keys::SESSION_USER).await {
        Ok(Some(raw)) => serde_json::from_str::<Uuid>(&raw)
            .map_err(|e| warn!("Stored session user is unreadable: {}", e))
            .ok(),
        Ok(None) => None,
        Err(e) => {
            warn!("Failed to read the session user: {}", e);
            None
        }
    };
    let current_view = match storage.get(keys::CURRENT_VIEW).await {
        Ok(Some(raw)) => serde_json::from_str::<String>(&raw)
            .ok()
            .and_then(|label| label.parse::<View>().ok())
            .unwrap_or_else(|| {
                warn!("Stored view '{}' is unreadable", raw);
                View::Login
            }),
        Ok(None) => View::Login,
        Err(e) => {
            warn!("Failed to read the current view: {}", e);
            View::Login
        }
    };
    Session {
        current_user_id,
        current_view,
    }
}

/// Applies the session rules to a persisted session: the user must still exist,
/// a logged-in session cannot sit on the login view, and only admins may
/// resume on the admin view.
fn restore_session(stored: Session, users: &[User]) -> Session {
    let Some(user_id) = stored.current_user_id else {
        return Session::logged_out();
    };
    let Some(user) = users.iter().find(|u| u.id == user_id) else {
        warn!("Stored session points at missing user {}, logging out", user_id);
        return Session::logged_out();
    };
    let current_view = match stored.current_view {
        View::Login => return Session::logged_out(),
        View::Admin if !user.is_admin() => View::Dashboard,
        view => view,
    };
    Session {
        current_user_id: Some(user_id),
        current_view,
    }
}

/// Writes both session keys. A write that stops halfway restores either as the
/// previous session or as logged out: a user is stored before its view, and a
/// logout stores the login view before dropping the user.
async fn write_session(storage: &dyn KeyValueStore, session: &Session) -> Result<(), PortError> {
    let view = serde_json::to_string(session.current_view.as_str())
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
    match session.current_user_id {
        Some(id) => {
            let raw = serde_json::to_string(&id).map_err(|e| PortError::Unexpected(e.to_string()))?;
            storage.set(keys::SESSION_USER, &raw).await?;
            storage.set(keys::CURRENT_VIEW, &view).await
        }
        None => {
            storage.set(keys::CURRENT_VIEW, &view).await?;
            storage.remove(keys::SESSION_USER).await
        }
    }
}
