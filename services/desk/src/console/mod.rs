//! services/desk/src/console/mod.rs
//!
//! A line-oriented front end for the store. It only reads snapshots and calls
//! store operations; it never touches a collection directly.

pub mod command;
pub mod render;

use crate::error::DeskError;
use chrono::{Datelike, Local};
use command::{Command, HELP};
use std::io::Write;
use std::sync::Arc;
use study_desk_core::{StoreChange, StudyStore};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Whether the read loop should keep going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Console<W> {
    store: Arc<StudyStore>,
    out: W,
    shutdown: CancellationToken,
}

impl<W: Write> Console<W> {
    pub fn new(store: Arc<StudyStore>, out: W, shutdown: CancellationToken) -> Self {
        Self {
            store,
            out,
            shutdown,
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Reads commands until `quit`, end of input, or shutdown.
    ///
    /// Each command is awaited before the next line is read, so a login that
    /// is still waiting out its delay cannot be triggered twice.
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, input: R) -> Result<(), DeskError> {
        let mut lines = input.lines();
        self.print_session().await?;
        loop {
            let line = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                line = lines.next_line() => line?,
            };
            let Some(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }

            match line.parse::<Command>() {
                Ok(command) => match self.execute(command).await {
                    Ok(Flow::Quit) => break,
                    Ok(Flow::Continue) => {}
                    Err(DeskError::Store(e)) => writeln!(self.out, "error: {}", e)?,
                    Err(e) => return Err(e),
                },
                Err(e) => writeln!(self.out, "error: {}", e)?,
            }
        }
        info!("Console closed");
        Ok(())
    }

    pub async fn execute(&mut self, command: Command) -> Result<Flow, DeskError> {
        debug!("Executing {:?}", command);
        let requires_login = !matches!(
            command,
            Command::Login { .. } | Command::Logout | Command::WhoAmI | Command::Help | Command::Quit
        );
        if requires_login && !self.store.session().await.is_logged_in() {
            writeln!(self.out, "log in first")?;
            return Ok(Flow::Continue);
        }

        match command {
            Command::Login { username, password } => {
                writeln!(self.out, "signing in...")?;
                let cancel = self.shutdown.child_token();
                let user = self.store.authenticate(&username, &password, &cancel).await?;
                writeln!(self.out, "welcome, {}", user.full_name)?;
                self.print_session().await?;
            }
            Command::Logout => {
                self.store.logout().await;
                writeln!(self.out, "logged out")?;
            }
            Command::Go(view) => {
                self.store.navigate(view).await?;
                self.print_session().await?;
            }
            Command::WhoAmI => self.print_session().await?,

            Command::Files(filter) => {
                let files = self.store.find_files(&filter).await;
                writeln!(self.out, "{}", render::files(&files))?;
            }
            Command::Upload { path, mime_type } => {
                let (data, name) = match (tokio::fs::read(&path).await, path.file_name()) {
                    (Ok(data), Some(name)) => (data, name.to_string_lossy().into_owned()),
                    (Err(e), _) => {
                        writeln!(self.out, "error: cannot read {}: {}", path.display(), e)?;
                        return Ok(Flow::Continue);
                    }
                    (Ok(_), None) => {
                        writeln!(self.out, "error: {} is not a file", path.display())?;
                        return Ok(Flow::Continue);
                    }
                };
                let mime_type = mime_type.unwrap_or_else(|| guess_mime_type(&name).to_string());
                let size = data.len() as u64;
                let file = self
                    .store
                    .upload_file(data.into(), &name, &mime_type, size)
                    .await?;
                writeln!(self.out, "uploaded {} ({}) as {}", file.name, file.size, file.id)?;
            }
            Command::Categorize { id, category } => {
                match self.store.set_file_category(id, category).await? {
                    Some(file) => writeln!(self.out, "{} is now {}", file.name, file.category)?,
                    None => writeln!(self.out, "no such file")?,
                }
            }
            Command::RemoveFile(id) => {
                self.store.delete_file(id).await?;
                writeln!(self.out, "ok")?;
            }

            Command::Events(day) => {
                let events = match day {
                    Some(day) => self.store.events_on(day).await,
                    None => self.store.events().await,
                };
                writeln!(self.out, "{}", render::events(&events))?;
            }
            Command::Month(month) => {
                let (year, month) = month.unwrap_or_else(|| {
                    let today = Local::now().date_naive();
                    (today.year(), today.month())
                });
                let events = self.store.events().await;
                match render::month(year, month, &events) {
                    Some(page) => writeln!(self.out, "{}", page)?,
                    None => writeln!(self.out, "no such month")?,
                }
            }
            Command::AddEvent(new_event) => {
                let event = self.store.create_event(new_event).await?;
                writeln!(self.out, "{}", render::event(&event))?;
            }
            Command::Toggle(id) => match self.store.toggle_event_completion(id).await? {
                Some(event) => writeln!(self.out, "{}", render::event(&event))?,
                None => writeln!(self.out, "no such event")?,
            },
            Command::RemoveEvent(id) => {
                self.store.delete_event(id).await?;
                writeln!(self.out, "ok")?;
            }

            Command::Users => {
                let users = self.store.list_users().await?;
                writeln!(self.out, "{}", render::users(&users))?;
            }
            Command::AddUser(new_user) => {
                let user = self.store.create_user(new_user).await?;
                writeln!(self.out, "created {} ({})", user.username, user.id)?;
            }
            Command::RemoveUser(id) => {
                self.store.delete_user(id).await?;
                writeln!(self.out, "ok")?;
            }

            Command::Help => writeln!(self.out, "{}", HELP)?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    async fn print_session(&mut self) -> Result<(), DeskError> {
        let session = self.store.session().await;
        let user = self.store.current_user().await;
        writeln!(self.out, "{}", render::session_line(&session, user.as_ref()))?;
        Ok(())
    }
}

/// Logs every store change until the store's channel closes or `shutdown` fires.
pub fn spawn_change_logger(store: &StudyStore, shutdown: CancellationToken) -> JoinHandle<()> {
    let mut changes = store.subscribe();
    tokio::spawn(async move {
        loop {
            let change = tokio::select! {
                _ = shutdown.cancelled() => break,
                change = changes.recv() => change,
            };
            match change {
                Ok(StoreChange::Session) => debug!("Session changed"),
                Ok(change) => debug!("Collection changed: {:?}", change),
                Err(RecvError::Lagged(missed)) => warn!("Change logger missed {} updates", missed),
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn guess_mime_type(name: &str) -> &'static str {
    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_types_follow_the_extension() {
        assert_eq!(guess_mime_type("Lab.PDF"), "application/pdf");
        assert_eq!(guess_mime_type("notes.md"), "text/markdown");
        assert_eq!(guess_mime_type("Makefile"), "application/octet-stream");
    }
}
