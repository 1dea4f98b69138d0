//! services/desk/src/console/command.rs
//!
//! The line protocol between the person at the terminal and the console.
//! Each input line parses into exactly one `Command`.

use chrono::{NaiveDate, NaiveDateTime};
use std::path::PathBuf;
use std::str::FromStr;
use study_desk_core::{EventType, FileCategory, FileFilter, NewEvent, NewUser, Role, View};
use uuid::Uuid;

/// Accepted formats for the date argument of `add-event`.
const EVENT_INPUT_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];

#[derive(Debug, Clone)]
pub enum Command {
    Login { username: String, password: String },
    Logout,
    Go(View),
    WhoAmI,

    Files(FileFilter),
    Upload { path: PathBuf, mime_type: Option<String> },
    Categorize { id: Uuid, category: FileCategory },
    RemoveFile(Uuid),

    /// Events on one day, or all of them.
    Events(Option<NaiveDate>),
    /// Month page for a year and month, or the current month.
    Month(Option<(i32, u32)>),
    AddEvent(NewEvent),
    Toggle(Uuid),
    RemoveEvent(Uuid),

    Users,
    AddUser(NewUser),
    RemoveUser(Uuid),

    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("{0}")]
    InvalidArgument(String),
}

pub const HELP: &str = "\
commands:
  login <username> <password>       log in
  logout                            log out
  go <dashboard|calendar|admin>     switch view
  whoami                            show the current session
  files [search] [--category <c>]   list files, newest first
  upload <path> [mime-type]         upload a local file
  categorize <file-id> <category>   Assignment, Lecture-Notes, Reference, Exam-Paper
  rm-file <file-id>                 delete a file
  events [YYYY-MM-DD]               list events, optionally for one day
  month [YYYY-MM]                   show a month page
  add-event <YYYY-MM-DDTHH:MM> <class|exam|study> <title...> [-- description...]
  toggle <event-id>                 mark an event done / not done
  rm-event <event-id>               delete an event
  users                             list accounts (admin)
  add-user <username> <password> <admin|student> <full name...>
  rm-user <user-id>                 delete an account (admin)
  help                              show this text
  quit                              exit";

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(ParseError::Empty)?;
        let args: Vec<&str> = words.collect();

        match name {
            "login" => match args.as_slice() {
                [username, password] => Ok(Command::Login {
                    username: username.to_string(),
                    password: password.to_string(),
                }),
                _ => Err(ParseError::Usage("login <username> <password>")),
            },
            "logout" => Ok(Command::Logout),
            "go" => match args.as_slice() {
                [view] => Ok(Command::Go(parse_arg(view)?)),
                _ => Err(ParseError::Usage("go <dashboard|calendar|admin>")),
            },
            "whoami" => Ok(Command::WhoAmI),

            "files" => parse_files(&args),
            "upload" => match args.as_slice() {
                [path] => Ok(Command::Upload {
                    path: PathBuf::from(path),
                    mime_type: None,
                }),
                [path, mime_type] => Ok(Command::Upload {
                    path: PathBuf::from(path),
                    mime_type: Some(mime_type.to_string()),
                }),
                _ => Err(ParseError::Usage("upload <path> [mime-type]")),
            },
            "categorize" => match args.as_slice() {
                [id, category @ ..] if !category.is_empty() => Ok(Command::Categorize {
                    id: parse_id(id)?,
                    category: parse_arg(&category.join(" "))?,
                }),
                _ => Err(ParseError::Usage("categorize <file-id> <category>")),
            },
            "rm-file" => Ok(Command::RemoveFile(single_id(&args, "rm-file <file-id>")?)),

            "events" => match args.as_slice() {
                [] => Ok(Command::Events(None)),
                [day] => Ok(Command::Events(Some(parse_day(day)?))),
                _ => Err(ParseError::Usage("events [YYYY-MM-DD]")),
            },
            "month" => match args.as_slice() {
                [] => Ok(Command::Month(None)),
                [month] => Ok(Command::Month(Some(parse_month(month)?))),
                _ => Err(ParseError::Usage("month [YYYY-MM]")),
            },
            "add-event" => parse_add_event(&args),
            "toggle" => Ok(Command::Toggle(single_id(&args, "toggle <event-id>")?)),
            "rm-event" => Ok(Command::RemoveEvent(single_id(&args, "rm-event <event-id>")?)),

            "users" => Ok(Command::Users),
            "add-user" => match args.as_slice() {
                [username, password, role, full_name @ ..] if !full_name.is_empty() => {
                    Ok(Command::AddUser(NewUser {
                        username: username.to_string(),
                        password: password.to_string(),
                        role: parse_arg::<Role>(role)?,
                        full_name: full_name.join(" "),
                    }))
                }
                _ => Err(ParseError::Usage(
                    "add-user <username> <password> <admin|student> <full name...>",
                )),
            },
            "rm-user" => Ok(Command::RemoveUser(single_id(&args, "rm-user <user-id>")?)),

            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }
}

fn parse_arg<T>(raw: &str) -> Result<T, ParseError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| ParseError::InvalidArgument(e.to_string()))
}

fn parse_id(raw: &str) -> Result<Uuid, ParseError> {
    Uuid::parse_str(raw).map_err(|_| ParseError::InvalidArgument(format!("'{}' is not an id", raw)))
}

fn single_id(args: &[&str], usage: &'static str) -> Result<Uuid, ParseError> {
    match args {
        [id] => parse_id(id),
        _ => Err(ParseError::Usage(usage)),
    }
}

fn parse_day(raw: &str) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ParseError::InvalidArgument(format!("'{}' is not a YYYY-MM-DD date", raw)))
}

fn parse_month(raw: &str) -> Result<(i32, u32), ParseError> {
    let invalid = || ParseError::InvalidArgument(format!("'{}' is not a YYYY-MM month", raw));
    let (year, month) = raw.split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month))
}

fn parse_files(args: &[&str]) -> Result<Command, ParseError> {
    const USAGE: &str = "files [search] [--category <category>]";
    let mut filter = FileFilter::default();
    let mut search = Vec::new();
    let mut rest = args.iter();
    while let Some(word) = rest.next() {
        if *word == "--category" {
            let category = rest.next().ok_or(ParseError::Usage(USAGE))?;
            filter.category = Some(parse_arg(category)?);
        } else {
            search.push(*word);
        }
    }
    if !search.is_empty() {
        filter.search = Some(search.join(" "));
    }
    Ok(Command::Files(filter))
}

fn parse_add_event(args: &[&str]) -> Result<Command, ParseError> {
    const USAGE: &str =
        "add-event <YYYY-MM-DDTHH:MM> <class|exam|study> <title...> [-- description...]";
    let [date, event_type, rest @ ..] = args else {
        return Err(ParseError::Usage(USAGE));
    };
    let (title, description) = match rest.iter().position(|w| *w == "--") {
        Some(split) => (&rest[..split], Some(rest[split + 1..].join(" "))),
        None => (rest, None),
    };
    if title.is_empty() {
        return Err(ParseError::Usage(USAGE));
    }

    let date = EVENT_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(date, format).ok())
        .ok_or_else(|| {
            ParseError::InvalidArgument(format!("'{}' is not a YYYY-MM-DDTHH:MM date", date))
        })?;

    Ok(Command::AddEvent(NewEvent {
        title: title.join(" "),
        date,
        event_type: parse_arg::<EventType>(event_type)?,
        description,
    }))
}
