//! Line-oriented commands of the interactive prompt.
//!
//! [`Command::parse`] turns one input line into a command; [`execute`] runs
//! it against a [`Session`] and returns the lines to print.

use chrono::{DateTime, Local};
use famtasks_proto::category::{self, CATEGORIES, Category};
use famtasks_proto::task::{NewTask, Task, TaskPatch, TaskStatus};

use crate::presence::{ActivityKind, Roster, RosterEntry};
use crate::session::Session;
use crate::tasks::{self, TaskError};
use crate::workspace::Clipboard;

/// Usage text printed by `help`.
pub const HELP: &str = "\
Commands:
  list [category]            show tasks, optionally for one category
  add <category> <title>     add a task
  cycle <id>                 advance a task: idle -> in progress -> done
  rename-task <id> <title>   change a task's title
  delete <id>                remove a task
  who                        show who is online
  name <new name>            change your display name
  invite                     show the invite link
  copy                       copy the invite link to the clipboard
  status                     show the sync status
  help                       show this help
  quit                       leave";

/// A parsed prompt command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show tasks, all categories or one.
    List {
        /// Category id filter.
        category: Option<String>,
    },
    /// Add an idle task.
    Add {
        /// Category id.
        category: String,
        /// Task title, untrimmed.
        title: String,
    },
    /// Advance a task's status.
    Cycle {
        /// Id fragment.
        id: String,
    },
    /// Change a task's title.
    RenameTask {
        /// Id fragment.
        id: String,
        /// New title, untrimmed.
        title: String,
    },
    /// Remove a task.
    Delete {
        /// Id fragment.
        id: String,
    },
    /// Show the roster.
    Who,
    /// Change the display name.
    Name {
        /// Candidate name, untrimmed.
        name: String,
    },
    /// Show the invite link.
    Invite,
    /// Copy the invite link.
    Copy,
    /// Show the sync status.
    Status,
    /// Show usage.
    Help,
    /// Leave.
    Quit,
}

/// Reasons an input line is not a command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The line was blank.
    #[error("empty command")]
    Empty,
    /// The first word is not a known command.
    #[error("unknown command {0:?}, type `help` for a list")]
    Unknown(String),
    /// A required argument is missing.
    #[error("usage: {0}")]
    Usage(&'static str),
    /// The category id is not in the catalog.
    #[error("unknown category {0:?} (groceries, chores, errands, personal)")]
    UnknownCategory(String),
}

impl Command {
    /// Parses one input line.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] if the line is blank, names no known
    /// command, lacks a required argument or names an unknown category.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(CommandError::Empty);
        }
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(word, rest)| (word, rest.trim()));

        match word.to_ascii_lowercase().as_str() {
            "list" | "ls" => {
                let category = non_empty(rest).map(known_category).transpose()?;
                Ok(Self::List { category })
            }
            "add" => {
                let (category, title) =
                    split_arg(rest).ok_or(CommandError::Usage("add <category> <title>"))?;
                Ok(Self::Add {
                    category: known_category(category)?,
                    title: title.to_string(),
                })
            }
            "cycle" => Ok(Self::Cycle {
                id: non_empty(rest).ok_or(CommandError::Usage("cycle <id>"))?.to_string(),
            }),
            "rename-task" => {
                let (id, title) =
                    split_arg(rest).ok_or(CommandError::Usage("rename-task <id> <title>"))?;
                Ok(Self::RenameTask {
                    id: id.to_string(),
                    title: title.to_string(),
                })
            }
            "delete" | "rm" => Ok(Self::Delete {
                id: non_empty(rest).ok_or(CommandError::Usage("delete <id>"))?.to_string(),
            }),
            "who" => Ok(Self::Who),
            "name" => Ok(Self::Name {
                name: non_empty(rest).ok_or(CommandError::Usage("name <new name>"))?.to_string(),
            }),
            "invite" => Ok(Self::Invite),
            "copy" => Ok(Self::Copy),
            "status" => Ok(Self::Status),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            _ => Err(CommandError::Unknown(word.to_string())),
        }
    }
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

/// Splits `first rest...`, requiring both parts.
fn split_arg(s: &str) -> Option<(&str, &str)> {
    let (first, rest) = s.split_once(char::is_whitespace)?;
    let rest = rest.trim();
    (!rest.is_empty()).then_some((first, rest))
}

fn known_category(id: &str) -> Result<String, CommandError> {
    let id = id.to_ascii_lowercase();
    if category::find(&id).is_some() {
        Ok(id)
    } else {
        Err(CommandError::UnknownCategory(id))
    }
}

/// What running a command produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    /// Lines to print.
    pub lines: Vec<String>,
    /// The user asked to leave.
    pub quit: bool,
}

impl Reply {
    fn line(text: impl Into<String>) -> Self {
        Self {
            lines: vec![text.into()],
            quit: false,
        }
    }
}

/// Runs `command` against `session`.
///
/// Every command counts as a key press for presence. Failures are reported
/// as reply lines, never as errors.
pub fn execute(session: &Session, command: Command, clipboard: &dyn Clipboard) -> Reply {
    session.record_activity(ActivityKind::KeyPress);
    match command {
        Command::List { category } => Reply {
            lines: render_tasks(&session.tasks().tasks(), category.as_deref()),
            quit: false,
        },
        Command::Add { category, title } => {
            match session.tasks().add(NewTask::idle(title, category)) {
                Ok(id) => Reply::line(format!("added [{}]", tasks::short_id(&id))),
                Err(e) => task_error(&e),
            }
        }
        Command::Cycle { id } => with_task(session, &id, |task| {
            match session.tasks().cycle(&task.id) {
                Ok(Some(status)) => Reply::line(format!("{} is now {}", task.title, status.label())),
                Ok(None) => Reply::line(format!("task [{id}] disappeared")),
                Err(e) => task_error(&e),
            }
        }),
        Command::RenameTask { id, title } => with_task(session, &id, |task| {
            match session.tasks().update(&task.id, TaskPatch::title(title.as_str())) {
                Ok(()) => Reply::line("task renamed"),
                Err(e) => task_error(&e),
            }
        }),
        Command::Delete { id } => with_task(session, &id, |task| {
            match session.tasks().delete(&task.id) {
                Ok(()) => Reply::line(format!("deleted {}", task.title)),
                Err(e) => task_error(&e),
            }
        }),
        Command::Who => Reply {
            lines: render_roster(&session.presence().roster()),
            quit: false,
        },
        Command::Name { name } => match session.rename(&name) {
            Ok(name) => Reply::line(format!("you are now {name}")),
            Err(e) => Reply::line(e.to_string()),
        },
        Command::Invite => Reply {
            lines: vec![
                format!("workspace: {}", session.workspace_id()),
                format!("invite link: {}", session.invite_link()),
            ],
            quit: false,
        },
        Command::Copy => {
            if session.copy_invite_link(clipboard) {
                Reply::line("invite link copied")
            } else {
                Reply::default()
            }
        }
        Command::Status => Reply::line(session.status().label()),
        Command::Help => Reply {
            lines: HELP.lines().map(str::to_string).collect(),
            quit: false,
        },
        Command::Quit => Reply {
            lines: Vec::new(),
            quit: true,
        },
    }
}

fn with_task(session: &Session, fragment: &str, f: impl FnOnce(&Task) -> Reply) -> Reply {
    let tasks = session.tasks().tasks();
    match tasks::find_by_fragment(&tasks, fragment) {
        Some(task) => f(task),
        None => Reply::line(format!("no single task matches [{fragment}]")),
    }
}

fn task_error(e: &TaskError) -> Reply {
    tracing::debug!(error = %e, "task command failed");
    Reply::line(e.to_string())
}

const fn status_marker(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Idle => "[ ]",
        TaskStatus::InProgress => "[~]",
        TaskStatus::Done => "[x]",
    }
}

/// Renders the task list grouped by catalog category.
#[must_use]
pub fn render_tasks(all: &[Task], only: Option<&str>) -> Vec<String> {
    let mut lines = Vec::new();
    let categories = CATEGORIES.iter().filter(|c| only.is_none_or(|id| c.id == id));
    for Category { id, name, icon, .. } in categories {
        let in_category = tasks::tasks_in_category(all, id);
        lines.push(format!("{} {name} ({})", icon.glyph(), in_category.len()));
        if in_category.is_empty() {
            lines.push("    no tasks yet".to_string());
        }
        for task in in_category {
            lines.push(format!(
                "    {} {:<8}  {}",
                status_marker(task.status),
                tasks::short_id(&task.id),
                task.title
            ));
        }
    }

    let uncategorised: Vec<&Task> = all
        .iter()
        .filter(|task| category::find(&task.category).is_none())
        .filter(|task| only.is_none_or(|id| task.category == id))
        .collect();
    for task in uncategorised {
        lines.push(format!(
            "{} {} {:<8}  {} ({})",
            category::icon_for(&task.category).glyph(),
            status_marker(task.status),
            tasks::short_id(&task.id),
            task.title,
            task.category
        ));
    }
    lines
}

/// Formats a millisecond timestamp as local wall-clock time.
#[must_use]
pub fn format_time(ms: u64, format: &str) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .map_or_else(
            || "?".to_string(),
            |t| t.with_timezone(&Local).format(format).to_string(),
        )
}

fn roster_line(entry: &RosterEntry) -> String {
    let you = if entry.is_self { " (You)" } else { "" };
    format!(
        "  ({}) {}{you}  {}, last seen {}",
        entry.avatar.initials,
        entry.name,
        entry.status,
        format_time(entry.last_activity, "%H:%M")
    )
}

/// Renders the roster, local participant first.
#[must_use]
pub fn render_roster(roster: &Roster) -> Vec<String> {
    let mut lines = vec![roster.online_label(), roster_line(&roster.me)];
    lines.extend(roster.visible.iter().map(roster_line));
    if let Some(more) = roster.overflow_label() {
        lines.push(format!("  {more} more"));
    }
    lines
}
