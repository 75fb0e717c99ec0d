//! Text commands shared by both skins.
//!
//! The dashboard accepts them with a leading `/`, the plain prompt without.

use kas_protocol::{ExplorerKind, ExplorerPredicate};
use kas_session::{Event, Session, SessionError};

pub const COMMAND_HELP: &[(&str, &str)] = &[
    ("backend <url>", "set the backend address (no request is sent)"),
    ("explorer <search_space|algorithm>", "switch explorer and load its help"),
    ("apply", "connect: load help for the current explorer"),
    ("root", "go to the root state"),
    ("up", "go to the parent state"),
    ("crumb <index>", "go to breadcrumb <index> (0 = Root)"),
    ("child <value|#index>", "descend into a child"),
    ("run <predicate>", "run an action, prompting for its arguments"),
    ("show", "print the current state"),
    ("help", "list commands"),
    ("quit", "leave the explorer"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Backend(String),
    Explorer(ExplorerKind),
    Apply,
    Root,
    Up,
    Crumb(usize),
    Child(ChildRef),
    Run(String),
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildRef {
    Index(usize),
    Value(String),
}

/// What a command turns into against the current session.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Dispatch(Event),
    Collect(ExplorerPredicate),
    Show,
    Help,
    Quit,
}

/// Parse one input line. Empty lines give `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    let line = line.strip_prefix('/').unwrap_or(line);
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };

    let needs_arg = |usage: &str| {
        if rest.is_empty() {
            Err(format!("usage: {usage}"))
        } else {
            Ok(rest.to_string())
        }
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "backend" => Command::Backend(needs_arg("backend <url>")?),
        "explorer" => {
            let kind = needs_arg("explorer <search_space|algorithm>")?;
            Command::Explorer(kind.parse().map_err(|e: kas_protocol::ProtocolError| e.to_string())?)
        }
        "apply" | "connect" => Command::Apply,
        "root" => Command::Root,
        "up" | ".." => Command::Up,
        "crumb" => {
            let index = needs_arg("crumb <index>")?;
            Command::Crumb(
                index
                    .parse()
                    .map_err(|_| format!("'{index}' is not a breadcrumb index"))?,
            )
        }
        "child" | "cd" => {
            let target = needs_arg("child <value|#index>")?;
            match target.strip_prefix('#') {
                Some(n) => Command::Child(ChildRef::Index(
                    n.parse().map_err(|_| format!("'{target}' is not a child index"))?,
                )),
                None => Command::Child(ChildRef::Value(target)),
            }
        }
        "run" => Command::Run(needs_arg("run <predicate>")?),
        "show" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command '{other}' (try help)")),
    };
    Ok(Some(command))
}

impl Command {
    /// Resolve against `session`. Selections that do not exist are errors
    /// and send nothing.
    pub fn resolve(self, session: &Session) -> Result<Action, SessionError> {
        let action = match self {
            Command::Backend(address) => Action::Dispatch(Event::SetBackend(address)),
            Command::Explorer(kind) => Action::Dispatch(Event::SetExplorerKind(kind)),
            Command::Apply => Action::Dispatch(Event::ApplyHelp),
            Command::Root => Action::Dispatch(session.select_breadcrumb(0)?),
            Command::Up => {
                let parent = session.path().len().saturating_sub(1);
                Action::Dispatch(session.select_breadcrumb(parent)?)
            }
            Command::Crumb(index) => Action::Dispatch(session.select_breadcrumb(index)?),
            Command::Child(ChildRef::Index(index)) => Action::Dispatch(session.select_child(index)?),
            Command::Child(ChildRef::Value(value)) => {
                Action::Dispatch(session.select_child_value(&value)?)
            }
            Command::Run(name) => Action::Collect(session.predicate(&name)?.clone()),
            Command::Show => Action::Show,
            Command::Help => Action::Help,
            Command::Quit => Action::Quit,
        };
        Ok(action)
    }
}
