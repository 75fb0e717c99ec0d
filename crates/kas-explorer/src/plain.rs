//! Line-oriented skin: one command per line on stdin, state printed to stdout.
//!
//! Each command that sends a request waits for every in-flight request to
//! settle before the state is printed again.

use std::io::{self, BufRead, Write};

use kas_session::{collect_arguments, ArgumentPrompter, Event, Session};

use crate::commands::{parse_command, Action, COMMAND_HELP};
use crate::controller::ExplorerController;

/// Answer that abandons an argument prompt.
pub const CANCEL_ANSWER: &str = ":cancel";

/// Consecutive unreadable lines tolerated before giving up on stdin.
const MAX_READ_FAILURES: usize = 3;

pub struct PlainSkin<R, W> {
    controller: ExplorerController,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PlainSkin<R, W> {
    pub fn new(controller: ExplorerController, input: R, output: W) -> Self {
        Self {
            controller,
            input,
            output,
        }
    }

    pub fn controller(&self) -> &ExplorerController {
        &self.controller
    }

    pub fn into_parts(self) -> (ExplorerController, R, W) {
        (self.controller, self.input, self.output)
    }

    /// Read commands until `quit` or end of input. Needs a multi-threaded
    /// runtime because reads block.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        writeln!(self.output, "KAS Explorer (type 'help' for commands)")?;
        self.controller.settle().await;
        render(self.controller.session(), &mut self.output)?;

        let mut read_failures = 0;
        loop {
            write!(self.output, "{}> ", self.controller.session().path())?;
            self.output.flush()?;
            let line = match read_line(&mut self.input) {
                Ok(Some(line)) => {
                    read_failures = 0;
                    line
                }
                Ok(None) => {
                    writeln!(self.output)?;
                    break;
                }
                Err(e) => {
                    read_failures += 1;
                    tracing::warn!(error = %e, read_failures, "failed to read command");
                    writeln!(self.output, "error: could not read input: {e}")?;
                    if read_failures >= MAX_READ_FAILURES {
                        return Err(e.into());
                    }
                    continue;
                }
            };

            let command = match parse_command(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(msg) => {
                    writeln!(self.output, "error: {msg}")?;
                    continue;
                }
            };

            match command.resolve(self.controller.session()) {
                Err(e) => writeln!(self.output, "error: {e}")?,
                Ok(Action::Quit) => break,
                Ok(Action::Help) => {
                    for (usage, what) in COMMAND_HELP {
                        writeln!(self.output, "  {usage:<36} {what}")?;
                    }
                }
                Ok(Action::Show) => render(self.controller.session(), &mut self.output)?,
                Ok(Action::Dispatch(Event::SetBackend(address))) => {
                    self.controller.dispatch(Event::SetBackend(address));
                    writeln!(
                        self.output,
                        "backend set to {} (use 'apply' to connect)",
                        self.controller.session().backend()
                    )?;
                }
                Ok(Action::Dispatch(event)) => self.send(event).await?,
                Ok(Action::Collect(predicate)) => {
                    let mut prompter = LinePrompter {
                        input: &mut self.input,
                        output: &mut self.output,
                    };
                    match collect_arguments(&predicate, &mut prompter) {
                        Ok(event) => self.send(event).await?,
                        Err(e) => writeln!(self.output, "{e}; nothing was sent")?,
                    }
                }
            }
        }
        Ok(())
    }

    async fn send(&mut self, event: Event) -> anyhow::Result<()> {
        self.controller.dispatch(event);
        self.controller.settle().await;
        render(self.controller.session(), &mut self.output)?;
        Ok(())
    }
}

/// Prompts on the same input and output as the command loop. End of input
/// or [`CANCEL_ANSWER`] cancels.
struct LinePrompter<'a, R, W> {
    input: &'a mut R,
    output: &'a mut W,
}

impl<R: BufRead, W: Write> ArgumentPrompter for LinePrompter<'_, R, W> {
    fn prompt(&mut self, prompt: &str) -> Option<String> {
        write!(self.output, "{prompt} > ").ok()?;
        self.output.flush().ok()?;
        match read_line(self.input) {
            Ok(Some(answer)) if answer != CANCEL_ANSWER => Some(answer),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read argument");
                None
            }
        }
    }
}

fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut buf = String::new();
    let read = tokio::task::block_in_place(|| input.read_line(&mut buf))?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(buf.trim_end_matches(['\r', '\n']).to_string()))
}

/// Print the whole session view.
pub fn render<W: Write>(session: &Session, out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        "── {} @ {} ──",
        session.kind().display_name(),
        session.backend()
    )?;
    let validity = match session.valid() {
        Some(true) => "valid",
        Some(false) => "invalid",
        None => "unknown",
    };
    writeln!(out, "State:    {}   ({validity})", session.path())?;

    writeln!(out, "Info:")?;
    for line in session.info().lines() {
        writeln!(out, "  {line}")?;
    }

    let actions: Vec<String> = session
        .predicates()
        .iter()
        .map(|p| {
            if p.additional_args.is_empty() {
                p.name.clone()
            } else {
                format!("{}({})", p.name, p.additional_args.join(", "))
            }
        })
        .collect();
    if actions.is_empty() {
        writeln!(out, "Actions:  (none)")?;
    } else {
        writeln!(out, "Actions:  {}", actions.join(", "))?;
    }

    writeln!(out, "Children:")?;
    if session.children().is_empty() {
        writeln!(out, "  (none)")?;
    }
    for (i, child) in session.children().iter().enumerate() {
        let label = child
            .label
            .as_deref()
            .map(|l| format!(" [{l}]"))
            .unwrap_or_default();
        writeln!(out, "  #{i} {}{label}", child.value)?;
        for line in child.caption.lines() {
            writeln!(out, "      {line}")?;
        }
    }

    writeln!(out, "Console:")?;
    for entry in session.console().newest_first() {
        writeln!(out, "  {}", entry.text)?;
    }

    writeln!(out, "Help:")?;
    for line in session.help_message().lines() {
        writeln!(out, "  {line}")?;
    }

    if let Some(error) = session.last_error() {
        writeln!(out, "Error:    {error}")?;
    }
    Ok(())
}
