//! Full-screen explorer dashboard.
//!
//! Shows the breadcrumb state, info text, available actions, the console
//! and the backend's help text on the left, and the children of the
//! current state on the right. Panels are focused with Tab; Enter activates
//! the selected breadcrumb, action or child. Slash commands typed into the
//! input line cover the rest (`/help` lists them).
//!
//! Launch with `kas-explorer --skin dashboard`.

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, Event as TermEvent, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};

use kas_session::{ArgumentCollector, CollectStep, Event, Session};

use crate::commands::{parse_command, Action, COMMAND_HELP};
use crate::controller::ExplorerController;

/// Which panel receives arrow keys and Enter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Input,
    Breadcrumb,
    Actions,
    Children,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Input => Focus::Breadcrumb,
            Focus::Breadcrumb => Focus::Actions,
            Focus::Actions => Focus::Children,
            Focus::Children => Focus::Input,
        }
    }

    fn prev(self) -> Self {
        match self {
            Focus::Input => Focus::Children,
            Focus::Breadcrumb => Focus::Input,
            Focus::Actions => Focus::Breadcrumb,
            Focus::Children => Focus::Actions,
        }
    }
}

/// The dashboard TUI state.
struct Dashboard {
    controller: ExplorerController,
    focus: Focus,
    /// Current text in the input field.
    input: String,
    /// Cursor position within the input field, in chars.
    cursor_pos: usize,
    /// Command history for up/down arrow navigation.
    history: Vec<String>,
    /// Current position in history (`None` = current input).
    history_pos: Option<usize>,
    breadcrumb_sel: usize,
    action_sel: usize,
    child_sel: usize,
    /// Argument prompt in progress, if any.
    prompt: Option<ArgumentCollector>,
    /// One-line feedback shown above the input.
    status: Option<(String, Color)>,
    quit: bool,
}

impl Dashboard {
    fn new(controller: ExplorerController) -> Self {
        Self {
            controller,
            focus: Focus::Input,
            input: String::new(),
            cursor_pos: 0,
            history: Vec::new(),
            history_pos: None,
            breadcrumb_sel: 0,
            action_sel: 0,
            child_sel: 0,
            prompt: None,
            status: Some((
                "Type /apply to connect, /help for commands, Tab to move between panels.".into(),
                Color::DarkGray,
            )),
            quit: false,
        }
    }

    fn session(&self) -> &Session {
        self.controller.session()
    }

    fn set_status(&mut self, msg: impl Into<String>, color: Color) {
        self.status = Some((msg.into(), color));
    }

    /// Keep selections inside the current lists after a response lands.
    fn clamp_selections(&mut self) {
        let s = self.controller.session();
        let crumbs = s.path().len() + 1;
        let actions = s.predicates().len();
        let children = s.children().len();
        self.breadcrumb_sel = self.breadcrumb_sel.min(crumbs - 1);
        self.action_sel = self.action_sel.min(actions.saturating_sub(1));
        self.child_sel = self.child_sel.min(children.saturating_sub(1));
    }

    fn dispatch(&mut self, event: Event) {
        if let Event::NavigateTo(path) = &event {
            self.breadcrumb_sel = path.len();
            self.child_sel = 0;
        }
        self.controller.dispatch(event);
    }

    /// Process the input line: an argument answer or a command.
    fn submit_input(&mut self) {
        let text = std::mem::take(&mut self.input);
        self.cursor_pos = 0;

        if let Some(collector) = self.prompt.take() {
            self.advance_prompt(collector.supply(text));
            return;
        }

        let line = text.trim();
        if line.is_empty() {
            return;
        }
        self.history.push(line.to_string());
        self.history_pos = None;

        let command = match parse_command(line) {
            Ok(Some(command)) => command,
            Ok(None) => return,
            Err(msg) => {
                self.set_status(msg, Color::Yellow);
                return;
            }
        };
        match command.resolve(self.controller.session()) {
            Ok(action) => self.run_action(action),
            Err(e) => self.set_status(e.to_string(), Color::Yellow),
        }
    }

    fn run_action(&mut self, action: Action) {
        match action {
            Action::Dispatch(Event::SetBackend(address)) => {
                self.set_status(
                    format!("Backend set to {address}. /apply to connect."),
                    Color::Cyan,
                );
                self.dispatch(Event::SetBackend(address));
            }
            Action::Dispatch(event) => {
                self.status = None;
                self.dispatch(event);
            }
            Action::Collect(predicate) => self.advance_prompt(ArgumentCollector::start(predicate)),
            Action::Show => self.set_status(
                format!("{} @ {}", self.session().path(), self.session().backend()),
                Color::Cyan,
            ),
            Action::Help => {
                let summary = COMMAND_HELP
                    .iter()
                    .map(|(usage, _)| format!("/{usage}"))
                    .collect::<Vec<_>>()
                    .join("  ");
                self.set_status(summary, Color::Cyan);
            }
            Action::Quit => self.quit = true,
        }
    }

    fn advance_prompt(&mut self, step: CollectStep) {
        match step {
            CollectStep::Ready(event) => {
                self.status = None;
                self.dispatch(event);
            }
            CollectStep::Pending(collector) => {
                self.focus = Focus::Input;
                self.prompt = Some(collector);
            }
        }
    }

    fn cancel_prompt(&mut self) {
        if let Some(collector) = self.prompt.take() {
            let err = collector.cancel();
            self.set_status(format!("{err}; nothing was sent."), Color::Yellow);
            self.input.clear();
            self.cursor_pos = 0;
        }
    }

    /// Activate the selected item of the focused panel.
    fn activate(&mut self) {
        let result = match self.focus {
            Focus::Input => {
                self.submit_input();
                return;
            }
            Focus::Breadcrumb => self
                .session()
                .select_breadcrumb(self.breadcrumb_sel)
                .map(Action::Dispatch),
            Focus::Children => self.session().select_child(self.child_sel).map(Action::Dispatch),
            Focus::Actions => match self.session().predicates().get(self.action_sel) {
                Some(p) => Ok(Action::Collect(p.clone())),
                None => return,
            },
        };
        match result {
            Ok(action) => self.run_action(action),
            Err(e) => self.set_status(e.to_string(), Color::Yellow),
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let s = self.controller.session();
        let (sel, len) = match self.focus {
            Focus::Breadcrumb => (&mut self.breadcrumb_sel, s.path().len() + 1),
            Focus::Actions => (&mut self.action_sel, s.predicates().len()),
            Focus::Children => (&mut self.child_sel, s.children().len()),
            Focus::Input => return,
        };
        if len == 0 {
            return;
        }
        *sel = (*sel as isize + delta).clamp(0, len as isize - 1) as usize;
    }

    /// Handle a key press.
    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            self.quit = true;
            return;
        }

        match code {
            KeyCode::Esc => {
                if self.prompt.is_some() {
                    self.cancel_prompt();
                } else {
                    self.focus = Focus::Input;
                }
                return;
            }
            KeyCode::Tab if self.prompt.is_none() => {
                self.focus = self.focus.next();
                return;
            }
            KeyCode::BackTab if self.prompt.is_none() => {
                self.focus = self.focus.prev();
                return;
            }
            KeyCode::Enter => {
                self.activate();
                return;
            }
            _ => {}
        }

        if self.focus != Focus::Input {
            match code {
                KeyCode::Up | KeyCode::Left => self.move_selection(-1),
                KeyCode::Down | KeyCode::Right => self.move_selection(1),
                KeyCode::Home => self.move_selection(isize::MIN / 2),
                KeyCode::End => self.move_selection(isize::MAX / 2),
                _ => {}
            }
            return;
        }

        match code {
            KeyCode::Char(c) => {
                let at = byte_index(&self.input, self.cursor_pos);
                self.input.insert(at, c);
                self.cursor_pos += 1;
            }
            KeyCode::Backspace => {
                if self.cursor_pos > 0 {
                    self.cursor_pos -= 1;
                    let at = byte_index(&self.input, self.cursor_pos);
                    self.input.remove(at);
                }
            }
            KeyCode::Delete => {
                if self.cursor_pos < self.input.chars().count() {
                    let at = byte_index(&self.input, self.cursor_pos);
                    self.input.remove(at);
                }
            }
            KeyCode::Left => {
                self.cursor_pos = self.cursor_pos.saturating_sub(1);
            }
            KeyCode::Right => {
                if self.cursor_pos < self.input.chars().count() {
                    self.cursor_pos += 1;
                }
            }
            KeyCode::Home => {
                self.cursor_pos = 0;
            }
            KeyCode::End => {
                self.cursor_pos = self.input.chars().count();
            }
            KeyCode::Up if self.prompt.is_none() => {
                if !self.history.is_empty() {
                    let pos = match self.history_pos {
                        Some(p) if p > 0 => p - 1,
                        Some(p) => p,
                        None => self.history.len() - 1,
                    };
                    self.history_pos = Some(pos);
                    self.input = self.history[pos].clone();
                    self.cursor_pos = self.input.chars().count();
                }
            }
            KeyCode::Down if self.prompt.is_none() => {
                if let Some(pos) = self.history_pos {
                    if pos + 1 < self.history.len() {
                        self.history_pos = Some(pos + 1);
                        self.input = self.history[pos + 1].clone();
                    } else {
                        self.history_pos = None;
                        self.input.clear();
                    }
                    self.cursor_pos = self.input.chars().count();
                }
            }
            _ => {}
        }
    }

    /// Render the full dashboard layout.
    fn render(&self, frame: &mut Frame) {
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Status bar
                Constraint::Min(10),   // Panels
                Constraint::Length(4), // Input
            ])
            .split(frame.area());

        self.render_status_bar(frame, outer[0]);
        self.render_panels(frame, outer[1]);
        self.render_input(frame, outer[2]);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let s = self.session();
        let block = Block::default()
            .title(" KAS Explorer ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        let (valid, valid_color) = match s.valid() {
            Some(true) => ("valid", Color::Green),
            Some(false) => ("invalid", Color::Red),
            None => ("-", Color::DarkGray),
        };
        let in_flight = s.in_flight();

        let line = Line::from(vec![
            Span::styled("  Backend: ", Style::default().fg(Color::Gray)),
            Span::styled(s.backend(), Style::default().fg(Color::White)),
            Span::styled("  |  Explorer: ", Style::default().fg(Color::Gray)),
            Span::styled(s.kind().display_name(), Style::default().fg(Color::LightCyan)),
            Span::styled("  |  State: ", Style::default().fg(Color::Gray)),
            Span::styled(valid, Style::default().fg(valid_color)),
            Span::styled("  |  In flight: ", Style::default().fg(Color::Gray)),
            Span::styled(
                in_flight.to_string(),
                Style::default().fg(if in_flight > 0 { Color::Yellow } else { Color::Green }),
            ),
        ]);
        frame.render_widget(Paragraph::new(line).block(block), area);
    }

    fn render_panels(&self, frame: &mut Frame, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(area);

        let console_height = (self.session().console().capacity() as u16).min(10) + 2;
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),              // State
                Constraint::Min(4),                 // Info
                Constraint::Length(5),              // Actions
                Constraint::Length(console_height), // Console
                Constraint::Length(6),              // Help
            ])
            .split(columns[0]);

        self.render_breadcrumb(frame, left[0]);
        self.render_info(frame, left[1]);
        self.render_actions(frame, left[2]);
        self.render_console(frame, left[3]);
        self.render_help(frame, left[4]);
        self.render_children(frame, columns[1]);
    }

    fn panel(&self, title: &'static str, focus: Option<Focus>, color: Color) -> Block<'static> {
        let focused = focus.is_some() && focus == Some(self.focus);
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(if focused {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(color)
            })
    }

    fn render_breadcrumb(&self, frame: &mut Frame, area: Rect) {
        let block = self.panel(" State ", Some(Focus::Breadcrumb), Color::Yellow);
        let mut spans = Vec::new();
        for (i, crumb) in self.session().path().breadcrumbs().into_iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" / ", Style::default().fg(Color::DarkGray)));
            }
            let mut style = Style::default().fg(Color::LightYellow);
            if self.focus == Focus::Breadcrumb && i == self.breadcrumb_sel {
                style = style.add_modifier(Modifier::REVERSED);
            }
            spans.push(Span::styled(crumb.to_string(), style));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
    }

    fn render_info(&self, frame: &mut Frame, area: Rect) {
        let block = self.panel(" Info ", None, Color::LightBlue);
        let paragraph = Paragraph::new(self.session().info().to_string())
            .block(block)
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn render_actions(&self, frame: &mut Frame, area: Rect) {
        let block = self.panel(" Actions ", Some(Focus::Actions), Color::Green);
        let predicates = self.session().predicates();
        if predicates.is_empty() {
            let text = Line::from(Span::styled(
                "  No actions yet. /apply loads them.",
                Style::default().fg(Color::DarkGray),
            ));
            frame.render_widget(Paragraph::new(text).block(block), area);
            return;
        }

        let mut spans = Vec::new();
        for (i, p) in predicates.iter().enumerate() {
            let mut style = Style::default().fg(Color::Black).bg(Color::Green);
            if self.focus == Focus::Actions && i == self.action_sel {
                style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
            }
            spans.push(Span::styled(format!(" {} ", p.name), style));
            spans.push(Span::raw(" "));
        }
        let paragraph = Paragraph::new(Line::from(spans))
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_console(&self, frame: &mut Frame, area: Rect) {
        let block = self.panel(" Console ", None, Color::Magenta);
        let visible = area.height.saturating_sub(2) as usize;
        let lines: Vec<Line> = self
            .session()
            .console()
            .newest_first()
            .take(visible)
            .map(|entry| {
                Line::from(vec![
                    Span::styled(
                        format!("{} ", entry.at.format("%H:%M:%S")),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::styled(entry.text.clone(), Style::default().fg(Color::White)),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let block = self.panel(" Help ", None, Color::DarkGray);
        let paragraph = Paragraph::new(self.session().help_message().to_string())
            .block(block)
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn render_children(&self, frame: &mut Frame, area: Rect) {
        let block = self.panel(" Children ", Some(Focus::Children), Color::Cyan);
        let children = self.session().children();
        if children.is_empty() {
            let text = vec![
                Line::from(""),
                Line::from(Span::styled(
                    "  No children at this state.",
                    Style::default().fg(Color::DarkGray),
                )),
            ];
            frame.render_widget(Paragraph::new(text).block(block), area);
            return;
        }

        let mut lines: Vec<Line> = Vec::new();
        let mut selected_line = 0;
        for (i, child) in children.iter().enumerate() {
            let selected = self.focus == Focus::Children && i == self.child_sel;
            if i == self.child_sel {
                selected_line = lines.len();
            }
            let mut value_style = Style::default().fg(Color::LightCyan).add_modifier(Modifier::BOLD);
            if selected {
                value_style = value_style.add_modifier(Modifier::REVERSED);
            }
            let mut head = vec![Span::styled(format!(" {} ", child.value), value_style)];
            if let Some(label) = &child.label {
                head.push(Span::styled(format!(" [{label}]"), Style::default().fg(Color::Yellow)));
            }
            lines.push(Line::from(head));
            for caption in child.caption.lines() {
                lines.push(Line::from(Span::styled(
                    format!("    {caption}"),
                    Style::default().fg(Color::Gray),
                )));
            }
        }

        // Keep the selected child on screen.
        let visible_height = area.height.saturating_sub(2) as usize;
        let scroll = selected_line.saturating_sub(visible_height.saturating_sub(3));
        let visible: Vec<Line> = lines.into_iter().skip(scroll).take(visible_height).collect();
        frame.render_widget(Paragraph::new(visible).block(block), area);
    }

    fn render_input(&self, frame: &mut Frame, area: Rect) {
        let (title, border) = match &self.prompt {
            Some(c) => (
                format!(" {} of '{}' (Esc cancels) ", c.prompt(), c.predicate_name()),
                Color::LightMagenta,
            ),
            None => (
                " Command (/help) ".to_string(),
                if self.focus == Focus::Input { Color::White } else { Color::DarkGray },
            ),
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border));

        let status = match (&self.status, self.session().last_error()) {
            (Some((msg, color)), _) => Line::from(Span::styled(msg.clone(), Style::default().fg(*color))),
            (None, Some(err)) => Line::from(Span::styled(
                format!("Error: {err}"),
                Style::default().fg(Color::Red),
            )),
            (None, None) => Line::from(""),
        };
        let text = vec![
            Line::from(vec![
                Span::styled("> ", Style::default().fg(Color::Cyan)),
                Span::raw(self.input.clone()),
            ]),
            status,
        ];
        frame.render_widget(Paragraph::new(text).block(block), area);

        if self.focus == Focus::Input {
            frame.set_cursor_position((area.x + 3 + self.cursor_pos as u16, area.y + 1));
        }
    }
}

fn byte_index(s: &str, char_pos: usize) -> usize {
    s.char_indices().nth(char_pos).map(|(i, _)| i).unwrap_or(s.len())
}

/// Set up the terminal for TUI rendering.
fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

/// Restore the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Best-effort terminal restore for the panic path.
fn leave_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Runs `restore` before the previous panic hook while alive. Dropping it
/// reinstates the previous hook.
struct PanicHookGuard {
    previous: Arc<PanicHook>,
}

type PanicHook = Box<dyn Fn(&std::panic::PanicHookInfo<'_>) + Sync + Send + 'static>;

impl PanicHookGuard {
    fn install(restore: fn()) -> Self {
        let previous: Arc<PanicHook> = Arc::new(std::panic::take_hook());
        let chained = Arc::clone(&previous);
        std::panic::set_hook(Box::new(move |panic_info| {
            restore();
            (*chained)(panic_info);
        }));
        Self { previous }
    }
}

impl Drop for PanicHookGuard {
    fn drop(&mut self) {
        // Dropping our hook releases its clone of `previous`.
        drop(std::panic::take_hook());
        let previous = Arc::clone(&self.previous);
        std::panic::set_hook(Box::new(move |panic_info| (*previous)(panic_info)));
    }
}

/// Run the dashboard event loop until the user quits.
pub async fn run_dashboard(controller: ExplorerController) -> Result<(), anyhow::Error> {
    use std::io::IsTerminal;
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        return Err(anyhow::anyhow!(
            "The dashboard requires a terminal (TTY); use --skin plain instead."
        ));
    }

    let _panic_hook = PanicHookGuard::install(leave_terminal);
    let mut terminal = setup_terminal()?;
    let mut dashboard = Dashboard::new(controller);
    let tick_rate = Duration::from_millis(100);

    let result: anyhow::Result<()> = loop {
        if dashboard.controller.drain_completions() > 0 {
            dashboard.clamp_selections();
        }

        if let Err(e) = terminal.draw(|frame| dashboard.render(frame)) {
            break Err(e.into());
        }

        // Let spawned requests make progress between polls.
        let polled = tokio::task::block_in_place(|| event::poll(tick_rate));
        match polled {
            Ok(true) => match event::read() {
                Ok(TermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    dashboard.handle_key(key.code, key.modifiers);
                }
                Ok(_) => {}
                Err(e) => break Err(e.into()),
            },
            Ok(false) => {}
            Err(e) => break Err(e.into()),
        }

        if dashboard.quit {
            break Ok(());
        }
    };

    restore_terminal(&mut terminal)?;
    result
}
