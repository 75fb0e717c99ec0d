//! Session record and reducer.
//!
//! Path, info, children and predicates are only ever taken from backend
//! responses. The one local write is the optimistic path set by
//! [`Event::NavigateTo`], which the response overwrites when it lands.
//!
//! A `help` request resets the console once its response has been applied,
//! so messages from that response are dropped. A failed `help` leaves the
//! console alone.

use std::collections::BTreeMap;

use kas_protocol::{
    resolve_download, DownloadMode, Endpoint, ExplorerChild, ExplorerKind, ExplorerPredicate,
    ExplorerRequest, ExplorerResponse, NavigationPath, ProtocolError, DEFAULT_BACKEND,
};

use crate::console_log::ConsoleLog;
use crate::ordering::{RequestSeq, ResponseOrdering};
use crate::SessionError;

pub const INITIAL_INFO: &str = "Please set the backend address.";
pub const INITIAL_HELP: &str = "Loading...";

/// Settings a session starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub backend: String,
    pub kind: ExplorerKind,
    pub console_capacity: usize,
    pub download_mode: DownloadMode,
    pub ordering: ResponseOrdering,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            backend: DEFAULT_BACKEND.to_string(),
            kind: ExplorerKind::SearchSpace,
            console_capacity: 5,
            download_mode: DownloadMode::Relative,
            ordering: ResponseOrdering::LastArrival,
        }
    }
}

/// Something that happened to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Change the backend address. Sends nothing.
    SetBackend(String),
    /// Switch explorer and ask it for help at the current path.
    SetExplorerKind(ExplorerKind),
    /// Ask the current explorer for help at the current path.
    ApplyHelp,
    /// Move to a path (optimistically) and ask the backend about it.
    NavigateTo(NavigationPath),
    /// Run a backend predicate at the current path.
    InvokePredicate { name: String, args: Vec<String> },
    /// Append a line to the console.
    LogMessage(String),
    /// A request completed with a decoded response.
    ResponseReceived {
        seq: RequestSeq,
        response: ExplorerResponse,
    },
    /// A request failed.
    RequestFailed { seq: RequestSeq, error: ProtocolError },
}

/// One request the caller must send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub seq: RequestSeq,
    pub backend: String,
    pub kind: ExplorerKind,
    pub body: ExplorerRequest,
}

impl OutboundRequest {
    pub fn endpoint(&self) -> Result<Endpoint, ProtocolError> {
        Endpoint::new(&self.backend, self.kind)
    }
}

/// Side effect produced by the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SendRequest(OutboundRequest),
    /// Open this URL in a new browsing context.
    OpenDownload(String),
}

/// State of one explorer session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    backend: String,
    kind: ExplorerKind,
    path: NavigationPath,
    info: String,
    children: Vec<ExplorerChild>,
    predicates: Vec<ExplorerPredicate>,
    help_message: String,
    console: ConsoleLog,
    valid: Option<bool>,
    last_error: Option<String>,
    download_mode: DownloadMode,
    ordering: ResponseOrdering,
    next_seq: RequestSeq,
    last_applied: Option<RequestSeq>,
    in_flight: usize,
    /// Backend each in-flight request was sent to.
    sent_to: BTreeMap<RequestSeq, String>,
    /// Latest `help` request; its response resets the console.
    pending_help: Option<RequestSeq>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}

impl Session {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            backend: options.backend,
            kind: options.kind,
            path: NavigationPath::root(),
            info: INITIAL_INFO.to_string(),
            children: Vec::new(),
            predicates: Vec::new(),
            help_message: INITIAL_HELP.to_string(),
            console: ConsoleLog::new(options.console_capacity),
            valid: None,
            last_error: None,
            download_mode: options.download_mode,
            ordering: options.ordering,
            next_seq: 1,
            last_applied: None,
            in_flight: 0,
            sent_to: BTreeMap::new(),
            pending_help: None,
        }
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn kind(&self) -> ExplorerKind {
        self.kind
    }

    pub fn path(&self) -> &NavigationPath {
        &self.path
    }

    pub fn info(&self) -> &str {
        &self.info
    }

    pub fn children(&self) -> &[ExplorerChild] {
        &self.children
    }

    pub fn predicates(&self) -> &[ExplorerPredicate] {
        &self.predicates
    }

    pub fn help_message(&self) -> &str {
        &self.help_message
    }

    pub fn console(&self) -> &ConsoleLog {
        &self.console
    }

    /// `valid` flag of the last applied response.
    pub fn valid(&self) -> Option<bool> {
        self.valid
    }

    /// Most recent request failure, cleared by the next applied response.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn download_mode(&self) -> DownloadMode {
        self.download_mode
    }

    pub fn ordering(&self) -> ResponseOrdering {
        self.ordering
    }

    /// Requests sent whose completion has not been reduced yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Event for clicking breadcrumb `index` (0 is the root).
    pub fn select_breadcrumb(&self, index: usize) -> Result<Event, SessionError> {
        self.path
            .truncated(index)
            .map(Event::NavigateTo)
            .ok_or(SessionError::BreadcrumbOutOfRange {
                index,
                len: self.path.len(),
            })
    }

    /// Event for clicking the child at `index`.
    pub fn select_child(&self, index: usize) -> Result<Event, SessionError> {
        self.children
            .get(index)
            .map(|child| Event::NavigateTo(self.path.child(&child.value)))
            .ok_or_else(|| SessionError::UnknownChild(index.to_string()))
    }

    /// Event for clicking the child whose value is `value`.
    pub fn select_child_value(&self, value: &str) -> Result<Event, SessionError> {
        self.children
            .iter()
            .find(|child| child.value == value)
            .map(|child| Event::NavigateTo(self.path.child(&child.value)))
            .ok_or_else(|| SessionError::UnknownChild(value.to_string()))
    }

    pub fn predicate(&self, name: &str) -> Result<&ExplorerPredicate, SessionError> {
        self.predicates
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| SessionError::UnknownPredicate(name.to_string()))
    }

    /// Fold `event` into the session and return the effects to perform.
    pub fn reduce(mut self, event: Event) -> (Session, Vec<Effect>) {
        let mut effects = Vec::new();
        match event {
            Event::SetBackend(address) => {
                self.backend = address;
            }
            Event::SetExplorerKind(kind) => {
                tracing::info!(%kind, backend = %self.backend, "switching explorer");
                self.kind = kind;
                effects.push(self.send_help());
            }
            Event::ApplyHelp => {
                tracing::info!(kind = %self.kind, backend = %self.backend, "connecting");
                effects.push(self.send_help());
            }
            Event::NavigateTo(path) => {
                self.path = path;
                let body = ExplorerRequest::navigate(self.path.clone());
                effects.push(self.send(body));
            }
            Event::InvokePredicate { name, args } => {
                let body = ExplorerRequest::predicate(self.path.clone(), &name, args);
                effects.push(self.send(body));
            }
            Event::LogMessage(text) => {
                self.console.push(&text);
            }
            Event::ResponseReceived { seq, response } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                let sent_to = self.sent_to.remove(&seq);
                let resets_console = self.take_pending_help(seq);
                if !self.ordering.accepts(seq, self.last_applied) {
                    tracing::debug!(
                        seq,
                        last_applied = ?self.last_applied,
                        "discarding stale explorer response"
                    );
                    return (self, effects);
                }
                self.last_applied = Some(seq);
                let backend = sent_to.unwrap_or_else(|| self.backend.clone());
                effects.extend(self.apply_response(response, &backend));
                if resets_console {
                    self.console.reset();
                }
            }
            Event::RequestFailed { seq, error } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.sent_to.remove(&seq);
                self.take_pending_help(seq);
                tracing::debug!(seq, %error, "explorer request failed");
                self.console.push(&format!("Request failed: {error}"));
                self.last_error = Some(error.to_string());
            }
        }
        (self, effects)
    }

    fn send(&mut self, body: ExplorerRequest) -> Effect {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.in_flight += 1;
        self.sent_to.insert(seq, self.backend.clone());
        Effect::SendRequest(OutboundRequest {
            seq,
            backend: self.backend.clone(),
            kind: self.kind,
            body,
        })
    }

    fn send_help(&mut self) -> Effect {
        self.pending_help = Some(self.next_seq);
        self.send(ExplorerRequest::help(self.path.clone()))
    }

    /// Whether `seq` is the pending `help` request. Clears it if so.
    fn take_pending_help(&mut self, seq: RequestSeq) -> bool {
        if self.pending_help == Some(seq) {
            self.pending_help = None;
            true
        } else {
            false
        }
    }

    fn apply_response(&mut self, response: ExplorerResponse, backend: &str) -> Option<Effect> {
        let ExplorerResponse {
            state,
            valid,
            info,
            children,
            message,
            download_url,
            available_predicates,
            help_message,
        } = response;

        self.path = state;
        self.valid = Some(valid);
        self.info = info;
        self.children = children;
        self.console.push(&message);
        self.last_error = None;
        if let Some(predicates) = available_predicates {
            self.predicates = predicates;
        }
        if let Some(help) = help_message {
            self.help_message = help;
        }
        download_url
            .filter(|url| !url.is_empty())
            .map(|url| Effect::OpenDownload(resolve_download(backend, &url, self.download_mode)))
    }
}
