//! Runs the session reducer and performs its effects.
//!
//! Each request is sent from its own tokio task and reports back over a
//! channel. Requests are never cancelled or queued, so completions are
//! reduced in whatever order they arrive.

use std::sync::Arc;

use tokio::sync::mpsc;

use kas_protocol::{ExplorerResponse, ProtocolError};
use kas_session::{Effect, Event, OutboundRequest, RequestSeq, Session};

use crate::client::ExplorerBackend;
use crate::download::DownloadOpener;

/// Result of one request, tagged with its sequence number.
#[derive(Debug)]
pub struct Completion {
    pub seq: RequestSeq,
    pub result: Result<ExplorerResponse, ProtocolError>,
}

pub struct ExplorerController {
    session: Session,
    backend: Arc<dyn ExplorerBackend>,
    opener: Box<dyn DownloadOpener>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl ExplorerController {
    pub fn new(
        session: Session,
        backend: Arc<dyn ExplorerBackend>,
        opener: Box<dyn DownloadOpener>,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            session,
            backend,
            opener,
            completions_tx,
            completions_rx,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Reduce `event` and perform the resulting effects. Must be called
    /// from within a tokio runtime.
    pub fn dispatch(&mut self, event: Event) {
        let session = std::mem::take(&mut self.session);
        let (session, effects) = session.reduce(event);
        self.session = session;
        for effect in effects {
            self.perform(effect);
        }
    }

    /// Apply every completion that has already arrived. Returns how many.
    pub fn drain_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.apply(completion);
            applied += 1;
        }
        applied
    }

    /// Wait for the next completion and apply it. Returns `false` when
    /// nothing is in flight.
    pub async fn next_completion(&mut self) -> bool {
        if self.session.in_flight() == 0 {
            return false;
        }
        match self.completions_rx.recv().await {
            Some(completion) => {
                self.apply(completion);
                true
            }
            None => false,
        }
    }

    /// Wait until every request sent so far has completed.
    pub async fn settle(&mut self) {
        while self.next_completion().await {}
    }

    fn apply(&mut self, completion: Completion) {
        let Completion { seq, result } = completion;
        match result {
            Ok(response) => self.dispatch(Event::ResponseReceived { seq, response }),
            Err(error) => {
                tracing::warn!(seq, %error, "explorer request failed");
                self.dispatch(Event::RequestFailed { seq, error });
            }
        }
    }

    fn perform(&mut self, effect: Effect) {
        match effect {
            Effect::SendRequest(request) => self.spawn_request(request),
            Effect::OpenDownload(url) => {
                tracing::info!(%url, "opening download");
                if let Err(e) = self.opener.open(&url) {
                    tracing::warn!(%url, error = %e, "failed to open download");
                    self.dispatch(Event::LogMessage(format!("Could not open {url}: {e}")));
                }
            }
        }
    }

    fn spawn_request(&self, request: OutboundRequest) {
        let backend = Arc::clone(&self.backend);
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = match request.endpoint() {
                Ok(endpoint) => backend.explore(&endpoint, &request.body).await,
                Err(e) => Err(e),
            };
            // The receiver lives as long as the controller.
            let _ = tx.send(Completion {
                seq: request.seq,
                result,
            });
        });
    }
}
