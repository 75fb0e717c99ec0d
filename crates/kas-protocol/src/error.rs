use thiserror::Error;

/// Errors raised while talking to an exploration backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("invalid backend address '{address}': {reason}")]
    InvalidBackend { address: String, reason: String },

    #[error("unknown explorer kind '{0}' (expected search_space or algorithm)")]
    UnknownExplorer(String),

    #[error("unknown download mode '{0}' (expected relative or raw)")]
    UnknownDownloadMode(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed explorer response: {0}")]
    Decode(String),
}
