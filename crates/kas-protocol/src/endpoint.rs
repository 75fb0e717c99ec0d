//! Backend address handling.
//!
//! The backend address is whatever the user typed. It is only parsed when a
//! request is about to be sent, so an invalid address surfaces at the action
//! that uses it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{EXPLORER_QUERY_PARAM, EXPLORE_PATH};
use crate::{ExplorerKind, ProtocolError};

/// Destination of one exploration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    backend: Url,
    kind: ExplorerKind,
}

impl Endpoint {
    pub fn new(backend: &str, kind: ExplorerKind) -> Result<Self, ProtocolError> {
        let invalid = |reason: String| ProtocolError::InvalidBackend {
            address: backend.to_string(),
            reason,
        };
        let url = Url::parse(backend.trim()).map_err(|e| invalid(e.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(invalid("address cannot carry a path".into()));
        }
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        Ok(Self { backend: url, kind })
    }

    pub fn backend(&self) -> &Url {
        &self.backend
    }

    pub fn kind(&self) -> ExplorerKind {
        self.kind
    }

    /// `<backend>/explore?explorer=<kind>`, keeping any path prefix of the backend.
    pub fn explore_url(&self) -> Url {
        let mut url = self.backend.clone();
        let path = format!("{}/{}", url.path().trim_end_matches('/'), EXPLORE_PATH);
        url.set_path(&path);
        url.set_fragment(None);
        url.query_pairs_mut()
            .clear()
            .append_pair(EXPLORER_QUERY_PARAM, self.kind.as_str());
        url
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.explore_url())
    }
}

/// How a `download_url` from a response is turned into something to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DownloadMode {
    /// `<backend>/<download_url>`.
    #[default]
    Relative,
    /// `download_url` as sent.
    Raw,
}

impl DownloadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadMode::Relative => "relative",
            DownloadMode::Raw => "raw",
        }
    }
}

impl fmt::Display for DownloadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DownloadMode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relative" => Ok(DownloadMode::Relative),
            "raw" => Ok(DownloadMode::Raw),
            _ => Err(ProtocolError::UnknownDownloadMode(s.to_string())),
        }
    }
}

/// Resolve a response's `download_url` against the backend address.
pub fn resolve_download(backend: &str, download_url: &str, mode: DownloadMode) -> String {
    match mode {
        DownloadMode::Raw => download_url.to_string(),
        DownloadMode::Relative => format!(
            "{}/{}",
            backend.trim().trim_end_matches('/'),
            download_url.trim_start_matches('/')
        ),
    }
}
