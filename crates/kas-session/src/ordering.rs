use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sequence number stamped on every outbound request, increasing per session.
pub type RequestSeq = u64;

/// Which responses are applied when several requests are in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseOrdering {
    /// Every response is applied as it arrives; the last one to land wins.
    #[default]
    LastArrival,
    /// Responses older than the newest applied one are discarded.
    LatestRequest,
}

impl ResponseOrdering {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseOrdering::LastArrival => "last-arrival",
            ResponseOrdering::LatestRequest => "latest-request",
        }
    }

    /// Whether a response for `seq` may be applied after `last_applied`.
    pub fn accepts(&self, seq: RequestSeq, last_applied: Option<RequestSeq>) -> bool {
        match (self, last_applied) {
            (ResponseOrdering::LastArrival, _) | (_, None) => true,
            (ResponseOrdering::LatestRequest, Some(last)) => seq >= last,
        }
    }
}

impl fmt::Display for ResponseOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResponseOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "last-arrival" => Ok(ResponseOrdering::LastArrival),
            "latest-request" => Ok(ResponseOrdering::LatestRequest),
            other => Err(format!(
                "unknown response ordering '{other}' (expected last-arrival or latest-request)"
            )),
        }
    }
}
