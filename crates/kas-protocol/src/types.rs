use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{HELP_PREDICATE, NAVIGATE_PREDICATE, ROOT_LABEL};
use crate::ProtocolError;

/// Which explorer the backend should answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExplorerKind {
    /// Browse the whole search space.
    #[default]
    SearchSpace,
    /// Browse the decisions of a specific search algorithm.
    Algorithm,
}

impl ExplorerKind {
    pub const ALL: [ExplorerKind; 2] = [ExplorerKind::SearchSpace, ExplorerKind::Algorithm];

    /// Name used on the wire (`explorer=` query parameter).
    pub fn as_str(&self) -> &'static str {
        match self {
            ExplorerKind::SearchSpace => "search_space",
            ExplorerKind::Algorithm => "algorithm",
        }
    }

    /// Human-readable name for selectors.
    pub fn display_name(&self) -> &'static str {
        match self {
            ExplorerKind::SearchSpace => "Search Space",
            ExplorerKind::Algorithm => "Algorithm-Specific",
        }
    }

    /// The other kind. Used by selectors that toggle.
    pub fn toggled(&self) -> Self {
        match self {
            ExplorerKind::SearchSpace => ExplorerKind::Algorithm,
            ExplorerKind::Algorithm => ExplorerKind::SearchSpace,
        }
    }
}

impl fmt::Display for ExplorerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExplorerKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "search_space" => Ok(ExplorerKind::SearchSpace),
            "algorithm" => Ok(ExplorerKind::Algorithm),
            _ => Err(ProtocolError::UnknownExplorer(s.to_string())),
        }
    }
}

/// Root-relative sequence of path segments. The empty path is the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NavigationPath(Vec<String>);

impl NavigationPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The first `len` segments, or `None` if the path is shorter than that.
    pub fn truncated(&self, len: usize) -> Option<Self> {
        self.0.get(..len).map(|s| Self(s.to_vec()))
    }

    /// A new path with `segment` appended.
    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        Self(segments)
    }

    /// Breadcrumb labels: the root label followed by every segment.
    /// Clicking label `i` navigates to `truncated(i)`.
    pub fn breadcrumbs(&self) -> Vec<&str> {
        std::iter::once(ROOT_LABEL)
            .chain(self.0.iter().map(String::as_str))
            .collect()
    }
}

impl fmt::Display for NavigationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.breadcrumbs().join(" / "))
    }
}

impl<S: Into<String>> FromIterator<S> for NavigationPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Body posted to `/explore`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerRequest {
    pub state: NavigationPath,
    pub predicate: String,
    pub args: Vec<String>,
}

impl ExplorerRequest {
    /// Ask for the predicate set and help text at `state`.
    pub fn help(state: NavigationPath) -> Self {
        Self {
            state,
            predicate: HELP_PREDICATE.to_string(),
            args: Vec::new(),
        }
    }

    /// Plain navigation to `state`.
    pub fn navigate(state: NavigationPath) -> Self {
        Self {
            state,
            predicate: NAVIGATE_PREDICATE.to_string(),
            args: Vec::new(),
        }
    }

    pub fn predicate(state: NavigationPath, name: &str, args: Vec<String>) -> Self {
        Self {
            state,
            predicate: name.to_string(),
            args,
        }
    }
}

/// A backend-defined action with prompts for its extra arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerPredicate {
    pub name: String,
    #[serde(default)]
    pub additional_args: Vec<String>,
}

/// A candidate next path segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerChild {
    pub value: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Body returned by `/explore`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerResponse {
    pub state: NavigationPath,
    pub valid: bool,
    pub info: String,
    #[serde(default)]
    pub children: Vec<ExplorerChild>,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    /// Only sent in answer to `help`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_predicates: Option<Vec<ExplorerPredicate>>,
    /// Only sent in answer to `help`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_message: Option<String>,
}

impl ExplorerResponse {
    /// Decode a response body.
    pub fn from_slice(body: &[u8]) -> Result<Self, ProtocolError> {
        serde_json::from_slice(body).map_err(|e| ProtocolError::Decode(e.to_string()))
    }
}
