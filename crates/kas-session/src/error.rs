use thiserror::Error;

/// Errors from resolving a user selection into a session event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("breadcrumb {index} is out of range (path has {len} segments)")]
    BreadcrumbOutOfRange { index: usize, len: usize },

    #[error("child '{0}' is not offered at this path")]
    UnknownChild(String),

    #[error("predicate '{0}' is not available")]
    UnknownPredicate(String),

    #[error("argument entry for '{0}' was cancelled")]
    ArgumentsCancelled(String),
}
