/// Predicate that asks the backend for its predicate set and help text.
pub const HELP_PREDICATE: &str = "help";

/// Predicate sent when only the navigation state changes.
pub const NAVIGATE_PREDICATE: &str = "";

/// Path segment appended to the backend address for exploration calls.
pub const EXPLORE_PATH: &str = "explore";

/// Query parameter that selects the explorer kind.
pub const EXPLORER_QUERY_PARAM: &str = "explorer";

/// Backend address used until the user enters another one.
pub const DEFAULT_BACKEND: &str = "http://localhost:7070";

/// Label rendered in front of the navigation path.
pub const ROOT_LABEL: &str = "Root";
