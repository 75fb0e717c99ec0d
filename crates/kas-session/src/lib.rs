//! KAS Session - Explorer session state and reducer
//!
//! The session is a plain record. Every user action and every backend
//! completion is an [`Event`]; [`Session::reduce`] folds it into a new
//! session and returns the [`Effect`]s (requests, downloads) the caller
//! must perform. Nothing in this crate does I/O.

pub mod arguments;
pub mod console_log;
pub mod error;
pub mod ordering;
pub mod session;

pub use arguments::{argument_prompt, collect_arguments, ArgumentCollector, ArgumentPrompter, CollectStep};
pub use console_log::{ConsoleEntry, ConsoleLog, CONSOLE_BANNER};
pub use error::SessionError;
pub use ordering::{RequestSeq, ResponseOrdering};
pub use session::{Effect, Event, OutboundRequest, Session, SessionOptions};
