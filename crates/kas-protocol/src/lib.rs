//! KAS Protocol - Explorer wire types and endpoint resolution
//!
//! Mirrors the JSON contract spoken by KAS exploration backends:
//! a client posts `{state, predicate, args}` to
//! `<backend>/explore?explorer=<kind>` and receives the new navigation
//! state, descriptive text, children and (for `help`) the predicate set.

pub mod constants;
pub mod endpoint;
pub mod error;
pub mod types;

pub use constants::*;
pub use endpoint::{resolve_download, DownloadMode, Endpoint};
pub use error::*;
pub use types::*;
