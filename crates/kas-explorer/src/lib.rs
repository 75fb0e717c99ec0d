//! Terminal client for KAS explorer backends.
//!
//! Two skins drive the same [`controller::ExplorerController`]: a full-screen
//! dashboard and a line-oriented prompt.

pub mod client;
pub mod commands;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod download;
pub mod logging;
pub mod plain;

pub use client::{ExplorerBackend, HttpBackend};
pub use config::{ConfigError, ExplorerConfig, Skin};
pub use controller::{Completion, ExplorerController};
pub use download::{BrowserOpener, DownloadOpener};
