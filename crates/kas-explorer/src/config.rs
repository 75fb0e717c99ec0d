//! Explorer configuration.
//!
//! Read from `<config dir>/kas-explorer/config.toml` unless a path is given.
//! Every field is optional; command-line flags override file values.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use kas_protocol::{DownloadMode, ExplorerKind, DEFAULT_BACKEND};
use kas_session::{ResponseOrdering, SessionOptions};

const APP_DIR: &str = "kas-explorer";
const CONFIG_FILE: &str = "config.toml";
const LOG_FILE: &str = "explorer.log";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Which UI to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Skin {
    /// Full-screen terminal dashboard.
    #[default]
    Dashboard,
    /// Line-oriented prompt on stdin/stdout.
    Plain,
}

impl Skin {
    pub fn default_console_capacity(&self) -> usize {
        match self {
            Skin::Dashboard => 5,
            Skin::Plain => 100,
        }
    }

    pub fn default_download_mode(&self) -> DownloadMode {
        match self {
            Skin::Dashboard => DownloadMode::Relative,
            Skin::Plain => DownloadMode::Raw,
        }
    }
}

impl fmt::Display for Skin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Skin::Dashboard => write!(f, "dashboard"),
            Skin::Plain => write!(f, "plain"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExplorerConfig {
    /// Backend address, e.g. `http://localhost:7070`.
    pub backend: String,
    pub explorer: ExplorerKind,
    pub skin: Skin,
    /// Console lines kept. Defaults by skin.
    pub console_capacity: Option<usize>,
    /// Defaults by skin.
    pub download_mode: Option<DownloadMode>,
    pub ordering: ResponseOrdering,
    /// Send `help` as soon as the UI starts.
    pub connect_on_start: bool,
    pub log_file: Option<PathBuf>,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            backend: DEFAULT_BACKEND.to_string(),
            explorer: ExplorerKind::default(),
            skin: Skin::default(),
            console_capacity: None,
            download_mode: None,
            ordering: ResponseOrdering::default(),
            connect_on_start: false,
            log_file: None,
        }
    }
}

impl ExplorerConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from `path`, or from the default location. A missing default
    /// file yields defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::default_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };

        let config: Self =
            toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.clone(), source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.console_capacity == Some(0) {
            return Err(ConfigError::Invalid(
                "console_capacity must be at least 1".into(),
            ));
        }
        if self.backend.trim().is_empty() {
            return Err(ConfigError::Invalid("backend must not be empty".into()));
        }
        Ok(())
    }

    pub fn console_capacity(&self) -> usize {
        self.console_capacity
            .unwrap_or_else(|| self.skin.default_console_capacity())
    }

    pub fn download_mode(&self) -> DownloadMode {
        self.download_mode
            .unwrap_or_else(|| self.skin.default_download_mode())
    }

    /// Where log records go. The dashboard owns the terminal, so it logs to
    /// a file under the cache directory unless told otherwise.
    pub fn log_destination(&self) -> Option<PathBuf> {
        match (&self.log_file, self.skin) {
            (Some(path), _) => Some(path.clone()),
            (None, Skin::Dashboard) => dirs::cache_dir()
                .or_else(|| Some(std::env::temp_dir()))
                .map(|d| d.join(APP_DIR).join(LOG_FILE)),
            (None, Skin::Plain) => None,
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            backend: self.backend.clone(),
            kind: self.explorer,
            console_capacity: self.console_capacity(),
            download_mode: self.download_mode(),
            ordering: self.ordering,
        }
    }
}
