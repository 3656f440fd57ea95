//! Configuration management for Informant.
//!
//! The config file is searched for in `$HOME`, `$XDG_CONFIG_HOME`, `/etc` and
//! the current directory as `.informantrc.json` or `informantrc.json`, unless
//! `--config` names one explicitly. Files ending in `.toml` are read as TOML,
//! anything else as JSON. Without a file, the Arch Linux news feed is used.

pub mod env;

pub use env::EnvSnapshot;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAMES: [&str; 2] = [".informantrc.json", "informantrc.json"];

pub const DEFAULT_TITLE_KEY: &str = "title";
pub const DEFAULT_BODY_KEY: &str = "summary";
pub const DEFAULT_TIMESTAMP_KEY: &str = "published";

/// One RSS/Atom feed to follow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "title-key", default)]
    pub title_key: String,
    #[serde(rename = "body-key", default)]
    pub body_key: String,
    #[serde(rename = "timestamp-key", default)]
    pub timestamp_key: String,
}

impl FeedConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            title_key: DEFAULT_TITLE_KEY.to_string(),
            body_key: DEFAULT_BODY_KEY.to_string(),
            timestamp_key: DEFAULT_TIMESTAMP_KEY.to_string(),
        }
    }

    fn fill_defaults(&mut self) {
        if self.title_key.is_empty() {
            self.title_key = DEFAULT_TITLE_KEY.to_string();
        }
        if self.body_key.is_empty() {
            self.body_key = DEFAULT_BODY_KEY.to_string();
        }
        if self.timestamp_key.is_empty() {
            self.timestamp_key = DEFAULT_TIMESTAMP_KEY.to_string();
        }
    }
}

/// Main configuration struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feeds: Vec<FeedConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feeds: vec![FeedConfig::new(
                "Arch Linux News",
                "https://archlinux.org/feeds/news/",
            )],
        }
    }
}

impl Config {
    /// Find the config file to use: `explicit` if given, otherwise the first
    /// existing candidate in the search directories.
    pub fn discover(explicit: Option<&Path>, env: &EnvSnapshot) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        env.config_search_dirs()
            .into_iter()
            .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
            .find(|candidate| candidate.is_file())
    }

    /// Load from `path`, or fall back to the defaults when there is no file.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let is_toml = path.extension().is_some_and(|ext| ext == "toml");
        let config: Config = if is_toml {
            toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        };

        tracing::debug!(path = %path.display(), feeds = config.feeds.len(), "Loaded config");
        config.finalize()
    }

    /// Fill in default field keys and reject feeds without a usable URL.
    fn finalize(mut self) -> Result<Self, ConfigError> {
        for feed in &mut self.feeds {
            feed.fill_defaults();

            if feed.url.is_empty() {
                return Err(ConfigError::Invalid("feed URL cannot be empty".into()));
            }
            url::Url::parse(&feed.url)
                .map_err(|e| ConfigError::Invalid(format!("feed URL {}: {}", feed.url, e)))?;
        }

        Ok(self)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
