use thiserror::Error;

use crate::config::ConfigError;
use crate::store::StorageError;

#[derive(Error, Debug)]
pub enum InformantError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Hook error: {0}")]
    Hook(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, InformantError>;
