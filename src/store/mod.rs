pub mod cache;
pub mod locator;
pub mod status;

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};

pub use cache::FeedCache;
pub use locator::{FallbackMode, StorageHandle, StorageLocator, StoragePaths};
pub use status::{ReadStatus, StatusStore};

pub trait ReadStore {
    fn is_read(&self, item_id: &str) -> bool;
    fn mark_as_read(&self, item_id: &str) -> StorageResult<()>;
    fn mark_as_unread(&self, item_id: &str) -> StorageResult<()>;
    fn read_time(&self, item_id: &str) -> Option<DateTime<Utc>>;
    fn read_count(&self) -> usize;
    /// Drop read marks older than `max_age`, returning how many were removed.
    fn cleanup(&self, max_age: Duration) -> StorageResult<usize>;
}

/// Raw feed body cache consulted before any network fetch.
///
/// Lookups never fail: absent, corrupt and expired entries all read as `None`.
pub trait CacheStore {
    fn get_cache_file(&self, url: &str, max_age: Duration) -> Option<Vec<u8>>;
    fn set_cache_file(&self, url: &str, data: &[u8]) -> StorageResult<()>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to initialize storage at {path}: {source}")]
    StorageInit {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("User declined to use per-user storage")]
    UserDeclined,

    #[error("Could not determine a configuration directory for per-user storage")]
    NoConfigDir,

    #[error("Failed to load read status from {path}: {source}")]
    Load {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to save read status to {path}: {source}")]
    Save {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write cache file {path}: {source}")]
    CacheWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Whether `age` still falls inside `max_age`. Exactly `max_age` old counts as
/// fresh; negative ages from clock skew count as fresh too.
pub(crate) fn within_max_age(now: DateTime<Utc>, stamp: DateTime<Utc>, max_age: Duration) -> bool {
    match now.signed_duration_since(stamp).to_std() {
        Ok(age) => age <= max_age,
        Err(_) => true,
    }
}
