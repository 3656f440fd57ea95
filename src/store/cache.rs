//! On-disk cache of raw feed bodies, one JSON file per feed URL.
//!
//! Entries expire lazily: a lookup compares the stored timestamp against the
//! caller's max-age and ignores stale entries, which stay on disk until the
//! next successful fetch of the same URL overwrites them.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::store::locator::StorageHandle;
use crate::store::{within_max_age, CacheStore, StorageError, StorageResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    pub timestamp: DateTime<Utc>,
    /// Source URL, kept for debugging only.
    pub url: String,
}

pub struct FeedCache {
    cache_dir: PathBuf,
    shared: bool,
}

impl FeedCache {
    pub fn new<P: Into<PathBuf>>(cache_dir: P, shared: bool) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            shared,
        }
    }

    pub fn open(handle: &StorageHandle) -> Self {
        Self::new(handle.cache_dir(), handle.is_system_wide())
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path of the cache file for `url`. Depends only on the exact URL string.
    pub fn cache_file_path(&self, url: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", fingerprint(url)))
    }

    /// Read the stored entry for `url`, ignoring its age.
    pub fn read_entry(&self, url: &str) -> Option<CacheEntry> {
        let path = self.cache_file_path(url);
        let data = fs::read(&path).ok()?;

        match serde_json::from_slice(&data) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Ignoring unreadable cache entry");
                None
            }
        }
    }

    pub fn get_cache_file_at(
        &self,
        url: &str,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Option<Vec<u8>> {
        let entry = self.read_entry(url)?;

        if !within_max_age(now, entry.timestamp, max_age) {
            tracing::debug!(url, cached_at = %entry.timestamp, "Cache entry expired");
            return None;
        }

        tracing::debug!(url, cached_at = %entry.timestamp, "Cache hit");
        Some(entry.data)
    }

    pub fn set_cache_file_at(&self, url: &str, data: &[u8], now: DateTime<Utc>) -> StorageResult<()> {
        let path = self.cache_file_path(url);
        let entry = CacheEntry {
            data: data.to_vec(),
            timestamp: now,
            url: url.to_string(),
        };

        let json = serde_json::to_vec(&entry).map_err(|e| StorageError::CacheWrite {
            path: path.clone(),
            source: e.into(),
        })?;

        self.write_entry(&path, &json)
            .map_err(|source| StorageError::CacheWrite { path, source })
    }

    fn write_entry(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.cache_dir)?;

        // Unique per process: several users may refresh the shared cache at once
        let temp_path = path.with_extension(format!("{}.tmp", std::process::id()));
        let written = write_file(&temp_path, contents, self.shared)
            .and_then(|_| fs::rename(&temp_path, path));

        if written.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        written
    }
}

impl CacheStore for FeedCache {
    fn get_cache_file(&self, url: &str, max_age: Duration) -> Option<Vec<u8>> {
        self.get_cache_file_at(url, max_age, Utc::now())
    }

    fn set_cache_file(&self, url: &str, data: &[u8]) -> StorageResult<()> {
        self.set_cache_file_at(url, data, Utc::now())
    }
}

/// Lower-hex SHA-256 of the URL string, used as the cache file stem.
pub fn fingerprint(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

fn write_file(path: &Path, contents: &[u8], shared: bool) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(contents)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if shared {
            fs::set_permissions(path, fs::Permissions::from_mode(0o666))?;
        }
    }
    #[cfg(not(unix))]
    let _ = shared;

    Ok(())
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<T, S>(data: T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: AsRef<[u8]>,
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(data.as_ref()))
    }

    /// Accepts `null` as empty data.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(encoded) => STANDARD.decode(encoded.as_bytes()).map_err(de::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}
