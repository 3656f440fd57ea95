//! Persistent read-status record.
//!
//! The whole record lives in memory behind a readers-writer lock and is
//! rewritten to disk after every mutation. Writes go to `<file>.tmp` next to
//! the status file and are renamed over it, so a concurrent reader never
//! observes a half-written file. There is no cross-process lock: two
//! processes saving at once lose updates, last writer wins.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::locator::StorageHandle;
use crate::store::{within_max_age, ReadStore, StorageError, StorageResult};

/// Mode for the status file when it is shared between users.
#[cfg(unix)]
const SHARED_FILE_MODE: u32 = 0o666;
#[cfg(unix)]
const PRIVATE_FILE_MODE: u32 = 0o644;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadStatus {
    #[serde(default)]
    pub read_items: HashMap<String, DateTime<Utc>>,
    #[serde(default = "Utc::now")]
    pub last_check: DateTime<Utc>,
}

impl ReadStatus {
    pub fn new() -> Self {
        Self {
            read_items: HashMap::new(),
            last_check: Utc::now(),
        }
    }
}

impl Default for ReadStatus {
    fn default() -> Self {
        Self::new()
    }
}

pub struct StatusStore {
    path: PathBuf,
    system_wide: bool,
    status: RwLock<ReadStatus>,
}

impl StatusStore {
    /// Open the status file chosen by the locator.
    pub fn open(handle: &StorageHandle) -> StorageResult<Self> {
        Self::with_path(handle.status_file(), handle.is_system_wide())
    }

    /// Open a status file at an explicit path. A missing file starts empty and
    /// is created by the first save; an unreadable or corrupt one is an error.
    pub fn with_path<P: Into<PathBuf>>(path: P, system_wide: bool) -> StorageResult<Self> {
        let path = path.into();
        let status = Self::load(&path)?.unwrap_or_default();

        tracing::debug!(
            path = %path.display(),
            items = status.read_items.len(),
            "Loaded read status"
        );

        Ok(Self {
            path,
            system_wide,
            status: RwLock::new(status),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_system_wide(&self) -> bool {
        self.system_wide
    }

    pub fn last_check(&self) -> DateTime<Utc> {
        self.read_status().last_check
    }

    pub fn mark_as_read_at(&self, item_id: &str, now: DateTime<Utc>) -> StorageResult<()> {
        let mut status = self.write_status();
        status.read_items.insert(item_id.to_string(), now);
        self.save(&mut status)
    }

    /// Remove every mark older than `max_age` relative to `now`, then save once.
    /// Returns how many marks were removed.
    pub fn cleanup_at(&self, max_age: Duration, now: DateTime<Utc>) -> StorageResult<usize> {
        let mut status = self.write_status();
        let before = status.read_items.len();
        status
            .read_items
            .retain(|_, read_at| within_max_age(now, *read_at, max_age));
        let removed = before - status.read_items.len();

        self.save(&mut status)?;
        tracing::debug!(removed, "Cleaned up read status");
        Ok(removed)
    }

    fn load(path: &Path) -> StorageResult<Option<ReadStatus>> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StorageError::Load {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        let status = serde_json::from_slice(&data).map_err(|e| StorageError::Load {
            path: path.to_path_buf(),
            source: e.into(),
        })?;

        Ok(Some(status))
    }

    fn save(&self, status: &mut ReadStatus) -> StorageResult<()> {
        self.save_with(status, |_| Ok(()))
    }

    /// Serialize `status` and atomically replace the status file with it.
    /// `before_rename` runs once the temp file is fully written.
    fn save_with<F>(&self, status: &mut ReadStatus, before_rename: F) -> StorageResult<()>
    where
        F: FnOnce(&Path) -> io::Result<()>,
    {
        status.last_check = Utc::now();

        let json = serde_json::to_string_pretty(status).map_err(|e| self.save_error(e.into()))?;

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| self.save_error(e))?;
        }

        let temp_path = temp_path_for(&self.path);
        let written = self
            .write_temp(&temp_path, json.as_bytes())
            .and_then(|_| before_rename(&temp_path))
            .and_then(|_| fs::rename(&temp_path, &self.path));

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(self.save_error(e));
        }

        if self.system_wide {
            ensure_shared_mode(&self.path).map_err(|e| self.save_error(e))?;
        }

        Ok(())
    }

    fn write_temp(&self, temp_path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut file = fs::File::create(temp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mode = if self.system_wide {
                SHARED_FILE_MODE
            } else {
                PRIVATE_FILE_MODE
            };
            fs::set_permissions(temp_path, fs::Permissions::from_mode(mode))?;
        }

        Ok(())
    }

    fn save_error(&self, source: io::Error) -> StorageError {
        StorageError::Save {
            path: self.path.clone(),
            source,
        }
    }

    fn read_status(&self) -> RwLockReadGuard<'_, ReadStatus> {
        self.status.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_status(&self) -> RwLockWriteGuard<'_, ReadStatus> {
        self.status.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ReadStore for StatusStore {
    fn is_read(&self, item_id: &str) -> bool {
        self.read_status().read_items.contains_key(item_id)
    }

    fn mark_as_read(&self, item_id: &str) -> StorageResult<()> {
        self.mark_as_read_at(item_id, Utc::now())
    }

    fn mark_as_unread(&self, item_id: &str) -> StorageResult<()> {
        let mut status = self.write_status();
        status.read_items.remove(item_id);
        self.save(&mut status)
    }

    fn read_time(&self, item_id: &str) -> Option<DateTime<Utc>> {
        self.read_status().read_items.get(item_id).copied()
    }

    fn read_count(&self) -> usize {
        self.read_status().read_items.len()
    }

    fn cleanup(&self, max_age: Duration) -> StorageResult<usize> {
        self.cleanup_at(max_age, Utc::now())
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Make the file readable and writable by everyone, touching it only when the
/// mode is not already right.
#[cfg(unix)]
fn ensure_shared_mode(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = fs::metadata(path)?.permissions().mode() & 0o777;
    if mode != SHARED_FILE_MODE {
        fs::set_permissions(path, fs::Permissions::from_mode(SHARED_FILE_MODE))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_shared_mode(_path: &Path) -> io::Result<()> {
    Ok(())
}
