//! Decides once per process where read status and feed cache live.
//!
//! Root always gets the system-wide locations, created on demand. Everyone
//! else gets them only if both can be written; otherwise the locator falls
//! back to per-user storage, but never silently: it warns, and in interactive
//! mode asks for an explicit yes first.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::config::EnvSnapshot;
use crate::store::{StorageError, StorageResult};

pub const SYSTEM_STATUS_FILE: &str = "/var/lib/informant/read_status.json";
pub const SYSTEM_CACHE_DIR: &str = "/var/cache/informant";

const USER_STATUS_FILE: &str = ".informant_read_status.json";
const USER_CACHE_DIR: &str = ".informant_cache";
const WRITE_TEST_FILE: &str = ".informant_test_write";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    pub status_file: PathBuf,
    pub cache_dir: PathBuf,
}

impl StoragePaths {
    pub fn system() -> Self {
        Self {
            status_file: PathBuf::from(SYSTEM_STATUS_FILE),
            cache_dir: PathBuf::from(SYSTEM_CACHE_DIR),
        }
    }

    pub fn per_user(config_dir: &Path) -> Self {
        Self {
            status_file: config_dir.join(USER_STATUS_FILE),
            cache_dir: config_dir.join(USER_CACHE_DIR),
        }
    }
}

/// Resolved storage locations. Immutable once the locator has decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageHandle {
    paths: StoragePaths,
    system_wide: bool,
}

impl StorageHandle {
    pub fn new(paths: StoragePaths, system_wide: bool) -> Self {
        Self { paths, system_wide }
    }

    pub fn status_file(&self) -> &Path {
        &self.paths.status_file
    }

    pub fn cache_dir(&self) -> &Path {
        &self.paths.cache_dir
    }

    pub fn is_system_wide(&self) -> bool {
        self.system_wide
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackMode {
    /// Warn and require a `y`/`yes` answer before using per-user storage.
    Interactive,
    /// Warn and continue; used where nobody can answer, e.g. the pacman hook.
    NonInteractive,
}

/// How the locator talks to the user about falling back.
pub trait Prompter {
    fn warn(&self, message: &str);
    fn confirm(&self, question: &str) -> bool;
}

/// Warnings on stderr, answers from stdin. Blocks until a line is read.
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn warn(&self, message: &str) {
        eprintln!("Warning: {}", message);
    }

    fn confirm(&self, question: &str) -> bool {
        eprint!("{} [y/N]: ", question);
        let _ = io::stderr().flush();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }

        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

pub struct StorageLocator {
    system: StoragePaths,
    elevated: bool,
    env: EnvSnapshot,
    mode: FallbackMode,
    prompter: Box<dyn Prompter>,
}

impl StorageLocator {
    pub fn new(env: EnvSnapshot, mode: FallbackMode) -> Self {
        Self {
            system: StoragePaths::system(),
            elevated: is_elevated(),
            env,
            mode,
            prompter: Box::new(TerminalPrompter),
        }
    }

    pub fn with_system_paths(mut self, paths: StoragePaths) -> Self {
        self.system = paths;
        self
    }

    pub fn with_elevated(mut self, elevated: bool) -> Self {
        self.elevated = elevated;
        self
    }

    pub fn with_prompter<P: Prompter + 'static>(mut self, prompter: P) -> Self {
        self.prompter = Box::new(prompter);
        self
    }

    pub fn locate(&self) -> StorageResult<StorageHandle> {
        if self.elevated {
            create_system_dirs(&self.system)?;
            tracing::debug!("Running privileged, using system-wide storage");
            return Ok(StorageHandle::new(self.system.clone(), true));
        }

        if can_use_system_storage(&self.system) {
            tracing::debug!("System-wide storage is writable");
            return Ok(StorageHandle::new(self.system.clone(), true));
        }

        let warning = format!(
            "Cannot write to system-wide storage ({})\n\
             Falling back to per-user storage. This means read status won't be shared between users.",
            self.system.status_file.display()
        );
        tracing::warn!(
            status_file = %self.system.status_file.display(),
            "Falling back to per-user storage"
        );
        self.prompter.warn(&warning);

        if self.mode == FallbackMode::Interactive
            && !self.prompter.confirm("Continue with per-user storage?")
        {
            return Err(StorageError::UserDeclined);
        }

        let config_dir = self
            .env
            .user_config_dir()
            .ok_or(StorageError::NoConfigDir)?;
        let paths = StoragePaths::per_user(&config_dir);

        fs::create_dir_all(&paths.cache_dir).map_err(|source| StorageError::StorageInit {
            path: paths.cache_dir.clone(),
            source,
        })?;

        tracing::debug!(
            status_file = %paths.status_file.display(),
            cache_dir = %paths.cache_dir.display(),
            "Using per-user storage"
        );
        Ok(StorageHandle::new(paths, false))
    }
}

#[cfg(unix)]
pub(crate) fn is_elevated() -> bool {
    nix::unistd::geteuid().is_root()
}

#[cfg(not(unix))]
pub(crate) fn is_elevated() -> bool {
    false
}

fn init_error(path: &Path) -> impl FnOnce(io::Error) -> StorageError {
    let path = path.to_path_buf();
    move |source| StorageError::StorageInit { path, source }
}

/// Both directories end up world-writable: saves replace the status file by
/// renaming a temp file created next to it, so every user needs write access
/// to its directory, not just to the file.
fn create_system_dirs(paths: &StoragePaths) -> StorageResult<()> {
    if let Some(lib_dir) = paths.status_file.parent() {
        create_dir_all_with_mode(lib_dir, 0o755).map_err(init_error(lib_dir))?;
        set_mode(lib_dir, 0o777).map_err(init_error(lib_dir))?;
    }

    create_dir_all_with_mode(&paths.cache_dir, 0o755).map_err(init_error(&paths.cache_dir))?;
    set_mode(&paths.cache_dir, 0o777).map_err(init_error(&paths.cache_dir))?;

    Ok(())
}

#[cfg(unix)]
fn create_dir_all_with_mode(dir: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(mode).create(dir)
}

#[cfg(not(unix))]
fn create_dir_all_with_mode(dir: &Path, _mode: u32) -> io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

/// Both the status file location and the cache directory must be writable.
fn can_use_system_storage(paths: &StoragePaths) -> bool {
    status_file_writable(&paths.status_file) && dir_accepts_writes(&paths.cache_dir)
}

/// The file itself, when present, and its directory, where saves create
/// their temp file.
fn status_file_writable(path: &Path) -> bool {
    // Open without truncating; the handle is dropped straight away
    if path.exists() && fs::OpenOptions::new().write(true).open(path).is_err() {
        return false;
    }

    path.parent().is_some_and(dir_accepts_writes)
}

fn dir_accepts_writes(dir: &Path) -> bool {
    let marker = dir.join(WRITE_TEST_FILE);
    match fs::write(&marker, b"test") {
        Ok(()) => {
            let _ = fs::remove_file(&marker);
            true
        }
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "Directory is not writable");
            false
        }
    }
}
