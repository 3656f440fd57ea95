//! The pacman hook that runs `informant check` before every transaction and
//! aborts it while unread news exists.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::app::{InformantError, Result};
use crate::store::locator::is_elevated;

pub const HOOK_PATH: &str = "/usr/share/libalpm/hooks/00-informant.hook";

const HOOK_TEMPLATE: &str = include_str!("informant.hook");
const TEMPLATE_EXEC: &str = "/usr/bin/informant check";

/// The hook file contents, with `Exec` pointing at `exe`.
pub fn render_hook(exe: &Path) -> String {
    HOOK_TEMPLATE.replace(TEMPLATE_EXEC, &format!("{} check", exe.display()))
}

pub fn install(force: bool) -> Result<()> {
    require_root("install")?;
    let exe = current_exe()?;
    let path = Path::new(HOOK_PATH);

    install_at(path, &exe, force)?;
    println!("Installed pacman hook at {}", path.display());
    Ok(())
}

pub fn uninstall() -> Result<()> {
    require_root("uninstall")?;
    let path = Path::new(HOOK_PATH);

    if uninstall_at(path)? {
        println!("Removed pacman hook from {}", path.display());
    } else {
        println!("No pacman hook installed at {}", path.display());
    }
    Ok(())
}

/// Write the hook to `path`. An existing file is only replaced with `force`.
pub fn install_at(path: &Path, exe: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(InformantError::Hook(format!(
            "{} already exists; use --force to overwrite it",
            path.display()
        )));
    }

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, render_hook(exe))?;
    tracing::debug!(path = %path.display(), exe = %exe.display(), "Wrote pacman hook");
    Ok(())
}

/// Remove the hook at `path`. Returns whether there was one.
pub fn uninstall_at(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn require_root(action: &str) -> Result<()> {
    if is_elevated() {
        Ok(())
    } else {
        Err(InformantError::Hook(format!(
            "must be run as root to {} the pacman hook",
            action
        )))
    }
}

fn current_exe() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    Ok(fs::canonicalize(&exe).unwrap_or(exe))
}
