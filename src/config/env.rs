//! Snapshot of the process environment that storage and config discovery
//! depend on, so path resolution stays a pure function.

use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    pub home: Option<PathBuf>,
    pub xdg_config_home: Option<PathBuf>,
    /// Whether `~/.config` exists.
    pub home_config_exists: bool,
    /// Config file in use, if one was found.
    pub config_file: Option<PathBuf>,
}

impl EnvSnapshot {
    pub fn capture() -> Self {
        let home = dirs::home_dir();
        let xdg_config_home = std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let home_config_exists = home
            .as_ref()
            .is_some_and(|h| h.join(".config").is_dir());

        Self {
            home,
            xdg_config_home,
            home_config_exists,
            config_file: None,
        }
    }

    pub fn with_config_file(mut self, config_file: Option<PathBuf>) -> Self {
        self.config_file = config_file;
        self
    }

    /// Directory for per-user state: next to the config file in use, else
    /// `$XDG_CONFIG_HOME`, else `~/.config` when it exists, else `~`.
    pub fn user_config_dir(&self) -> Option<PathBuf> {
        if let Some(file) = &self.config_file {
            return Some(match file.parent() {
                Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
                _ => PathBuf::from("."),
            });
        }

        if let Some(xdg) = &self.xdg_config_home {
            return Some(xdg.clone());
        }

        let home = self.home.as_ref()?;
        if self.home_config_exists {
            Some(home.join(".config"))
        } else {
            Some(home.clone())
        }
    }

    /// Directories searched for a config file, in priority order.
    pub fn config_search_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        if let Some(home) = &self.home {
            dirs.push(home.clone());
        }
        if let Some(xdg) = &self.xdg_config_home {
            dirs.push(xdg.clone());
        }
        dirs.push(PathBuf::from("/etc"));
        dirs.push(PathBuf::from("."));
        dirs
    }
}
