pub mod commands;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::cli::commands::parse_duration;

#[derive(Parser)]
#[command(name = "informant")]
#[command(version, about = "An Arch Linux news reader and pacman hook", long_about = None)]
pub struct Cli {
    /// Config file to use instead of searching the default locations
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Never prompt; fall back to per-user storage with a warning
    #[arg(long, global = true)]
    pub no_confirm: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List news items, newest first
    List {
        /// Only show unread items
        #[arg(long)]
        unread: bool,

        /// Show oldest first
        #[arg(long)]
        reverse: bool,
    },
    /// Read news items and mark them as read
    Read {
        /// Index from `list` or part of a title
        item: Option<String>,

        /// Mark every unread item as read without displaying it
        #[arg(long, conflicts_with = "item")]
        all: bool,
    },
    /// Exit with the number of unread items; meant for the pacman hook
    Check,
    /// Browse news in a terminal UI
    Tui,
    /// Install the pacman hook (requires root)
    Install {
        /// Overwrite an existing hook
        #[arg(short, long)]
        force: bool,
    },
    /// Remove the pacman hook (requires root)
    Uninstall,
    /// Forget read marks older than the given age
    Cleanup {
        /// Age such as "90d", "12h", "30m" or plain seconds
        #[arg(long, default_value = "90d", value_parser = parse_duration)]
        older_than: Duration,
    },
}
