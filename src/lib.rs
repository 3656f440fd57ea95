//! # Informant
//!
//! An Arch Linux news reader that doubles as a pacman hook: `informant check`
//! runs before each transaction and aborts it while there is unread news.
//!
//! ## Architecture
//!
//! ```text
//! Config → StorageLocator → Fetcher (+ FeedCache) → Normalizer → commands / TUI
//!                              ↘ StatusStore (read marks) ↙
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! # List news, newest first
//! informant list
//!
//! # Read unread items one by one
//! informant read
//!
//! # Install the pacman hook
//! sudo informant install
//! ```

/// Application context and error handling.
///
/// [`AppContext`](app::AppContext) wires storage, the fetcher and the
/// configured feeds together for one command run.
pub mod app;

/// Command-line interface using clap.
///
/// - `list [--unread] [--reverse]`
/// - `read [ITEM] [--all]`
/// - `check` - exit code is the number of unread items
/// - `tui`
/// - `install [--force]` / `uninstall`
/// - `cleanup [--older-than AGE]`
pub mod cli;

/// Configuration file discovery and parsing.
pub mod config;

/// Core domain model: [`NewsItem`](domain::NewsItem).
pub mod domain;

/// HTTP fetching with an optional on-disk cache in front.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for feed fetching
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
/// - [`ParallelFetcher`](fetcher::ParallelFetcher): Concurrent fetching with semaphore
pub mod fetcher;

/// The pacman hook file.
pub mod hook;

/// Feed parsing and normalization.
///
/// Converts RSS 0.9x/1.0/2.0, Atom 0.3/1.0, and JSON Feed 1.0
/// into [`NewsItem`](domain::NewsItem) values.
pub mod normalizer;

/// Persistent state: where it lives, read marks, and the feed cache.
///
/// - [`StorageLocator`](store::StorageLocator): picks system-wide or per-user paths
/// - [`StatusStore`](store::StatusStore): read marks, saved atomically
/// - [`FeedCache`](store::FeedCache): raw feed bodies keyed by URL
pub mod store;

/// Terminal user interface built with ratatui.
///
/// Keybindings: j/k navigate, Enter reads, r toggles read, o opens in
/// browser, R refreshes, ? shows help, q goes back or quits.
pub mod tui;
