use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use informant::app::{AppContext, Result};
use informant::config::{Config, EnvSnapshot, FeedConfig};
use informant::fetcher::Fetcher;
use informant::store::{
    CacheStore, FallbackMode, FeedCache, ReadStore, StatusStore, StorageLocator, StoragePaths,
};

const FEED_URL: &str = "https://archlinux.org/feeds/news/";

const NEWS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Arch Linux: Recent news updates</title>
    <item>
      <title>Newer</title>
      <link>https://archlinux.org/news/newer/</link>
      <pubDate>Tue, 02 Jul 2024 10:00:00 +0000</pubDate>
      <description>Second</description>
    </item>
    <item>
      <title>Older</title>
      <link>https://archlinux.org/news/older/</link>
      <pubDate>Mon, 01 Jul 2024 10:00:00 +0000</pubDate>
      <description>First</description>
    </item>
  </channel>
</rss>"#;

struct CountingFetcher {
    calls: AtomicUsize,
}

#[async_trait]
impl Fetcher for CountingFetcher {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(NEWS.as_bytes().to_vec())
    }
}

fn unwritable_system(root: &Path) -> StoragePaths {
    let blocker = root.join("blocker");
    fs::write(&blocker, "not a directory").unwrap();
    StoragePaths {
        status_file: blocker.join("read_status.json"),
        cache_dir: blocker.join("cache"),
    }
}

fn user_env(config_dir: &Path) -> EnvSnapshot {
    EnvSnapshot {
        home: None,
        xdg_config_home: Some(config_dir.to_path_buf()),
        home_config_exists: false,
        config_file: None,
    }
}

#[test]
fn test_per_user_fallback_persists_across_runs() {
    let root = TempDir::new().unwrap();
    let config_dir = root.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let system = unwritable_system(root.path());
    let locate = || {
        StorageLocator::new(user_env(&config_dir), FallbackMode::NonInteractive)
            .with_system_paths(system.clone())
            .with_elevated(false)
            .locate()
            .unwrap()
    };

    let handle = locate();
    assert!(!handle.is_system_wide());
    assert_eq!(
        handle.status_file(),
        config_dir.join(".informant_read_status.json")
    );
    assert!(handle.cache_dir().is_dir());

    {
        let store = StatusStore::open(&handle).unwrap();
        store.mark_as_read("https://archlinux.org/news/older/").unwrap();
        let cache = FeedCache::open(&handle);
        cache.set_cache_file(FEED_URL, NEWS.as_bytes()).unwrap();
    }

    let handle = locate();
    let store = StatusStore::open(&handle).unwrap();
    assert!(store.is_read("https://archlinux.org/news/older/"));
    assert!(!store.is_read("https://archlinux.org/news/newer/"));
    assert_eq!(store.read_count(), 1);

    let cache = FeedCache::open(&handle);
    assert_eq!(
        cache.get_cache_file(FEED_URL, Duration::from_secs(900)),
        Some(NEWS.as_bytes().to_vec())
    );

    assert_eq!(store.cleanup(Duration::from_secs(3600)).unwrap(), 0);
    assert_eq!(store.cleanup(Duration::ZERO).unwrap(), 1);
}

#[test]
fn test_context_collects_items_through_cache() {
    let root = TempDir::new().unwrap();
    let config_dir = root.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let handle = StorageLocator::new(user_env(&config_dir), FallbackMode::NonInteractive)
        .with_system_paths(unwritable_system(root.path()))
        .with_elevated(false)
        .locate()
        .unwrap();

    let fetcher = Arc::new(CountingFetcher {
        calls: AtomicUsize::new(0),
    });
    let config = Config {
        feeds: vec![FeedConfig::new("Arch Linux News", FEED_URL)],
    };
    let ctx = AppContext::from_handle(config, handle, fetcher.clone()).unwrap();

    let items = tokio_test::block_on(ctx.collect_items(true));
    let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["Newer", "Older"]);
    assert_eq!(items[0].id, "https://archlinux.org/news/newer/");

    // Served from the cache the second time
    tokio_test::block_on(ctx.collect_items(true));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

    // Live fetch ignores the cache
    tokio_test::block_on(ctx.collect_items(false));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);

    ctx.store.mark_as_read(&items[1].id).unwrap();
    let reopened = StatusStore::open(&ctx.handle).unwrap();
    assert!(reopened.is_read("https://archlinux.org/news/older/"));
}
