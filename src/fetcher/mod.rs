pub mod http_fetcher;
pub mod parallel;

use std::time::Duration;

use async_trait::async_trait;

use crate::app::Result;
use crate::config::FeedConfig;
use crate::domain::NewsItem;
use crate::normalizer::Normalizer;
use crate::store::CacheStore;

pub use http_fetcher::HttpFetcher;
pub use parallel::ParallelFetcher;

/// How long a cached feed body is served before fetching again.
pub const FEED_CACHE_MAX_AGE: Duration = Duration::from_secs(15 * 60);

#[async_trait]
pub trait Fetcher {
    /// Fetch the raw body at `url`.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Fetch and normalize one feed, serving the body from `cache` when a fresh
/// entry exists. A failed cache write is logged and does not fail the fetch.
pub async fn fetch_feed(
    fetcher: &(dyn Fetcher + Send + Sync),
    normalizer: &Normalizer,
    feed: &FeedConfig,
    cache: Option<&(dyn CacheStore + Send + Sync)>,
) -> Result<Vec<NewsItem>> {
    let cached = cache.and_then(|c| c.get_cache_file(&feed.url, FEED_CACHE_MAX_AGE));

    let body = match cached {
        Some(body) => body,
        None => {
            tracing::debug!(url = %feed.url, "Fetching feed");
            let body = fetcher.fetch(&feed.url).await?;
            if let Some(cache) = cache {
                if let Err(e) = cache.set_cache_file(&feed.url, &body) {
                    tracing::warn!(url = %feed.url, error = %e, "Failed to cache feed");
                }
            }
            body
        }
    };

    normalizer.normalize(feed, &body)
}


#[cfg(test)]
mod tests {
    use super::mock::{rss, MockFetcher};
    use super::*;
    use crate::store::FeedCache;
    use chrono::Utc;
    use tempfile::TempDir;

    const URL: &str = "https://example.com/feed.xml";

    #[test]
    fn test_fetch_without_cache() {
        let fetcher = MockFetcher::default().with(URL, &rss("Hello", "h1", "Mon, 01 Jul 2024 10:00:00 +0000"));
        let feed = FeedConfig::new("Example", URL);

        let items = tokio_test::block_on(fetch_feed(&fetcher, &Normalizer::new(), &feed, None)).unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Hello");
        assert_eq!(items[0].feed_name, "Example");
        assert_eq!(fetcher.calls(), 1);
    }

    #[test]
    fn test_fresh_cache_skips_network() {
        let dir = TempDir::new().unwrap();
        let cache = FeedCache::new(dir.path(), false);
        let fetcher = MockFetcher::default().with(URL, &rss("Live", "l1", "Mon, 01 Jul 2024 10:00:00 +0000"));
        let feed = FeedConfig::new("Example", URL);

        let first = tokio_test::block_on(fetch_feed(&fetcher, &Normalizer::new(), &feed, Some(&cache))).unwrap();
        let second = tokio_test::block_on(fetch_feed(&fetcher, &Normalizer::new(), &feed, Some(&cache))).unwrap();

        assert_eq!(first, second);
        assert_eq!(fetcher.calls(), 1);
    }

    #[test]
    fn test_stale_cache_refetches() {
        let dir = TempDir::new().unwrap();
        let cache = FeedCache::new(dir.path(), false);
        let stale = rss("Stale", "s1", "Mon, 01 Jul 2024 10:00:00 +0000");
        cache
            .set_cache_file_at(URL, stale.as_bytes(), Utc::now() - chrono::Duration::hours(1))
            .unwrap();
        let fetcher = MockFetcher::default().with(URL, &rss("Live", "l1", "Mon, 01 Jul 2024 10:00:00 +0000"));
        let feed = FeedConfig::new("Example", URL);

        let items = tokio_test::block_on(fetch_feed(&fetcher, &Normalizer::new(), &feed, Some(&cache))).unwrap();

        assert_eq!(items[0].title, "Live");
        assert_eq!(fetcher.calls(), 1);
    }

    #[test]
    fn test_cache_write_failure_still_returns_items() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file").unwrap();
        let cache = FeedCache::new(&blocker, false);
        let fetcher = MockFetcher::default().with(URL, &rss("Hello", "h1", "Mon, 01 Jul 2024 10:00:00 +0000"));
        let feed = FeedConfig::new("Example", URL);

        let items = tokio_test::block_on(fetch_feed(&fetcher, &Normalizer::new(), &feed, Some(&cache))).unwrap();

        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_fetch_error_propagates() {
        let fetcher = MockFetcher::default();
        let feed = FeedConfig::new("Example", URL);

        let result = tokio_test::block_on(fetch_feed(&fetcher, &Normalizer::new(), &feed, None));
        assert!(result.is_err());
    }
}
