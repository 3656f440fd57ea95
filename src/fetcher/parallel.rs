use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::app::{InformantError, Result};
use crate::config::FeedConfig;
use crate::domain::NewsItem;
use crate::fetcher::{fetch_feed, Fetcher};
use crate::normalizer::Normalizer;
use crate::store::CacheStore;

pub const DEFAULT_WORKERS: usize = 4;

/// Outcome of fetching one configured feed.
#[derive(Debug)]
pub struct FeedOutcome {
    pub feed_name: String,
    pub result: Result<Vec<NewsItem>>,
}

pub struct ParallelFetcher {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    normalizer: Normalizer,
    semaphore: Arc<Semaphore>,
}

impl ParallelFetcher {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>, normalizer: Normalizer) -> Self {
        Self::with_workers(fetcher, normalizer, DEFAULT_WORKERS)
    }

    pub fn with_workers(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        normalizer: Normalizer,
        workers: usize,
    ) -> Self {
        Self {
            fetcher,
            normalizer,
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Fetch every feed concurrently. Outcomes come back in the order of
    /// `feeds`, one per feed.
    pub async fn fetch_all(
        &self,
        feeds: &[FeedConfig],
        cache: Option<Arc<dyn CacheStore + Send + Sync>>,
    ) -> Vec<FeedOutcome> {
        let mut handles = Vec::with_capacity(feeds.len());

        for feed in feeds {
            let fetcher = self.fetcher.clone();
            let normalizer = self.normalizer.clone();
            let semaphore = self.semaphore.clone();
            let cache = cache.clone();
            let feed = feed.clone();

            let handle = tokio::spawn(async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|e| InformantError::Other(e.to_string()))?;

                fetch_feed(fetcher.as_ref(), &normalizer, &feed, cache.as_deref()).await
            });

            handles.push(handle);
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (feed, handle) in feeds.iter().zip(handles) {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(feed = %feed.name, "Task join error: {}", e);
                    Err(InformantError::Other(e.to_string()))
                }
            };
            outcomes.push(FeedOutcome {
                feed_name: feed.name.clone(),
                result,
            });
        }

        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::mock::{rss, MockFetcher};
    use crate::store::FeedCache;
    use tempfile::TempDir;

    fn two_feed_fetcher() -> MockFetcher {
        MockFetcher::default()
            .with(
                "https://a.example/feed",
                &rss("From A", "a1", "Mon, 01 Jul 2024 10:00:00 +0000"),
            )
            .with(
                "https://b.example/feed",
                &rss("From B", "b1", "Tue, 02 Jul 2024 10:00:00 +0000"),
            )
    }

    #[test]
    fn test_outcomes_in_config_order() {
        let feeds = vec![
            FeedConfig::new("B", "https://b.example/feed"),
            FeedConfig::new("A", "https://a.example/feed"),
        ];
        let parallel = ParallelFetcher::new(Arc::new(two_feed_fetcher()), Normalizer::new());

        let outcomes = tokio_test::block_on(parallel.fetch_all(&feeds, None));

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].feed_name, "B");
        assert_eq!(outcomes[0].result.as_ref().unwrap()[0].title, "From B");
        assert_eq!(outcomes[1].feed_name, "A");
        assert_eq!(outcomes[1].result.as_ref().unwrap()[0].title, "From A");
    }

    #[test]
    fn test_one_failure_does_not_sink_others() {
        let feeds = vec![
            FeedConfig::new("A", "https://a.example/feed"),
            FeedConfig::new("Missing", "https://missing.example/feed"),
        ];
        let parallel =
            ParallelFetcher::with_workers(Arc::new(two_feed_fetcher()), Normalizer::new(), 1);

        let outcomes = tokio_test::block_on(parallel.fetch_all(&feeds, None));

        assert!(outcomes[0].result.is_ok());
        assert!(outcomes[1].result.is_err());
    }

    #[test]
    fn test_shared_cache_is_populated() {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(FeedCache::new(dir.path(), false));
        let feeds = vec![FeedConfig::new("A", "https://a.example/feed")];
        let parallel = ParallelFetcher::new(Arc::new(two_feed_fetcher()), Normalizer::new());

        let outcomes = tokio_test::block_on(parallel.fetch_all(&feeds, Some(cache.clone())));

        assert!(outcomes[0].result.is_ok());
        assert!(cache.cache_file_path("https://a.example/feed").exists());
    }
}
