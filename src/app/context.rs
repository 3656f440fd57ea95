use std::sync::Arc;

use crate::app::error::Result;
use crate::config::{Config, EnvSnapshot};
use crate::domain::item::{sort_newest_first, NewsItem};
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::parallel::ParallelFetcher;
use crate::fetcher::Fetcher;
use crate::normalizer::Normalizer;
use crate::store::{CacheStore, FallbackMode, FeedCache, StatusStore, StorageHandle, StorageLocator};

pub struct AppContext {
    pub config: Config,
    pub handle: StorageHandle,
    pub store: Arc<StatusStore>,
    pub cache: Arc<FeedCache>,
    pub parallel_fetcher: ParallelFetcher,
}

impl AppContext {
    /// Resolve storage for this run and wire up the HTTP fetcher.
    pub fn new(config: Config, env: EnvSnapshot, mode: FallbackMode) -> Result<Self> {
        let handle = StorageLocator::new(env, mode).locate()?;
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new()?);
        Self::from_handle(config, handle, fetcher)
    }

    pub fn from_handle(
        config: Config,
        handle: StorageHandle,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
    ) -> Result<Self> {
        tracing::debug!(
            status_file = %handle.status_file().display(),
            cache_dir = %handle.cache_dir().display(),
            system_wide = handle.is_system_wide(),
            "Using storage"
        );

        let store = Arc::new(StatusStore::open(&handle)?);
        let cache = Arc::new(FeedCache::open(&handle));
        let parallel_fetcher = ParallelFetcher::new(fetcher, Normalizer::new());

        Ok(Self {
            config,
            handle,
            store,
            cache,
            parallel_fetcher,
        })
    }

    /// Fetch every configured feed and return all items, newest first. Feeds
    /// that fail are logged and skipped.
    pub async fn collect_items(&self, use_cache: bool) -> Vec<NewsItem> {
        let cache: Option<Arc<dyn CacheStore + Send + Sync>> = if use_cache {
            Some(self.cache.clone())
        } else {
            None
        };

        let mut items = Vec::new();
        for outcome in self.parallel_fetcher.fetch_all(&self.config.feeds, cache).await {
            match outcome.result {
                Ok(feed_items) => items.extend(feed_items),
                Err(e) => tracing::info!(feed = %outcome.feed_name, "Failed to fetch feed: {}", e),
            }
        }

        sort_newest_first(&mut items);
        items
    }
}
