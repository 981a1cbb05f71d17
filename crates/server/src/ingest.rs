//! The refresh cycle: fetch the latest feed, decode, normalize, and
//! replace the cached collection.
//!
//! The cache write is a single `set` for the whole collection, so readers
//! only ever observe complete snapshots of one feed file. A failed cycle
//! returns before that write and leaves previously cached data untouched:
//! staleness is preferred over emptiness.

use std::sync::Arc;

use listafeed_core::CacheStore;
use listafeed_core::cache::NS_PROPERTIES;
use listafeed_feed::parser::{decode, normalize};
use listafeed_feed::{FeedFormat, FeedSource, Property};

use crate::error::RefreshError;

/// Cache key holding the full property collection.
pub const COLLECTION_KEY: &str = "all";

/// Runs refresh cycles against one feed source and one cache store.
pub struct Ingestor {
    source: Arc<dyn FeedSource>,
    cache: Arc<CacheStore>,
}

impl Ingestor {
    pub fn new(source: Arc<dyn FeedSource>, cache: Arc<CacheStore>) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    /// Execute one full refresh cycle and return the ingested collection.
    ///
    /// # Errors
    ///
    /// Transport and batch-level parse failures abort the cycle; the
    /// existing cached collection is not modified.
    pub async fn refresh(&self) -> Result<Vec<Property>, RefreshError> {
        let (entry, bytes) = self.source.fetch_latest().await?;
        let format = FeedFormat::from_name(&entry.name)?;
        let tree = decode(&bytes, format)?;
        let properties = normalize(&tree)?;

        self.cache
            .set_json(NS_PROPERTIES, COLLECTION_KEY, &properties, 0)?;

        tracing::info!(feed = %entry.name, count = properties.len(), "refreshed property collection");
        Ok(properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingSource, StaticSource};
    use std::time::Duration;

    fn cache() -> Arc<CacheStore> {
        Arc::new(CacheStore::new([(NS_PROPERTIES, Duration::from_secs(1800))]))
    }

    const FEED: &str = r#"{"properties": [
        {"id": "a", "price": "100000", "city": "Sevilla"},
        {"id": "b", "price": "200000", "city": "Sevilla"},
        {"id": "c", "price": "300000", "city": "Sevilla"},
        {"id": "d", "city": "Sevilla"}
    ]}"#;

    #[tokio::test]
    async fn test_refresh_populates_cache() {
        let cache = cache();
        let ingestor = Ingestor::new(Arc::new(StaticSource::json(FEED)), cache.clone());

        let properties = ingestor.refresh().await.unwrap();
        assert_eq!(properties.len(), 4);
        // A record without a price is kept with the documented default.
        assert_eq!(properties[3].operation.price, 0);

        let cached: Vec<Property> = cache.get_json(NS_PROPERTIES, COLLECTION_KEY).unwrap().unwrap();
        assert_eq!(cached, properties);
    }

    #[tokio::test]
    async fn test_failed_refresh_leaves_cache_untouched() {
        let cache = cache();
        let ingestor = Ingestor::new(Arc::new(StaticSource::json(FEED)), cache.clone());
        ingestor.refresh().await.unwrap();
        let before = cache.get(NS_PROPERTIES, COLLECTION_KEY).unwrap();

        let failing = Ingestor::new(Arc::new(FailingSource::timeout()), cache.clone());
        assert!(failing.refresh().await.is_err());

        let after = cache.get(NS_PROPERTIES, COLLECTION_KEY).unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_unparseable_feed_aborts_cycle() {
        let cache = cache();
        let ingestor = Ingestor::new(
            Arc::new(StaticSource::new("broken.xml", "<properties><property>")),
            cache.clone(),
        );
        let result = ingestor.refresh().await;
        assert!(matches!(result, Err(RefreshError::Parse(_))));
        assert_eq!(cache.get(NS_PROPERTIES, COLLECTION_KEY).unwrap(), None);
    }
}
