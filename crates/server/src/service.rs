//! On-demand read path for request handlers.
//!
//! Lookup order: cached collection, coalesced re-ingestion of the feed,
//! partner per-property lookup, and finally a visibly-tagged placeholder.
//! A reader always gets a record; only a cold cache combined with failing
//! upstreams produces the placeholder. Cache-layer errors degrade to
//! misses and are never surfaced to the caller.
//!
//! Concurrent lookups for the same missing data coalesce into a single
//! upstream call per key, for both the collection refresh and partner
//! lookups.

use std::sync::Arc;

use listafeed_core::cache::NS_PROPERTIES;
use listafeed_core::{CacheStore, SingleFlight};
use listafeed_feed::partner::PropertyLookup;
use listafeed_feed::{Property, TransportError};

use crate::error::RefreshError;
use crate::ingest::{COLLECTION_KEY, Ingestor};

/// Serves property reads from cache, refilling through the coalescer.
pub struct PropertyService {
    cache: Arc<CacheStore>,
    ingestor: Arc<Ingestor>,
    collection_flight: SingleFlight<Result<Vec<Property>, RefreshError>>,
    partner_flight: SingleFlight<Result<Option<Property>, TransportError>>,
    partner: Option<Arc<dyn PropertyLookup>>,
}

impl PropertyService {
    pub fn new(ingestor: Arc<Ingestor>, partner: Option<Arc<dyn PropertyLookup>>) -> Self {
        let cache = ingestor.cache().clone();
        Self {
            cache,
            ingestor,
            collection_flight: SingleFlight::new(),
            partner_flight: SingleFlight::new(),
            partner,
        }
    }

    /// The full cached collection, re-ingesting the feed on a miss.
    ///
    /// # Errors
    ///
    /// Fails only when the cache is cold and the feed cannot be fetched
    /// or parsed.
    pub async fn list_properties(&self) -> Result<Vec<Property>, RefreshError> {
        if let Some(properties) = self.cached_collection() {
            return Ok(properties);
        }
        let ingestor = self.ingestor.clone();
        self.collection_flight
            .run("properties:all", || async move { ingestor.refresh().await })
            .await
    }

    /// Resolve one property, never failing the caller: when every
    /// upstream source is down, the result is a placeholder record
    /// tagged via [`Property::placeholder`].
    pub async fn get_property(&self, id: &str) -> Property {
        match self.list_properties().await {
            Ok(properties) => {
                if let Some(property) = properties.into_iter().find(|p| p.id == id) {
                    return property;
                }
            }
            Err(err) => {
                tracing::warn!(id, %err, "collection unavailable for lookup");
            }
        }

        if let Some(property) = self.partner_lookup(id).await {
            return property;
        }

        tracing::warn!(id, "no upstream source resolved property, serving placeholder");
        Property::placeholder(id)
    }

    fn cached_collection(&self) -> Option<Vec<Property>> {
        match self.cache.get_json(NS_PROPERTIES, COLLECTION_KEY) {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(%err, "cache read failed, treating as miss");
                None
            }
        }
    }

    async fn partner_lookup(&self, id: &str) -> Option<Property> {
        let partner = self.partner.clone()?;

        // Partner hits are cached under their own id until the next
        // refresh window.
        match self.cache.get_json::<Property>(NS_PROPERTIES, id) {
            Ok(Some(property)) => return Some(property),
            Ok(None) => {}
            Err(err) => tracing::warn!(id, %err, "cache read failed, treating as miss"),
        }

        let key = format!("partner:{id}");
        let owned_id = id.to_owned();
        let result = self
            .partner_flight
            .run(&key, || async move { partner.lookup(&owned_id).await })
            .await;

        match result {
            Ok(Some(property)) => {
                if let Err(err) = self.cache.set_json(NS_PROPERTIES, id, &property, 0) {
                    tracing::warn!(id, %err, "failed to cache partner record");
                }
                Some(property)
            }
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(id, %err, "partner lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingSource, StaticSource};
    use async_trait::async_trait;
    use listafeed_core::cache::NS_PROPERTIES;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    const FEED: &str = r#"{"properties": [
        {"id": "X", "price": "100000", "city": "Sevilla"},
        {"id": "Y", "price": "200000", "city": "Sevilla"}
    ]}"#;

    fn cache() -> Arc<CacheStore> {
        Arc::new(CacheStore::new([(NS_PROPERTIES, Duration::from_secs(1800))]))
    }

    struct CountingPartner {
        calls: AtomicUsize,
        known: Option<&'static str>,
    }

    #[async_trait]
    impl PropertyLookup for CountingPartner {
        async fn lookup(&self, id: &str) -> Result<Option<Property>, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.known {
                Some(known) if known == id => {
                    let record = serde_json::json!({"id": id, "price": "77000", "city": "Bilbao"});
                    Ok(listafeed_feed::parser::normalize_record(&record).ok())
                }
                _ => Ok(None),
            }
        }
    }

    fn service(source: Arc<dyn listafeed_feed::FeedSource>, partner: Option<Arc<dyn PropertyLookup>>) -> PropertyService {
        let ingestor = Arc::new(Ingestor::new(source, cache()));
        PropertyService::new(ingestor, partner)
    }

    #[tokio::test]
    async fn test_cold_cache_lookup_ingests_feed() {
        let source = Arc::new(StaticSource::json(FEED));
        let service = service(source.clone(), None);

        let property = service.get_property("X").await;
        assert_eq!(property.id, "X");
        assert!(!property.placeholder);
        assert_eq!(source.calls(), 1);

        // Second lookup is served from cache.
        let property = service.get_property("Y").await;
        assert_eq!(property.id, "Y");
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_cold_lookups_share_one_fetch() {
        let source = Arc::new(StaticSource::json(FEED).with_delay(Duration::from_millis(200)));
        let service = Arc::new(service(source.clone(), None));

        let started = Instant::now();
        let a = {
            let service = service.clone();
            tokio::spawn(async move { service.get_property("X").await })
        };
        let b = {
            let service = service.clone();
            tokio::spawn(async move { service.get_property("X").await })
        };

        let a = a.await.unwrap();
        let b = b.await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(a, b);
        assert_eq!(source.calls(), 1);
        // Both resolve in roughly one upstream round-trip, not two.
        assert!(elapsed < Duration::from_millis(380), "elapsed = {elapsed:?}");
    }

    #[tokio::test]
    async fn test_unknown_id_falls_back_to_partner() {
        let partner = Arc::new(CountingPartner { calls: AtomicUsize::new(0), known: Some("Z") });
        let service = service(Arc::new(StaticSource::json(FEED)), Some(partner.clone()));

        let property = service.get_property("Z").await;
        assert_eq!(property.id, "Z");
        assert_eq!(property.address.city, "Bilbao");
        assert!(!property.placeholder);
        assert_eq!(partner.calls.load(Ordering::SeqCst), 1);

        // Partner hit is cached; no second partner call.
        let property = service.get_property("Z").await;
        assert_eq!(property.address.city, "Bilbao");
        assert_eq!(partner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_all_sources_down_serves_placeholder() {
        let service = service(Arc::new(FailingSource::timeout()), None);

        let property = service.get_property("X").await;
        assert!(property.placeholder);
        assert_eq!(property.id, "X");
    }

    #[tokio::test]
    async fn test_unknown_id_without_partner_serves_placeholder() {
        let service = service(Arc::new(StaticSource::json(FEED)), None);

        let property = service.get_property("nope").await;
        assert!(property.placeholder);
    }

    #[tokio::test]
    async fn test_stale_feed_failure_still_serves_cached_data() {
        let cache = cache();
        let good = Arc::new(Ingestor::new(Arc::new(StaticSource::json(FEED)), cache.clone()));
        good.refresh().await.unwrap();

        // Upstream is now failing, but the cached collection survives.
        let failing = Arc::new(Ingestor::new(Arc::new(FailingSource::timeout()), cache));
        let service = PropertyService::new(failing, None);

        let property = service.get_property("X").await;
        assert!(!property.placeholder);
        assert_eq!(property.id, "X");
    }

    #[tokio::test]
    async fn test_list_properties_cold_failure_is_error() {
        let service = service(Arc::new(FailingSource::empty_listing()), None);
        let result = service.list_properties().await;
        assert!(result.is_err());
    }
}
