use crate::{config::Config, record::DomainRecord};
use moka::future::Cache;
use std::time::Duration;
use tracing::debug;

/// In-process memo of successful lookups, keyed by normalized domain.
pub struct CacheService {
    cache: Cache<String, DomainRecord>,
}

impl CacheService {
    pub fn new(config: &Config) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.cache_max_entries)
            .time_to_live(Duration::from_secs(config.cache_ttl_seconds))
            .build();

        Self { cache }
    }

    pub async fn get(&self, domain: &str) -> Option<DomainRecord> {
        let hit = self.cache.get(domain).await;
        if hit.is_some() {
            debug!("Cache hit for domain: {}", domain);
        } else {
            debug!("Cache miss for domain: {}", domain);
        }
        hit
    }

    pub async fn set(&self, record: &DomainRecord) {
        self.cache.insert(record.domain.clone(), record.clone()).await;
        debug!("Cached record for domain: {}", record.domain);
    }

    pub async fn invalidate(&self, domain: &str) {
        self.cache.invalidate(domain).await;
    }
}
