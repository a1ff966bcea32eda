//! # Domain Whois
//!
//! Async WHOIS lookups that turn free-form registry text into structured
//! [`DomainRecord`]s.
//!
//! ## Features
//!
//! - Suffix → server resolution with root-server fallback and overrides
//! - One-hop registry → registrar referral following
//! - Tolerant field extraction across registry formats and date styles
//! - Bounded retries for transient network failures
//! - Concurrent batches with per-domain failure isolation
//! - Optional in-process memoization
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use domain_whois::WhoisClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = WhoisClient::new()?;
//!     let record = client.query_domain("example.com").await?;
//!
//!     println!("Domain: {}", record.domain);
//!     println!("Registrar: {:?}", record.registrar);
//!     println!("Expires: {:?}", record.expires_at);
//!
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod cache;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod parser;
pub mod record;
pub mod resolver;
pub mod transport;
pub mod whois;

// Re-export main types for easy access
pub use batch::{parse_domain_list, BatchOrchestrator};
pub use cache::CacheService;
pub use config::Config;
pub use errors::{ErrorInfo, ErrorKind, WhoisError};
pub use parser::{ParseOutcome, WhoisParser};
pub use record::{AggregateSummary, AvailabilityVerdict, BatchReport, BatchResult, DomainRecord};
pub use resolver::{normalize_domain, ServerResolver};
pub use transport::{TcpTransport, Transport};
pub use whois::WhoisService;

use std::sync::Arc;

/// High-level whois client with optional memoization
#[derive(Clone)]
pub struct WhoisClient {
    service: Arc<WhoisService>,
    batch: BatchOrchestrator,
    cache: Option<Arc<CacheService>>,
}

impl WhoisClient {
    /// Create a new whois client configured from the environment
    pub fn new() -> Result<Self, WhoisError> {
        Ok(Self::with_config(Config::load()?))
    }

    pub fn with_config(config: Config) -> Self {
        let transport = Arc::new(TcpTransport::new(&config));
        Self::with_transport(config, transport)
    }

    /// Client talking through a custom [`Transport`].
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Self {
        let cache = config
            .cache_enabled()
            .then(|| Arc::new(CacheService::new(&config)));
        let service = Arc::new(WhoisService::with_transport(Arc::new(config), transport));

        Self {
            batch: BatchOrchestrator::new(service.clone()),
            service,
            cache,
        }
    }

    pub fn config(&self) -> &Config {
        self.service.config()
    }

    /// Look up a single domain, answering from the memo when possible.
    pub async fn query_domain(&self, domain: &str) -> Result<DomainRecord, WhoisError> {
        self.query_with_options(domain, false).await
    }

    /// Look up a single domain, bypassing the memo.
    pub async fn query_domain_fresh(&self, domain: &str) -> Result<DomainRecord, WhoisError> {
        self.query_with_options(domain, true).await
    }

    async fn query_with_options(&self, domain: &str, fresh: bool) -> Result<DomainRecord, WhoisError> {
        let domain = normalize_domain(domain)?;

        if !fresh {
            if let Some(cache) = &self.cache {
                if let Some(record) = cache.get(&domain).await {
                    metrics::increment_cache_hits();
                    return Ok(record);
                }
            }
        }

        let record = self.service.lookup_validated(&domain).await?;

        if let Some(cache) = &self.cache {
            cache.set(&record).await;
        }

        Ok(record)
    }

    /// Registered-or-not verdict for one domain.
    pub async fn check_availability(&self, domain: &str) -> Result<AvailabilityVerdict, WhoisError> {
        self.query_domain(domain).await.map(|record| record.verdict())
    }

    /// Look up many domains concurrently. Always fresh.
    pub async fn batch_query_domains<I, S>(&self, domains: I) -> BatchReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.batch.lookup_many(domains).await
    }

    /// Like [`Self::batch_query_domains`] for a comma or whitespace separated list.
    pub async fn batch_query_domain_list(&self, domains: &str) -> BatchReport {
        self.batch.lookup_many(parse_domain_list(domains)).await
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.is_some()
    }
}
