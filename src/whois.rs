use crate::{
    config::Config,
    errors::{ErrorKind, WhoisError},
    metrics,
    parser::{ParseOutcome, WhoisParser},
    record::DomainRecord,
    resolver::{normalize_domain, suffix_of, ServerResolver},
    transport::{TcpTransport, Transport},
};
use std::{sync::Arc, time::Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Single-domain lookups: resolve, query with retries, parse, follow at most
/// one registry → registrar referral.
pub struct WhoisService {
    config: Arc<Config>,
    resolver: ServerResolver,
    transport: Arc<dyn Transport>,
    parser: WhoisParser,
}

impl WhoisService {
    pub fn new(config: Arc<Config>) -> Self {
        let transport = Arc::new(TcpTransport::new(&config));
        Self::with_transport(config, transport)
    }

    pub fn with_transport(config: Arc<Config>, transport: Arc<dyn Transport>) -> Self {
        info!(
            "WhoisService initialized: timeout {}s, {} retries, root server {}",
            config.whois_timeout_seconds, config.max_retries, config.root_server
        );
        if !config.server_overrides.is_empty() {
            info!("{} server override(s) configured", config.server_overrides.len());
        }

        Self {
            resolver: ServerResolver::new(&config),
            config,
            transport,
            parser: WhoisParser::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Perform a whois lookup for a user-supplied domain name.
    pub async fn lookup(&self, domain: &str) -> Result<DomainRecord, WhoisError> {
        let domain = normalize_domain(domain)?;
        self.lookup_validated(&domain).await
    }

    /// Lookup for a domain that already went through [`normalize_domain`].
    pub(crate) async fn lookup_validated(&self, domain: &str) -> Result<DomainRecord, WhoisError> {
        let started = Instant::now();
        let result = self.lookup_normalized(domain).await;
        metrics::record_lookup(domain, started.elapsed(), result.as_ref().err());

        match &result {
            Ok(record) => debug!(
                "Lookup for {} finished in {}ms (registered: {})",
                domain,
                started.elapsed().as_millis(),
                record.registered
            ),
            Err(e) => debug!("Lookup for {} failed: {}", domain, e),
        }

        result
    }

    async fn lookup_normalized(&self, domain: &str) -> Result<DomainRecord, WhoisError> {
        let resolved = self.resolver.resolve_server(domain)?;

        let server = if resolved.via_root {
            self.discover_from_root(&resolved.host, domain).await?
        } else {
            resolved.host
        };

        let (raw, outcome) = self.query_with_retry(&server, domain).await?;

        match outcome {
            ParseOutcome::Record(record) => Ok(finish(record, &server)),
            ParseOutcome::Referral(referred) => {
                self.follow_referral(domain, &server, &raw, &referred).await
            }
        }
    }

    /// Asks the root server which server is authoritative for the suffix.
    async fn discover_from_root(&self, root: &str, domain: &str) -> Result<String, WhoisError> {
        let no_server = || {
            WhoisError::UnsupportedDomain(format!(
                "no WHOIS server is known for .{}",
                suffix_of(domain).unwrap_or(domain)
            ))
        };

        match self.query_with_retry(root, domain).await {
            Ok((_, ParseOutcome::Referral(server))) => {
                debug!("Root server {} names {} for {}", root, server, domain);
                Ok(server)
            }
            Ok((_, ParseOutcome::Record(_))) => Err(no_server()),
            Err(e) if e.kind() == ErrorKind::AmbiguousResponse => Err(no_server()),
            Err(e) => Err(e),
        }
    }

    async fn follow_referral(
        &self,
        domain: &str,
        server: &str,
        raw: &[u8],
        referred: &str,
    ) -> Result<DomainRecord, WhoisError> {
        debug!("Following referral from {} to {}", server, referred);
        metrics::increment_referrals();

        match self.query_with_retry(referred, domain).await {
            Ok((_, ParseOutcome::Record(record))) => Ok(finish(record, referred)),
            Ok((_, ParseOutcome::Referral(next))) => Err(WhoisError::ReferralLoop {
                domain: domain.to_string(),
                server: referred.to_string(),
                referred: next,
            }),
            Err(e) if is_transport_failure(&e) => {
                // Thin registries still answer with the core fields
                let text = String::from_utf8_lossy(raw);
                match self.parser.parse_record(&text, domain) {
                    Ok(record) => {
                        warn!(
                            "Referral server {} failed for {} ({}), using {} response",
                            referred, domain, e, server
                        );
                        Ok(finish(record, server))
                    }
                    Err(_) => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn query_with_retry(
        &self,
        server: &str,
        domain: &str,
    ) -> Result<(Vec<u8>, ParseOutcome), WhoisError> {
        let attempts = self.config.max_retries + 1;
        let mut attempt = 1;

        loop {
            match self.query_once(server, domain).await {
                Err(e) if e.is_retryable() && attempt < attempts => {
                    warn!(
                        "Attempt {}/{} against {} for {} failed: {}",
                        attempt, attempts, server, domain, e
                    );
                    metrics::increment_retries();
                    tokio::time::sleep(self.config.retry_backoff()).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn query_once(
        &self,
        server: &str,
        domain: &str,
    ) -> Result<(Vec<u8>, ParseOutcome), WhoisError> {
        let query_timeout = self.config.query_timeout();

        // Enforced here as well so no transport can outlive the deadline
        let raw = timeout(query_timeout, self.transport.send(server, domain, query_timeout)).await??;
        let outcome = self.parser.parse_response(&raw, domain, server)?;

        Ok((raw, outcome))
    }
}

fn finish(mut record: DomainRecord, server: &str) -> DomainRecord {
    record.whois_server = Some(server.to_string());
    record
}

fn is_transport_failure(error: &WhoisError) -> bool {
    matches!(
        error.kind(),
        ErrorKind::ConnectError
            | ErrorKind::TimeoutError
            | ErrorKind::EmptyResponse
            | ErrorKind::RateLimited
            | ErrorKind::ResponseTooLarge
    )
}
