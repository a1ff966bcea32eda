use crate::{
    errors::{ErrorInfo, ErrorKind},
    metrics,
    record::{AggregateSummary, BatchReport, BatchResult},
    resolver::normalize_domain,
    whois::WhoisService,
};
use futures::stream::{self, StreamExt};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

const DEADLINE_MESSAGE: &str = "batch deadline exceeded";

/// Runs many lookups with bounded concurrency. Duplicate inputs are looked up
/// once and one failing domain never affects the others.
#[derive(Clone)]
pub struct BatchOrchestrator {
    service: Arc<WhoisService>,
    concurrency: usize,
    batch_timeout: Option<Duration>,
}

impl BatchOrchestrator {
    pub fn new(service: Arc<WhoisService>) -> Self {
        let concurrency = service.config().concurrency;
        let batch_timeout = service.config().batch_timeout();
        Self {
            service,
            concurrency: concurrency.max(1),
            batch_timeout,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_batch_timeout(mut self, limit: Option<Duration>) -> Self {
        self.batch_timeout = limit;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub async fn lookup_many<I, S>(&self, domains: I) -> BatchReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let started = Instant::now();

        let mut keys: Vec<String> = Vec::new();
        let mut slots: Vec<Option<BatchResult>> = Vec::new();
        let mut positions = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut pending = Vec::new();

        for input in domains {
            let input = input.as_ref();
            let (key, normalized) = match normalize_domain(input) {
                Ok(domain) => (domain.clone(), Ok(domain)),
                Err(e) => (input.trim().to_lowercase(), Err(e)),
            };

            if let Some(&slot) = seen.get(&key) {
                positions.push(slot);
                continue;
            }

            let slot = keys.len();
            seen.insert(key.clone(), slot);
            positions.push(slot);
            keys.push(key.clone());

            match normalized {
                Ok(domain) => {
                    slots.push(None);
                    pending.push((slot, domain));
                }
                Err(e) => slots.push(Some(BatchResult::Error(ErrorInfo::new(key, &e)))),
            }
        }

        info!(
            "Starting batch of {} domains ({} unique, {} to query, concurrency {})",
            positions.len(),
            keys.len(),
            pending.len(),
            self.concurrency
        );

        let service = &self.service;
        let mut lookups = stream::iter(pending.into_iter().map(|(slot, domain)| async move {
            let outcome = service.lookup_validated(&domain).await;
            (slot, domain, outcome)
        }))
        .buffer_unordered(self.concurrency);

        let drive = async {
            while let Some((slot, domain, outcome)) = lookups.next().await {
                slots[slot] = Some(match outcome {
                    Ok(record) => BatchResult::Record(record),
                    Err(e) => {
                        debug!("Batch entry {} failed: {}", domain, e);
                        BatchResult::Error(ErrorInfo::new(domain, &e))
                    }
                });
            }
        };

        match self.batch_timeout {
            Some(limit) => {
                if timeout(limit, drive).await.is_err() {
                    warn!("Batch deadline of {:?} exceeded", limit);
                }
            }
            None => drive.await,
        }
        // Cancels whatever the deadline cut off
        drop(lookups);

        let results: Vec<BatchResult> = slots
            .into_iter()
            .zip(keys)
            .map(|(slot, domain)| {
                slot.unwrap_or_else(|| {
                    BatchResult::Error(ErrorInfo {
                        domain,
                        kind: ErrorKind::TimeoutError,
                        message: DEADLINE_MESSAGE.to_string(),
                    })
                })
            })
            .collect();

        let summary = AggregateSummary::from_results(&results, positions.len(), started.elapsed());
        metrics::record_batch(&summary);
        info!(
            "Batch finished in {}ms: {} registered, {} available, {} errors",
            summary.elapsed_ms, summary.registered, summary.available, summary.errored
        );

        BatchReport {
            results,
            positions,
            summary,
        }
    }
}

/// Splits a comma and/or whitespace separated list of domains.
pub fn parse_domain_list(input: &str) -> Vec<String> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
