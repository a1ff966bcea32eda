//! Lookup instrumentation through the `metrics` facade.
//!
//! Nothing is exported unless the embedding application installs a recorder.
//! With the `metrics` feature disabled every helper is a no-op.

use crate::{errors::WhoisError, record::AggregateSummary};
use std::time::Duration;

#[cfg(feature = "metrics")]
use metrics::{counter, histogram};

#[cfg(feature = "metrics")]
pub fn record_lookup(domain: &str, duration: Duration, error: Option<&WhoisError>) {
    let suffix = crate::resolver::suffix_of(domain)
        .unwrap_or("unknown")
        .to_string();
    counter!("whois_lookups_total", "suffix" => suffix).increment(1);
    histogram!("whois_lookup_duration_seconds").record(duration.as_secs_f64());

    if let Some(error) = error {
        counter!("whois_errors_total", "kind" => error.kind().as_str()).increment(1);
    }
}

#[cfg(feature = "metrics")]
pub fn increment_retries() {
    counter!("whois_retries_total").increment(1);
}

#[cfg(feature = "metrics")]
pub fn increment_referrals() {
    counter!("whois_referrals_total").increment(1);
}

#[cfg(feature = "metrics")]
pub fn increment_cache_hits() {
    counter!("whois_cache_hits_total").increment(1);
}

#[cfg(feature = "metrics")]
pub fn record_batch(summary: &AggregateSummary) {
    counter!("whois_batches_total").increment(1);
    histogram!("whois_batch_duration_seconds").record(summary.elapsed_ms as f64 / 1000.0);
    histogram!("whois_batch_size").record(summary.unique as f64);
}

#[cfg(not(feature = "metrics"))]
pub fn record_lookup(_domain: &str, _duration: Duration, _error: Option<&WhoisError>) {}

#[cfg(not(feature = "metrics"))]
pub fn increment_retries() {}

#[cfg(not(feature = "metrics"))]
pub fn increment_referrals() {}

#[cfg(not(feature = "metrics"))]
pub fn increment_cache_hits() {}

#[cfg(not(feature = "metrics"))]
pub fn record_batch(_summary: &AggregateSummary) {}
