//! Normalized lookup results and the views derived from them.

use crate::errors::ErrorInfo;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One normalized WHOIS outcome for a single domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRecord {
    pub domain: String,
    pub registered: bool,
    pub registrar: Option<String>,
    pub created_at: Option<NaiveDate>,
    pub expires_at: Option<NaiveDate>,
    pub updated_at: Option<NaiveDate>,
    pub statuses: Vec<String>,
    pub name_servers: Vec<String>,
    /// Server whose answer produced this record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois_server: Option<String>,
    pub raw_text: String,
    pub queried_at: DateTime<Utc>,
}

impl DomainRecord {
    /// Record for a name the registry has no entry for.
    pub fn unregistered(domain: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            registered: false,
            registrar: None,
            created_at: None,
            expires_at: None,
            updated_at: None,
            statuses: Vec::new(),
            name_servers: Vec::new(),
            whois_server: None,
            raw_text: raw_text.into(),
            queried_at: Utc::now(),
        }
    }

    pub fn is_available(&self) -> bool {
        !self.registered
    }

    /// Days from the query until expiry; negative once expired.
    pub fn days_until_expiry(&self) -> Option<i64> {
        self.expires_at
            .map(|expires| (expires - self.queried_at.date_naive()).num_days())
    }

    pub fn days_since_creation(&self) -> Option<i64> {
        self.created_at
            .map(|created| (self.queried_at.date_naive() - created).num_days())
    }

    pub fn days_since_update(&self) -> Option<i64> {
        self.updated_at
            .map(|updated| (self.queried_at.date_naive() - updated).num_days())
    }

    pub fn is_expired(&self) -> bool {
        self.days_until_expiry().is_some_and(|days| days < 0)
    }

    pub fn verdict(&self) -> AvailabilityVerdict {
        AvailabilityVerdict::from(self)
    }
}

/// Yes/no answer to "can this domain be registered", with detail when not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityVerdict {
    pub domain: String,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registrar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<NaiveDate>,
}

impl From<&DomainRecord> for AvailabilityVerdict {
    fn from(record: &DomainRecord) -> Self {
        if record.is_available() {
            Self {
                domain: record.domain.clone(),
                available: true,
                registrar: None,
                expires_at: None,
            }
        } else {
            Self {
                domain: record.domain.clone(),
                available: false,
                registrar: record.registrar.clone(),
                expires_at: record.expires_at,
            }
        }
    }
}

/// Outcome for one distinct domain of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BatchResult {
    Record(DomainRecord),
    Error(ErrorInfo),
}

impl BatchResult {
    pub fn domain(&self) -> &str {
        match self {
            BatchResult::Record(record) => &record.domain,
            BatchResult::Error(info) => &info.domain,
        }
    }

    pub fn record(&self) -> Option<&DomainRecord> {
        match self {
            BatchResult::Record(record) => Some(record),
            BatchResult::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        match self {
            BatchResult::Record(_) => None,
            BatchResult::Error(info) => Some(info),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSummary {
    /// Number of input entries, duplicates included.
    pub requested: usize,
    /// Number of distinct domains actually looked up.
    pub unique: usize,
    pub registered: usize,
    pub available: usize,
    pub errored: usize,
    pub elapsed_ms: u64,
}

impl AggregateSummary {
    pub fn from_results(results: &[BatchResult], requested: usize, elapsed: Duration) -> Self {
        let mut summary = Self {
            requested,
            unique: results.len(),
            elapsed_ms: elapsed.as_millis() as u64,
            ..Self::default()
        };

        for result in results {
            match result {
                BatchResult::Record(record) if record.registered => summary.registered += 1,
                BatchResult::Record(_) => summary.available += 1,
                BatchResult::Error(_) => summary.errored += 1,
            }
        }

        summary
    }
}

/// Results of a batch in first-seen order plus the mapping back to every input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub results: Vec<BatchResult>,
    /// For each input position, the index of its entry in `results`.
    pub positions: Vec<usize>,
    pub summary: AggregateSummary,
}

impl BatchReport {
    /// Result for the `index`-th input, shared between duplicate inputs.
    pub fn for_input(&self, index: usize) -> Option<&BatchResult> {
        self.positions
            .get(index)
            .and_then(|&slot| self.results.get(slot))
    }

    /// One result per input position, in request order.
    pub fn per_input(&self) -> impl Iterator<Item = &BatchResult> + '_ {
        self.positions.iter().filter_map(|&slot| self.results.get(slot))
    }

    pub fn records(&self) -> impl Iterator<Item = &DomainRecord> + '_ {
        self.results.iter().filter_map(BatchResult::record)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ErrorInfo> + '_ {
        self.results.iter().filter_map(BatchResult::error)
    }
}
