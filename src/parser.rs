//! Turns raw WHOIS text into a [`DomainRecord`].
//!
//! Registries do not agree on a format, so fields are found through a table of
//! label synonyms rather than a grammar. Labels are compared after stripping
//! everything but ASCII letters and digits, so `Registry Expiry Date`,
//! `registry-expiry-date` and `REGISTRY_EXPIRY_DATE` are the same key.
//!
//! Order of checks for a response:
//! 1. rate-limit banners fail with [`WhoisError::RateLimited`]
//! 2. "no match" sentinels yield an unregistered record
//! 3. a referral to another server is handed back as [`ParseOutcome::Referral`]
//! 4. `label: value` lines are matched against the synonym table

use crate::{errors::WhoisError, record::DomainRecord};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Registrar,
    CreatedAt,
    ExpiresAt,
    UpdatedAt,
    Status,
    NameServer,
}

const FIELD_SYNONYMS: &[(Field, &[&str])] = &[
    (
        Field::Registrar,
        &[
            "registrar",
            "sponsoringregistrar",
            "registrarname",
            "registrarorganization",
            "registrationserviceprovider",
        ],
    ),
    (
        Field::CreatedAt,
        &[
            "creationdate",
            "created",
            "createdon",
            "createddate",
            "registered",
            "registeredon",
            "registrationdate",
            "registrationtime",
            "domainregistrationdate",
            "domaincreatedate",
            "recordcreatedon",
            "domainrecordactivated",
        ],
    ),
    (
        Field::ExpiresAt,
        &[
            "registryexpirydate",
            "registrarregistrationexpirationdate",
            "expirationdate",
            "expirydate",
            "expires",
            "expireson",
            "expire",
            "expirationtime",
            "domainexpirationdate",
            "paidtill",
            "renewaldate",
            "validuntil",
        ],
    ),
    (
        Field::UpdatedAt,
        &[
            "updateddate",
            "updated",
            "updatedon",
            "lastupdated",
            "lastupdatedon",
            "lastupdate",
            "lastmodified",
            "modified",
            "changed",
            "domainlastupdateddate",
        ],
    ),
    (
        Field::Status,
        &[
            "domainstatus",
            "status",
            "state",
            "registrationstatus",
            "eppstatus",
        ],
    ),
    (
        Field::NameServer,
        &[
            "nameserver",
            "nameservers",
            "nserver",
            "ns",
            "dns",
            "domainserversinlistedorder",
        ],
    ),
];

const REFERRAL_LABELS: &[&str] = &[
    "whoisserver",
    "registrarwhoisserver",
    "referralserver",
    "refer",
    "whois",
];

const BLOCK_NAME_LABELS: &[&str] = &["name", "organization", "organisation", "org"];

const NOT_FOUND_SENTINELS: &[&str] = &[
    "no match",
    "not found",
    "no entries found",
    "no data found",
    "no matching record",
    "no object found",
    "the queried object does not exist",
    "domain name not known",
    "status: free",
    "status: available",
    "this domain name has not been registered",
    "is available for registration",
    "no information available about domain name",
];

const RATE_LIMIT_PHRASES: &[&str] = &[
    "rate limit exceeded",
    "too many requests",
    "quota exceeded",
    "query limit exceeded",
    "exceeded the maximum allowable number",
    "access control limit reached",
    "excessive querying",
    "try again later",
];

// Tried in order; the first pattern that parses the whole value wins.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S %z",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y.%m.%d %H:%M:%S",
    "%d-%b-%Y %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%Y%m%d",
    "%d-%b-%Y",
    "%d %b %Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%m/%d/%Y",
];

static SYNONYMS: Lazy<HashMap<&'static str, Field>> = Lazy::new(|| {
    FIELD_SYNONYMS
        .iter()
        .flat_map(|(field, labels)| labels.iter().map(move |label| (*label, *field)))
        .collect()
});

static LABEL_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<label>[^:\[\]]{1,80}?)\s*:\s*(?P<value>.*)$").expect("label line regex")
});

// JPRS style: "[Created on]   2001/02/01", optionally prefixed with "a. "
static BRACKET_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[a-z]\.\s*)?\[(?P<label>[^\]]{1,80})\]\s*(?P<value>.*)$")
        .expect("bracket line regex")
});

static HOSTNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]([a-z0-9-]*[a-z0-9])?(\.[a-z0-9]([a-z0-9-]*[a-z0-9])?)+$")
        .expect("hostname regex")
});

/// What a single response amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Record(DomainRecord),
    /// The registry pointed at another server for this domain.
    Referral(String),
}

#[derive(Debug, Default)]
struct Extracted {
    registrar: Option<String>,
    created_at: Option<NaiveDate>,
    expires_at: Option<NaiveDate>,
    updated_at: Option<NaiveDate>,
    statuses: Vec<String>,
    name_servers: Vec<String>,
}

impl Extracted {
    fn apply(&mut self, field: Field, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }

        match field {
            Field::Registrar => {
                if self.registrar.is_none() {
                    self.registrar = Some(value.to_string());
                }
            }
            Field::CreatedAt => set_date(&mut self.created_at, value),
            Field::ExpiresAt => set_date(&mut self.expires_at, value),
            Field::UpdatedAt => set_date(&mut self.updated_at, value),
            Field::Status => {
                // "clientHold https://icann.org/epp#clientHold"
                let value = match value.split_once(" http") {
                    Some((code, _)) => code.trim_end(),
                    None => value,
                };
                if !self.statuses.iter().any(|s| s == value) {
                    self.statuses.push(value.to_string());
                }
            }
            Field::NameServer => {
                // Some registries append glue addresses after the host
                let host = value
                    .split_whitespace()
                    .next()
                    .unwrap_or(value)
                    .trim_end_matches('.')
                    .to_lowercase();
                if !host.is_empty() && !self.name_servers.contains(&host) {
                    self.name_servers.push(host);
                }
            }
        }
    }

    fn identifies_registration(&self) -> bool {
        self.registrar.is_some() || self.created_at.is_some()
    }
}

fn set_date(slot: &mut Option<NaiveDate>, value: &str) {
    if slot.is_none() {
        *slot = parse_date(value);
    }
}

struct PendingBlock {
    field: Field,
    indent: usize,
}

pub struct WhoisParser;

impl WhoisParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses a response without knowing which server produced it; any
    /// referral marker is reported.
    pub fn parse(&self, raw: &[u8], domain: &str) -> Result<ParseOutcome, WhoisError> {
        self.parse_response(raw, domain, "")
    }

    /// Parses the answer `server` gave for `domain`. A referral naming
    /// `server` itself is not treated as a referral.
    pub fn parse_response(
        &self,
        raw: &[u8],
        domain: &str,
        server: &str,
    ) -> Result<ParseOutcome, WhoisError> {
        let text = String::from_utf8_lossy(raw).into_owned();
        let lowered = text.to_lowercase();

        if RATE_LIMIT_PHRASES.iter().any(|p| lowered.contains(p)) {
            debug!("Rate limit banner from {} for {}", server, domain);
            return Err(WhoisError::RateLimited(server.to_string()));
        }

        if NOT_FOUND_SENTINELS.iter().any(|s| lowered.contains(s)) {
            debug!("No registry entry for {}", domain);
            return Ok(ParseOutcome::Record(DomainRecord::unregistered(domain, text)));
        }

        if let Some(referral) = find_referral(&text) {
            if !referral.eq_ignore_ascii_case(server) {
                debug!("Response for {} refers to {}", domain, referral);
                return Ok(ParseOutcome::Referral(referral));
            }
        }

        self.parse_record(&text, domain).map(ParseOutcome::Record)
    }

    /// Extracts fields from `text`, ignoring sentinels and referrals.
    pub fn parse_record(&self, text: &str, domain: &str) -> Result<DomainRecord, WhoisError> {
        let extracted = extract_fields(text);

        if !extracted.identifies_registration() {
            return Err(WhoisError::AmbiguousResponse {
                domain: domain.to_string(),
                raw_text: text.to_string(),
            });
        }

        Ok(DomainRecord {
            domain: domain.to_string(),
            registered: true,
            registrar: extracted.registrar,
            created_at: extracted.created_at,
            expires_at: extracted.expires_at,
            updated_at: extracted.updated_at,
            statuses: extracted.statuses,
            name_servers: extracted.name_servers,
            whois_server: None,
            raw_text: text.to_string(),
            queried_at: Utc::now(),
        })
    }
}

impl Default for WhoisParser {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn is_comment(line: &str) -> bool {
    line.starts_with('%') || line.starts_with('#') || line.starts_with(">>>")
}

fn split_label(line: &str) -> Option<(String, &str)> {
    let caps = BRACKET_LINE
        .captures(line)
        .or_else(|| LABEL_LINE.captures(line))?;
    let label = caps.name("label")?.as_str();
    let value = caps.name("value").map_or("", |m| m.as_str());
    Some((normalize_label(label), value.trim()))
}

fn extract_fields(text: &str) -> Extracted {
    let mut extracted = Extracted::default();
    let mut pending: Option<PendingBlock> = None;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            pending = None;
            continue;
        }
        if is_comment(line) {
            continue;
        }

        let indent = raw_line.len() - raw_line.trim_start().len();

        // Deeper-indented lines under an empty-valued label belong to it
        if let Some(block) = &pending {
            if indent > block.indent {
                if let Some(value) = block_value(line) {
                    extracted.apply(block.field, value);
                }
                continue;
            }
            pending = None;
        }

        let Some((label, value)) = split_label(line) else {
            continue;
        };
        let Some(&field) = SYNONYMS.get(label.as_str()) else {
            continue;
        };

        if value.is_empty() {
            pending = Some(PendingBlock { field, indent });
        } else {
            extracted.apply(field, value);
        }
    }

    extracted
}

/// Value carried by a line inside a block. EURid and DNS Belgium nest
/// `Name:`/`Website:` pairs under `Registrar:`; only the name is kept.
fn block_value(line: &str) -> Option<&str> {
    let Some((label, value)) = split_label(line) else {
        return Some(line);
    };

    // "ns3.example.net 2001:db8::1" is a host followed by glue, not a label
    let raw_label = line.split(':').next().unwrap_or_default();
    if raw_label.contains('.') || !label.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Some(line);
    }

    BLOCK_NAME_LABELS.contains(&label.as_str()).then_some(value)
}

fn find_referral(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_comment(line))
        .filter_map(split_label)
        .filter(|(label, _)| REFERRAL_LABELS.contains(&label.as_str()))
        .find_map(|(_, value)| clean_referral(value))
}

/// Reduces `rwhois://whois.example.net:4321/` style values to a bare host.
fn clean_referral(value: &str) -> Option<String> {
    let value = value.trim().to_lowercase();
    let without_scheme = value
        .split_once("://")
        .map_or(value.as_str(), |(_, rest)| rest);
    let host = without_scheme
        .split(|c: char| c == '/' || c == ':' || c.is_whitespace())
        .next()?
        .trim_end_matches('.');

    HOSTNAME.is_match(host).then(|| host.to_string())
}

/// Parses the date formats registries are known to use, dropping the time of
/// day. Values carrying an offset are converted to UTC first.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    parse_full_date(value).or_else(|| {
        // "2001-02-01 (JST)", "1999-10-11 12:00:00 CLST" and friends
        let token = value.split_whitespace().next()?;
        (token != value).then(|| parse_full_date(token)).flatten()
    })
    .or_else(|| {
        debug!("Failed to parse date: {}", value);
        None
    })
}

fn parse_full_date(value: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.with_timezone(&Utc).date_naive());
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.date());
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn record(raw: &str, domain: &str) -> DomainRecord {
        match WhoisParser::new().parse(raw.as_bytes(), domain).unwrap() {
            ParseOutcome::Record(record) => record,
            other => panic!("expected a record, got {:?}", other),
        }
    }

    #[test]
    fn test_basic_registered_response() {
        let raw = "Registrar: Example Corp\n\
                   Creation Date: 1999-10-11\n\
                   Name Server: ns1.example.com\n\
                   Name Server: ns2.example.com\n";
        let parsed = record(raw, "example.com");

        assert!(parsed.registered);
        assert_eq!(parsed.registrar.as_deref(), Some("Example Corp"));
        assert_eq!(parsed.created_at, date(1999, 10, 11));
        assert_eq!(parsed.name_servers, vec!["ns1.example.com", "ns2.example.com"]);
        assert!(parsed.expires_at.is_none());
        assert_eq!(parsed.raw_text, raw);
    }

    #[test]
    fn test_no_match_sentinel() {
        let parsed = record("No match for DOMAIN.TEST", "domain.test");
        assert!(!parsed.registered);
        assert!(parsed.registrar.is_none());
        assert!(parsed.created_at.is_none());
        assert!(parsed.expires_at.is_none());
        assert!(parsed.statuses.is_empty());
        assert!(parsed.name_servers.is_empty());
    }

    #[test]
    fn test_sentinels_are_case_insensitive() {
        for raw in [
            "NOT FOUND",
            "%% Domain not found.",
            "No entries found for the selected source(s).",
            "Domain Status: No Object Found",
            "The queried object does not exist: DOMAIN NOT FOUND",
            "Status: free",
        ] {
            assert!(!record(raw, "free.test").registered, "raw {:?}", raw);
        }
    }

    #[test]
    fn test_unknown_banner_is_ambiguous() {
        let err = WhoisParser::new()
            .parse(b"Some unknown registry banner with no fields", "x.com")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AmbiguousResponse);
        assert_eq!(err.raw_text(), Some("Some unknown registry banner with no fields"));
    }

    #[test]
    fn test_fields_without_identity_are_ambiguous() {
        // Statuses alone cannot prove a registration
        let err = WhoisParser::new()
            .parse(b"Domain Status: ok\nName Server: ns1.example.com\n", "x.com")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AmbiguousResponse);
    }

    #[test]
    fn test_verisign_style_referral() {
        let raw = "   Domain Name: EXAMPLE.COM\n\
                   Registry Domain ID: 2336799_DOMAIN_COM-VRSN\n\
                   Registrar WHOIS Server: whois.markmonitor.com\n\
                   Registrar URL: http://www.markmonitor.com\n\
                   Creation Date: 1995-08-14T04:00:00Z\n";
        let outcome = WhoisParser::new().parse(raw.as_bytes(), "example.com").unwrap();
        assert_eq!(outcome, ParseOutcome::Referral("whois.markmonitor.com".to_string()));
    }

    #[test]
    fn test_self_referral_is_parsed() {
        let raw = "Registrar WHOIS Server: whois.markmonitor.com\n\
                   Registrar: MarkMonitor, Inc.\n\
                   Creation Date: 1997-09-15T07:00:00+0000\n";
        let outcome = WhoisParser::new()
            .parse_response(raw.as_bytes(), "google.com", "whois.markmonitor.com")
            .unwrap();
        match outcome {
            ParseOutcome::Record(record) => {
                assert_eq!(record.registrar.as_deref(), Some("MarkMonitor, Inc."));
                assert_eq!(record.created_at, date(1997, 9, 15));
            }
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_referral_values_are_cleaned() {
        assert_eq!(
            clean_referral("rwhois://RWhois.Example.NET:4321/"),
            Some("rwhois.example.net".to_string())
        );
        assert_eq!(clean_referral("whois.nic.io"), Some("whois.nic.io".to_string()));
        assert_eq!(clean_referral(""), None);
        assert_eq!(clean_referral("not a host"), None);

        let outcome = WhoisParser::new()
            .parse(b"refer:        whois.nic.example\n\ndomain: EXAMPLE\n", "x.example")
            .unwrap();
        assert_eq!(outcome, ParseOutcome::Referral("whois.nic.example".to_string()));
    }

    #[test]
    fn test_empty_referral_value_is_ignored() {
        let raw = "Registrar WHOIS Server: \nRegistrar: Public Interest Registry\nCreated On: 1985-01-01\n";
        let parsed = record(raw, "example.org");
        assert_eq!(parsed.registrar.as_deref(), Some("Public Interest Registry"));
    }

    #[test]
    fn test_statuses_and_nameservers_deduplicated_in_order() {
        let raw = "Registrar: R\n\
                   Domain Status: clientTransferProhibited https://icann.org/epp#clientTransferProhibited\n\
                   Domain Status: clientDeleteProhibited https://icann.org/epp#clientDeleteProhibited\n\
                   Domain Status: clientTransferProhibited https://icann.org/epp#clientTransferProhibited\n\
                   Name Server: NS2.EXAMPLE.COM\n\
                   nserver: ns1.example.com. 192.0.2.1\n\
                   Name Server: ns2.example.com\n";
        let parsed = record(raw, "example.com");
        assert_eq!(
            parsed.statuses,
            vec!["clientTransferProhibited", "clientDeleteProhibited"]
        );
        assert_eq!(parsed.name_servers, vec!["ns2.example.com", "ns1.example.com"]);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let raw = "Registrar: First Registrar\n\
                   Sponsoring Registrar: Second Registrar\n\
                   Registry Expiry Date: 2028-09-14T04:00:00Z\n\
                   Registrar Registration Expiration Date: 2028-09-13T00:00:00Z\n";
        let parsed = record(raw, "example.com");
        assert_eq!(parsed.registrar.as_deref(), Some("First Registrar"));
        assert_eq!(parsed.expires_at, date(2028, 9, 14));
    }

    #[test]
    fn test_nominet_multiline_blocks() {
        let raw = "\n    Domain name:\n        google.co.uk\n\n\
                   \x20   Registrar:\n        Markmonitor Inc. t/a MarkMonitor Inc. [Tag = MARKMONITOR]\n        URL: http://www.markmonitor.com\n\n\
                   \x20   Relevant dates:\n        Registered on: 14-Feb-1999\n        Expiry date:  14-Feb-2026\n        Last updated:  13-Jan-2025\n\n\
                   \x20   Registration status:\n        Registered until expiry date.\n\n\
                   \x20   Name servers:\n        ns1.google.com\n        ns2.google.com\n        ns3.google.com   2001:4860:4802:34::a\n\n";
        let parsed = record(raw, "google.co.uk");

        assert_eq!(
            parsed.registrar.as_deref(),
            Some("Markmonitor Inc. t/a MarkMonitor Inc. [Tag = MARKMONITOR]")
        );
        assert_eq!(parsed.created_at, date(1999, 2, 14));
        assert_eq!(parsed.expires_at, date(2026, 2, 14));
        assert_eq!(parsed.updated_at, date(2025, 1, 13));
        assert_eq!(parsed.statuses, vec!["Registered until expiry date."]);
        assert_eq!(
            parsed.name_servers,
            vec!["ns1.google.com", "ns2.google.com", "ns3.google.com"]
        );
    }

    #[test]
    fn test_labelled_lines_inside_registrar_block() {
        let eurid = "Domain: example.eu\n\
                     Script: LATIN\n\n\
                     Registrant:\n        NOT DISCLOSED!\n\n\
                     Technical:\n        Organisation: Example Tech\n\n\
                     Registrar:\n        Name: Example Registrar NV\n        Website: www.registrar.eu\n\n\
                     Name servers:\n        ns1.example.eu\n        ns2.example.eu (192.0.2.1)\n\n";
        let parsed = record(eurid, "example.eu");
        assert_eq!(parsed.registrar.as_deref(), Some("Example Registrar NV"));
        assert_eq!(parsed.name_servers, vec!["ns1.example.eu", "ns2.example.eu"]);

        let dns_be = "Domain:\texample.be\n\
                      Status:\tNOT AVAILABLE\n\n\
                      Registrar:\n\tWebsite:\thttps://www.registrar.be\n\tName:\tExample Registrar BV\n\n\
                      Nameservers:\n\tns1.example.be\n\tns2.example.be\n\n";
        let parsed = record(dns_be, "example.be");
        assert_eq!(parsed.registrar.as_deref(), Some("Example Registrar BV"));
        assert_eq!(parsed.statuses, vec!["NOT AVAILABLE"]);
        assert_eq!(parsed.name_servers, vec!["ns1.example.be", "ns2.example.be"]);
    }

    #[test]
    fn test_jprs_bracket_labels() {
        let raw = "[ JPRS database provides information on network administration. ]\n\
                   Domain Information:\n\
                   a. [Domain Name]                EXAMPLE.JP\n\
                   [Name Server]                   ns1.example.jp\n\
                   [Created on]                    2001/02/01\n\
                   [Expires on]                    2026/02/28\n\
                   [Status]                        Active\n\
                   [Last Update]                   2025/03/01 01:05:03 (JST)\n";
        let parsed = record(raw, "example.jp");
        assert_eq!(parsed.created_at, date(2001, 2, 1));
        assert_eq!(parsed.expires_at, date(2026, 2, 28));
        assert_eq!(parsed.updated_at, date(2025, 3, 1));
        assert_eq!(parsed.statuses, vec!["Active"]);
        assert_eq!(parsed.name_servers, vec!["ns1.example.jp"]);
    }

    #[test]
    fn test_ru_style_labels() {
        let raw = "domain:        YANDEX.RU\n\
                   nserver:       ns1.yandex.ru.\n\
                   state:         REGISTERED, DELEGATED, VERIFIED\n\
                   registrar:     RU-CENTER-RU\n\
                   created:       1997-09-23T09:45:07Z\n\
                   paid-till:     2025-09-30T21:00:00Z\n";
        let parsed = record(raw, "yandex.ru");
        assert_eq!(parsed.registrar.as_deref(), Some("RU-CENTER-RU"));
        assert_eq!(parsed.expires_at, date(2025, 9, 30));
        assert_eq!(parsed.name_servers, vec!["ns1.yandex.ru"]);
        assert_eq!(parsed.statuses, vec!["REGISTERED, DELEGATED, VERIFIED"]);
    }

    #[test]
    fn test_comment_lines_are_skipped() {
        let raw = "% Registrar: Not This One\n\
                   # Creation Date: 2000-01-01\n\
                   Registrar: Real Registrar\n\
                   >>> Last update of WHOIS database: 2025-01-01T00:00:00Z <<<\n";
        let parsed = record(raw, "example.com");
        assert_eq!(parsed.registrar.as_deref(), Some("Real Registrar"));
        assert!(parsed.updated_at.is_none());
    }

    #[test]
    fn test_bad_date_is_dropped_not_fatal() {
        let raw = "Registrar: Example Corp\n\
                   Creation Date: before Aug-1996\n\
                   Registry Expiry Date: 2030-01-01\n";
        let parsed = record(raw, "example.com");
        assert!(parsed.created_at.is_none());
        assert_eq!(parsed.expires_at, date(2030, 1, 1));
    }

    #[test]
    fn test_date_formats() {
        let expected = date(2025, 5, 18);
        for value in [
            "2025-05-18T13:36:06Z",
            "2025-05-18T13:36:06.0Z",
            "2025-05-18T13:36:06.123456Z",
            "2025-05-18T13:36:06+0000",
            "2025-05-18T13:36:06+00:00",
            "2025-05-18 13:36:06",
            "2025-05-18 13:36:06 UTC",
            "2025-05-18",
            "18-May-2025",
            "18-may-2025",
            "18 May 2025",
            "2025/05/18",
            "2025.05.18",
            "20250518",
            "18.05.2025",
            "05/18/2025",
        ] {
            assert_eq!(parse_date(value), expected, "value {:?}", value);
        }

        // Offsets are normalized to UTC before the day is taken
        assert_eq!(parse_date("2025-05-18T23:30:00-02:00"), date(2025, 5, 19));
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut raw = b"Registrar: Caf".to_vec();
        raw.push(0xE9);
        raw.extend_from_slice(b" Registrar\nCreated: 2001-01-01\n");

        match WhoisParser::new().parse(&raw, "x.fr").unwrap() {
            ParseOutcome::Record(parsed) => {
                assert_eq!(parsed.registrar.as_deref(), Some("Caf\u{FFFD} Registrar"));
                assert!(parsed.raw_text.contains('\u{FFFD}'));
            }
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_rate_limit_banner() {
        let err = WhoisParser::new()
            .parse_response(b"Too many requests, please try again later.", "x.com", "whois.test")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_synonym_labels_round_trip() {
        let created = date(2004, 2, 29).unwrap();
        let expires = date(2031, 12, 1).unwrap();
        let updated = date(2024, 7, 4).unwrap();

        for (registrar_label, created_label, expires_label, updated_label, status_label, ns_label) in [
            ("Registrar", "Creation Date", "Registry Expiry Date", "Updated Date", "Domain Status", "Name Server"),
            ("Sponsoring Registrar", "Registered On", "Expiration Date", "Last Modified", "Status", "nserver"),
            ("registrar-name", "created", "paid-till", "changed", "state", "Name Servers"),
        ] {
            let raw = format!(
                "{}: Round Trip Registrar\n{}: {}\n{}: {}\n{}: {}\n{}: ok\n{}: ns1.round.trip\n{}: ns2.round.trip\n",
                registrar_label,
                created_label,
                created.format("%Y-%m-%d"),
                expires_label,
                expires.format("%Y-%m-%d"),
                updated_label,
                updated.format("%Y-%m-%d"),
                status_label,
                ns_label,
                ns_label,
            );
            let parsed = record(&raw, "round.trip");
            assert_eq!(parsed.registrar.as_deref(), Some("Round Trip Registrar"), "{}", raw);
            assert_eq!(parsed.created_at, Some(created), "{}", raw);
            assert_eq!(parsed.expires_at, Some(expires), "{}", raw);
            assert_eq!(parsed.updated_at, Some(updated), "{}", raw);
            assert_eq!(parsed.statuses, vec!["ok"], "{}", raw);
            assert_eq!(parsed.name_servers, vec!["ns1.round.trip", "ns2.round.trip"], "{}", raw);
        }
    }

    #[test]
    fn test_parsing_is_deterministic() {
        let raw = b"Registrar: Example Corp\nCreation Date: 1999-10-11\nDomain Status: ok\n";
        let parser = WhoisParser::new();
        let first = match parser.parse(raw, "example.com").unwrap() {
            ParseOutcome::Record(r) => r,
            other => panic!("unexpected {:?}", other),
        };
        let mut second = match parser.parse(raw, "example.com").unwrap() {
            ParseOutcome::Record(r) => r,
            other => panic!("unexpected {:?}", other),
        };
        second.queried_at = first.queried_at;
        assert_eq!(first, second);
    }

    #[test]
    fn test_label_normalization() {
        assert_eq!(normalize_label("Registry Expiry Date"), "registryexpirydate");
        assert_eq!(normalize_label("paid-till"), "paidtill");
        assert_eq!(normalize_label("REGISTRAR_NAME"), "registrarname");
    }
}
