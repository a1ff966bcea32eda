//! Domain normalization and suffix → WHOIS server resolution.

use crate::{config::Config, errors::WhoisError};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::debug;
use url::Host;

const MAX_DOMAIN_LENGTH: usize = 253;
const MAX_LABEL_LENGTH: usize = 63;

// Authoritative servers for the suffixes seen most often; anything else goes
// through the root server's referral.
const SUFFIX_SERVERS: &[(&str, &str)] = &[
    // Legacy gTLDs
    ("com", "whois.verisign-grs.com"),
    ("net", "whois.verisign-grs.com"),
    ("org", "whois.pir.org"),
    ("info", "whois.afilias.net"),
    ("mobi", "whois.afilias.net"),
    ("biz", "whois.nic.biz"),
    ("name", "whois.nic.name"),
    ("pro", "whois.registrypro.pro"),
    ("edu", "whois.educause.edu"),
    ("gov", "whois.dotgov.gov"),
    ("int", "whois.iana.org"),
    ("asia", "whois.nic.asia"),
    ("tel", "whois.nic.tel"),
    // New gTLDs
    ("app", "whois.nic.google"),
    ("dev", "whois.nic.google"),
    ("page", "whois.nic.google"),
    ("xyz", "whois.nic.xyz"),
    ("top", "whois.nic.top"),
    ("shop", "whois.nic.shop"),
    ("online", "whois.nic.online"),
    ("store", "whois.nic.store"),
    ("site", "whois.nic.site"),
    ("tech", "whois.nic.tech"),
    ("blog", "whois.nic.blog"),
    ("club", "whois.nic.club"),
    ("live", "whois.nic.live"),
    ("cloud", "whois.nic.cloud"),
    ("vip", "whois.nic.vip"),
    // Country codes
    ("io", "whois.nic.io"),
    ("ai", "whois.nic.ai"),
    ("co", "whois.nic.co"),
    ("me", "whois.nic.me"),
    ("tv", "whois.nic.tv"),
    ("cc", "ccwhois.verisign-grs.com"),
    ("us", "whois.nic.us"),
    ("ca", "whois.cira.ca"),
    ("uk", "whois.nic.uk"),
    ("de", "whois.denic.de"),
    ("fr", "whois.nic.fr"),
    ("it", "whois.nic.it"),
    ("nl", "whois.domain-registry.nl"),
    ("be", "whois.dns.be"),
    ("ch", "whois.nic.ch"),
    ("at", "whois.nic.at"),
    ("se", "whois.iis.se"),
    ("no", "whois.norid.no"),
    ("dk", "whois.punktum.dk"),
    ("fi", "whois.fi"),
    ("pl", "whois.dns.pl"),
    ("cz", "whois.nic.cz"),
    ("eu", "whois.eu"),
    ("ru", "whois.tcinet.ru"),
    ("su", "whois.tcinet.ru"),
    ("jp", "whois.jprs.jp"),
    ("kr", "whois.kr"),
    ("cn", "whois.cnnic.cn"),
    ("hk", "whois.hkirc.hk"),
    ("tw", "whois.twnic.net.tw"),
    ("sg", "whois.sgnic.sg"),
    ("in", "whois.registry.in"),
    ("au", "whois.auda.org.au"),
    ("nz", "whois.irs.net.nz"),
    ("br", "whois.registro.br"),
    ("mx", "whois.mx"),
    ("za", "whois.registry.net.za"),
];

static SUFFIX_TABLE: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| SUFFIX_SERVERS.iter().copied().collect());

/// Trims, lower-cases and IDNA-encodes `input`, rejecting anything that is not
/// a multi-label host name.
pub fn normalize_domain(input: &str) -> Result<String, WhoisError> {
    let trimmed = input.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        return Err(WhoisError::UnsupportedDomain("empty domain".to_string()));
    }

    let domain = match Host::parse(trimmed) {
        Ok(Host::Domain(domain)) => domain,
        Ok(_) => {
            return Err(WhoisError::UnsupportedDomain(format!(
                "{} is an IP address, not a domain",
                trimmed
            )))
        }
        Err(e) => {
            return Err(WhoisError::UnsupportedDomain(format!("{}: {}", trimmed, e)));
        }
    };

    if domain.len() > MAX_DOMAIN_LENGTH {
        return Err(WhoisError::UnsupportedDomain(format!(
            "{} exceeds {} characters",
            domain, MAX_DOMAIN_LENGTH
        )));
    }

    if !domain.contains('.') {
        return Err(WhoisError::UnsupportedDomain(format!(
            "{} has no suffix",
            domain
        )));
    }

    for label in domain.split('.') {
        let valid = !label.is_empty()
            && label.len() <= MAX_LABEL_LENGTH
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-');
        if !valid {
            return Err(WhoisError::UnsupportedDomain(format!(
                "{} has an invalid label '{}'",
                domain, label
            )));
        }
    }

    Ok(domain)
}

/// Rightmost label of a normalized domain.
pub fn suffix_of(domain: &str) -> Option<&str> {
    match domain.rsplit_once('.') {
        Some((_, suffix)) if !suffix.is_empty() => Some(suffix),
        _ => None,
    }
}

/// Maps suffixes to authoritative servers; consults overrides before the
/// built-in table and falls back to the root server.
#[derive(Debug, Clone)]
pub struct ServerResolver {
    overrides: HashMap<String, String>,
    root_server: String,
}

impl ServerResolver {
    pub fn new(config: &Config) -> Self {
        Self {
            overrides: config.server_overrides.clone(),
            root_server: config.root_server.clone(),
        }
    }

    pub fn resolve(&self, domain: &str) -> Result<String, WhoisError> {
        self.resolve_server(domain).map(|resolved| resolved.host)
    }

    pub fn resolve_server(&self, domain: &str) -> Result<ResolvedServer, WhoisError> {
        let suffix = suffix_of(domain)
            .ok_or_else(|| WhoisError::UnsupportedDomain(format!("{} has no suffix", domain)))?;

        if let Some(server) = self.overrides.get(suffix) {
            debug!("Using override server {} for .{}", server, suffix);
            return Ok(ResolvedServer::direct(server));
        }

        if let Some(server) = SUFFIX_TABLE.get(suffix) {
            return Ok(ResolvedServer::direct(server));
        }

        debug!("No known server for .{}, falling back to {}", suffix, self.root_server);
        Ok(ResolvedServer {
            host: self.root_server.clone(),
            via_root: true,
        })
    }
}

/// Server chosen for a domain. `via_root` means the suffix was unknown and
/// the root server has to name the real one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedServer {
    pub host: String,
    pub via_root: bool,
}

impl ResolvedServer {
    fn direct(host: &str) -> Self {
        Self {
            host: host.to_string(),
            via_root: false,
        }
    }
}
