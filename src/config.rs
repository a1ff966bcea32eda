use serde::{Deserialize, Serialize};
use std::{collections::HashMap, time::Duration};

pub const DEFAULT_WHOIS_PORT: u16 = 43;
pub const DEFAULT_ROOT_SERVER: &str = "whois.iana.org";

#[derive(Debug, Clone)]
pub struct Config {
    pub whois_timeout_seconds: u64,
    pub whois_port: u16,
    pub max_retries: usize,
    pub retry_backoff_ms: u64,
    pub concurrency: usize,
    pub batch_timeout_seconds: u64, // 0 disables the batch deadline
    pub max_response_size: usize,
    pub buffer_size: usize,
    pub root_server: String,
    pub cache_ttl_seconds: u64, // 0 disables memoization
    pub cache_max_entries: u64,
    pub server_overrides: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigData {
    pub whois_timeout_seconds: u64,
    pub whois_port: u16,
    pub max_retries: usize,
    pub retry_backoff_ms: u64,
    pub concurrency: usize,
    pub batch_timeout_seconds: u64,
    pub max_response_size: usize,
    pub buffer_size: usize,
    pub root_server: String,
    pub cache_ttl_seconds: u64,
    pub cache_max_entries: u64,
    pub server_overrides: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            whois_timeout_seconds: 10,
            whois_port: DEFAULT_WHOIS_PORT,
            max_retries: 2,
            retry_backoff_ms: 500,
            concurrency: 5,
            batch_timeout_seconds: 0,
            max_response_size: 1024 * 1024,
            buffer_size: 8192,
            root_server: DEFAULT_ROOT_SERVER.to_string(),
            cache_ttl_seconds: 600,
            cache_max_entries: 1000,
            server_overrides: HashMap::new(),
        }
    }
}

impl Config {
    /// Defaults overridden by whatever the process environment provides.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_with(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::load`] with an explicit variable lookup.
    pub fn load_with<F>(lookup: F) -> Result<Self, config::ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let mut settings = config::Config::builder()
            .set_default("whois_timeout_seconds", defaults.whois_timeout_seconds)?
            .set_default("whois_port", defaults.whois_port as i64)?
            .set_default("max_retries", defaults.max_retries as i64)?
            .set_default("retry_backoff_ms", defaults.retry_backoff_ms)?
            .set_default("concurrency", defaults.concurrency as i64)?
            .set_default("batch_timeout_seconds", defaults.batch_timeout_seconds)?
            .set_default("max_response_size", defaults.max_response_size as i64)?
            .set_default("buffer_size", defaults.buffer_size as i64)?
            .set_default("root_server", defaults.root_server.as_str())?
            .set_default("cache_ttl_seconds", defaults.cache_ttl_seconds)?
            .set_default("cache_max_entries", defaults.cache_max_entries)?
            .set_default("server_overrides", "")?;

        settings = Self::apply_env_overrides(settings, &lookup)?;

        let data: ConfigData = settings.build()?.try_deserialize()?;

        let config = Config {
            whois_timeout_seconds: data.whois_timeout_seconds,
            whois_port: data.whois_port,
            max_retries: data.max_retries,
            retry_backoff_ms: data.retry_backoff_ms,
            concurrency: data.concurrency,
            batch_timeout_seconds: data.batch_timeout_seconds,
            max_response_size: data.max_response_size,
            buffer_size: data.buffer_size,
            root_server: data.root_server.trim().to_lowercase(),
            cache_ttl_seconds: data.cache_ttl_seconds,
            cache_max_entries: data.cache_max_entries,
            server_overrides: parse_server_overrides(&data.server_overrides)?,
        };
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides<F>(
        mut settings: config::ConfigBuilder<config::builder::DefaultState>,
        lookup: &F,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Later entries win when several aliases are set
        let env_mappings = [
            ("WHOIS_TIMEOUT", "whois_timeout_seconds"),
            ("WHOIS_TIMEOUT_SECONDS", "whois_timeout_seconds"),
            ("WHOIS_PORT", "whois_port"),
            ("WHOIS_RETRIES", "max_retries"),
            ("WHOIS_MAX_RETRIES", "max_retries"),
            ("WHOIS_RETRY_BACKOFF_MS", "retry_backoff_ms"),
            ("CONCURRENT_WHOIS_QUERIES", "concurrency"),
            ("WHOIS_CONCURRENCY", "concurrency"),
            ("WHOIS_BATCH_TIMEOUT_SECONDS", "batch_timeout_seconds"),
            ("MAX_RESPONSE_SIZE", "max_response_size"),
            ("BUFFER_SIZE", "buffer_size"),
            ("WHOIS_ROOT_SERVER", "root_server"),
            ("CACHE_TTL", "cache_ttl_seconds"),
            ("CACHE_TTL_SECONDS", "cache_ttl_seconds"),
            ("CACHE_SIZE", "cache_max_entries"),
            ("CACHE_MAX_ENTRIES", "cache_max_entries"),
            ("WHOIS_SERVER_OVERRIDES", "server_overrides"),
        ];

        for (env_var, config_key) in env_mappings {
            if let Some(value) = lookup(env_var) {
                settings = settings.set_override(config_key, value)?;
            }
        }

        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.whois_timeout_seconds == 0 {
            return Err(config::ConfigError::Message(
                "whois_timeout_seconds must be greater than zero".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(config::ConfigError::Message(
                "concurrency must be greater than zero".to_string(),
            ));
        }
        if self.buffer_size == 0 || self.max_response_size == 0 {
            return Err(config::ConfigError::Message(
                "buffer_size and max_response_size must be greater than zero".to_string(),
            ));
        }
        if self.root_server.is_empty() {
            return Err(config::ConfigError::Message(
                "root_server must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.whois_timeout_seconds)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn batch_timeout(&self) -> Option<Duration> {
        (self.batch_timeout_seconds > 0).then(|| Duration::from_secs(self.batch_timeout_seconds))
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache_ttl_seconds > 0 && self.cache_max_entries > 0
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.whois_timeout_seconds = seconds;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_retries(mut self, max_retries: usize, backoff_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.retry_backoff_ms = backoff_ms;
        self
    }

    pub fn with_batch_timeout(mut self, seconds: u64) -> Self {
        self.batch_timeout_seconds = seconds;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.whois_port = port;
        self
    }

    pub fn with_root_server(mut self, server: impl Into<String>) -> Self {
        self.root_server = server.into().trim().to_lowercase();
        self
    }

    pub fn with_server_override(mut self, suffix: &str, server: &str) -> Self {
        self.server_overrides.insert(
            suffix.trim().trim_start_matches('.').to_lowercase(),
            server.trim().to_lowercase(),
        );
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.cache_ttl_seconds = 0;
        self
    }
}

/// Parses `com=whois.example.net,dev=whois.nic.google` into a suffix table.
fn parse_server_overrides(raw: &str) -> Result<HashMap<String, String>, config::ConfigError> {
    let mut overrides = HashMap::new();

    for entry in raw.split(|c: char| c == ',' || c == ';' || c.is_whitespace()) {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }

        let (suffix, server) = entry.split_once('=').ok_or_else(|| {
            config::ConfigError::Message(format!(
                "invalid server override '{}', expected suffix=server",
                entry
            ))
        })?;

        let suffix = suffix.trim().trim_start_matches('.').to_lowercase();
        let server = server.trim().to_lowercase();
        if suffix.is_empty() || server.is_empty() {
            return Err(config::ConfigError::Message(format!(
                "invalid server override '{}', expected suffix=server",
                entry
            )));
        }
        overrides.insert(suffix, server);
    }

    Ok(overrides)
}
