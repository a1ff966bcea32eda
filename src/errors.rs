use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Closed set of failure categories a lookup can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnsupportedDomain,
    ConnectError,
    TimeoutError,
    EmptyResponse,
    AmbiguousResponse,
    ReferralLoop,
    RateLimited,
    ResponseTooLarge,
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnsupportedDomain => "unsupported_domain",
            ErrorKind::ConnectError => "connect_error",
            ErrorKind::TimeoutError => "timeout_error",
            ErrorKind::EmptyResponse => "empty_response",
            ErrorKind::AmbiguousResponse => "ambiguous_response",
            ErrorKind::ReferralLoop => "referral_loop",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::ResponseTooLarge => "response_too_large",
            ErrorKind::Config => "config",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum WhoisError {
    #[error("Unsupported domain: {0}")]
    UnsupportedDomain(String),

    #[error("Connection to {server} failed: {message}")]
    Connect { server: String, message: String },

    #[error("Network timeout")]
    Timeout,

    #[error("Empty response from {0}")]
    EmptyResponse(String),

    #[error("Unrecognized response format for {domain}")]
    AmbiguousResponse { domain: String, raw_text: String },

    #[error("Referral loop for {domain}: {server} referred again to {referred}")]
    ReferralLoop {
        domain: String,
        server: String,
        referred: String,
    },

    #[error("Rate limited by {0}")]
    RateLimited(String),

    #[error("Response too large")]
    ResponseTooLarge,

    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

}

impl WhoisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WhoisError::UnsupportedDomain(_) => ErrorKind::UnsupportedDomain,
            WhoisError::Connect { .. } => ErrorKind::ConnectError,
            WhoisError::Timeout => ErrorKind::TimeoutError,
            WhoisError::EmptyResponse(_) => ErrorKind::EmptyResponse,
            WhoisError::AmbiguousResponse { .. } => ErrorKind::AmbiguousResponse,
            WhoisError::ReferralLoop { .. } => ErrorKind::ReferralLoop,
            WhoisError::RateLimited(_) => ErrorKind::RateLimited,
            WhoisError::ResponseTooLarge => ErrorKind::ResponseTooLarge,
            WhoisError::ConfigError(_) => ErrorKind::Config,
        }
    }

    /// Transient failures worth another attempt against the same server.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::ConnectError
                | ErrorKind::TimeoutError
                | ErrorKind::EmptyResponse
                | ErrorKind::RateLimited
        )
    }

    /// Raw response text for failures where the server did answer.
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            WhoisError::AmbiguousResponse { raw_text, .. } => Some(raw_text),
            _ => None,
        }
    }

    pub(crate) fn connect(server: &str, err: impl fmt::Display) -> Self {
        WhoisError::Connect {
            server: server.to_string(),
            message: err.to_string(),
        }
    }
}

impl From<tokio::time::error::Elapsed> for WhoisError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        WhoisError::Timeout
    }
}

/// Per-domain failure as reported inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub domain: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(domain: impl Into<String>, error: &WhoisError) -> Self {
        Self {
            domain: domain.into(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}
