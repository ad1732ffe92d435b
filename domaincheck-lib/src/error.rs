//! Error handling for domain checking operations.
//!
//! A single error type covers every way a check can fail. The variants fall
//! into three groups that are handled very differently by callers:
//!
//! - request-shape errors (`EmptyBatch`, `TooManyDomains`) abort a batch
//!   before any probing starts;
//! - per-domain errors (normalization, prober failures, `Cancelled`) end up
//!   inside an `Error` verdict at that domain's position;
//! - ambient errors (configuration, files) only occur outside the engine.

use std::time::Duration;
use thiserror::Error;

/// Main error type for domain checking operations.
#[derive(Debug, Clone, Error)]
pub enum DomainCheckError {
    /// The input was empty after trimming whitespace
    #[error("domain cannot be empty")]
    EmptyInput,

    /// The input does not form a valid domain name
    #[error("invalid domain format: {input}")]
    InvalidFormat { input: String },

    /// No RDAP endpoint is known for the TLD
    #[error("RDAP server not configured for TLD: {tld}")]
    Unsupported { tld: String },

    /// Network or process failure while talking to a data source
    #[error("{protocol} request failed: {message}")]
    Transport {
        protocol: &'static str,
        message: String,
    },

    /// The data source answered with something we cannot interpret
    #[error("RDAP returned an unexpected response for '{domain}': {message}")]
    Unexpected {
        domain: String,
        message: String,
        status_code: Option<u16>,
    },

    /// An operation ran past its time budget
    #[error("{operation} timeout after {duration:?}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// A batch request carried no domains
    #[error("no domains provided")]
    EmptyBatch,

    /// A batch request carried more domains than allowed
    #[error("maximum {max} domains per request (got {count})")]
    TooManyDomains { count: usize, max: usize },

    /// The request context was cancelled or its deadline passed
    #[error("request cancelled")]
    Cancelled,

    /// Configuration errors (invalid settings, unparsable files)
    #[error("configuration error: {message}")]
    Config { message: String },

    /// File I/O errors when reading configuration or domain lists
    #[error("file error at '{path}': {message}")]
    File { path: String, message: String },

    /// Anything that does not fit the categories above
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl DomainCheckError {
    /// Create a new invalid format error for the given input.
    pub fn invalid_format<I: Into<String>>(input: I) -> Self {
        Self::InvalidFormat {
            input: input.into(),
        }
    }

    /// Create a new unsupported-TLD error.
    pub fn unsupported<T: Into<String>>(tld: T) -> Self {
        Self::Unsupported { tld: tld.into() }
    }

    /// Create a new transport error for the RDAP protocol.
    pub fn rdap_transport<M: Into<String>>(message: M) -> Self {
        Self::Transport {
            protocol: "RDAP",
            message: message.into(),
        }
    }

    /// Create a new transport error for the WHOIS protocol.
    pub fn whois_transport<M: Into<String>>(message: M) -> Self {
        Self::Transport {
            protocol: "WHOIS",
            message: message.into(),
        }
    }

    /// Create a new unexpected-response error.
    pub fn unexpected<D: Into<String>, M: Into<String>>(domain: D, message: M) -> Self {
        Self::Unexpected {
            domain: domain.into(),
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a new unexpected-response error carrying the HTTP status code.
    pub fn unexpected_status<D: Into<String>, M: Into<String>>(
        domain: D,
        message: M,
        status_code: u16,
    ) -> Self {
        Self::Unexpected {
            domain: domain.into(),
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::File {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Errors about the shape of a whole batch request.
    ///
    /// These abort the batch before any domain is probed and are surfaced to
    /// clients as a bad request.
    pub fn is_request_shape(&self) -> bool {
        matches!(self, Self::EmptyBatch | Self::TooManyDomains { .. })
    }

    /// Errors produced by the normalizer.
    pub fn is_normalization(&self) -> bool {
        matches!(self, Self::EmptyInput | Self::InvalidFormat { .. })
    }
}

impl From<reqwest::Error> for DomainCheckError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::rdap_transport(format!("timed out: {}", err))
        } else if err.is_connect() {
            Self::rdap_transport(format!("connection failed: {}", err))
        } else {
            Self::rdap_transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DomainCheckError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(format!("JSON processing failed: {}", err))
    }
}

impl From<std::io::Error> for DomainCheckError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(format!("I/O error: {}", err))
    }
}
