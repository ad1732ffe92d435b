//! Core data types for domain availability checking.
//!
//! This module defines the normalized domain identifier, the per-domain
//! verdict, the aggregated batch result, their JSON wire forms, and the
//! checker configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A validated, normalized domain name.
///
/// Only the normalizer can build one, so holding a `DomainIdentifier` means
/// the name is lowercase, well formed, and does not begin with a hyphen.
/// `full == label + "." + tld` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DomainIdentifier {
    full: String,
    label: String,
    tld: String,
}

impl DomainIdentifier {
    pub(crate) fn from_parts(full: String, label: String, tld: String) -> Self {
        debug_assert_eq!(full, format!("{}.{}", label, tld));
        Self { full, label, tld }
    }

    /// The canonical lowercase dotted name (e.g. "sub.example.org").
    pub fn full(&self) -> &str {
        &self.full
    }

    /// Everything before the final dot-segment (e.g. "sub.example").
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The final dot-segment (e.g. "org").
    pub fn tld(&self) -> &str {
        &self.tld
    }
}

impl std::fmt::Display for DomainIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full)
    }
}

/// Final availability status of one domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Available,
    Taken,
    Error,
}

/// Which data source produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckMethod {
    /// Nameserver / address / mail records exist
    #[serde(rename = "dns")]
    Dns,

    /// Registration Data Access Protocol
    #[serde(rename = "rdap")]
    Rdap,

    /// Legacy WHOIS lookup
    #[serde(rename = "whois")]
    Whois,
}

impl CheckMethod {
    /// Wire name of the method ("dns", "rdap", "whois").
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckMethod::Dns => "dns",
            CheckMethod::Rdap => "rdap",
            CheckMethod::Whois => "whois",
        }
    }
}

impl std::fmt::Display for CheckMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckMethod::Dns => write!(f, "DNS"),
            CheckMethod::Rdap => write!(f, "RDAP"),
            CheckMethod::Whois => write!(f, "WHOIS"),
        }
    }
}

/// Result of checking a single domain.
///
/// Built once through [`Verdict::resolved`] or [`Verdict::failed`] and never
/// changed afterwards. Serializes to the `VerdictRecord` wire format.
#[derive(Debug, Clone, Serialize)]
#[serde(into = "VerdictRecord")]
pub struct Verdict {
    domain: String,
    identifier: Option<DomainIdentifier>,
    status: CheckStatus,
    error_message: Option<String>,
    source: Option<CheckMethod>,
    checked_at: DateTime<Utc>,
    duration: Duration,
}

impl Verdict {
    /// A definitive answer from one of the data sources.
    pub fn resolved(
        identifier: DomainIdentifier,
        available: bool,
        source: CheckMethod,
        checked_at: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        Self {
            domain: identifier.full().to_string(),
            identifier: Some(identifier),
            status: if available {
                CheckStatus::Available
            } else {
                CheckStatus::Taken
            },
            error_message: None,
            source: Some(source),
            checked_at,
            duration,
        }
    }

    /// A check that could not produce an answer.
    ///
    /// `domain` is the normalized name when one exists, otherwise the raw input.
    /// `source` names the stage that failed last, if any stage ran.
    pub fn failed(
        domain: impl Into<String>,
        identifier: Option<DomainIdentifier>,
        message: impl Into<String>,
        source: Option<CheckMethod>,
        checked_at: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        Self {
            domain: domain.into(),
            identifier,
            status: CheckStatus::Error,
            error_message: Some(message.into()),
            source,
            checked_at,
            duration,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn identifier(&self) -> Option<&DomainIdentifier> {
        self.identifier.as_ref()
    }

    pub fn status(&self) -> CheckStatus {
        self.status
    }

    /// Convenience flag, true exactly when the status is `Available`.
    pub fn available(&self) -> bool {
        self.status == CheckStatus::Available
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn source(&self) -> Option<CheckMethod> {
        self.source
    }

    pub fn checked_at(&self) -> DateTime<Utc> {
        self.checked_at
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

/// JSON wire format of a verdict.
///
/// Field names are fixed by the HTTP API: `domain, available, error, source,
/// checked_at, duration_ms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictRecord {
    pub domain: String,
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<CheckMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_ms: u64,
}

impl VerdictRecord {
    /// Status reconstructed from the wire fields.
    pub fn status(&self) -> CheckStatus {
        if self.error.is_some() {
            CheckStatus::Error
        } else if self.available {
            CheckStatus::Available
        } else {
            CheckStatus::Taken
        }
    }
}

impl From<Verdict> for VerdictRecord {
    fn from(verdict: Verdict) -> Self {
        Self {
            available: verdict.available(),
            domain: verdict.domain,
            error: verdict.error_message,
            source: verdict.source,
            checked_at: Some(verdict.checked_at),
            duration_ms: verdict.duration.as_millis() as u64,
        }
    }
}

/// Aggregated outcome of a batch check.
///
/// `verdicts` is in input order and `checked == available + taken + errors`.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    #[serde(rename = "results")]
    verdicts: Vec<Verdict>,
    checked: usize,
    available: usize,
    taken: usize,
    errors: usize,
}

impl BatchResult {
    /// Aggregate position-ordered verdicts and count their statuses.
    pub fn from_verdicts(verdicts: Vec<Verdict>) -> Self {
        let mut available = 0;
        let mut taken = 0;
        let mut errors = 0;

        for verdict in &verdicts {
            match verdict.status() {
                CheckStatus::Available => available += 1,
                CheckStatus::Taken => taken += 1,
                CheckStatus::Error => errors += 1,
            }
        }

        Self {
            checked: verdicts.len(),
            verdicts,
            available,
            taken,
            errors,
        }
    }

    pub fn verdicts(&self) -> &[Verdict] {
        &self.verdicts
    }

    pub fn into_verdicts(self) -> Vec<Verdict> {
        self.verdicts
    }

    pub fn checked(&self) -> usize {
        self.checked
    }

    pub fn available(&self) -> usize {
        self.available
    }

    pub fn taken(&self) -> usize {
        self.taken
    }

    pub fn errors(&self) -> usize {
        self.errors
    }
}

/// JSON wire format of a batch result: `results, checked, available, taken, errors`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub results: Vec<VerdictRecord>,
    pub checked: usize,
    pub available: usize,
    pub taken: usize,
    pub errors: usize,
}

impl From<BatchResult> for BatchReport {
    fn from(result: BatchResult) -> Self {
        Self {
            checked: result.checked,
            available: result.available,
            taken: result.taken,
            errors: result.errors,
            results: result.verdicts.into_iter().map(VerdictRecord::from).collect(),
        }
    }
}

/// Configuration options for domain checking operations.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckConfig {
    /// Maximum number of concurrent domain checks within one batch
    /// Default: 10, Range: 1-100
    pub concurrency: usize,

    /// Deadline for a whole batch
    /// Default: 60 seconds
    pub batch_timeout: Duration,

    /// Budget for the DNS pre-filter
    /// Default: 3 seconds
    pub dns_timeout: Duration,

    /// HTTP timeout for RDAP requests
    /// Default: 10 seconds
    pub rdap_timeout: Duration,

    /// Upper bound for a WHOIS lookup (also capped by the caller's deadline)
    /// Default: 10 seconds
    pub whois_timeout: Duration,

    /// Whether to consult the IANA bootstrap registry for TLDs outside the built-in map
    /// Default: false
    pub enable_bootstrap: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            batch_timeout: Duration::from_secs(60),
            dns_timeout: Duration::from_secs(3),
            rdap_timeout: Duration::from_secs(10),
            whois_timeout: Duration::from_secs(10),
            enable_bootstrap: false,
        }
    }
}

impl CheckConfig {
    /// Set concurrency, capped to 1-100 to prevent resource exhaustion.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, 100);
        self
    }

    /// Set the overall batch deadline.
    pub fn with_batch_timeout(mut self, timeout: Duration) -> Self {
        self.batch_timeout = timeout;
        self
    }

    pub fn with_dns_timeout(mut self, timeout: Duration) -> Self {
        self.dns_timeout = timeout;
        self
    }

    pub fn with_rdap_timeout(mut self, timeout: Duration) -> Self {
        self.rdap_timeout = timeout;
        self
    }

    pub fn with_whois_timeout(mut self, timeout: Duration) -> Self {
        self.whois_timeout = timeout;
        self
    }

    /// Enable or disable IANA bootstrap registry.
    pub fn with_bootstrap(mut self, enabled: bool) -> Self {
        self.enable_bootstrap = enabled;
        self
    }
}
