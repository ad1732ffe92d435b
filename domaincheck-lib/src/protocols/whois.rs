//! WHOIS prober.
//!
//! Last stage of the cascade. The raw text comes from a [`WhoisSource`]
//! (the system `whois` command in production) and is classified by keyword
//! matching. Inconclusive output counts as taken.

use crate::context::CheckContext;
use crate::error::DomainCheckError;
use crate::types::DomainIdentifier;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Phrases registries use when no record exists. Checked first.
const AVAILABLE_INDICATORS: &[&str] = &[
    "No match for domain",
    "No match for \"",
    "NOT FOUND",
    "No entries found",
    "no matching record",
    "Domain not found",
    "No Data Found",
    "Status: AVAILABLE",
    "Not found:",
];

/// Fields only present in a real registration record.
const TAKEN_INDICATORS: &[&str] = &[
    "Registry Domain ID:",
    "Creation Date:",
    "Registrar:",
    "Domain Status:",
    "Name Server:",
    "Registrant Name:",
];

/// Raw result of one WHOIS lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhoisResponse {
    /// Combined stdout and stderr
    pub output: String,
    /// Whether the lookup exited cleanly
    pub success: bool,
}

impl WhoisResponse {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            success: true,
        }
    }

    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            success: false,
        }
    }
}

/// Where WHOIS text comes from.
///
/// Dropping the returned future must abandon the lookup.
#[async_trait]
pub trait WhoisSource: Send + Sync {
    async fn query(&self, domain: &DomainIdentifier) -> Result<WhoisResponse, DomainCheckError>;
}

/// Runs the system `whois` binary.
#[derive(Debug, Clone, Default)]
pub struct SystemWhois;

#[async_trait]
impl WhoisSource for SystemWhois {
    async fn query(&self, domain: &DomainIdentifier) -> Result<WhoisResponse, DomainCheckError> {
        let output = Command::new("whois")
            .arg(domain.full())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                DomainCheckError::whois_transport(format!(
                    "failed to execute whois command: {}. Make sure 'whois' is installed.",
                    e
                ))
            })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(WhoisResponse {
            output: text,
            success: output.status.success(),
        })
    }
}

/// WHOIS lookup for one domain.
///
/// `Ok(true)` means available, `Ok(false)` means taken.
#[async_trait]
pub trait WhoisProbe: Send + Sync {
    async fn probe(
        &self,
        ctx: &CheckContext,
        domain: &DomainIdentifier,
    ) -> Result<bool, DomainCheckError>;
}

/// Bounded-time WHOIS prober over any text source.
#[derive(Debug, Clone)]
pub struct WhoisClient<S = SystemWhois> {
    source: S,
    timeout: Duration,
}

impl WhoisClient<SystemWhois> {
    pub fn new(timeout: Duration) -> Self {
        Self::with_source(SystemWhois, timeout)
    }
}

impl<S: WhoisSource> WhoisClient<S> {
    pub fn with_source(source: S, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    /// Time allowed for this lookup: the configured timeout, cut short by
    /// the context deadline.
    fn budget(&self, ctx: &CheckContext) -> Duration {
        match ctx.remaining() {
            Some(remaining) => remaining.min(self.timeout),
            None => self.timeout,
        }
    }
}

#[async_trait]
impl<S: WhoisSource> WhoisProbe for WhoisClient<S> {
    async fn probe(
        &self,
        ctx: &CheckContext,
        domain: &DomainIdentifier,
    ) -> Result<bool, DomainCheckError> {
        let budget = self.budget(ctx);

        let response = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(DomainCheckError::Cancelled),
            res = tokio::time::timeout(budget, self.source.query(domain)) => match res {
                Ok(res) => res?,
                Err(_) => return Err(DomainCheckError::timeout("WHOIS query", budget)),
            },
        };

        let available = classify_whois_response(&response)?;
        debug!(domain = %domain, available, exited_ok = response.success, "WHOIS classified");
        Ok(available)
    }
}

/// Decide availability from WHOIS text.
///
/// Available indicators win over taken indicators. Output matching neither
/// set is treated as taken, whether or not the lookup exited cleanly. Only
/// empty output is an error.
pub fn classify_whois_response(response: &WhoisResponse) -> Result<bool, DomainCheckError> {
    let output = response.output.as_str();

    if AVAILABLE_INDICATORS.iter().any(|p| output.contains(p)) {
        return Ok(true);
    }
    if TAKEN_INDICATORS.iter().any(|p| output.contains(p)) {
        return Ok(false);
    }

    if output.trim().is_empty() {
        let message = if response.success {
            "whois returned no output"
        } else {
            "whois exited with an error and no output"
        };
        return Err(DomainCheckError::whois_transport(message));
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize;
    use std::sync::Mutex;

    /// Serves canned responses and records what was asked.
    struct CannedWhois {
        response: Result<WhoisResponse, DomainCheckError>,
        delay: Duration,
        seen: Mutex<Vec<String>>,
    }

    impl CannedWhois {
        fn new(response: Result<WhoisResponse, DomainCheckError>) -> Self {
            Self {
                response,
                delay: Duration::ZERO,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl WhoisSource for CannedWhois {
        async fn query(&self, domain: &DomainIdentifier) -> Result<WhoisResponse, DomainCheckError> {
            self.seen.lock().unwrap().push(domain.full().to_string());
            tokio::time::sleep(self.delay).await;
            self.response.clone()
        }
    }

    fn classify(output: &str, success: bool) -> Result<bool, DomainCheckError> {
        classify_whois_response(&WhoisResponse {
            output: output.to_string(),
            success,
        })
    }

    #[test]
    fn test_available_patterns() {
        for text in [
            "No match for domain \"TRUCORE.COM\".",
            "No match for \"TRUCORE.COM\".",
            "Domain NOT FOUND",
            "No entries found for the selected source(s).",
            "%% no matching record.",
            "Domain not found.",
            "No Data Found",
            "Domain: foo.xyz\nStatus: AVAILABLE",
            "Not found: trucore.dev",
        ] {
            assert!(classify(text, true).unwrap(), "{:?}", text);
        }
    }

    #[test]
    fn test_taken_patterns() {
        for text in [
            "Registry Domain ID: 2138514_DOMAIN_COM-VRSN",
            "Creation Date: 1997-09-15T04:00:00Z",
            "Registrar: MarkMonitor Inc.",
            "Domain Status: clientDeleteProhibited",
            "Name Server: NS1.GOOGLE.COM",
            "Registrant Name: REDACTED",
        ] {
            assert!(!classify(text, true).unwrap(), "{:?}", text);
        }
    }

    #[test]
    fn test_available_checked_before_taken() {
        let text = "Registrar: none\nNo match for domain \"X.COM\".";
        assert!(classify(text, true).unwrap());
    }

    #[test]
    fn test_inconclusive_output_defaults_to_taken() {
        assert!(!classify("some unrecognised banner", true).unwrap());
        assert!(!classify("connect: rate limited, try later", false).unwrap());
    }

    #[test]
    fn test_empty_output_is_error() {
        assert!(matches!(
            classify("", false),
            Err(DomainCheckError::Transport { protocol: "WHOIS", .. })
        ));
        assert!(matches!(
            classify("  \n", true),
            Err(DomainCheckError::Transport { .. })
        ));
    }

    #[tokio::test]
    async fn test_probe_uses_source() {
        let source = CannedWhois::new(Ok(WhoisResponse::ok("No match for \"TRUCORE.COM\".")));
        let client = WhoisClient::with_source(source, Duration::from_secs(10));
        let domain = normalize("trucore").unwrap();

        let available = client
            .probe(&CheckContext::background(), &domain)
            .await
            .unwrap();

        assert!(available);
        assert_eq!(*client.source.seen.lock().unwrap(), vec!["trucore.com"]);
    }

    #[tokio::test]
    async fn test_nonzero_exit_with_registration_text_is_taken() {
        let source = CannedWhois::new(Ok(WhoisResponse::failed("Registrar: Example Inc.")));
        let client = WhoisClient::with_source(source, Duration::from_secs(10));
        let domain = normalize("example.com").unwrap();

        let available = client
            .probe(&CheckContext::background(), &domain)
            .await
            .unwrap();
        assert!(!available);
    }

    #[tokio::test]
    async fn test_source_error_propagates() {
        let source = CannedWhois::new(Err(DomainCheckError::whois_transport("not installed")));
        let client = WhoisClient::with_source(source, Duration::from_secs(10));
        let domain = normalize("example.com").unwrap();

        let err = client
            .probe(&CheckContext::background(), &domain)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainCheckError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_timeout_capped_by_context_deadline() {
        let source =
            CannedWhois::new(Ok(WhoisResponse::ok("Registrar: x"))).slow(Duration::from_secs(5));
        let client = WhoisClient::with_source(source, Duration::from_secs(10));
        let ctx = CheckContext::background().with_timeout(Duration::from_millis(50));
        let domain = normalize("example.com").unwrap();

        let started = std::time::Instant::now();
        let err = client.probe(&ctx, &domain).await.unwrap_err();

        assert!(matches!(err, DomainCheckError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_cancelled_context() {
        let source =
            CannedWhois::new(Ok(WhoisResponse::ok("Registrar: x"))).slow(Duration::from_secs(5));
        let client = WhoisClient::with_source(source, Duration::from_secs(10));
        let ctx = CheckContext::background();
        ctx.cancel();
        let domain = normalize("example.com").unwrap();

        let err = client.probe(&ctx, &domain).await.unwrap_err();
        assert!(matches!(err, DomainCheckError::Cancelled));
    }

    #[tokio::test]
    #[ignore] // Requires the whois binary and network access
    async fn test_system_whois_real_domain() {
        let client = WhoisClient::new(Duration::from_secs(10));
        let domain = normalize("google.com").unwrap();
        let available = client
            .probe(&CheckContext::background(), &domain)
            .await
            .unwrap();
        assert!(!available);
    }
}
