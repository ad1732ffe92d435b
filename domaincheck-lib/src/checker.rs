//! Resolution engine.
//!
//! `DomainChecker` runs the DNS → RDAP → WHOIS cascade for one domain and
//! always produces a [`Verdict`]. Each stage yields an [`Outcome`]; the pure
//! [`next_step`] function decides whether that outcome settles the question
//! or hands over to the next stage.

use crate::context::CheckContext;
use crate::error::DomainCheckError;
use crate::normalize::normalize;
use crate::protocols::{
    DnsPrefilter, DnsProbe, DnsSignal, RdapClient, RdapProbe, RdapRegistry, WhoisClient,
    WhoisProbe,
};
use crate::types::{CheckConfig, CheckMethod, DomainIdentifier, Verdict};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Cascade stages, in order of increasing cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Dns,
    Rdap,
    Whois,
}

/// What a stage reported.
#[derive(Debug)]
pub enum Outcome {
    Dns(DnsSignal),
    Rdap(Result<bool, DomainCheckError>),
    Whois(Result<bool, DomainCheckError>),
}

/// Transition produced by one stage.
#[derive(Debug)]
pub enum Step {
    /// Definitive answer; the cascade stops.
    Resolved { available: bool, source: CheckMethod },
    /// No answer; continue with the given stage.
    Next(Stage),
    /// The last stage failed; the cascade is exhausted.
    Failed(DomainCheckError),
}

/// Cascade transition function.
///
/// DNS only ever settles "taken". RDAP errors (including `Unsupported`) fall
/// through to WHOIS. A WHOIS error ends the cascade.
pub fn next_step(outcome: Outcome) -> Step {
    match outcome {
        Outcome::Dns(signal) if signal.definitive => Step::Resolved {
            available: false,
            source: CheckMethod::Dns,
        },
        Outcome::Dns(_) => Step::Next(Stage::Rdap),
        Outcome::Rdap(Ok(available)) => Step::Resolved {
            available,
            source: CheckMethod::Rdap,
        },
        Outcome::Rdap(Err(_)) => Step::Next(Stage::Whois),
        Outcome::Whois(Ok(available)) => Step::Resolved {
            available,
            source: CheckMethod::Whois,
        },
        Outcome::Whois(Err(e)) => Step::Failed(e),
    }
}

/// Main domain checker that coordinates the probers.
///
/// Cloning is cheap; probers are shared behind `Arc`s.
///
/// # Example
///
/// ```rust,no_run
/// use domaincheck_lib::{CheckContext, DomainChecker};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let checker = DomainChecker::new()?;
///     let verdict = checker
///         .check_domain(&CheckContext::background(), "example.com")
///         .await?;
///     println!("{} available: {}", verdict.domain(), verdict.available());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct DomainChecker {
    config: CheckConfig,
    dns: Arc<dyn DnsProbe>,
    rdap: Arc<dyn RdapProbe>,
    whois: Arc<dyn WhoisProbe>,
}

impl DomainChecker {
    /// Create a checker with default configuration and the real probers.
    pub fn new() -> Result<Self, DomainCheckError> {
        Self::with_config(CheckConfig::default())
    }

    /// Create a checker with the real probers tuned by `config`.
    pub fn with_config(config: CheckConfig) -> Result<Self, DomainCheckError> {
        let registry = RdapRegistry::builtin().with_bootstrap(config.enable_bootstrap);
        let rdap = RdapClient::with_registry(config.rdap_timeout, registry)?;
        let dns = DnsPrefilter::new(config.dns_timeout);
        let whois = WhoisClient::new(config.whois_timeout);

        Ok(Self::from_parts(
            config,
            Arc::new(dns),
            Arc::new(rdap),
            Arc::new(whois),
        ))
    }

    /// Assemble a checker from arbitrary prober implementations.
    pub fn from_parts(
        config: CheckConfig,
        dns: Arc<dyn DnsProbe>,
        rdap: Arc<dyn RdapProbe>,
        whois: Arc<dyn WhoisProbe>,
    ) -> Self {
        Self {
            config,
            dns,
            rdap,
            whois,
        }
    }

    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// Run the cascade for an already-normalized domain.
    ///
    /// Never fails: exhausting every stage produces an `Error` verdict whose
    /// source is WHOIS.
    pub async fn resolve(&self, ctx: &CheckContext, domain: &DomainIdentifier) -> Verdict {
        let started = Instant::now();
        let checked_at = Utc::now();
        let mut stage = Stage::Dns;

        loop {
            let outcome = match stage {
                Stage::Dns => Outcome::Dns(self.dns.probe(ctx, domain).await),
                Stage::Rdap => Outcome::Rdap(self.rdap.probe(ctx, domain).await),
                Stage::Whois => Outcome::Whois(self.whois.probe(ctx, domain).await),
            };

            if let Outcome::Rdap(Err(e)) = &outcome {
                debug!(domain = %domain, error = %e, "RDAP failed, falling back to WHOIS");
            }

            match next_step(outcome) {
                Step::Resolved { available, source } => {
                    debug!(domain = %domain, available, source = source.as_str(), "resolved");
                    return Verdict::resolved(
                        domain.clone(),
                        available,
                        source,
                        checked_at,
                        started.elapsed(),
                    );
                }
                Step::Next(next) => stage = next,
                Step::Failed(e) => {
                    debug!(domain = %domain, error = %e, "all checks failed");
                    return Verdict::failed(
                        domain.full(),
                        Some(domain.clone()),
                        format!("all checks failed, last error: {}", e),
                        Some(CheckMethod::Whois),
                        checked_at,
                        started.elapsed(),
                    );
                }
            }
        }
    }

    /// Normalize `input` and run the cascade for it.
    ///
    /// # Errors
    ///
    /// Only normalization errors; probe failures end up inside the verdict.
    pub async fn check_domain(
        &self,
        ctx: &CheckContext,
        input: &str,
    ) -> Result<Verdict, DomainCheckError> {
        let domain = normalize(input)?;
        Ok(self.resolve(ctx, &domain).await)
    }
}
