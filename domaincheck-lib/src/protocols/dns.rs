//! DNS pre-filter.
//!
//! A registered domain very often has address, mail or nameserver records.
//! Finding any of them settles the question without touching RDAP or WHOIS.
//! Finding none proves nothing, since plenty of registered domains have no
//! DNS configured at all.

use crate::context::CheckContext;
use crate::types::DomainIdentifier;
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// Outcome of the pre-filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DnsSignal {
    pub likely_available: bool,
    pub definitive: bool,
}

impl DnsSignal {
    /// At least one record exists: the domain is registered.
    pub const REGISTERED: DnsSignal = DnsSignal {
        likely_available: false,
        definitive: true,
    };

    /// Nothing found (or lookups failed): keep going.
    pub const NO_SIGNAL: DnsSignal = DnsSignal {
        likely_available: true,
        definitive: false,
    };
}

/// Cheap existence probe run before any registry lookup.
///
/// Implementations never fail: lookup errors and timeouts count as "no record".
#[async_trait]
pub trait DnsProbe: Send + Sync {
    async fn probe(&self, ctx: &CheckContext, domain: &DomainIdentifier) -> DnsSignal;
}

/// Pre-filter backed by the system resolver configuration.
#[derive(Clone)]
pub struct DnsPrefilter {
    resolver: Arc<TokioAsyncResolver>,
    timeout: Duration,
}

impl DnsPrefilter {
    /// Build a pre-filter from `/etc/resolv.conf`, falling back to public
    /// resolvers when the system configuration cannot be read.
    pub fn new(timeout: Duration) -> Self {
        let resolver = match TokioAsyncResolver::tokio_from_system_conf() {
            Ok(resolver) => resolver,
            Err(e) => {
                debug!(error = %e, "system resolver config unavailable, using defaults");
                let mut opts = ResolverOpts::default();
                opts.timeout = timeout;
                TokioAsyncResolver::tokio(ResolverConfig::default(), opts)
            }
        };

        Self {
            resolver: Arc::new(resolver),
            timeout,
        }
    }

    pub fn with_resolver(resolver: TokioAsyncResolver, timeout: Duration) -> Self {
        Self {
            resolver: Arc::new(resolver),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Query A/AAAA, MX and NS concurrently; true as soon as any returns a record.
    async fn any_record(&self, name: String) -> bool {
        let mut lookups: FuturesUnordered<BoxFuture<'_, bool>> = FuturesUnordered::new();

        let resolver = &self.resolver;
        let ip_name = name.clone();
        lookups.push(Box::pin(async move {
            resolver
                .lookup_ip(ip_name)
                .await
                .map(|found| found.iter().next().is_some())
                .unwrap_or(false)
        }));
        let mx_name = name.clone();
        lookups.push(Box::pin(async move {
            resolver
                .mx_lookup(mx_name)
                .await
                .map(|found| found.iter().next().is_some())
                .unwrap_or(false)
        }));
        lookups.push(Box::pin(async move {
            resolver
                .ns_lookup(name)
                .await
                .map(|found| found.iter().next().is_some())
                .unwrap_or(false)
        }));

        while let Some(found) = lookups.next().await {
            if found {
                return true;
            }
        }
        false
    }
}

#[async_trait]
impl DnsProbe for DnsPrefilter {
    async fn probe(&self, ctx: &CheckContext, domain: &DomainIdentifier) -> DnsSignal {
        // Trailing dot keeps the resolver from applying search domains.
        let fqdn = format!("{}.", domain.full());
        let scoped = ctx.with_timeout(self.timeout);

        match scoped.run(async { Ok(self.any_record(fqdn).await) }).await {
            Ok(true) => {
                debug!(domain = %domain, "DNS records found");
                DnsSignal::REGISTERED
            }
            Ok(false) => DnsSignal::NO_SIGNAL,
            Err(_) => {
                debug!(domain = %domain, timeout = ?self.timeout, "DNS pre-filter gave up");
                DnsSignal::NO_SIGNAL
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_constants() {
        assert!(DnsSignal::REGISTERED.definitive);
        assert!(!DnsSignal::REGISTERED.likely_available);
        assert!(!DnsSignal::NO_SIGNAL.definitive);
        assert!(DnsSignal::NO_SIGNAL.likely_available);
    }

    #[tokio::test]
    async fn test_cancelled_context_gives_no_signal() {
        let prefilter = DnsPrefilter::new(Duration::from_secs(3));
        let ctx = CheckContext::background();
        ctx.cancel();

        let domain = crate::normalize("example.com").unwrap();
        assert_eq!(prefilter.probe(&ctx, &domain).await, DnsSignal::NO_SIGNAL);
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_real_domain_has_records() {
        let prefilter = DnsPrefilter::new(Duration::from_secs(3));
        let domain = crate::normalize("google.com").unwrap();
        let signal = prefilter.probe(&CheckContext::background(), &domain).await;
        assert_eq!(signal, DnsSignal::REGISTERED);
    }
}
