//! RDAP (Registration Data Access Protocol) prober.
//!
//! Looks the domain up at its registry's RDAP endpoint. A 404 means nobody
//! holds the name; a 200 means somebody does. Anything else is an error that
//! sends the cascade on to WHOIS.

use crate::context::CheckContext;
use crate::error::DomainCheckError;
use crate::protocols::registry::RdapRegistry;
use crate::types::DomainIdentifier;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const RDAP_ACCEPT: &str = "application/rdap+json";

/// Registry lookup for one domain.
///
/// `Ok(true)` means available, `Ok(false)` means taken.
#[async_trait]
pub trait RdapProbe: Send + Sync {
    async fn probe(
        &self,
        ctx: &CheckContext,
        domain: &DomainIdentifier,
    ) -> Result<bool, DomainCheckError>;
}

/// The part of an RDAP domain object we look at.
#[derive(Debug, Default, Deserialize)]
struct RdapDomain {
    #[serde(default)]
    status: Vec<String>,
}

/// HTTPS client for RDAP lookups.
#[derive(Clone)]
pub struct RdapClient {
    http_client: reqwest::Client,
    registry: RdapRegistry,
}

impl RdapClient {
    /// Create a client using the built-in endpoint map.
    pub fn new(timeout: Duration) -> Result<Self, DomainCheckError> {
        Self::with_registry(timeout, RdapRegistry::builtin())
    }

    /// Create a client with a custom registry (bootstrap, test endpoints).
    pub fn with_registry(
        timeout: Duration,
        registry: RdapRegistry,
    ) -> Result<Self, DomainCheckError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                DomainCheckError::rdap_transport(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            registry,
        })
    }

    pub fn registry(&self) -> &RdapRegistry {
        &self.registry
    }

    async fn lookup(&self, domain: &DomainIdentifier) -> Result<bool, DomainCheckError> {
        let endpoint = self
            .registry
            .endpoint_for(&self.http_client, domain.tld())
            .await?;
        let url = format!("{}{}", endpoint, domain.full());
        debug!(domain = %domain, url = %url, "RDAP request");

        let response = self
            .http_client
            .get(&url)
            .header(ACCEPT, RDAP_ACCEPT)
            .header(USER_AGENT, concat!("domaincheck/", env!("CARGO_PKG_VERSION")))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(true),
            StatusCode::OK => {
                let body = response.bytes().await?;
                let parsed: RdapDomain = serde_json::from_slice(&body).map_err(|e| {
                    DomainCheckError::unexpected(domain.full(), format!("malformed JSON: {}", e))
                })?;
                // The record exists, so the domain is taken whatever its
                // status list says.
                if !has_registered_status(&parsed.status) {
                    debug!(
                        domain = %domain,
                        statuses = ?parsed.status,
                        "inconclusive RDAP status, assuming taken"
                    );
                }
                Ok(false)
            }
            status => {
                warn!(domain = %domain, status = status.as_u16(), "unexpected RDAP status");
                Err(DomainCheckError::unexpected_status(
                    domain.full(),
                    format!("HTTP {}", status),
                    status.as_u16(),
                ))
            }
        }
    }
}

/// True when the status list names the record as active or registered.
fn has_registered_status(statuses: &[String]) -> bool {
    statuses.iter().any(|s| {
        let s = s.to_lowercase();
        s.contains("active") || s.contains("registered")
    })
}

#[async_trait]
impl RdapProbe for RdapClient {
    async fn probe(
        &self,
        ctx: &CheckContext,
        domain: &DomainIdentifier,
    ) -> Result<bool, DomainCheckError> {
        ctx.run(self.lookup(domain)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize;
    use httpmock::prelude::*;
    use std::collections::HashMap;

    fn client_for(server: &MockServer) -> RdapClient {
        let endpoints = HashMap::from([("com".to_string(), server.url("/domain/"))]);
        RdapClient::with_registry(
            Duration::from_secs(5),
            RdapRegistry::with_endpoints(endpoints),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_404_means_available() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/domain/trucore.com")
                .header("accept", "application/rdap+json");
            then.status(404);
        });

        let client = client_for(&server);
        let domain = normalize("trucore").unwrap();
        let available = client
            .probe(&CheckContext::background(), &domain)
            .await
            .unwrap();

        assert!(available);
        mock.assert();
    }

    #[tokio::test]
    async fn test_200_with_active_status_is_taken() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/domain/google.com");
            then.status(200)
                .header("content-type", "application/rdap+json")
                .json_body(serde_json::json!({
                    "objectClassName": "domain",
                    "status": ["client transfer prohibited", "active"]
                }));
        });

        let client = client_for(&server);
        let domain = normalize("google.com").unwrap();
        let available = client
            .probe(&CheckContext::background(), &domain)
            .await
            .unwrap();
        assert!(!available);
    }

    #[tokio::test]
    async fn test_200_with_empty_status_defaults_to_taken() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/domain/quiet.com");
            then.status(200).body("{}");
        });

        let client = client_for(&server);
        let domain = normalize("quiet.com").unwrap();
        let available = client
            .probe(&CheckContext::background(), &domain)
            .await
            .unwrap();
        assert!(!available);
    }

    #[tokio::test]
    async fn test_malformed_json_is_unexpected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/domain/broken.com");
            then.status(200).body("not json");
        });

        let client = client_for(&server);
        let domain = normalize("broken.com").unwrap();
        let err = client
            .probe(&CheckContext::background(), &domain)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainCheckError::Unexpected { status_code: None, .. }));
    }

    #[tokio::test]
    async fn test_other_status_is_unexpected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/domain/limited.com");
            then.status(429);
        });

        let client = client_for(&server);
        let domain = normalize("limited.com").unwrap();
        let err = client
            .probe(&CheckContext::background(), &domain)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainCheckError::Unexpected {
                status_code: Some(429),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_unmapped_tld_is_unsupported() {
        let server = MockServer::start();
        let client = client_for(&server);
        let domain = normalize("example.zz").unwrap();
        let err = client
            .probe(&CheckContext::background(), &domain)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainCheckError::Unsupported { .. }));
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let endpoints = HashMap::from([(
            "com".to_string(),
            "http://127.0.0.1:1/domain/".to_string(),
        )]);
        let client = RdapClient::with_registry(
            Duration::from_secs(2),
            RdapRegistry::with_endpoints(endpoints),
        )
        .unwrap();
        let domain = normalize("example.com").unwrap();
        let err = client
            .probe(&CheckContext::background(), &domain)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainCheckError::Transport { protocol: "RDAP", .. }));
    }

    #[tokio::test]
    async fn test_cancelled_context() {
        let server = MockServer::start();
        let client = client_for(&server);
        let ctx = CheckContext::background();
        ctx.cancel();

        let domain = normalize("example.com").unwrap();
        let err = client.probe(&ctx, &domain).await.unwrap_err();
        assert!(matches!(err, DomainCheckError::Cancelled));
    }

    #[test]
    fn test_registered_status_detection() {
        assert!(has_registered_status(&["Active".to_string()]));
        assert!(has_registered_status(&[
            "client transfer prohibited".to_string(),
            "registered".to_string(),
        ]));
        assert!(!has_registered_status(&[]));
        assert!(!has_registered_status(&["pending delete".to_string()]));
    }
}
