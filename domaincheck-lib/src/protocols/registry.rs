//! TLD to RDAP endpoint mappings and IANA bootstrap discovery.
//!
//! The built-in map answers for the common TLDs without any network access.
//! When bootstrap is enabled, TLDs outside the map are looked up in the IANA
//! RDAP bootstrap file, which is fetched once and cached for 24 hours.

use crate::error::DomainCheckError;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// IANA RDAP bootstrap registry for DNS.
pub const IANA_BOOTSTRAP_URL: &str = "https://data.iana.org/rdap/dns.json";

/// Bootstrap cache TTL: 24 hours (RDAP endpoints rarely change)
const BOOTSTRAP_TTL: Duration = Duration::from_secs(24 * 3600);

lazy_static::lazy_static! {
    static ref BUILTIN_ENDPOINTS: HashMap<&'static str, &'static str> = HashMap::from([
        // Popular gTLDs
        ("com", "https://rdap.verisign.com/com/v1/domain/"),
        ("net", "https://rdap.verisign.com/net/v1/domain/"),
        ("org", "https://rdap.publicinterestregistry.org/rdap/domain/"),
        ("info", "https://rdap.identitydigital.services/rdap/domain/"),
        ("biz", "https://rdap.nic.biz/domain/"),
        // Google
        ("app", "https://pubapi.registry.google/rdap/domain/"),
        ("dev", "https://pubapi.registry.google/rdap/domain/"),
        ("page", "https://pubapi.registry.google/rdap/domain/"),
        // CentralNic
        ("xyz", "https://rdap.centralnic.com/xyz/domain/"),
        ("tech", "https://rdap.centralnic.com/tech/domain/"),
        ("online", "https://rdap.centralnic.com/online/domain/"),
        ("site", "https://rdap.centralnic.com/site/domain/"),
        ("website", "https://rdap.centralnic.com/website/domain/"),
        ("blog", "https://rdap.blog.fury.ca/rdap/domain/"),
        ("shop", "https://rdap.gmoregistry.net/rdap/domain/"),
        // Identity Digital
        ("ai", "https://rdap.identitydigital.services/rdap/domain/"),
        ("io", "https://rdap.identitydigital.services/rdap/domain/"),
        ("me", "https://rdap.identitydigital.services/rdap/domain/"),
        ("zone", "https://rdap.identitydigital.services/rdap/domain/"),
        ("digital", "https://rdap.identitydigital.services/rdap/domain/"),
        // ccTLDs with working RDAP endpoints
        ("us", "https://rdap.nic.us/domain/"),
        ("uk", "https://rdap.nominet.uk/domain/"),
        ("de", "https://rdap.denic.de/domain/"),
        ("ca", "https://rdap.ca.fury.ca/rdap/domain/"),
        ("au", "https://rdap.cctld.au/rdap/domain/"),
        ("fr", "https://rdap.nic.fr/domain/"),
        ("nl", "https://rdap.sidn.nl/domain/"),
        ("br", "https://rdap.registro.br/domain/"),
        ("in", "https://rdap.nixiregistry.in/rdap/domain/"),
        ("tv", "https://rdap.nic.tv/domain/"),
        ("cc", "https://tld-rdap.verisign.com/cc/v1/domain/"),
        ("cloud", "https://rdap.registry.cloud/rdap/domain/"),
    ]);
}

/// Endpoints learned from the bootstrap file.
#[derive(Default)]
struct BootstrapCache {
    endpoints: HashMap<String, String>,
    /// TLDs the last fetch did not list
    no_rdap: HashSet<String>,
    last_fetch: Option<Instant>,
}

impl BootstrapCache {
    fn is_stale(&self) -> bool {
        match self.last_fetch {
            Some(t) => t.elapsed() > BOOTSTRAP_TTL,
            None => true,
        }
    }
}

/// Resolves a TLD to the base URL of its RDAP domain endpoint.
///
/// Cloning is cheap and clones share the bootstrap cache.
#[derive(Clone)]
pub struct RdapRegistry {
    endpoints: Arc<HashMap<String, String>>,
    bootstrap_url: Option<String>,
    cache: Arc<Mutex<BootstrapCache>>,
}

impl Default for RdapRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RdapRegistry {
    /// Registry backed only by the built-in map.
    pub fn builtin() -> Self {
        let endpoints = BUILTIN_ENDPOINTS
            .iter()
            .map(|(tld, url)| (tld.to_string(), url.to_string()))
            .collect();
        Self::with_endpoints(endpoints)
    }

    /// Registry backed by an explicit TLD map (useful for pointing at a test server).
    pub fn with_endpoints(endpoints: HashMap<String, String>) -> Self {
        Self {
            endpoints: Arc::new(endpoints),
            bootstrap_url: None,
            cache: Arc::new(Mutex::new(BootstrapCache::default())),
        }
    }

    /// Enable IANA bootstrap discovery for TLDs outside the map.
    pub fn with_bootstrap(mut self, enabled: bool) -> Self {
        self.bootstrap_url = enabled.then(|| IANA_BOOTSTRAP_URL.to_string());
        self
    }

    /// Fetch bootstrap data from a custom URL instead of IANA.
    pub fn with_bootstrap_url(mut self, url: impl Into<String>) -> Self {
        self.bootstrap_url = Some(url.into());
        self
    }

    pub fn bootstrap_enabled(&self) -> bool {
        self.bootstrap_url.is_some()
    }

    /// Look up the endpoint for `tld`.
    ///
    /// # Errors
    ///
    /// `Unsupported` when the TLD is neither in the map nor (with bootstrap
    /// enabled) in the bootstrap file, and also when the bootstrap fetch fails.
    pub async fn endpoint_for(
        &self,
        http: &reqwest::Client,
        tld: &str,
    ) -> Result<String, DomainCheckError> {
        let tld = tld.to_lowercase();

        if let Some(endpoint) = self.endpoints.get(&tld) {
            return Ok(endpoint.clone());
        }

        let Some(url) = &self.bootstrap_url else {
            return Err(DomainCheckError::unsupported(tld));
        };

        let needs_fetch = {
            let cache = self.lock_cache()?;
            if !cache.is_stale() {
                if let Some(endpoint) = cache.endpoints.get(&tld) {
                    return Ok(endpoint.clone());
                }
                if cache.no_rdap.contains(&tld) {
                    return Err(DomainCheckError::unsupported(tld));
                }
            }
            cache.is_stale()
        };

        if needs_fetch {
            match fetch_bootstrap(http, url).await {
                Ok(endpoints) => {
                    debug!(count = endpoints.len(), "loaded RDAP bootstrap registry");
                    let mut cache = self.lock_cache()?;
                    cache.endpoints = endpoints;
                    cache.no_rdap.clear();
                    cache.last_fetch = Some(Instant::now());
                }
                Err(e) => {
                    warn!(error = %e, "RDAP bootstrap fetch failed");
                    return Err(DomainCheckError::unsupported(tld));
                }
            }
        }

        let mut cache = self.lock_cache()?;
        match cache.endpoints.get(&tld) {
            Some(endpoint) => Ok(endpoint.clone()),
            None => {
                cache.no_rdap.insert(tld.clone());
                Err(DomainCheckError::unsupported(tld))
            }
        }
    }

    /// TLDs this registry can currently answer for, sorted.
    pub fn known_tlds(&self) -> Vec<String> {
        let mut tlds: HashSet<String> = self.endpoints.keys().cloned().collect();
        if let Ok(cache) = self.cache.lock() {
            tlds.extend(cache.endpoints.keys().cloned());
        }
        let mut tlds: Vec<String> = tlds.into_iter().collect();
        tlds.sort();
        tlds
    }

    fn lock_cache(&self) -> Result<std::sync::MutexGuard<'_, BootstrapCache>, DomainCheckError> {
        self.cache
            .lock()
            .map_err(|_| DomainCheckError::internal("Failed to acquire bootstrap cache lock"))
    }
}

/// All TLDs in the built-in map, sorted alphabetically.
pub fn get_all_known_tlds() -> Vec<String> {
    let mut tlds: Vec<String> = BUILTIN_ENDPOINTS.keys().map(|k| k.to_string()).collect();
    tlds.sort();
    tlds
}

/// Download and parse the bootstrap file into a TLD -> endpoint map.
///
/// The file lists `services` as `[[tlds...], [urls...]]` pairs; the first
/// URL of each service is used.
async fn fetch_bootstrap(
    http: &reqwest::Client,
    url: &str,
) -> Result<HashMap<String, String>, DomainCheckError> {
    let response = http.get(url).send().await?;

    if !response.status().is_success() {
        return Err(DomainCheckError::rdap_transport(format!(
            "bootstrap registry returned HTTP {}",
            response.status()
        )));
    }

    let json: serde_json::Value = response.json().await?;
    let services = json
        .get("services")
        .and_then(|s| s.as_array())
        .ok_or_else(|| DomainCheckError::rdap_transport("bootstrap JSON has no 'services' array"))?;

    let mut endpoints = HashMap::new();
    for service in services {
        let Some([tlds, urls, ..]) = service.as_array().map(Vec::as_slice) else {
            continue;
        };
        let Some(base) = urls
            .as_array()
            .and_then(|urls| urls.first())
            .and_then(|u| u.as_str())
        else {
            continue;
        };

        let endpoint = format!("{}/domain/", base.trim_end_matches('/'));
        for tld in tlds.as_array().into_iter().flatten().filter_map(|t| t.as_str()) {
            endpoints.insert(tld.to_lowercase(), endpoint.clone());
        }
    }

    Ok(endpoints)
}
