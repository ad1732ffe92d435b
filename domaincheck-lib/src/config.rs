//! Configuration file parsing and management.
//!
//! Settings come from (lowest to highest precedence) built-in defaults,
//! TOML files, `DC_*` environment variables, and finally command-line flags,
//! which the binaries apply on top of what this module produces.

use crate::error::DomainCheckError;
use crate::types::CheckConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration loaded from TOML files.
///
/// ```toml
/// [checker]
/// concurrency = 20
/// batch_timeout = "90s"
/// whois_timeout = "15s"
/// bootstrap = true
///
/// [server]
/// bind = "127.0.0.1"
/// port = 9000
///
/// [client]
/// server = "http://checker.internal:8765"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checker: Option<CheckerSection>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerSection>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientSection>,
}

/// Engine tuning, mapped onto [`CheckConfig`].
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CheckerSection {
    /// Concurrent checks per batch (1-100)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Timeouts as strings, e.g. "5s", "2m"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_timeout: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_timeout: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rdap_timeout: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois_timeout: Option<String>,

    /// Use the IANA bootstrap registry for unmapped TLDs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap: Option<bool>,
}

/// HTTP server listen address.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ServerSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// CLI client settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ClientSection {
    /// Base URL of the domaincheck server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
}

impl FileConfig {
    /// Apply the `[checker]` section on top of `base`.
    pub fn apply_to(&self, mut base: CheckConfig) -> CheckConfig {
        let Some(checker) = &self.checker else {
            return base;
        };

        if let Some(concurrency) = checker.concurrency {
            base = base.with_concurrency(concurrency);
        }
        if let Some(t) = checker.batch_timeout.as_deref().and_then(parse_timeout_string) {
            base.batch_timeout = Duration::from_secs(t);
        }
        if let Some(t) = checker.dns_timeout.as_deref().and_then(parse_timeout_string) {
            base.dns_timeout = Duration::from_secs(t);
        }
        if let Some(t) = checker.rdap_timeout.as_deref().and_then(parse_timeout_string) {
            base.rdap_timeout = Duration::from_secs(t);
        }
        if let Some(t) = checker.whois_timeout.as_deref().and_then(parse_timeout_string) {
            base.whois_timeout = Duration::from_secs(t);
        }
        if let Some(bootstrap) = checker.bootstrap {
            base.enable_bootstrap = bootstrap;
        }
        base
    }

    pub fn server_bind(&self) -> Option<&str> {
        self.server.as_ref().and_then(|s| s.bind.as_deref())
    }

    pub fn server_port(&self) -> Option<u16> {
        self.server.as_ref().and_then(|s| s.port)
    }

    pub fn client_server(&self) -> Option<&str> {
        self.client.as_ref().and_then(|c| c.server.as_deref())
    }
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Report which files were picked up
    pub verbose: bool,
}

impl ConfigManager {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load and validate a specific configuration file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, DomainCheckError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DomainCheckError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            DomainCheckError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            DomainCheckError::config(format!("Failed to parse TOML configuration: {}", e))
        })?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and merge configuration files in precedence order.
    ///
    /// XDG config (lowest), then `~/.domaincheck.toml`, then
    /// `./domaincheck.toml` (highest). Files that fail to load are skipped
    /// with a warning.
    pub fn discover_and_load(&self) -> Result<FileConfig, DomainCheckError> {
        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        let mut merged = FileConfig::default();
        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    if self.verbose {
                        debug!(path = %path.display(), "loaded configuration file");
                    }
                    merged = self.merge_configs(merged, config);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "ignoring configuration file"),
            }
        }

        Ok(merged)
    }

    fn get_local_config_path(&self) -> Option<PathBuf> {
        let path = Path::new("./domaincheck.toml");
        path.exists().then(|| path.to_path_buf())
    }

    fn get_global_config_path(&self) -> Option<PathBuf> {
        let path = Path::new(&env::var_os("HOME")?).join(".domaincheck.toml");
        path.exists().then_some(path)
    }

    /// Follows the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("domaincheck").join("config.toml");
        path.exists().then_some(path)
    }

    /// Values from `higher` take precedence over values from `lower`.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            checker: match (lower.checker, higher.checker) {
                (Some(lo), Some(hi)) => Some(CheckerSection {
                    concurrency: hi.concurrency.or(lo.concurrency),
                    batch_timeout: hi.batch_timeout.or(lo.batch_timeout),
                    dns_timeout: hi.dns_timeout.or(lo.dns_timeout),
                    rdap_timeout: hi.rdap_timeout.or(lo.rdap_timeout),
                    whois_timeout: hi.whois_timeout.or(lo.whois_timeout),
                    bootstrap: hi.bootstrap.or(lo.bootstrap),
                }),
                (lo, hi) => hi.or(lo),
            },
            server: match (lower.server, higher.server) {
                (Some(lo), Some(hi)) => Some(ServerSection {
                    bind: hi.bind.or(lo.bind),
                    port: hi.port.or(lo.port),
                }),
                (lo, hi) => hi.or(lo),
            },
            client: match (lower.client, higher.client) {
                (Some(lo), Some(hi)) => Some(ClientSection {
                    server: hi.server.or(lo.server),
                }),
                (lo, hi) => hi.or(lo),
            },
        }
    }

    fn validate_config(&self, config: &FileConfig) -> Result<(), DomainCheckError> {
        if let Some(checker) = &config.checker {
            if let Some(concurrency) = checker.concurrency {
                if concurrency == 0 || concurrency > 100 {
                    return Err(DomainCheckError::config(
                        "Concurrency must be between 1 and 100",
                    ));
                }
            }

            let timeouts = [
                ("batch_timeout", &checker.batch_timeout),
                ("dns_timeout", &checker.dns_timeout),
                ("rdap_timeout", &checker.rdap_timeout),
                ("whois_timeout", &checker.whois_timeout),
            ];
            for (name, value) in timeouts {
                if let Some(value) = value {
                    match parse_timeout_string(value) {
                        Some(0) => {
                            return Err(DomainCheckError::config(format!(
                                "{} must be greater than zero",
                                name
                            )));
                        }
                        Some(_) => {}
                        None => {
                            return Err(DomainCheckError::config(format!(
                                "Invalid {} '{}'. Use format like '5s', '30s', '2m'",
                                name, value
                            )));
                        }
                    }
                }
            }
        }

        if let Some(server) = config.client_server() {
            if !server.starts_with("http://") && !server.starts_with("https://") {
                return Err(DomainCheckError::config(format!(
                    "Client server '{}' must start with http:// or https://",
                    server
                )));
            }
        }

        Ok(())
    }
}

/// Settings taken from `DC_*` environment variables (and `PORT`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub concurrency: Option<usize>,
    pub timeout: Option<Duration>,
    pub bootstrap: Option<bool>,
    pub server: Option<String>,
    pub port: Option<u16>,
}

impl EnvConfig {
    /// Apply the engine-related variables on top of `base`.
    pub fn apply_to(&self, mut base: CheckConfig) -> CheckConfig {
        if let Some(concurrency) = self.concurrency {
            base = base.with_concurrency(concurrency);
        }
        if let Some(timeout) = self.timeout {
            base.batch_timeout = timeout;
        }
        if let Some(bootstrap) = self.bootstrap {
            base.enable_bootstrap = bootstrap;
        }
        base
    }
}

/// Load configuration from the process environment.
///
/// Invalid values are logged and ignored.
pub fn load_env_config() -> EnvConfig {
    load_env_config_from(|key| env::var(key).ok())
}

/// Load configuration through an arbitrary variable lookup.
pub fn load_env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    if let Some(val) = lookup("DC_CONCURRENCY") {
        match val.trim().parse::<usize>() {
            Ok(concurrency) if (1..=100).contains(&concurrency) => {
                env_config.concurrency = Some(concurrency);
            }
            _ => warn!(value = %val, "invalid DC_CONCURRENCY, must be 1-100"),
        }
    }

    if let Some(val) = lookup("DC_TIMEOUT") {
        match parse_timeout_string(&val) {
            Some(secs) if secs > 0 => env_config.timeout = Some(Duration::from_secs(secs)),
            _ => warn!(value = %val, "invalid DC_TIMEOUT, use a format like '30s' or '2m'"),
        }
    }

    if let Some(val) = lookup("DC_BOOTSTRAP") {
        match parse_bool(&val) {
            Some(enabled) => env_config.bootstrap = Some(enabled),
            None => warn!(value = %val, "invalid DC_BOOTSTRAP, expected true/false"),
        }
    }

    if let Some(val) = lookup("DC_SERVER") {
        let val = val.trim();
        if val.starts_with("http://") || val.starts_with("https://") {
            env_config.server = Some(val.to_string());
        } else if !val.is_empty() {
            warn!(value = %val, "invalid DC_SERVER, must start with http:// or https://");
        }
    }

    if let Some(val) = lookup("PORT") {
        match val.trim().parse::<u16>() {
            Ok(port) if port > 0 => env_config.port = Some(port),
            _ => warn!(value = %val, "invalid PORT"),
        }
    }

    env_config
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a timeout string like "5s", "30s", "2m" into seconds.
///
/// A bare number is read as seconds.
pub fn parse_timeout_string(timeout_str: &str) -> Option<u64> {
    let timeout_str = timeout_str.trim().to_lowercase();

    if let Some(secs) = timeout_str.strip_suffix('s') {
        secs.parse::<u64>().ok()
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        mins.parse::<u64>().ok().and_then(|m| m.checked_mul(60))
    } else {
        timeout_str.parse::<u64>().ok()
    }
}
