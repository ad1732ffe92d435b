//! Data sources consulted by the resolution engine.
//!
//! Each prober sits behind a small async trait so the cascade can be driven
//! by mocks in tests.

/// DNS record presence pre-filter
pub mod dns;

/// RDAP (Registration Data Access Protocol) implementation
pub mod rdap;

/// TLD to RDAP endpoint mappings and bootstrap discovery
pub mod registry;

/// WHOIS lookup and response classification
pub mod whois;

pub use dns::{DnsPrefilter, DnsProbe, DnsSignal};
pub use rdap::{RdapClient, RdapProbe};
pub use registry::{get_all_known_tlds, RdapRegistry};
pub use whois::{classify_whois_response, SystemWhois, WhoisClient, WhoisProbe, WhoisResponse, WhoisSource};
