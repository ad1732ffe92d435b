//! # Domaincheck Library
//!
//! Decides whether a domain name is registered by cascading through three
//! data sources of increasing cost: DNS record presence, RDAP, and WHOIS.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use domaincheck_lib::{CheckContext, DomainChecker};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let checker = DomainChecker::new()?;
//!     let batch = checker
//!         .check_batch(&CheckContext::background(), &["trucore", "example.org"])
//!         .await?;
//!
//!     for verdict in batch.verdicts() {
//!         println!("{} -> {:?}", verdict.domain(), verdict.status());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Normalization**: bare names get `.com`, other TLDs are left alone, and
//!   anything that could be mistaken for a command-line flag is rejected
//! - **Cascade**: DNS short-circuits registered names, RDAP errors fall back to WHOIS
//! - **Batches**: up to 100 domains, bounded concurrency, one shared deadline
//! - **Conservative**: inconclusive evidence is reported as taken

pub use batch::{check_batch, DEFAULT_CONCURRENCY, MAX_BATCH_SIZE};
pub use checker::{next_step, DomainChecker, Outcome, Stage, Step};
pub use config::{
    load_env_config, load_env_config_from, parse_timeout_string, CheckerSection, ClientSection,
    ConfigManager, EnvConfig, FileConfig, ServerSection,
};
pub use context::CheckContext;
pub use error::DomainCheckError;
pub use normalize::{normalize, normalize_batch};
pub use types::{
    BatchReport, BatchResult, CheckConfig, CheckMethod, CheckStatus, DomainIdentifier, Verdict,
    VerdictRecord,
};

/// Probers and their seams, for callers assembling a custom checker.
pub mod protocols;

mod batch;
mod checker;
mod config;
mod context;
mod error;
mod normalize;
mod types;

pub type Result<T> = std::result::Result<T, DomainCheckError>;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
