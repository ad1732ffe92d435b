//! domaincheck CLI
//!
//! Sends a batch of domains to a domaincheck server (or checks them
//! in-process with `--local`) and prints one line per domain.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use domaincheck_lib::{
    load_env_config, normalize_batch, parse_timeout_string, BatchReport, CheckConfig,
    CheckContext, ConfigManager, DomainChecker, EnvConfig, FileConfig,
};
use serde::Serialize;
use std::io::Read;
use std::process;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

const DEFAULT_SERVER: &str = "http://localhost:8765";

/// Request timeout per domain, before clamping.
const TIMEOUT_PER_DOMAIN: Duration = Duration::from_secs(12);
const MIN_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_TIMEOUT: Duration = Duration::from_secs(300);

/// Input files and stdin are read up to this many bytes.
const MAX_INPUT_BYTES: u64 = 10 * 1024 * 1024;
/// Server error bodies are shown up to this many bytes.
const MAX_ERROR_BODY_BYTES: usize = 1024 * 1024;

/// CLI arguments for domaincheck
#[derive(Parser, Debug)]
#[command(name = "domaincheck")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Check domain availability via DNS, RDAP and WHOIS")]
#[command(
    long_about = "Check domain availability via DNS, RDAP and WHOIS.\n\nBare names get .com appended. Domains are sent to a domaincheck server in one batch of up to 100, or checked in-process with --local.\n\nExit status is 0 when at least one domain is available."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Domain names to check (use - to read from stdin)
    #[arg(value_name = "DOMAINS", help_heading = "Domain Selection")]
    pub domains: Vec<String>,

    /// Read domains from a file, one per line (- for stdin)
    #[arg(
        short = 'f',
        long = "file",
        value_name = "FILE",
        help_heading = "Domain Selection"
    )]
    pub file: Option<String>,

    /// Output results in JSON format
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Only show available domains
    #[arg(short = 'a', long = "available", help_heading = "Output Format")]
    pub available_only: bool,

    /// No output; exit 0 if the first domain is available
    #[arg(short = 'q', long = "quiet", help_heading = "Output Format")]
    pub quiet: bool,

    /// Server URL [default: http://localhost:8765]
    #[arg(
        short = 's',
        long = "server",
        value_name = "URL",
        help_heading = "Connection"
    )]
    pub server: Option<String>,

    /// Run the checks in-process instead of calling a server
    #[arg(long = "local", help_heading = "Connection")]
    pub local: bool,

    /// Request timeout (e.g. 90s, 2m) [default: 12s per domain, 30s-300s]
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Connection")]
    pub timeout: Option<String>,

    /// Concurrent checks for --local (1-100)
    #[arg(
        short = 'c',
        long = "concurrency",
        value_name = "N",
        help_heading = "Connection"
    )]
    pub concurrency: Option<usize>,

    /// Use a specific config file instead of discovering one
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Debug logging on stderr
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

/// Body of `POST /check`.
#[derive(Serialize)]
struct CheckRequest<'a> {
    domains: &'a [String],
}

/// Settings after merging defaults, config file, environment and flags.
#[derive(Debug)]
struct Resolved {
    server: String,
    timeout: Option<Duration>,
    check_config: CheckConfig,
}

fn init_logger(verbose: bool) {
    let default = if verbose {
        "domaincheck=debug,domaincheck_lib=debug,warn"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logger(args.verbose);

    match run(args).await {
        Ok(code) => process::exit(code),
        Err(message) => {
            eprintln!("{}", message);
            process::exit(1);
        }
    }
}

/// Run the CLI and return the exit code. `Err` carries the full message
/// for stderr.
async fn run(args: Args) -> Result<i32, String> {
    let settings = resolve_settings(&args)?;

    let inputs = collect_inputs(&args)?;
    if inputs.is_empty() {
        return Err("Error: No domains specified".to_string());
    }

    let mut domains = Vec::with_capacity(inputs.len());
    for (input, normalized) in inputs.iter().zip(normalize_batch(&inputs)) {
        match normalized {
            Ok(domain) => domains.push(domain.full().to_string()),
            Err(e) => {
                return Err(format!("Error: invalid domain format: {} ({})", input, e));
            }
        }
    }

    let timeout = settings
        .timeout
        .unwrap_or_else(|| request_timeout(domains.len()));
    debug!(
        count = domains.len(),
        timeout_secs = timeout.as_secs(),
        local = args.local,
        "checking domains"
    );

    let report = if args.local {
        check_locally(settings.check_config.with_batch_timeout(timeout), &domains).await?
    } else {
        check_remote(&settings.server, &domains, timeout).await?
    };

    Ok(render(&report, &args))
}

fn resolve_settings(args: &Args) -> Result<Resolved, String> {
    let manager = ConfigManager::new(args.verbose);
    let file_config = match &args.config {
        Some(path) => manager
            .load_file(path)
            .map_err(|e| format!("Error: {}", e))?,
        None => manager
            .discover_and_load()
            .unwrap_or_else(|_| FileConfig::default()),
    };
    let env_config = load_env_config();

    merge_settings(args, &file_config, &env_config)
}

/// Precedence: defaults, then config file, then environment, then flags.
fn merge_settings(
    args: &Args,
    file_config: &FileConfig,
    env_config: &EnvConfig,
) -> Result<Resolved, String> {
    let server = args
        .server
        .clone()
        .or_else(|| env_config.server.clone())
        .or_else(|| file_config.client_server().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_SERVER.to_string());

    if !server.starts_with("http://") && !server.starts_with("https://") {
        return Err("Error: server URL must start with http:// or https://".to_string());
    }

    let timeout = match &args.timeout {
        Some(value) => {
            let secs = parse_timeout_string(value)
                .filter(|secs| *secs > 0)
                .ok_or_else(|| format!("Error: invalid timeout: {}", value))?;
            Some(Duration::from_secs(secs))
        }
        None => env_config.timeout,
    };

    let mut check_config = env_config.apply_to(file_config.apply_to(CheckConfig::default()));
    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 || concurrency > 100 {
            return Err("Error: concurrency must be between 1 and 100".to_string());
        }
        check_config = check_config.with_concurrency(concurrency);
    }

    Ok(Resolved {
        server: server.trim_end_matches('/').to_string(),
        timeout,
        check_config,
    })
}

/// Whole-request timeout for a batch of `count` domains.
fn request_timeout(count: usize) -> Duration {
    let count = u32::try_from(count).unwrap_or(u32::MAX);
    TIMEOUT_PER_DOMAIN
        .saturating_mul(count)
        .clamp(MIN_TIMEOUT, MAX_TIMEOUT)
}

/// Positional domains plus whatever `--file` or `-` provides, in that order.
fn collect_inputs(args: &Args) -> Result<Vec<String>, String> {
    let mut inputs = Vec::new();
    let mut read_stdin = false;

    for domain in &args.domains {
        if domain == "-" {
            read_stdin = true;
        } else {
            inputs.push(domain.clone());
        }
    }

    match args.file.as_deref() {
        Some("-") => read_stdin = true,
        Some(path) => {
            let file = std::fs::File::open(path)
                .map_err(|e| format!("Error opening file: {}", e))?;
            inputs.extend(read_domains(file).map_err(|e| format!("Error reading input: {}", e))?);
        }
        None => {}
    }

    if read_stdin {
        inputs.extend(
            read_domains(std::io::stdin().lock())
                .map_err(|e| format!("Error reading input: {}", e))?,
        );
    }

    Ok(inputs)
}

/// Read one domain per line, skipping blanks and `#` comments. Input past
/// [`MAX_INPUT_BYTES`] is ignored.
fn read_domains<R: Read>(reader: R) -> std::io::Result<Vec<String>> {
    let mut data = Vec::new();
    reader.take(MAX_INPUT_BYTES).read_to_end(&mut data)?;

    Ok(String::from_utf8_lossy(&data)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

async fn check_remote(
    server: &str,
    domains: &[String],
    timeout: Duration,
) -> Result<BatchReport, String> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("domaincheck/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| format!("Error: failed to build HTTP client: {}", e))?;

    let url = format!("{}/check", server);
    debug!(url = %url, "sending batch");

    let mut response = client
        .post(&url)
        .json(&CheckRequest { domains })
        .send()
        .await
        .map_err(|e| {
            format!(
                "Error connecting to server: {}\nMake sure the server is running: domaincheck-server",
                e
            )
        })?;

    let status = response.status();
    if !status.is_success() {
        let mut body = Vec::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    let room = MAX_ERROR_BODY_BYTES - body.len();
                    body.extend_from_slice(&chunk[..chunk.len().min(room)]);
                    if body.len() >= MAX_ERROR_BODY_BYTES {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    return Err(format!(
                        "Server error ({}): (could not read body: {})",
                        status.as_u16(),
                        e
                    ));
                }
            }
        }
        return Err(format!(
            "Server error ({}): {}",
            status.as_u16(),
            String::from_utf8_lossy(&body)
        ));
    }

    response
        .json::<BatchReport>()
        .await
        .map_err(|e| format!("Error parsing response: {}", e))
}

async fn check_locally(config: CheckConfig, domains: &[String]) -> Result<BatchReport, String> {
    let checker = DomainChecker::with_config(config).map_err(|e| format!("Error: {}", e))?;
    let ctx = CheckContext::background();

    checker
        .check_batch(&ctx, domains)
        .await
        .map(BatchReport::from)
        .map_err(|e| format!("Error: {}", e))
}

/// Print the report in the requested mode and pick the exit code.
fn render(report: &BatchReport, args: &Args) -> i32 {
    if args.quiet {
        let first_available = report.results.first().is_some_and(|r| r.available);
        return if first_available { 0 } else { 1 };
    }

    if args.json {
        return match ui::format_json(report, args.available_only) {
            Ok(json) => {
                println!("{}", json);
                0
            }
            Err(e) => {
                eprintln!("Error: failed to encode response: {}", e);
                1
            }
        };
    }

    ui::print_text(report, args.available_only);

    if report.available == 0 {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domaincheck_lib::ClientSection;
    use std::io::Write;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["domaincheck"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_request_timeout_clamps() {
        assert_eq!(request_timeout(1), MIN_TIMEOUT);
        assert_eq!(request_timeout(2), MIN_TIMEOUT);
        assert_eq!(request_timeout(3), Duration::from_secs(36));
        assert_eq!(request_timeout(10), Duration::from_secs(120));
        assert_eq!(request_timeout(25), MAX_TIMEOUT);
        assert_eq!(request_timeout(100), MAX_TIMEOUT);
    }

    #[test]
    fn test_read_domains_skips_blanks_and_comments() {
        let input = "# shortlist\ntrucore\n\n   example.org  \n#example.net\r\nfoo.io\n";
        let domains = read_domains(input.as_bytes()).unwrap();
        assert_eq!(domains, ["trucore", "example.org", "foo.io"]);
    }

    #[test]
    fn test_read_domains_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "alpha\nbeta.net").unwrap();

        let domains = read_domains(std::fs::File::open(file.path()).unwrap()).unwrap();
        assert_eq!(domains, ["alpha", "beta.net"]);
    }

    #[test]
    fn test_collect_inputs_combines_args_and_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "from-file").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let inputs = collect_inputs(&args(&["first", "-f", path.as_str()])).unwrap();
        assert_eq!(inputs, ["first", "from-file"]);
    }

    #[test]
    fn test_collect_inputs_missing_file() {
        let err = collect_inputs(&args(&["-f", "/nonexistent/domains.txt"])).unwrap_err();
        assert!(err.starts_with("Error opening file:"));
    }

    #[test]
    fn test_merge_settings_precedence() {
        let file_config = FileConfig {
            client: Some(ClientSection {
                server: Some("http://file:1".to_string()),
            }),
            ..Default::default()
        };
        let env_config = EnvConfig {
            server: Some("http://env:2".to_string()),
            concurrency: Some(4),
            ..Default::default()
        };

        let resolved = merge_settings(&args(&[]), &FileConfig::default(), &EnvConfig::default())
            .unwrap();
        assert_eq!(resolved.server, DEFAULT_SERVER);
        assert_eq!(resolved.timeout, None);

        let resolved = merge_settings(&args(&[]), &file_config, &EnvConfig::default()).unwrap();
        assert_eq!(resolved.server, "http://file:1");

        let resolved = merge_settings(&args(&[]), &file_config, &env_config).unwrap();
        assert_eq!(resolved.server, "http://env:2");
        assert_eq!(resolved.check_config.concurrency, 4);

        let resolved = merge_settings(
            &args(&["-s", "https://cli:3/", "-c", "7", "--timeout", "2m"]),
            &file_config,
            &env_config,
        )
        .unwrap();
        assert_eq!(resolved.server, "https://cli:3");
        assert_eq!(resolved.check_config.concurrency, 7);
        assert_eq!(resolved.timeout, Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_merge_settings_rejections() {
        let empty_file = FileConfig::default();
        let empty_env = EnvConfig::default();

        let err = merge_settings(&args(&["-s", "localhost:8765"]), &empty_file, &empty_env)
            .unwrap_err();
        assert_eq!(err, "Error: server URL must start with http:// or https://");

        let err = merge_settings(&args(&["-c", "0"]), &empty_file, &empty_env).unwrap_err();
        assert!(err.contains("concurrency"));

        let err = merge_settings(&args(&["--timeout", "soon"]), &empty_file, &empty_env)
            .unwrap_err();
        assert_eq!(err, "Error: invalid timeout: soon");
    }
}
