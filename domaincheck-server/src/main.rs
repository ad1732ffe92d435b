//! domaincheck-server binary.

use clap::Parser;
use domaincheck_lib::{load_env_config, CheckConfig, ConfigManager, DomainChecker, FileConfig};
use domaincheck_server::{serve, AppState};
use std::net::SocketAddr;
use std::process;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_BIND: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8765;

/// HTTP API for domain availability checks
#[derive(Parser, Debug)]
#[command(name = "domaincheck-server")]
#[command(version)]
struct Args {
    /// Address to listen on
    #[arg(short = 'b', long = "bind")]
    bind: Option<String>,

    /// Port to listen on (overrides PORT)
    #[arg(short = 'p', long = "port")]
    port: Option<u16>,

    /// Use a specific config file instead of discovering one
    #[arg(long = "config", value_name = "FILE")]
    config: Option<String>,

    /// Debug logging
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn init_logger(verbose: bool) {
    let default = if verbose {
        "domaincheck_lib=debug,domaincheck_server=debug,tower_http=debug,info"
    } else {
        "info"
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

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logger(args.verbose);

    if let Err(e) = run(args).await {
        error!("{}", e);
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let manager = ConfigManager::new(args.verbose);
    let file_config = match &args.config {
        Some(path) => manager.load_file(path)?,
        None => manager.discover_and_load().unwrap_or_else(|_| FileConfig::default()),
    };
    let env_config = load_env_config();

    let check_config = env_config.apply_to(file_config.apply_to(CheckConfig::default()));
    let bind = args
        .bind
        .or_else(|| file_config.server_bind().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_BIND.to_string());
    let port = args
        .port
        .or(env_config.port)
        .or(file_config.server_port())
        .unwrap_or(DEFAULT_PORT);

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    let checker = DomainChecker::with_config(check_config)?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        address = %listener.local_addr()?,
        concurrency = checker.config().concurrency,
        "domaincheck server listening"
    );

    serve(listener, AppState::new(checker), shutdown_signal()).await?;
    Ok(())
}
