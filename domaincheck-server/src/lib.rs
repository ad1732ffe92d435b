//! HTTP API over the domaincheck engine.
//!
//! | Route | Purpose |
//! |---|---|
//! | `POST /check` | batch of up to 100 domains |
//! | `GET /check/{domain}` | single domain |
//! | `GET /check/` | 400, no domain given |
//! | `GET /health` | liveness |

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use domaincheck_lib::DomainChecker;
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub mod routes;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1 << 20;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub checker: DomainChecker,
}

impl AppState {
    pub fn new(checker: DomainChecker) -> Self {
        Self { checker }
    }
}

/// Build the router.
///
/// Whole requests are cut off a few seconds after the checker's batch
/// deadline, which normally ends the work first.
pub fn router(state: AppState) -> Router {
    let request_timeout = state
        .checker
        .config()
        .batch_timeout
        .saturating_add(Duration::from_secs(5));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/check", post(routes::check_domains))
        .route("/check/", get(routes::missing_domain))
        .route("/check/{domain}", get(routes::check_single))
        .route("/health", get(routes::health))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
