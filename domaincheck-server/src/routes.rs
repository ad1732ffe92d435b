//! Request handlers.

use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domaincheck_lib::{normalize, CheckContext, DomainCheckError, MAX_BATCH_SIZE};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    pub domains: Vec<String>,
}

fn bad_request(message: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, message.into()).into_response()
}

/// `POST /check`
pub async fn check_domains(
    State(state): State<AppState>,
    payload: Result<Json<CheckRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            debug!(error = %rejection, "rejected request body");
            return bad_request("Invalid request format");
        }
    };

    let ctx = CheckContext::background();
    match state.checker.check_batch(&ctx, &request.domains).await {
        Ok(result) => {
            info!(
                checked = result.checked(),
                available = result.available(),
                taken = result.taken(),
                errors = result.errors(),
                "bulk check"
            );
            Json(result).into_response()
        }
        Err(DomainCheckError::EmptyBatch) => bad_request("No domains provided"),
        Err(DomainCheckError::TooManyDomains { .. }) => {
            bad_request(format!("Maximum {} domains per request", MAX_BATCH_SIZE))
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// `GET /check/{domain}`
pub async fn check_single(State(state): State<AppState>, Path(input): Path<String>) -> Response {
    let domain = match normalize(&input) {
        Ok(domain) => domain,
        Err(e) => {
            debug!(input = %input, error = %e, "rejected single check");
            return bad_request("Invalid domain format");
        }
    };

    let ctx = CheckContext::background().with_timeout(state.checker.config().batch_timeout);
    let verdict = state.checker.resolve(&ctx, &domain).await;
    info!(domain = %domain, status = ?verdict.status(), "single check");
    Json(verdict).into_response()
}

/// `GET /check/`
pub async fn missing_domain() -> Response {
    bad_request("No domain specified")
}

/// `GET /health`
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
