use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use bridge_protocol::AskResponse;
use serde_json::Value;
use uuid::Uuid;

use crate::admission::Admission;
use crate::config::BridgeConfig;
use crate::error::AskError;
use crate::request::{effective_timeout, parse_ask_request};
use crate::runner::Runner;

#[derive(Clone)]
pub(crate) struct AppState {
    runner: Arc<Runner>,
    admission: Admission,
    default_timeout_ms: u64,
    max_timeout_ms: u64,
    detailed_exit_status: bool,
}

impl AppState {
    pub(crate) fn new(runner: Arc<Runner>, config: &BridgeConfig) -> Self {
        Self {
            runner,
            admission: Admission::new(config.max_concurrent),
            default_timeout_ms: config.default_timeout_ms,
            max_timeout_ms: config.max_timeout_ms,
            detailed_exit_status: config.detailed_exit_status,
        }
    }
}

pub(crate) fn build_router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/ask", post(ask))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
        .layer(middleware::from_fn(log_http_request))
}

async fn health() -> &'static str {
    "OK"
}

async fn ask(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AskResponse>, AskError> {
    let id = Uuid::new_v4().to_string();
    let body = match payload {
        Ok(Json(body)) => body,
        // A body without a JSON content type is ignored, so validation sees no prompt.
        Err(JsonRejection::MissingJsonContentType(_)) => Value::Null,
        Err(rejection) => {
            tracing::warn!(
                event = "ask.rejected",
                id = %id,
                status = %rejection.status(),
                reason = %rejection.body_text(),
                "request body rejected"
            );
            return Err(AskError::Body {
                status: rejection.status(),
                message: rejection.body_text(),
            });
        }
    };

    let request = parse_ask_request(&body).map_err(|err| {
        tracing::warn!(
            event = "ask.rejected",
            id = %id,
            reason = %err,
            "invalid ask request"
        );
        err
    })?;
    let timeout = effective_timeout(
        request.timeout_ms,
        state.default_timeout_ms,
        state.max_timeout_ms,
    );

    let _permit = state.admission.try_admit().map_err(|err| {
        tracing::warn!(
            event = "ask.busy",
            id = %id,
            reason = %err,
            "ask request refused"
        );
        err
    })?;
    let output = state.runner.run(&id, &request.prompt, timeout).await?;
    Ok(Json(output.into_response(state.detailed_exit_status)))
}

async fn log_http_request(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let started_at = Instant::now();
    let response = next.run(req).await;
    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        latency_ms = started_at.elapsed().as_millis() as u64,
        "http request"
    );
    response
}
