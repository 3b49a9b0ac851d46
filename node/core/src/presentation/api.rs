// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use axum::{
    body::Bytes,
    extract::{rejection::FormRejection, DefaultBodyLimit, FromRequest, Request, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

use crate::application::{FileOperationService, LandingInfo, PairingService};
use crate::domain::envelope::{Envelope, RawEnvelope};
use crate::domain::protocol::{NodeResponse, MSG_USE_PANEL};

pub struct AppState {
    pub pairing: Arc<PairingService>,
    pub files: Arc<FileOperationService>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(pairing: Arc<PairingService>, files: Arc<FileOperationService>) -> Self {
        Self {
            pairing,
            files,
            start_time: Instant::now(),
        }
    }
}

/// Build the node router. Bodies larger than `max_body_bytes` are refused
/// with 413 before any handler runs.
pub fn app(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", get(landing_handler))
        .route("/init", post(pair_handler))
        .route("/files/view", post(list_handler))
        .route("/files/delete", post(delete_handler))
        .route("/files/upload", post(upload_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Envelope fields read from a JSON or form-encoded body. A body that
/// parses as neither counts as one with both fields missing. Only body
/// read failures (such as an exceeded size limit) reject the request.
struct EnvelopeBody(Option<Envelope>);

impl<S> FromRequest<S> for EnvelopeBody
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

        if form {
            return match Form::<RawEnvelope>::from_request(req, state).await {
                Ok(Form(raw)) => Ok(Self(raw.into_envelope())),
                Err(FormRejection::BytesRejection(e)) => Err(e.into_response()),
                Err(_) => Ok(Self(None)),
            };
        }

        let body = Bytes::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;
        Ok(Self(RawEnvelope::from_body(&body).into_envelope()))
    }
}

async fn landing_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.pairing.landing_info() {
        LandingInfo::Unpaired { public_key } => Json(json!({ "publickey": public_key })).into_response(),
        LandingInfo::AlreadyConnected => MSG_USE_PANEL.into_response(),
    }
}

async fn pair_handler(
    State(state): State<Arc<AppState>>,
    EnvelopeBody(envelope): EnvelopeBody,
) -> Json<NodeResponse> {
    Json(state.pairing.pair(envelope).await)
}

async fn list_handler(
    State(state): State<Arc<AppState>>,
    EnvelopeBody(envelope): EnvelopeBody,
) -> Json<NodeResponse> {
    Json(state.files.list(envelope).await)
}

async fn delete_handler(
    State(state): State<Arc<AppState>>,
    EnvelopeBody(envelope): EnvelopeBody,
) -> Json<NodeResponse> {
    Json(state.files.delete(envelope).await)
}

async fn upload_handler(
    State(state): State<Arc<AppState>>,
    EnvelopeBody(envelope): EnvelopeBody,
) -> Json<NodeResponse> {
    Json(state.files.upload(envelope).await)
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let status = if state.files.storage_healthy().await {
        "healthy"
    } else {
        "degraded"
    };

    Json(json!({
        "status": status,
        "uptime_seconds": state.start_time.elapsed().as_secs(),
    }))
}
