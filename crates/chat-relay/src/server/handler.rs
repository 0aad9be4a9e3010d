//! WebSocket admission and health handlers

use super::response::{HealthResponse, Rejection};
use crate::connection::{run_session, SessionHandle};
use crate::server::RelayState;
use axum::{
    extract::{ws::WebSocket, Query, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chat_common::AppError;
use chat_core::Identity;
use futures_util::StreamExt;
use serde::Deserialize;

/// Query string accepted by `GET /ws`
#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    #[serde(default)]
    pub token: Option<String>,
}

/// WebSocket relay handler
///
/// The token is verified before the upgrade is looked at, so an unauthenticated
/// caller always gets 401 whether or not it asked to upgrade.
pub async fn relay_handler(
    State(state): State<RelayState>,
    Query(params): Query<ConnectParams>,
    ws: Option<WebSocketUpgrade>,
) -> Response {
    let token = params.token.unwrap_or_default();
    let identity = match state.jwt().verify(token.trim()) {
        Ok(identity) => identity,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected connection");
            return Rejection(e).into_response();
        }
    };

    let Some(ws) = ws else {
        return Rejection(AppError::invalid_input("Expected a WebSocket upgrade request"))
            .into_response();
    };

    let max_message_bytes = state.session_settings().max_message_bytes;
    ws.max_message_size(max_message_bytes)
        .on_upgrade(move |socket| handle_socket(state, identity, socket))
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: RelayState, identity: Identity, socket: WebSocket) {
    let settings = state.session_settings();
    let (session, outbox) = SessionHandle::new(identity, settings.outbox_capacity);

    tracing::info!(
        session_id = %session.id(),
        user = %session.identity(),
        "WebSocket connection established"
    );

    let (sink, stream) = socket.split();
    run_session(sink, stream, session, outbox, state.hub().clone(), settings).await;
}

/// Liveness probe reporting hub membership counts
///
/// GET /health
pub async fn health_handler(State(state): State<RelayState>) -> (StatusCode, Json<HealthResponse>) {
    match state.hub().stats().await {
        Ok(stats) => (StatusCode::OK, Json(HealthResponse::healthy(stats))),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse::unavailable()),
            )
        }
    }
}
