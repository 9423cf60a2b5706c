//! IP allowlist middleware, consulted before any handler runs.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use tracing::debug;

use crate::state::AppState;

/// Rejects peers outside the allowlist with a bare 403; the body carries no
/// detail about why.
pub async fn allowlist_gate(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let ip = peer.ip().to_string();
    if !state.config.allowlist.permits(&ip) {
        debug!("rejected request from {ip}");
        return (StatusCode::FORBIDDEN, "forbidden").into_response();
    }
    next.run(request).await
}
