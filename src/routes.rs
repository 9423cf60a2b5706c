//! HTTP handlers: metrics, health probe, and per-log tails.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::collections::HashMap;
use tracing::warn;

use crate::logtail;
use crate::metrics::collect_metrics;
use crate::state::AppState;
use crate::types::{Health, MetricsDocument};

pub async fn metrics_handler(State(state): State<AppState>) -> Json<MetricsDocument> {
    Json(collect_metrics(&state.config).await)
}

pub async fn health_handler() -> Json<Health> {
    Json(Health {
        status: "ok",
        timestamp: chrono::Utc::now().timestamp(),
    })
}

/// `GET /logs/{name}?lines=n`. The endpoint exists for exactly one file, so a
/// read failure surfaces as a 500 with the underlying message rather than
/// being papered over.
pub async fn log_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let Some(target) = state.config.logs.iter().find(|l| l.name == name) else {
        return (StatusCode::NOT_FOUND, "unknown log").into_response();
    };
    let n = logtail::clamp_lines(query.get("lines").map(String::as_str));
    match logtail::tail_file(std::path::Path::new(&target.path), n) {
        Ok(body) => ([(header::CONTENT_TYPE, "text/plain")], body).into_response(),
        Err(e) => {
            warn!("tail of {} failed: {e}", target.path);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
