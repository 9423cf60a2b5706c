//! hostwatch_agent: serves tail views of configured log files, point-in-time
//! system metrics, and a liveness probe over HTTP, gated by an IP allowlist.

mod config;
mod gate;
mod logtail;
mod metrics;
mod procfs;
mod routes;
mod state;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{Allowlist, Config};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_args(std::env::args());
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    match &config.allowlist {
        Allowlist::All => info!("allowed_hosts: *"),
        Allowlist::Hosts(hosts) => info!("allowed_hosts: {hosts:?}"),
    }
    for log in &config.logs {
        info!("serving log {:?} from {}", log.name, log.path);
    }
    if !config.metrics.is_empty() {
        info!("enabled metrics: {:?}", config.metrics);
    }

    let state = AppState {
        config: Arc::new(config),
    };
    let app = Router::new()
        .route("/metrics", get(routes::metrics_handler))
        .route("/health", get(routes::health_handler))
        .route("/logs/:name", get(routes::log_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gate::allowlist_gate,
        ))
        .with_state(state);

    info!("agent listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    // ConnectInfo gives the gate the peer address of each connection.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
