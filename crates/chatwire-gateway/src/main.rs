//! chatwire gateway binary.
//!
//! Loads strict YAML config, resets the presence store, and serves the
//! WebSocket endpoint plus the HTTP API.

use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};

use chatwire_gateway::{app_state, config, router};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::var("CHATWIRE_CONFIG").unwrap_or_else(|_| "chatwire.yaml".into());
    let cfg = config::load_from_file(&path).expect("config load failed");
    let listen: SocketAddr = cfg
        .gateway
        .listen
        .parse()
        .expect("gateway.listen must be a valid SocketAddr");

    let state = app_state::AppState::new(cfg).await.expect("state init failed");
    let app = router::build_router(state.clone());

    tracing::info!(%listen, "chatwire-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen).await.expect("failed to bind");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .expect("server failed");

    state.tracker().shutdown().await;
}
