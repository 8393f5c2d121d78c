use crate::config::RelayConfig;
use crate::room::RoomRegistry;
use crate::signaling::ws_handler;
use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tracing::info;

/// Маршрут websocket: ws://host:port/ws/{room_id}/{user_id}
pub fn router(registry: RoomRegistry) -> Router {
    Router::new()
        .route("/ws/{room_id}/{user_id}", get(ws_handler))
        .with_state(registry)
}

pub async fn serve(config: RelayConfig) -> Result<()> {
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind relay on {}", config.bind))?;
    serve_listener(listener, RoomRegistry::new()).await
}

/// Runs the relay on an already bound listener until the server stops.
pub async fn serve_listener(listener: TcpListener, registry: RoomRegistry) -> Result<()> {
    let addr = listener.local_addr().context("Listener has no local address")?;
    info!("Relay listening on ws://{}", addr);

    axum::serve(listener, router(registry))
        .await
        .context("Relay server stopped with an error")
}
