//! HTTP delivery of player descriptors plus a small authoring API.

pub mod api;
pub mod state;

use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use state::WebState;

/// Build the application router.
pub fn router(web_state: Arc<WebState>) -> Router {
    Router::new()
        // Player polling
        .route("/smil/:player_id", get(api::get_descriptor))
        // Authoring API
        .route("/api/players", get(api::get_players))
        .route("/api/triggers/:item_id", get(api::get_triggers))
        .route("/api/player/:player_id/refresh", get(api::get_refresh))
        .with_state(web_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Start the descriptor server.
pub async fn start_web_server(
    listen_addr: SocketAddr,
    web_state: Arc<WebState>,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(web_state);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    log::info!("Descriptor server listening on http://{}", listen_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
