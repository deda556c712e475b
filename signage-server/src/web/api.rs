//! Web API endpoints: descriptor delivery and authoring helpers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use log::{error, info, warn};
use serde::Deserialize;
use serde_json::json;
use signage_descriptor::{refresh, trigger, Descriptor};

use crate::render::{self, RenderError};
use crate::store::{self, StoreError};
use crate::web::state::WebState;

/// Content type of SMIL descriptors.
pub const SMIL_CONTENT_TYPE: &str = "application/smil+xml";

/// Header listing queued player commands, comma separated.
pub static COMMANDS_HEADER: HeaderName = HeaderName::from_static("x-player-commands");

/// Header set when a cached descriptor is served instead of a fresh one.
pub static STALE_HEADER: HeaderName = HeaderName::from_static("x-descriptor-stale");

/// Trigger catalogue query.
#[derive(Debug, Deserialize)]
pub struct TriggerQuery {
    pub lang: Option<String>,
}

fn smil_response(descriptor: &Descriptor, stale: bool) -> Response {
    let commands = descriptor
        .commands
        .iter()
        .map(|c| c.wire_name())
        .collect::<Vec<_>>()
        .join(",");

    let mut response = (
        StatusCode::OK,
        [(CONTENT_TYPE, SMIL_CONTENT_TYPE)],
        descriptor.text.clone(),
    )
        .into_response();

    let headers = response.headers_mut();
    if !commands.is_empty() {
        if let Ok(value) = HeaderValue::from_str(&commands) {
            headers.insert(COMMANDS_HEADER.clone(), value);
        }
    }
    if stale {
        headers.insert(STALE_HEADER.clone(), HeaderValue::from_static("true"));
    }
    response
}

fn store_error_response(err: &StoreError) -> Response {
    match err {
        StoreError::UnknownPlayer(_) => (StatusCode::NOT_FOUND, err.to_string()).into_response(),
        StoreError::InvalidId(_) => (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
        _ => {
            error!("Store error: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "store error").into_response()
        }
    }
}

/// Deliver a player's descriptor.
pub async fn get_descriptor(
    State(web_state): State<Arc<WebState>>,
    Path(player_id): Path<String>,
) -> impl IntoResponse {
    if !store::is_valid_id(&player_id) {
        return (StatusCode::BAD_REQUEST, "invalid player id").into_response();
    }

    let now = web_state.now().await;
    match render::render_player(&web_state.store, &player_id, now).await {
        Ok(descriptor) => {
            info!("Serving descriptor to player {}", player_id);
            let response = smil_response(&descriptor, false);
            web_state.cache.store(&player_id, descriptor).await;
            response
        }
        Err(e) if e.is_environment_fault() => match web_state.cache.get(&player_id).await {
            Some(cached) => {
                warn!(
                    "Player {}: {}; serving descriptor built {}s ago",
                    player_id,
                    e,
                    cached.built_at.elapsed().as_secs()
                );
                smil_response(&cached.descriptor, true)
            }
            None => {
                error!("Player {}: {}; no cached descriptor", player_id, e);
                (StatusCode::SERVICE_UNAVAILABLE, "descriptor unavailable").into_response()
            }
        },
        Err(RenderError::Store(e)) => store_error_response(&e),
        Err(e @ (RenderError::Descriptor(_) | RenderError::Task(_))) => {
            error!("Player {}: {}", player_id, e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// List known players.
pub async fn get_players(State(web_state): State<Arc<WebState>>) -> impl IntoResponse {
    match web_state.store.player_ids().await {
        Ok(players) => {
            let count = players.len();
            Json(json!({
                "success": true,
                "players": players,
                "count": count,
                "cached": web_state.cache.len().await
            }))
            .into_response()
        }
        Err(e) => store_error_response(&e),
    }
}

/// Localized trigger catalogue for a playlist item.
pub async fn get_triggers(
    State(web_state): State<Arc<WebState>>,
    Path(item_id): Path<String>,
    Query(query): Query<TriggerQuery>,
) -> impl IntoResponse {
    let lang = query
        .lang
        .unwrap_or_else(|| web_state.default_locale.clone());

    match web_state
        .store
        .load_localizer(&lang, &web_state.default_locale)
        .await
    {
        Ok(strings) => Json(trigger::compose(&item_id, &strings)).into_response(),
        Err(e) => store_error_response(&e),
    }
}

/// Show the refresh interval computation for a player.
pub async fn get_refresh(
    State(web_state): State<Arc<WebState>>,
    Path(player_id): Path<String>,
) -> impl IntoResponse {
    match web_state.store.load_player(&player_id).await {
        Ok(record) => {
            let config = &record.configuration;
            Json(json!({
                "success": true,
                "player": player_id,
                "duration_seconds": config.duration_seconds,
                "refresh_seconds": config.refresh_seconds,
                "interval_seconds": refresh::compute(config.duration_seconds, config.refresh_seconds)
            }))
            .into_response()
        }
        Err(e) => store_error_response(&e),
    }
}
