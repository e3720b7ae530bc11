use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{DrawQuery, DrawResponse, NewDeckQuery, ShuffleResponse},
};
use storage::Storage;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;

use api::{draw_cards, draw_route, new_deck_route, new_shuffled_deck, ApiContext};
use app_state::AppState;
use config::load_settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    let storage = Storage::new(&settings.database_url)
        .await
        .map_err(|error| {
            error!(
                database_url = %settings.database_url,
                %error,
                "failed to open SQLite database; verify the path is writable"
            );
            error
        })?;

    let state = AppState {
        api: ApiContext {
            storage,
            image_base_url: settings.image_base_url,
        },
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, "deck server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    let new_deck = new_deck_route();
    let draw = draw_route();
    Router::new()
        .route("/healthz", get(healthz))
        .route(new_deck, get(http_new_deck))
        .route(new_deck.trim_end_matches('/'), get(http_new_deck))
        .route(draw, get(http_draw))
        .route(draw.trim_end_matches('/'), get(http_draw))
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    match state.api.storage.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(error) => {
            warn!(%error, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "storage unavailable")
        }
    }
}

async fn http_new_deck(
    State(state): State<Arc<AppState>>,
    Query(q): Query<NewDeckQuery>,
) -> (StatusCode, Json<ShuffleResponse>) {
    match new_shuffled_deck(&state.api, q.deck_count).await {
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(err) => (
            status_for(&err),
            Json(ShuffleResponse::failure(err.message)),
        ),
    }
}

async fn http_draw(
    State(state): State<Arc<AppState>>,
    Path(deck_id): Path<String>,
    Query(q): Query<DrawQuery>,
) -> (StatusCode, Json<DrawResponse>) {
    match draw_cards(&state.api, &deck_id, q.count).await {
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(err) => (
            status_for(&err),
            Json(DrawResponse::failure(Some(deck_id), err.message)),
        ),
    }
}

fn status_for(err: &ApiError) -> StatusCode {
    match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => {
            error!(message = %err.message, "deck request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
