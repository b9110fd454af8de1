//! HTTP surface: per-resource routers over the shared server state.

mod comments;
mod dashboard;
mod playlists;
mod reactions;
pub mod session;
pub mod state;
mod subscriptions;
mod tweets;
mod users;
mod videos;

use crate::api::ApiError;
use anyhow::Result;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use state::ServerState;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::InvalidArgument(format!("Invalid {} id", what)))
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({
        "statusCode": 200,
        "data": "OK",
        "message": "Service is running",
    }))
}

pub fn build_router(state: ServerState) -> Router {
    let api = Router::new()
        .nest("/users", users::routes())
        .nest("/videos", videos::routes())
        .nest("/comments", comments::routes())
        .nest("/tweets", tweets::routes())
        .nest("/likes", reactions::like_routes())
        .nest("/dislikes", reactions::dislike_routes())
        .nest("/subscriptions", subscriptions::routes())
        .nest("/playlist", playlists::routes())
        .nest("/dashboard", dashboard::routes());

    Router::new()
        .route("/healthcheck", get(healthcheck))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(state: ServerState, port: u16) -> Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Listening on port {}", port);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;
    Ok(())
}
