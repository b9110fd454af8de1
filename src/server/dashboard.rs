//! Channel dashboard: aggregate stats and the owner's video list.

use super::session::Session;
use super::state::ServerState;
use crate::api::{ApiError, ApiResponse, ApiResult};
use crate::enrichment::models::{ChannelStats, DashboardVideo};
use crate::store::EngagementStore;
use axum::extract::State;
use axum::routing::get;
use axum::Router;

pub fn routes() -> Router<ServerState> {
    Router::new()
        .route("/stats", get(channel_stats))
        .route("/videos", get(channel_videos))
}

async fn channel_stats(
    State(state): State<ServerState>,
    session: Session,
) -> ApiResult<ChannelStats> {
    let Some(stats) = state.store.channel_stats(session.user_id)? else {
        return Err(ApiError::NotFound("Channel not found".to_string()));
    };
    Ok(ApiResponse::ok(stats, "Channel stats fetched successfully"))
}

async fn channel_videos(
    State(state): State<ServerState>,
    session: Session,
) -> ApiResult<Vec<DashboardVideo>> {
    let videos = state.store.channel_videos(session.user_id)?;
    Ok(ApiResponse::ok(videos, "Videos fetched successfully"))
}
