//! Subscription toggle and listing handlers.

use super::parse_id;
use super::session::Session;
use super::state::ServerState;
use crate::api::{ApiError, ApiResponse, ApiResult};
use crate::enrichment::models::{SubscribedChannel, SubscriberView};
use crate::store::models::{SubscriptionRecord, Toggle};
use crate::store::{EngagementStore, UserStore};
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Router;

pub fn routes() -> Router<ServerState> {
    Router::new()
        .route("/c/{channelId}", post(toggle_subscription))
        .route("/c/{channelId}", get(channel_subscribers))
        .route("/u/{subscriberId}", get(subscribed_channels))
}

async fn toggle_subscription(
    State(state): State<ServerState>,
    session: Session,
    Path(channel_id): Path<String>,
) -> ApiResult<Toggle<SubscriptionRecord>> {
    let channel = parse_id(&channel_id, "channel")?;
    if channel == session.user_id {
        return Err(ApiError::InvalidArgument(
            "Cannot subscribe to your own channel".to_string(),
        ));
    }
    if state.store.user_by_id(channel)?.is_none() {
        return Err(ApiError::NotFound("Channel does not exist".to_string()));
    }
    let result = state.store.toggle_subscription(session.user_id, channel)?;
    Ok(ApiResponse::ok(result, "Subscription toggled successfully"))
}

async fn channel_subscribers(
    State(state): State<ServerState>,
    session: Option<Session>,
    Path(channel_id): Path<String>,
) -> ApiResult<Vec<SubscriberView>> {
    let channel = parse_id(&channel_id, "channel")?;
    let viewer = session.map(|s| s.user_id);
    let subscribers = state.store.channel_subscribers(channel, viewer)?;
    Ok(ApiResponse::ok(
        subscribers,
        "Subscribers fetched successfully",
    ))
}

async fn subscribed_channels(
    State(state): State<ServerState>,
    Path(subscriber_id): Path<String>,
) -> ApiResult<Vec<SubscribedChannel>> {
    let subscriber = parse_id(&subscriber_id, "subscriber")?;
    let channels = state.store.subscribed_channels(subscriber)?;
    Ok(ApiResponse::ok(
        channels,
        "Subscribed channels fetched successfully",
    ))
}
