//! Like and dislike toggles plus reacted-video listings.

use super::parse_id;
use super::session::Session;
use super::state::ServerState;
use crate::api::{ApiResponse, ApiResult};
use crate::enrichment::models::ReactedVideo;
use crate::store::models::{ReactionKind, ReactionRecord, ReactionTarget, Toggle};
use crate::store::EngagementStore;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Router;

pub fn like_routes() -> Router<ServerState> {
    Router::new()
        .route("/toggle/v/{videoId}", post(toggle_video_like))
        .route("/toggle/c/{commentId}", post(toggle_comment_like))
        .route("/toggle/t/{tweetId}", post(toggle_tweet_like))
        .route("/videos", get(liked_videos))
}

pub fn dislike_routes() -> Router<ServerState> {
    Router::new()
        .route("/toggle/v/{videoId}", post(toggle_video_dislike))
        .route("/toggle/c/{commentId}", post(toggle_comment_dislike))
        .route("/toggle/t/{tweetId}", post(toggle_tweet_dislike))
        .route("/videos", get(disliked_videos))
}

fn toggle(
    state: &ServerState,
    session: Session,
    target: ReactionTarget,
    kind: ReactionKind,
    subject: &str,
) -> ApiResult<Toggle<ReactionRecord>> {
    let result = state.store.toggle_reaction(session.user_id, target, kind)?;
    let verb = match kind {
        ReactionKind::Like => "like",
        ReactionKind::Dislike => "dislike",
    };
    Ok(ApiResponse::ok(
        result,
        format!("{} {} toggled successfully", subject, verb),
    ))
}

async fn toggle_video_like(
    State(state): State<ServerState>,
    session: Session,
    Path(video_id): Path<String>,
) -> ApiResult<Toggle<ReactionRecord>> {
    let id = parse_id(&video_id, "video")?;
    toggle(&state, session, ReactionTarget::Video(id), ReactionKind::Like, "Video")
}

async fn toggle_comment_like(
    State(state): State<ServerState>,
    session: Session,
    Path(comment_id): Path<String>,
) -> ApiResult<Toggle<ReactionRecord>> {
    let id = parse_id(&comment_id, "comment")?;
    toggle(&state, session, ReactionTarget::Comment(id), ReactionKind::Like, "Comment")
}

async fn toggle_tweet_like(
    State(state): State<ServerState>,
    session: Session,
    Path(tweet_id): Path<String>,
) -> ApiResult<Toggle<ReactionRecord>> {
    let id = parse_id(&tweet_id, "tweet")?;
    toggle(&state, session, ReactionTarget::Tweet(id), ReactionKind::Like, "Tweet")
}

async fn toggle_video_dislike(
    State(state): State<ServerState>,
    session: Session,
    Path(video_id): Path<String>,
) -> ApiResult<Toggle<ReactionRecord>> {
    let id = parse_id(&video_id, "video")?;
    toggle(&state, session, ReactionTarget::Video(id), ReactionKind::Dislike, "Video")
}

async fn toggle_comment_dislike(
    State(state): State<ServerState>,
    session: Session,
    Path(comment_id): Path<String>,
) -> ApiResult<Toggle<ReactionRecord>> {
    let id = parse_id(&comment_id, "comment")?;
    toggle(&state, session, ReactionTarget::Comment(id), ReactionKind::Dislike, "Comment")
}

async fn toggle_tweet_dislike(
    State(state): State<ServerState>,
    session: Session,
    Path(tweet_id): Path<String>,
) -> ApiResult<Toggle<ReactionRecord>> {
    let id = parse_id(&tweet_id, "tweet")?;
    toggle(&state, session, ReactionTarget::Tweet(id), ReactionKind::Dislike, "Tweet")
}

async fn liked_videos(
    State(state): State<ServerState>,
    session: Session,
) -> ApiResult<Vec<ReactedVideo>> {
    let videos = state
        .store
        .reacted_videos(session.user_id, ReactionKind::Like)?;
    Ok(ApiResponse::ok(videos, "Liked videos fetched successfully"))
}

async fn disliked_videos(
    State(state): State<ServerState>,
    session: Session,
) -> ApiResult<Vec<ReactedVideo>> {
    let videos = state
        .store
        .reacted_videos(session.user_id, ReactionKind::Dislike)?;
    Ok(ApiResponse::ok(
        videos,
        "Disliked videos fetched successfully",
    ))
}
