//! Tweet handlers.

use super::parse_id;
use super::session::Session;
use super::state::ServerState;
use crate::api::{ApiError, ApiResponse, ApiResult};
use crate::enrichment::models::TweetView;
use crate::store::models::TweetRecord;
use crate::store::TweetStore;
use axum::extract::{Path, State};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;

pub fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(create_tweet))
        .route("/user/{userId}", get(user_tweets))
        .route("/{tweetId}", patch(update_tweet))
        .route("/{tweetId}", delete(delete_tweet))
}

#[derive(Deserialize)]
struct TweetBody {
    content: Option<String>,
}

fn required_content(body: TweetBody) -> Result<String, ApiError> {
    body.content
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::InvalidArgument("Content is required".to_string()))
}

async fn create_tweet(
    State(state): State<ServerState>,
    session: Session,
    Json(body): Json<TweetBody>,
) -> ApiResult<TweetRecord> {
    let content = required_content(body)?;
    let tweet = state.store.create_tweet(session.user_id, &content)?;
    Ok(ApiResponse::created(tweet, "Tweet posted successfully"))
}

async fn user_tweets(
    State(state): State<ServerState>,
    session: Option<Session>,
    Path(user_id): Path<String>,
) -> ApiResult<Vec<TweetView>> {
    let owner = parse_id(&user_id, "user")?;
    let viewer = session.map(|s| s.user_id);
    let tweets = state.store.tweets_for_user(owner, viewer)?;
    Ok(ApiResponse::ok(tweets, "User's tweets fetched successfully"))
}

async fn update_tweet(
    State(state): State<ServerState>,
    session: Session,
    Path(tweet_id): Path<String>,
    Json(body): Json<TweetBody>,
) -> ApiResult<TweetRecord> {
    let id = parse_id(&tweet_id, "tweet")?;
    let content = required_content(body)?;

    let Some(existing) = state.store.tweet_by_id(id)? else {
        return Err(ApiError::NotFound("Tweet not found".to_string()));
    };
    if existing.owner_id != session.user_id {
        return Err(ApiError::Unauthorized(
            "Only the owner can modify this tweet".to_string(),
        ));
    }

    let Some(tweet) = state.store.update_tweet(id, &content)? else {
        return Err(ApiError::NotFound("Tweet not found".to_string()));
    };
    Ok(ApiResponse::ok(tweet, "Tweet updated successfully"))
}

async fn delete_tweet(
    State(state): State<ServerState>,
    session: Session,
    Path(tweet_id): Path<String>,
) -> ApiResult<TweetRecord> {
    let id = parse_id(&tweet_id, "tweet")?;

    let Some(existing) = state.store.tweet_by_id(id)? else {
        return Err(ApiError::NotFound("Tweet not found".to_string()));
    };
    if existing.owner_id != session.user_id {
        return Err(ApiError::Unauthorized(
            "Only the owner can delete this tweet".to_string(),
        ));
    }

    let Some(tweet) = state.store.delete_tweet(id)? else {
        return Err(ApiError::NotFound("Tweet not found".to_string()));
    };
    Ok(ApiResponse::ok(tweet, "Tweet deleted successfully"))
}
