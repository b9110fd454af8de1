//! Comment handlers.

use super::parse_id;
use super::session::Session;
use super::state::ServerState;
use crate::api::{ApiError, ApiResponse, ApiResult};
use crate::enrichment::models::CommentView;
use crate::pagination::{Page, PageParams, PageRequest};
use crate::store::models::CommentRecord;
use crate::store::{CommentStore, VideoStore};
use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;

pub fn routes() -> Router<ServerState> {
    Router::new()
        .route("/{videoId}", get(list_comments))
        .route("/{videoId}", post(add_comment))
        .route("/c/{commentId}", patch(update_comment))
        .route("/c/{commentId}", delete(delete_comment))
}

async fn list_comments(
    State(state): State<ServerState>,
    session: Option<Session>,
    Path(video_id): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult<Page<CommentView>> {
    let video = parse_id(&video_id, "video")?;
    let request = PageRequest::from_params(&params);
    let viewer = session.map(|s| s.user_id);
    let page = state.store.comments_page(video, request, viewer)?;
    Ok(ApiResponse::ok(page, "Comments fetched successfully"))
}

#[derive(Deserialize)]
struct CommentBody {
    content: Option<String>,
}

fn required_content(body: CommentBody) -> Result<String, ApiError> {
    body.content
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::InvalidArgument("Comment can not be empty".to_string()))
}

async fn add_comment(
    State(state): State<ServerState>,
    session: Session,
    Path(video_id): Path<String>,
    Json(body): Json<CommentBody>,
) -> ApiResult<CommentRecord> {
    let video = parse_id(&video_id, "video")?;
    let content = required_content(body)?;
    if state.store.video_by_id(video)?.is_none() {
        return Err(ApiError::NotFound("Video not found".to_string()));
    }
    let comment = state.store.add_comment(video, session.user_id, &content)?;
    Ok(ApiResponse::created(comment, "Comment posted successfully"))
}

async fn update_comment(
    State(state): State<ServerState>,
    session: Session,
    Path(comment_id): Path<String>,
    Json(body): Json<CommentBody>,
) -> ApiResult<CommentRecord> {
    let id = parse_id(&comment_id, "comment")?;
    let content = required_content(body)?;

    let Some(existing) = state.store.comment_by_id(id)? else {
        return Err(ApiError::NotFound("Comment not found".to_string()));
    };
    if existing.owner_id != session.user_id {
        return Err(ApiError::Unauthorized(
            "Only the owner can modify this comment".to_string(),
        ));
    }

    let Some(comment) = state.store.update_comment(id, &content)? else {
        return Err(ApiError::NotFound("Comment not found".to_string()));
    };
    Ok(ApiResponse::ok(comment, "Comment updated successfully"))
}

async fn delete_comment(
    State(state): State<ServerState>,
    session: Session,
    Path(comment_id): Path<String>,
) -> ApiResult<CommentRecord> {
    let id = parse_id(&comment_id, "comment")?;

    let Some(existing) = state.store.comment_by_id(id)? else {
        return Err(ApiError::NotFound("Comment not found".to_string()));
    };
    if existing.owner_id != session.user_id {
        return Err(ApiError::Unauthorized(
            "Only the owner can delete this comment".to_string(),
        ));
    }

    let Some(comment) = state.store.delete_comment(id)? else {
        return Err(ApiError::NotFound("Comment not found".to_string()));
    };
    Ok(ApiResponse::ok(comment, "Comment deleted successfully"))
}
