//! Video handlers: listing, publishing, fetching, updating, deleting.

use super::session::Session;
use super::state::ServerState;
use super::parse_id;
use crate::api::{ApiError, ApiResponse, ApiResult};
use crate::enrichment::models::{VideoDetail, VideoView};
use crate::enrichment::queries::{SortDirection, VideoFilter, VideoSort, VideoSortKey};
use crate::media::MediaStore;
use crate::pagination::{Page, PageRequest};
use crate::store::models::{NewVideo, VideoPatch, VideoRecord};
use crate::store::{HistoryStore, VideoStore};
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::routing::{delete, get, patch, post};
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

pub fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(list_videos))
        .route("/", post(publish_video))
        .route("/{videoId}", get(get_video))
        .route("/{videoId}", patch(update_video))
        .route("/{videoId}", delete(delete_video))
        .route("/toggle/publish/{videoId}", patch(toggle_publish))
        .layer(DefaultBodyLimit::max(512 * 1024 * 1024))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    page: Option<String>,
    limit: Option<String>,
    query: Option<String>,
    sort_by: Option<String>,
    sort_type: Option<String>,
    user_id: Option<String>,
}

async fn list_videos(
    State(state): State<ServerState>,
    session: Option<Session>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Page<VideoView>> {
    let request = PageRequest::from_raw(query.page.as_deref(), query.limit.as_deref());

    let owner = match &query.user_id {
        Some(raw) => Some(parse_id(raw, "user")?),
        None => None,
    };
    let filter = VideoFilter {
        published_only: true,
        owner,
        text: query.query.clone().filter(|s| !s.is_empty()),
    };

    let mut sort = VideoSort::default();
    if let Some(raw) = &query.sort_by {
        sort.key = VideoSortKey::parse(raw)
            .ok_or_else(|| ApiError::InvalidArgument(format!("Unsupported sort field {}", raw)))?;
        sort.direction = match query.sort_type.as_deref() {
            Some(raw) => SortDirection::parse(raw)
                .ok_or_else(|| ApiError::InvalidArgument(format!("Unsupported sort type {}", raw)))?,
            None => SortDirection::Asc,
        };
    }

    let viewer = session.map(|s| s.user_id);
    let page = state.store.list_videos(&filter, sort, request, viewer)?;
    Ok(ApiResponse::ok(page, "Videos fetched successfully"))
}

#[derive(Default)]
struct PublishForm {
    title: Option<String>,
    description: Option<String>,
    video_file: Option<(String, Vec<u8>)>,
    thumbnail: Option<(String, Vec<u8>)>,
}

async fn collect_publish_form(mut multipart: Multipart) -> Result<PublishForm, ApiError> {
    let mut form = PublishForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidArgument(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "videoFile" | "thumbnail" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::InvalidArgument(e.to_string()))?
                    .to_vec();
                if name == "videoFile" {
                    form.video_file = Some((file_name, bytes));
                } else {
                    form.thumbnail = Some((file_name, bytes));
                }
            }
            "title" => {
                form.title = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::InvalidArgument(e.to_string()))?,
                )
            }
            "description" => {
                form.description = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::InvalidArgument(e.to_string()))?,
                )
            }
            _ => {}
        }
    }
    Ok(form)
}

async fn publish_video(
    State(state): State<ServerState>,
    session: Session,
    multipart: Multipart,
) -> ApiResult<VideoRecord> {
    let form = collect_publish_form(multipart).await?;

    let (Some(title), Some(description)) = (
        form.title.filter(|s| !s.trim().is_empty()),
        form.description.filter(|s| !s.trim().is_empty()),
    ) else {
        return Err(ApiError::InvalidArgument(
            "Title and Description are required".to_string(),
        ));
    };
    let (Some((video_name, video_bytes)), Some((thumb_name, thumb_bytes))) =
        (form.video_file, form.thumbnail)
    else {
        return Err(ApiError::InvalidArgument(
            "VideoFile and Thumbnail are required".to_string(),
        ));
    };

    let video_asset = state
        .media
        .upload(&video_name, video_bytes)
        .await
        .map_err(|e| ApiError::Internal(e.into()))?;
    let thumbnail_asset = match state.media.upload(&thumb_name, thumb_bytes).await {
        Ok(asset) => asset,
        Err(e) => {
            // Either upload failing aborts the create; release the
            // sibling asset that already made it up.
            state.media.delete_best_effort(&video_asset.asset_id).await;
            return Err(ApiError::Internal(e.into()));
        }
    };

    let video = state.store.create_video(NewVideo {
        owner_id: session.user_id,
        video_url: video_asset.url,
        video_asset_id: video_asset.asset_id,
        thumbnail_url: thumbnail_asset.url,
        thumbnail_asset_id: thumbnail_asset.asset_id,
        title,
        description,
        duration_secs: video_asset.duration_secs.unwrap_or(0.0),
    })?;
    Ok(ApiResponse::created(video, "Video uploaded successfully"))
}

async fn get_video(
    State(state): State<ServerState>,
    session: Option<Session>,
    Path(video_id): Path<String>,
) -> ApiResult<VideoDetail> {
    let id = parse_id(&video_id, "video")?;
    if state.store.video_by_id(id)?.is_none() {
        return Err(ApiError::NotFound("Video not found".to_string()));
    }

    // Every fetch counts as a view; a known viewer additionally gets
    // the video moved to the front of their watch history.
    match session {
        Some(session) => state.store.record_view(session.user_id, id)?,
        None => state.store.increment_views(id)?,
    }

    let viewer = session.map(|s| s.user_id);
    let Some(detail) = state.store.video_detail(id, viewer)? else {
        return Err(ApiError::NotFound("Video not found".to_string()));
    };
    Ok(ApiResponse::ok(detail, "Video fetched successfully"))
}

async fn owned_video(state: &ServerState, id: Uuid, owner: Uuid) -> Result<VideoRecord, ApiError> {
    let Some(video) = state.store.video_by_id(id)? else {
        return Err(ApiError::NotFound("Video not found".to_string()));
    };
    if video.owner_id != owner {
        return Err(ApiError::Unauthorized(
            "Only the owner can modify this video".to_string(),
        ));
    }
    Ok(video)
}

#[derive(Default)]
struct UpdateForm {
    title: Option<String>,
    description: Option<String>,
    thumbnail: Option<(String, Vec<u8>)>,
}

async fn collect_update_form(mut multipart: Multipart) -> Result<UpdateForm, ApiError> {
    let mut form = UpdateForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidArgument(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "thumbnail" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::InvalidArgument(e.to_string()))?
                    .to_vec();
                form.thumbnail = Some((file_name, bytes));
            }
            "title" | "description" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::InvalidArgument(e.to_string()))?;
                if name == "title" {
                    form.title = Some(value);
                } else {
                    form.description = Some(value);
                }
            }
            _ => {}
        }
    }
    Ok(form)
}

async fn update_video(
    State(state): State<ServerState>,
    session: Session,
    Path(video_id): Path<String>,
    multipart: Multipart,
) -> ApiResult<VideoRecord> {
    let id = parse_id(&video_id, "video")?;
    let existing = owned_video(&state, id, session.user_id).await?;
    let form = collect_update_form(multipart).await?;

    let mut patch = VideoPatch {
        title: form.title.filter(|s| !s.trim().is_empty()),
        description: form.description.filter(|s| !s.trim().is_empty()),
        thumbnail: None,
    };
    let mut replaced_thumbnail = None;
    if let Some((file_name, bytes)) = form.thumbnail {
        let asset = state
            .media
            .upload(&file_name, bytes)
            .await
            .map_err(|e| ApiError::Internal(e.into()))?;
        patch.thumbnail = Some((asset.url, asset.asset_id));
        replaced_thumbnail = Some(existing.thumbnail_asset_id.clone());
    }

    let Some(video) = state.store.update_video(id, patch)? else {
        return Err(ApiError::NotFound("Video not found".to_string()));
    };
    if let Some(old) = replaced_thumbnail {
        state.media.delete_best_effort(&old).await;
    }
    Ok(ApiResponse::ok(video, "Video updated successfully"))
}

async fn delete_video(
    State(state): State<ServerState>,
    session: Session,
    Path(video_id): Path<String>,
) -> ApiResult<VideoRecord> {
    let id = parse_id(&video_id, "video")?;
    owned_video(&state, id, session.user_id).await?;

    let Some(video) = state.store.delete_video(id)? else {
        return Err(ApiError::NotFound("Video not found".to_string()));
    };
    state.media.delete_best_effort(&video.video_asset_id).await;
    state
        .media
        .delete_best_effort(&video.thumbnail_asset_id)
        .await;
    Ok(ApiResponse::ok(video, "Video deleted successfully"))
}

async fn toggle_publish(
    State(state): State<ServerState>,
    session: Session,
    Path(video_id): Path<String>,
) -> ApiResult<VideoRecord> {
    let id = parse_id(&video_id, "video")?;
    owned_video(&state, id, session.user_id).await?;

    let Some(video) = state.store.toggle_publish(id)? else {
        return Err(ApiError::NotFound("Video not found".to_string()));
    };
    Ok(ApiResponse::ok(video, "Publish status toggled successfully"))
}
