//! Playlist handlers.

use super::parse_id;
use super::session::Session;
use super::state::ServerState;
use crate::api::{ApiError, ApiResponse, ApiResult};
use crate::enrichment::models::PlaylistDetail;
use crate::store::models::PlaylistRecord;
use crate::store::{PlaylistStore, VideoStore};
use axum::extract::{Path, State};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

pub fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(create_playlist))
        .route("/user/{userId}", get(user_playlists))
        .route("/{playlistId}", get(get_playlist))
        .route("/{playlistId}", patch(update_playlist))
        .route("/{playlistId}", delete(delete_playlist))
        .route("/add/{videoId}/{playlistId}", patch(add_video))
        .route("/remove/{videoId}/{playlistId}", patch(remove_video))
}

#[derive(Deserialize)]
struct CreatePlaylistBody {
    name: Option<String>,
    description: Option<String>,
}

async fn create_playlist(
    State(state): State<ServerState>,
    session: Session,
    Json(body): Json<CreatePlaylistBody>,
) -> ApiResult<PlaylistRecord> {
    let (Some(name), Some(description)) = (
        body.name.filter(|s| !s.trim().is_empty()),
        body.description.filter(|s| !s.trim().is_empty()),
    ) else {
        return Err(ApiError::InvalidArgument(
            "Both name & description are required".to_string(),
        ));
    };
    let playlist = state
        .store
        .create_playlist(session.user_id, &name, &description)?;
    Ok(ApiResponse::created(playlist, "Playlist created successfully"))
}

async fn user_playlists(
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
) -> ApiResult<Vec<PlaylistRecord>> {
    let owner = parse_id(&user_id, "user")?;
    let playlists = state.store.playlists_for_owner(owner)?;
    Ok(ApiResponse::ok(playlists, "Playlists fetched successfully"))
}

async fn get_playlist(
    State(state): State<ServerState>,
    Path(playlist_id): Path<String>,
) -> ApiResult<PlaylistDetail> {
    let id = parse_id(&playlist_id, "playlist")?;
    let Some(playlist) = state.store.playlist_detail(id)? else {
        return Err(ApiError::NotFound("Playlist not found".to_string()));
    };
    Ok(ApiResponse::ok(playlist, "Playlist fetched successfully"))
}

fn owned_playlist(
    state: &ServerState,
    id: Uuid,
    owner: Uuid,
) -> Result<PlaylistRecord, ApiError> {
    let Some(playlist) = state.store.playlist_by_id(id)? else {
        return Err(ApiError::NotFound("Playlist not found".to_string()));
    };
    if playlist.owner_id != owner {
        return Err(ApiError::Unauthorized(
            "Only the owner can modify this playlist".to_string(),
        ));
    }
    Ok(playlist)
}

async fn add_video(
    State(state): State<ServerState>,
    session: Session,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> ApiResult<PlaylistRecord> {
    let video = parse_id(&video_id, "video")?;
    let playlist = parse_id(&playlist_id, "playlist")?;
    owned_playlist(&state, playlist, session.user_id)?;
    if state.store.video_by_id(video)?.is_none() {
        return Err(ApiError::NotFound("Video not found".to_string()));
    }

    let Some(playlist) = state.store.add_video_to_playlist(playlist, video)? else {
        return Err(ApiError::NotFound("Playlist not found".to_string()));
    };
    Ok(ApiResponse::ok(playlist, "Video added successfully"))
}

async fn remove_video(
    State(state): State<ServerState>,
    session: Session,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> ApiResult<PlaylistRecord> {
    let video = parse_id(&video_id, "video")?;
    let playlist = parse_id(&playlist_id, "playlist")?;
    owned_playlist(&state, playlist, session.user_id)?;

    let Some(playlist) = state.store.remove_video_from_playlist(playlist, video)? else {
        return Err(ApiError::NotFound("Playlist not found".to_string()));
    };
    Ok(ApiResponse::ok(playlist, "Video removed successfully"))
}

#[derive(Deserialize)]
struct UpdatePlaylistBody {
    name: Option<String>,
    description: Option<String>,
}

async fn update_playlist(
    State(state): State<ServerState>,
    session: Session,
    Path(playlist_id): Path<String>,
    Json(body): Json<UpdatePlaylistBody>,
) -> ApiResult<PlaylistRecord> {
    let id = parse_id(&playlist_id, "playlist")?;
    owned_playlist(&state, id, session.user_id)?;

    let name = body.name.filter(|s| !s.trim().is_empty());
    let description = body.description.filter(|s| !s.trim().is_empty());
    if name.is_none() && description.is_none() {
        return Err(ApiError::InvalidArgument(
            "At least one field is required".to_string(),
        ));
    }

    let Some(playlist) =
        state
            .store
            .update_playlist(id, name.as_deref(), description.as_deref())?
    else {
        return Err(ApiError::NotFound("Playlist not found".to_string()));
    };
    Ok(ApiResponse::ok(playlist, "Playlist updated successfully"))
}

async fn delete_playlist(
    State(state): State<ServerState>,
    session: Session,
    Path(playlist_id): Path<String>,
) -> ApiResult<PlaylistRecord> {
    let id = parse_id(&playlist_id, "playlist")?;
    owned_playlist(&state, id, session.user_id)?;

    let Some(playlist) = state.store.delete_playlist(id)? else {
        return Err(ApiError::NotFound("Playlist not found".to_string()));
    };
    Ok(ApiResponse::ok(playlist, "Playlist deleted successfully"))
}
