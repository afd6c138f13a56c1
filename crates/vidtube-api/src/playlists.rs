use std::collections::HashMap;

use axum::{
    Extension,
    extract::{Path, Query, State},
    response::Response,
};
use uuid::Uuid;

use vidtube_types::api::{CreatePlaylistRequest, UpdatePlaylistRequest};

use crate::error::ApiError;
use crate::extract::{ApiJson, created, ok, page_request, parse_id};
use crate::middleware::CurrentUser;
use crate::state::{AppState, blocking};

const PLAYLIST: &str = "Playlist";

pub async fn create_playlist(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(req): ApiJson<CreatePlaylistRequest>,
) -> Result<Response, ApiError> {
    let name = req.name.trim().to_string();
    let description = req.description.trim().to_string();
    if name.is_empty() || description.is_empty() {
        return Err(ApiError::bad_request("Name and Description both required!!"));
    }

    let owner = user.id;
    let playlist =
        blocking(&state, move |db| db.create_playlist(owner, &name, &description)).await?;
    Ok(created(playlist, "Playlist created successfully!!"))
}

pub async fn get_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&playlist_id, "playlistId")?;

    let playlist = blocking(&state, move |db| db.get_playlist(id))
        .await?
        .ok_or_else(|| ApiError::not_found("Playlist not found!!"))?;

    Ok(ok(playlist, "Playlist fetched successfully!!"))
}

pub async fn user_playlists(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let owner = parse_id(&user_id, "userId")?;
    let page = page_request(&params);

    let playlists = blocking(&state, move |db| db.list_user_playlists(owner, page)).await?;
    Ok(ok(playlists, "Playlist fetched successfully!!"))
}

/// Either field may be left out, not both.
pub async fn update_playlist(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(playlist_id): Path<String>,
    ApiJson(req): ApiJson<UpdatePlaylistRequest>,
) -> Result<Response, ApiError> {
    let id = parse_id(&playlist_id, "playlistId")?;
    let name = non_blank(req.name);
    let description = non_blank(req.description);
    if name.is_none() && description.is_none() {
        return Err(ApiError::bad_request("Name or Description is required!!"));
    }

    let owner = user.id;
    let playlist = blocking(&state, move |db| {
        db.update_owned_playlist(id, owner, name.as_deref(), description.as_deref())
    })
    .await?
    .ok_or_else(|| ApiError::not_found_or_unauthorized(PLAYLIST))?;

    Ok(ok(playlist, "Playlist updated successfully!!"))
}

pub async fn delete_playlist(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(playlist_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&playlist_id, "playlistId")?;
    let owner = user.id;

    if !blocking(&state, move |db| db.delete_owned_playlist(id, owner)).await? {
        return Err(ApiError::not_found_or_unauthorized(PLAYLIST));
    }

    Ok(ok(serde_json::json!({}), "Playlist deleted successfully!!"))
}

pub async fn add_video(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let (video, playlist) = parse_pair(&video_id, &playlist_id)?;
    let owner = user.id;

    let updated = blocking(&state, move |db| {
        if db.get_video(video)?.is_none() {
            return Ok(Err(ApiError::not_found("Video not found!!")));
        }
        Ok(db
            .add_video_to_playlist(playlist, owner, video)?
            .ok_or_else(|| ApiError::not_found_or_unauthorized(PLAYLIST)))
    })
    .await??;

    Ok(ok(updated, "Video added successfully to the playlist!!"))
}

/// Drops every occurrence of the video.
pub async fn remove_video(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let (video, playlist) = parse_pair(&video_id, &playlist_id)?;
    let owner = user.id;

    let updated = blocking(&state, move |db| {
        if db.get_video(video)?.is_none() {
            return Ok(Err(ApiError::not_found("Video not found!!")));
        }
        Ok(db
            .remove_video_from_playlist(playlist, owner, video)?
            .ok_or_else(|| ApiError::not_found_or_unauthorized(PLAYLIST)))
    })
    .await??;

    Ok(ok(updated, "Video removed successfully from the playlist!!"))
}

fn parse_pair(video_id: &str, playlist_id: &str) -> Result<(Uuid, Uuid), ApiError> {
    Ok((parse_id(video_id, "videoId")?, parse_id(playlist_id, "playlistId")?))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
