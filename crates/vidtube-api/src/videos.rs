use std::collections::HashMap;

use axum::{
    Extension,
    extract::{Multipart, Path, Query, State, multipart::MultipartRejection},
    response::Response,
};
use tracing::{info, warn};

use vidtube_db::{NewVideo, SortField, VideoQuery, VideoSort};
use vidtube_types::LikeTarget;
use vidtube_types::models::VideoDetail;

use crate::error::ApiError;
use crate::extract::{created, ok, page_request, parse_id};
use crate::media::MediaKind;
use crate::middleware::CurrentUser;
use crate::state::{AppState, blocking};
use crate::upload::Form;

const VIDEO: &str = "Video";

/// GET /videos?userId&query&sortBy&sortType&page&limit
pub async fn list_videos(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let owner_id = parse_id(params.get("userId").map(String::as_str).unwrap_or(""), "userId")?;

    let field = params
        .get("sortBy")
        .and_then(|s| SortField::parse(s.trim()))
        .unwrap_or_default();
    let descending = !params
        .get("sortType")
        .is_some_and(|s| s.trim().eq_ignore_ascii_case("asc"));

    let query = VideoQuery {
        owner_id,
        viewer_id: user.id,
        search: params.get("query").cloned(),
        sort: VideoSort { field, descending },
    };
    let page = page_request(&params);

    let videos = blocking(&state, move |db| db.list_videos(&query, page)).await?;
    Ok(ok(videos, "Videos fetched successfully"))
}

pub async fn publish_video(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let form = Form::read(multipart?).await?;

    let (Some(title), Some(description)) = (form.text("title"), form.text("description")) else {
        return Err(ApiError::bad_request("Title and Description are required!!"));
    };
    let (Some(video_file), Some(thumbnail)) = (form.file("videoFile"), form.file("thumbnail"))
    else {
        return Err(ApiError::bad_request("Video and Thumbnail files are required!!"));
    };

    let (video_upload, thumbnail_upload) = tokio::join!(
        state.media.upload(video_file, MediaKind::Video),
        state.media.upload(thumbnail, MediaKind::Image),
    );
    let video_upload =
        video_upload.map_err(|e| ApiError::upload_failed("Video & Thumbnail files!!", e))?;
    let thumbnail_upload =
        thumbnail_upload.map_err(|e| ApiError::upload_failed("Video & Thumbnail files!!", e))?;

    let new = NewVideo {
        owner_id: user.id,
        title: title.to_string(),
        description: description.to_string(),
        video_file: video_upload.asset,
        thumbnail: thumbnail_upload.asset,
        duration: video_upload.duration.map(f64::floor).unwrap_or(0.0),
    };
    let video = blocking(&state, move |db| db.insert_video(&new)).await?;

    info!(video = %video.id, owner = %user.id, "Video published");
    Ok(created(video, "Video uploaded successfully"))
}

/// Unpublished videos are visible to their owner only. Every successful
/// fetch counts a view and lands in the requester's watch history.
pub async fn get_video(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(video_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&video_id, "videoId")?;
    let viewer = user.id;

    let video = blocking(&state, move |db| {
        let Some(video) = db.get_video(id)? else {
            return Ok(Err(ApiError::not_found("Video not found!!")));
        };
        if !video.is_published && video.owner.id != viewer {
            return Ok(Err(ApiError::forbidden("Video is private")));
        }
        let Some(video) = db.increment_views(id)? else {
            return Ok(Err(ApiError::not_found("Video not found!!")));
        };
        db.record_watch(viewer, id)?;

        let target = LikeTarget::Video(id);
        Ok(Ok(VideoDetail {
            likes_count: db.like_count(target)?,
            is_liked: db.is_liked(viewer, target)?,
            is_subscribed: db.is_subscribed(viewer, video.owner.id)?,
            video,
        }))
    })
    .await??;

    Ok(ok(video, "Video fetched successfully"))
}

pub async fn update_video(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(video_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let id = parse_id(&video_id, "videoId")?;
    let form = Form::read(multipart?).await?;

    let (Some(title), Some(description)) = (form.text("title"), form.text("description")) else {
        return Err(ApiError::unprocessable("All fields are required"));
    };

    let owner = user.id;
    let existing = blocking(&state, move |db| db.get_owned_video(id, owner))
        .await?
        .ok_or_else(|| ApiError::not_found_or_unauthorized(VIDEO))?;

    let new_thumbnail = match form.any_file(&["thumbnail", "file"]) {
        Some(file) => Some(
            state
                .media
                .upload(file, MediaKind::Image)
                .await
                .map_err(|e| ApiError::upload_failed("thumbnail", e))?
                .asset,
        ),
        None => None,
    };

    let (title, description) = (title.to_string(), description.to_string());
    let thumbnail = new_thumbnail.clone();
    let updated = blocking(&state, move |db| {
        db.update_owned_video(id, owner, &title, &description, thumbnail.as_ref())
    })
    .await?
    .ok_or_else(|| ApiError::not_found_or_unauthorized(VIDEO))?;

    if new_thumbnail.is_some() {
        let old = &existing.thumbnail.public_id;
        if let Err(e) = state.media.delete(old, MediaKind::Image).await {
            warn!(error = %e, public_id = %old, "Failed to delete replaced thumbnail");
        }
    }

    Ok(ok(updated, "Video details updated successfully!!"))
}

pub async fn delete_video(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(video_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&video_id, "videoId")?;
    let owner = user.id;

    let deleted = blocking(&state, move |db| db.delete_owned_video(id, owner))
        .await?
        .ok_or_else(|| ApiError::not_found_or_unauthorized(VIDEO))?;

    let (thumb, file) = tokio::join!(
        state.media.delete(&deleted.thumbnail.public_id, MediaKind::Image),
        state.media.delete(&deleted.video_file.public_id, MediaKind::Video),
    );
    let removals = [
        (thumb, &deleted.thumbnail.public_id),
        (file, &deleted.video_file.public_id),
    ];
    for (result, public_id) in removals {
        if let Err(e) = result {
            warn!(error = %e, %public_id, "Failed to delete media of removed video");
        }
    }

    info!(video = %id, owner = %owner, "Video deleted");
    Ok(ok(deleted, "Video deleted successfully!!"))
}

pub async fn toggle_publish(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(video_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&video_id, "videoId")?;
    let owner = user.id;

    let video = blocking(&state, move |db| db.toggle_publish(id, owner))
        .await?
        .ok_or_else(|| ApiError::not_found_or_unauthorized(VIDEO))?;

    Ok(ok(video, "Publish status changed successfully!!"))
}
