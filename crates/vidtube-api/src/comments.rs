use std::collections::HashMap;

use axum::{
    Extension,
    extract::{Path, Query, State},
    response::Response,
};
use uuid::Uuid;

use vidtube_db::Database;
use vidtube_types::api::ContentRequest;

use crate::error::ApiError;
use crate::extract::{ApiJson, created, ok, page_request, parse_id};
use crate::middleware::CurrentUser;
use crate::state::{AppState, blocking};

const COMMENT: &str = "Comment";

/// Err when the video is missing, or unpublished and not the viewer's.
fn check_video_visible(
    db: &Database,
    video_id: Uuid,
    viewer: Uuid,
    private_msg: &str,
) -> anyhow::Result<Result<(), ApiError>> {
    Ok(match db.get_video(video_id)? {
        None => Err(ApiError::not_found("Video not found!!")),
        Some(video) if !video.is_published && video.owner.id != viewer => {
            Err(ApiError::forbidden(private_msg))
        }
        Some(_) => Ok(()),
    })
}

pub async fn list_comments(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(video_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let video_id = parse_id(&video_id, "videoId")?;
    let page = page_request(&params);
    let viewer = user.id;

    let comments = blocking(&state, move |db| {
        if let Err(e) = check_video_visible(db, video_id, viewer, "Video is private")? {
            return Ok(Err(e));
        }
        Ok(Ok(db.list_comments(video_id, page)?))
    })
    .await??;

    Ok(ok(comments, "Comments fetched successfully!!"))
}

pub async fn add_comment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(video_id): Path<String>,
    ApiJson(req): ApiJson<ContentRequest>,
) -> Result<Response, ApiError> {
    let video_id = parse_id(&video_id, "videoId")?;
    let content = required_content(req)?;
    let owner = user.id;

    let comment = blocking(&state, move |db| {
        let private_msg = "You cannot comment on a private video!!";
        if let Err(e) = check_video_visible(db, video_id, owner, private_msg)? {
            return Ok(Err(e));
        }
        Ok(Ok(db.insert_comment(video_id, owner, &content)?))
    })
    .await??;

    Ok(created(comment, "Comment published successfully!!"))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(comment_id): Path<String>,
    ApiJson(req): ApiJson<ContentRequest>,
) -> Result<Response, ApiError> {
    let id = parse_id(&comment_id, "commentId")?;
    let content = required_content(req)?;
    let owner = user.id;

    let comment = blocking(&state, move |db| db.update_owned_comment(id, owner, &content))
        .await?
        .ok_or_else(|| ApiError::not_found_or_unauthorized(COMMENT))?;

    Ok(ok(comment, "Comment updated successfully!!"))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(comment_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&comment_id, "commentId")?;
    let owner = user.id;

    if !blocking(&state, move |db| db.delete_owned_comment(id, owner)).await? {
        return Err(ApiError::not_found_or_unauthorized(COMMENT));
    }

    Ok(ok(serde_json::json!({}), "Comment deleted successfully!!"))
}

/// Trimmed content; blank is a 422.
pub(crate) fn required_content(req: ContentRequest) -> Result<String, ApiError> {
    let content = req.content.trim();
    if content.is_empty() {
        return Err(ApiError::unprocessable("Content is required!!"));
    }
    Ok(content.to_string())
}
