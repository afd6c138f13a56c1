use std::collections::HashMap;

use axum::{
    Extension,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
};
use tracing::debug;

use vidtube_types::api::{LikeToggled, ToggleLikeRequest};
use vidtube_types::{LikeTarget, TargetKind};

use crate::error::ApiError;
use crate::extract::{ApiJson, ok, page_request, parse_id, reply};
use crate::middleware::CurrentUser;
use crate::state::{AppState, blocking};

pub async fn toggle_video_like(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(video_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&video_id, "videoId")?;
    toggle(&state, &user, LikeTarget::new(TargetKind::Video, id)).await
}

pub async fn toggle_comment_like(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(comment_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&comment_id, "commentId")?;
    toggle(&state, &user, LikeTarget::new(TargetKind::Comment, id)).await
}

pub async fn toggle_tweet_like(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(tweet_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&tweet_id, "tweetId")?;
    toggle(&state, &user, LikeTarget::new(TargetKind::Tweet, id)).await
}

/// POST /likes/toggle with `{video | comment | tweet}`; exactly one must be set.
pub async fn toggle_like(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(req): ApiJson<ToggleLikeRequest>,
) -> Result<Response, ApiError> {
    let target = LikeTarget::from_refs(req.video, req.comment, req.tweet)?;
    toggle(&state, &user, target).await
}

/// 201 when the like was created, 200 when it was removed. The target is
/// not checked for existence.
async fn toggle(
    state: &AppState,
    user: &CurrentUser,
    target: LikeTarget,
) -> Result<Response, ApiError> {
    let user_id = user.id;
    let liked = blocking(state, move |db| db.toggle_like(user_id, target)).await?;

    debug!(user = %user_id, like_target = ?target, liked, "Like toggled");
    let status = if liked { StatusCode::CREATED } else { StatusCode::OK };
    Ok(reply(status, LikeToggled { liked }, "Toggled successfully!!"))
}

pub async fn liked_videos(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let page = page_request(&params);
    let user_id = user.id;

    let videos = blocking(&state, move |db| db.list_liked_videos(user_id, page)).await?;
    Ok(ok(videos, "Liked videos fetched successfully!!"))
}
