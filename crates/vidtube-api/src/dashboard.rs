use std::collections::HashMap;

use axum::{
    Extension,
    extract::{Query, State},
    response::Response,
};

use crate::error::ApiError;
use crate::extract::{ok, page_request};
use crate::middleware::CurrentUser;
use crate::state::{AppState, blocking};

pub async fn channel_stats(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Response, ApiError> {
    let owner = user.id;
    let stats = blocking(&state, move |db| db.channel_stats(owner)).await?;
    Ok(ok(stats, "Channel stats fetched successfully!!"))
}

/// All of the requester's videos, unpublished included.
pub async fn channel_videos(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let owner = user.id;
    let page = page_request(&params);
    let videos = blocking(&state, move |db| db.channel_videos(owner, page)).await?;
    Ok(ok(videos, "Channel videos fetched successfully!!"))
}
