use std::collections::HashMap;

use axum::{
    Extension,
    extract::{Path, Query, State},
    response::Response,
};

use vidtube_types::api::ContentRequest;

use crate::comments::required_content;
use crate::error::ApiError;
use crate::extract::{ApiJson, created, ok, page_request, parse_id};
use crate::middleware::CurrentUser;
use crate::state::{AppState, blocking};

const TWEET: &str = "Tweet";

pub async fn create_tweet(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(req): ApiJson<ContentRequest>,
) -> Result<Response, ApiError> {
    let content = required_content(req)?;
    let owner = user.id;

    let tweet = blocking(&state, move |db| db.insert_tweet(owner, &content)).await?;
    Ok(created(tweet, "Tweet created successfully!!"))
}

pub async fn user_tweets(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let owner = parse_id(&user_id, "userId")?;
    let page = page_request(&params);

    let tweets = blocking(&state, move |db| db.list_user_tweets(owner, page)).await?;
    Ok(ok(tweets, "All tweets fetched successfully!!"))
}

pub async fn update_tweet(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(tweet_id): Path<String>,
    ApiJson(req): ApiJson<ContentRequest>,
) -> Result<Response, ApiError> {
    let id = parse_id(&tweet_id, "tweetId")?;
    let content = required_content(req)?;
    let owner = user.id;

    let tweet = blocking(&state, move |db| db.update_owned_tweet(id, owner, &content))
        .await?
        .ok_or_else(|| ApiError::not_found_or_unauthorized(TWEET))?;

    Ok(ok(tweet, "Tweet updated successfully!!"))
}

pub async fn delete_tweet(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(tweet_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&tweet_id, "tweetId")?;
    let owner = user.id;

    if !blocking(&state, move |db| db.delete_owned_tweet(id, owner)).await? {
        return Err(ApiError::not_found_or_unauthorized(TWEET));
    }

    Ok(ok(serde_json::json!({}), "Tweet deleted successfully!!"))
}
