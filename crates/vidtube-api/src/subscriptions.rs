use std::collections::HashMap;

use axum::{
    Extension,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
};

use vidtube_types::api::SubscriptionToggled;

use crate::error::ApiError;
use crate::extract::{ok, page_request, parse_id, reply};
use crate::middleware::CurrentUser;
use crate::state::{AppState, blocking};

/// 201 when the subscription was created, 200 when it was removed.
pub async fn toggle_subscription(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(channel_id): Path<String>,
) -> Result<Response, ApiError> {
    let channel = parse_id(&channel_id, "channelId")?;
    let subscriber = user.id;
    if channel == subscriber {
        return Err(ApiError::bad_request("User cannot subscribe to itself!!"));
    }

    let subscribed = blocking(&state, move |db| {
        if db.get_user_by_id(channel)?.is_none() {
            return Ok(None);
        }
        db.toggle_subscription(subscriber, channel).map(Some)
    })
    .await?
    .ok_or_else(|| ApiError::not_found("channel does not exists"))?;

    let status = if subscribed { StatusCode::CREATED } else { StatusCode::OK };
    Ok(reply(status, SubscriptionToggled { subscribed }, "Successfully toggled!!"))
}

pub async fn channel_subscribers(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let channel = parse_id(&channel_id, "channelId")?;
    let page = page_request(&params);

    let subscribers = blocking(&state, move |db| db.list_subscribers(channel, page)).await?;
    Ok(ok(subscribers, "Subscribers retrived successfully!!"))
}

pub async fn subscribed_channels(
    State(state): State<AppState>,
    Path(subscriber_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let subscriber = parse_id(&subscriber_id, "subscriberId")?;
    let page = page_request(&params);

    let channels = blocking(&state, move |db| db.list_subscribed_channels(subscriber, page)).await?;
    Ok(ok(channels, "Channels retrived successfully!!"))
}
