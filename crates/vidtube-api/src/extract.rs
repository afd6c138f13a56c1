//! Request extraction helpers that report failures through `ApiError`.

use std::collections::HashMap;

use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use vidtube_types::PageRequest;
use vidtube_types::api::ApiResponse;

use crate::error::ApiError;

/// `axum::Json` with its rejection rendered as the failure envelope.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Parse a path or query identifier, naming it in the 400 message.
pub fn parse_id(raw: &str, name: &str) -> Result<Uuid, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Valid {name} is required!!")))
}

/// `page` and `limit` from a raw query map. Never fails.
pub fn page_request(query: &HashMap<String, String>) -> PageRequest {
    PageRequest::from_raw(
        query.get("page").map(String::as_str),
        query.get("limit").map(String::as_str),
    )
}

/// Success envelope with the given status.
pub fn reply<T: Serialize>(status: StatusCode, data: T, message: &str) -> Response {
    (status, axum::Json(ApiResponse::new(status.as_u16(), data, message))).into_response()
}

pub fn ok<T: Serialize>(data: T, message: &str) -> Response {
    reply(StatusCode::OK, data, message)
}

pub fn created<T: Serialize>(data: T, message: &str) -> Response {
    reply(StatusCode::CREATED, data, message)
}
