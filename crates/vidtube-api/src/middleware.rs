use std::ops::Deref;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use vidtube_db::UserRow;

use crate::error::ApiError;
use crate::state::{AppState, blocking};

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

/// The authenticated user, loaded from the store by `require_auth`.
#[derive(Clone)]
pub struct CurrentUser(pub Arc<UserRow>);

impl Deref for CurrentUser {
    type Target = UserRow;

    fn deref(&self) -> &UserRow {
        &self.0
    }
}

/// Validate the access token from the `accessToken` cookie or the
/// Authorization header and attach the user it names.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = jar
        .get(ACCESS_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| {
            req.headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(str::to_string)
        })
        .ok_or_else(|| ApiError::unauthorized("unauthorized request"))?;

    let claims = state
        .tokens
        .verify_access(&token)
        .ok_or_else(|| ApiError::unauthorized("Invalid Access Token"))?;

    let user = blocking(&state, move |db| db.get_user_by_id(claims.sub))
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid Access Token"))?;

    req.extensions_mut().insert(CurrentUser(Arc::new(user)));
    Ok(next.run(req).await)
}
