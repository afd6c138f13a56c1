use axum::{
    Extension,
    body::Bytes,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use tracing::{info, warn};

use vidtube_db::{NewUser, UserRow};
use vidtube_types::api::{
    ChangePasswordRequest, LoginRequest, LoginResponse, RefreshTokenRequest, TokenPair,
    UpdateAccountRequest,
};
use vidtube_types::models::MediaAsset;

use crate::error::ApiError;
use crate::extract::{ApiJson, created, ok};
use crate::media::MediaKind;
use crate::middleware::{ACCESS_COOKIE, CurrentUser, REFRESH_COOKIE};
use crate::password;
use crate::state::{AppState, blocking, offload};
use crate::upload::Form;

// -- Accounts --

pub async fn register(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let form = Form::read(multipart?).await?;

    // Passwords are kept exactly as typed; login compares them untrimmed.
    let (Some(fullname), Some(email), Some(username), Some(password)) = (
        form.text("fullname"),
        form.text("email"),
        form.text("username"),
        form.raw("password").filter(|p| !p.trim().is_empty()),
    ) else {
        return Err(ApiError::bad_request("All fields are required"));
    };
    let username = username.to_lowercase();
    let email = email.to_lowercase();

    let taken = {
        let (username, email) = (username.clone(), email.clone());
        blocking(&state, move |db| db.username_or_email_taken(&username, &email)).await?
    };
    if taken {
        return Err(ApiError::conflict("User with email or username already exists"));
    }

    let avatar_file = form
        .file("avatar")
        .ok_or_else(|| ApiError::bad_request("Avatar file is required"))?;
    let avatar = state
        .media
        .upload(avatar_file, MediaKind::Image)
        .await
        .map_err(|e| ApiError::upload_failed("Avatar file", e))?
        .asset;

    // A failed cover upload does not block registration.
    let cover_image = match form.file("coverImage") {
        Some(file) => match state.media.upload(file, MediaKind::Image).await {
            Ok(uploaded) => Some(uploaded.asset),
            Err(e) => {
                warn!(error = %e, "Cover image upload failed during registration");
                None
            }
        },
        None => None,
    };

    let password = password.to_string();
    let password_hash = offload(move || password::hash(&password)).await?;

    let new = NewUser {
        username,
        email,
        fullname: fullname.to_string(),
        password_hash,
        avatar,
        cover_image,
    };
    // A concurrent registration can still win the race past the check above.
    let user = blocking(&state, move |db| match db.create_user(&new) {
        Ok(user) => Ok(Some(user)),
        Err(e) if vidtube_db::is_unique_violation(&e) => Ok(None),
        Err(e) => Err(e),
    })
    .await?
    .ok_or_else(|| ApiError::conflict("User with email or username already exists"))?;

    info!(user = %user.id, username = %user.username, "User registered");
    Ok(created(user.to_profile(), "User registered Successfully"))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = non_blank(req.username).map(|u| u.to_lowercase());
    let email = non_blank(req.email).map(|e| e.to_lowercase());
    if username.is_none() && email.is_none() {
        return Err(ApiError::bad_request("username or email is required"));
    }

    let user = blocking(&state, move |db| {
        db.find_user_for_login(username.as_deref(), email.as_deref())
    })
    .await?
    .ok_or_else(|| ApiError::not_found("User does not exist"))?;

    let stored = user.password.clone();
    if !offload(move || password::verify(&req.password, &stored)).await? {
        return Err(ApiError::unauthorized("Invalid user credentials"));
    }

    let pair = issue_tokens(&state, &user).await?;
    let jar = with_token_cookies(jar, &pair);

    let body = LoginResponse {
        user: user.to_profile(),
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    };
    Ok((jar, ok(body, "User logged In Successfully")))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let id = user.id;
    blocking(&state, move |db| db.set_refresh_token(id, None)).await?;

    let jar = jar
        .remove(Cookie::build(ACCESS_COOKIE).path("/"))
        .remove(Cookie::build(REFRESH_COOKIE).path("/"));
    Ok((jar, ok(serde_json::json!({}), "User logged Out")))
}

/// Rotate both tokens. The refresh token comes from the cookie or the JSON
/// body and must be the one currently stored for the user.
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let incoming = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| {
            serde_json::from_slice::<RefreshTokenRequest>(&body)
                .ok()
                .and_then(|req| non_blank(req.refresh_token))
        })
        .ok_or_else(|| ApiError::unauthorized("unauthorized request"))?;

    let claims = state
        .tokens
        .verify_refresh(&incoming)
        .ok_or_else(|| ApiError::unauthorized("Invalid refresh token"))?;

    let user = blocking(&state, move |db| db.get_user_by_id(claims.sub))
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid refresh token"))?;

    if user.refresh_token.as_deref() != Some(incoming.as_str()) {
        return Err(ApiError::unauthorized("Refresh token is expired or used"));
    }

    let pair = issue_tokens(&state, &user).await?;
    let jar = with_token_cookies(jar, &pair);
    Ok((jar, ok(pair, "Access token refreshed")))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> Result<Response, ApiError> {
    if req.old_password.is_empty() || req.new_password.is_empty() {
        return Err(ApiError::bad_request("Both password are required"));
    }
    let stored = user.password.clone();
    let ChangePasswordRequest { old_password, new_password } = req;
    if !offload(move || password::verify(&old_password, &stored)).await? {
        return Err(ApiError::bad_request("Invalid old password"));
    }

    let hash = offload(move || password::hash(&new_password)).await?;
    let id = user.id;
    blocking(&state, move |db| db.set_password(id, &hash)).await?;

    Ok(ok(serde_json::json!({}), "Password changed successfully"))
}

pub async fn current_user(Extension(user): Extension<CurrentUser>) -> Response {
    ok(user.to_profile(), "User fetched successfully")
}

pub async fn update_account(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(req): ApiJson<UpdateAccountRequest>,
) -> Result<Response, ApiError> {
    let fullname = req.fullname.trim().to_string();
    let email = req.email.trim().to_lowercase();
    if fullname.is_empty() || email.is_empty() {
        return Err(ApiError::bad_request("All fields are required"));
    }

    let id = user.id;
    let updated = blocking(&state, move |db| {
        if db.email_taken_by_other(&email, id)? {
            return Ok(None);
        }
        match db.update_account(id, &fullname, &email) {
            Err(e) if vidtube_db::is_unique_violation(&e) => Ok(None),
            other => other,
        }
    })
    .await?
    .ok_or_else(|| ApiError::conflict("User with email or username already exists"))?;

    Ok(ok(updated.to_profile(), "Account details updated successfully"))
}

pub async fn update_avatar(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let form = Form::read(multipart?).await?;
    let file = form
        .any_file(&["avatar", "file"])
        .ok_or_else(|| ApiError::bad_request("Avatar file is missing"))?;

    let uploaded = state
        .media
        .upload(file, MediaKind::Image)
        .await
        .map_err(|e| ApiError::upload_failed("avatar", e))?;

    let id = user.id;
    let asset = uploaded.asset;
    let updated = blocking(&state, move |db| db.set_avatar(id, &asset))
        .await?
        .ok_or_else(|| ApiError::not_found("User does not exist"))?;

    release_image(&state, Some(&user.avatar)).await;
    Ok(ok(updated.to_profile(), "Avatar image updated successfully"))
}

pub async fn update_cover_image(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let form = Form::read(multipart?).await?;
    let file = form
        .any_file(&["coverImage", "file"])
        .ok_or_else(|| ApiError::bad_request("Cover image file is missing"))?;

    let uploaded = state
        .media
        .upload(file, MediaKind::Image)
        .await
        .map_err(|e| ApiError::upload_failed("cover image", e))?;

    let id = user.id;
    let asset = uploaded.asset;
    let updated = blocking(&state, move |db| db.set_cover_image(id, &asset))
        .await?
        .ok_or_else(|| ApiError::not_found("User does not exist"))?;

    release_image(&state, user.cover_image.as_ref()).await;
    Ok(ok(updated.to_profile(), "Cover image updated successfully"))
}

// -- Channel --

pub async fn channel_profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(username): Path<String>,
) -> Result<Response, ApiError> {
    let username = username.trim().to_lowercase();
    if username.is_empty() {
        return Err(ApiError::bad_request("username is missing"));
    }

    let viewer = user.id;
    let channel = blocking(&state, move |db| db.channel_profile(&username, viewer))
        .await?
        .ok_or_else(|| ApiError::not_found("channel does not exists"))?;

    Ok(ok(channel, "User channel fetched successfully"))
}

pub async fn watch_history(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Response, ApiError> {
    let id = user.id;
    let videos = blocking(&state, move |db| db.watch_history(id)).await?;
    Ok(ok(videos, "Watch history fetched successfully"))
}

// -- Helpers --

/// Issue a fresh pair and store the refresh token as the only valid one.
async fn issue_tokens(state: &AppState, user: &UserRow) -> Result<TokenPair, ApiError> {
    let pair = TokenPair {
        access_token: state.tokens.issue_access(user.id, &user.username)?,
        refresh_token: state.tokens.issue_refresh(user.id)?,
    };

    let id = user.id;
    let stored = pair.refresh_token.clone();
    blocking(state, move |db| db.set_refresh_token(id, Some(&stored))).await?;
    Ok(pair)
}

fn with_token_cookies(jar: CookieJar, pair: &TokenPair) -> CookieJar {
    jar.add(token_cookie(ACCESS_COOKIE, pair.access_token.clone()))
        .add(token_cookie(REFRESH_COOKIE, pair.refresh_token.clone()))
}

fn token_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

/// Delete a replaced image. Failure is logged and otherwise ignored.
async fn release_image(state: &AppState, old: Option<&MediaAsset>) {
    let Some(old) = old else { return };
    if let Err(e) = state.media.delete(&old.public_id, MediaKind::Image).await {
        warn!(error = %e, public_id = %old.public_id, "Failed to delete replaced image");
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
