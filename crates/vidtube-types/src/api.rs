use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::UserProfile;

// -- Envelope --

/// Uniform success envelope. `status_code` mirrors the HTTP status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn new(status_code: u16, data: T, message: impl Into<String>) -> Self {
        Self {
            status_code,
            data,
            message: message.into(),
            success: status_code < 400,
        }
    }
}

/// Uniform failure envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub message: String,
    pub success: bool,
}

// -- Token claims --

/// Access token claims. Canonical definition shared by the API middleware
/// and token issuance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

/// Refresh token claims. `jti` keeps every issued token distinct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub jti: Uuid,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserProfile,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateAccountRequest {
    pub fullname: String,
    pub email: String,
}

// -- Content --

/// Body for creating or editing a comment or tweet.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContentRequest {
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdatePlaylistRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

// -- Toggles --

/// Nullable-reference form of a like target. Exactly one must be set.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ToggleLikeRequest {
    pub video: Option<Uuid>,
    pub comment: Option<Uuid>,
    pub tweet: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct LikeToggled {
    pub liked: bool,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionToggled {
    pub subscribed: bool,
}

// -- Health --

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub uptime: String,
    pub version: &'static str,
}
