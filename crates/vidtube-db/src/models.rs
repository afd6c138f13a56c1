//! Row and query-parameter types for the store.
//!
//! Public read views come back as `vidtube_types::models` values directly;
//! only the user row is kept distinct, because it carries the password hash
//! and refresh token that must never reach a response.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use vidtube_types::models::{MediaAsset, OwnerSummary, UserProfile};

#[cfg_attr(test, derive(Debug))]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub fullname: String,
    pub password: String,
    pub avatar: MediaAsset,
    pub cover_image: Option<MediaAsset>,
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    pub fn to_profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            fullname: self.fullname.clone(),
            avatar: self.avatar.clone(),
            cover_image: self.cover_image.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn to_owner(&self) -> OwnerSummary {
        OwnerSummary {
            id: self.id,
            username: self.username.clone(),
            fullname: self.fullname.clone(),
            avatar: self.avatar.url.clone(),
        }
    }
}

pub struct NewUser {
    pub username: String,
    pub email: String,
    pub fullname: String,
    pub password_hash: String,
    pub avatar: MediaAsset,
    pub cover_image: Option<MediaAsset>,
}

pub struct NewVideo {
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub video_file: MediaAsset,
    pub thumbnail: MediaAsset,
    pub duration: f64,
}

/// Columns a video listing may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    Views,
    Duration,
    Title,
}

impl SortField {
    /// Accepts the API's camelCase field names.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "createdAt" => Some(Self::CreatedAt),
            "views" => Some(Self::Views),
            "duration" => Some(Self::Duration),
            "title" => Some(Self::Title),
            _ => None,
        }
    }

    pub(crate) fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "v.created_at",
            Self::Views => "v.views",
            Self::Duration => "v.duration",
            Self::Title => "v.title",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoSort {
    pub field: SortField,
    pub descending: bool,
}

impl Default for VideoSort {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            descending: true,
        }
    }
}

/// Filter for a channel's video listing as seen by `viewer_id`.
/// Unpublished videos are included only when the viewer owns the channel.
#[derive(Debug, Clone)]
pub struct VideoQuery {
    pub owner_id: Uuid,
    pub viewer_id: Uuid,
    pub search: Option<String>,
    pub sort: VideoSort,
}
