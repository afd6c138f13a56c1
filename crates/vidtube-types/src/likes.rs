use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Kinds of content a like (or a comment) can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Video,
    Comment,
    Tweet,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Comment => "comment",
            Self::Tweet => "tweet",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetKind {
    type Err = LikeTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(Self::Video),
            "comment" => Ok(Self::Comment),
            "tweet" => Ok(Self::Tweet),
            other => Err(LikeTargetError::UnknownKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LikeTargetError {
    #[error("A like must reference a video, comment or tweet")]
    Missing,

    #[error("Exactly one content type must be liked, got {0}")]
    Ambiguous(usize),

    #[error("Unknown like target kind: {0}")]
    UnknownKind(String),
}

/// The single piece of content a like refers to.
///
/// Stored as `(target_kind, target_id)`; there is no way to build a like
/// that points at zero or several targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum LikeTarget {
    Video(Uuid),
    Comment(Uuid),
    Tweet(Uuid),
}

impl LikeTarget {
    pub fn new(kind: TargetKind, id: Uuid) -> Self {
        match kind {
            TargetKind::Video => Self::Video(id),
            TargetKind::Comment => Self::Comment(id),
            TargetKind::Tweet => Self::Tweet(id),
        }
    }

    /// Build a target from the three nullable references used on the wire.
    /// Exactly one of them must be set.
    pub fn from_refs(
        video: Option<Uuid>,
        comment: Option<Uuid>,
        tweet: Option<Uuid>,
    ) -> Result<Self, LikeTargetError> {
        let set = [
            video.map(Self::Video),
            comment.map(Self::Comment),
            tweet.map(Self::Tweet),
        ];
        let mut present = set.into_iter().flatten();

        match (present.next(), present.count()) {
            (None, _) => Err(LikeTargetError::Missing),
            (Some(target), 0) => Ok(target),
            (Some(_), extra) => Err(LikeTargetError::Ambiguous(extra + 1)),
        }
    }

    pub fn kind(&self) -> TargetKind {
        match self {
            Self::Video(_) => TargetKind::Video,
            Self::Comment(_) => TargetKind::Comment,
            Self::Tweet(_) => TargetKind::Tweet,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::Video(id) | Self::Comment(id) | Self::Tweet(id) => *id,
        }
    }
}
