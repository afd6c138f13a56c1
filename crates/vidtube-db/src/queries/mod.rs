mod comments;
mod dashboard;
mod likes;
mod playlists;
mod subscriptions;
mod tweets;
mod users;
mod videos;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use rusqlite::types::Type;
use uuid::Uuid;

use vidtube_types::models::OwnerSummary;

/// Owner columns appended to joined selects, read back with `owner_at`.
pub(crate) const OWNER_COLUMNS: &str = "u.id, u.username, u.fullname, u.avatar_url";

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn now() -> String {
    timestamp(Utc::now())
}

pub(crate) fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn time_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn owner_at(row: &Row<'_>, start: usize) -> rusqlite::Result<OwnerSummary> {
    Ok(OwnerSummary {
        id: uuid_at(row, start)?,
        username: row.get(start + 1)?,
        fullname: row.get(start + 2)?,
        avatar: row.get(start + 3)?,
    })
}

/// Counts never go negative; SQLite hands them back as i64.
pub(crate) fn count(n: i64) -> u64 {
    n.max(0) as u64
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use uuid::Uuid;

    use vidtube_types::models::MediaAsset;

    use crate::Database;
    use crate::models::{NewUser, NewVideo, UserRow};

    pub fn asset(tag: &str) -> MediaAsset {
        MediaAsset {
            url: format!("https://media.test/{tag}"),
            public_id: format!("asset-{tag}"),
        }
    }

    pub fn user(db: &Database, name: &str) -> UserRow {
        db.create_user(&NewUser {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            fullname: name.to_uppercase(),
            password_hash: "hash".to_string(),
            avatar: asset(&format!("{name}-avatar")),
            cover_image: None,
        })
        .unwrap()
    }

    pub fn video(db: &Database, owner: Uuid, title: &str) -> vidtube_types::models::Video {
        db.insert_video(&NewVideo {
            owner_id: owner,
            title: title.to_string(),
            description: format!("about {title}"),
            video_file: asset(&format!("{title}-file")),
            thumbnail: asset(&format!("{title}-thumb")),
            duration: 12.5,
        })
        .unwrap()
    }
}
