use anyhow::Result;
use rusqlite::{Connection, Row, params};
use uuid::Uuid;

use vidtube_types::models::{MediaAsset, Video};
use vidtube_types::{Page, PageRequest};

use super::{OptionalExt, count, now, owner_at, time_at, uuid_at};
use crate::Database;
use crate::models::{NewVideo, VideoQuery};

/// Video joined with its owner. Column order is what `video_from_row` reads.
pub(crate) const VIDEO_SELECT: &str = "SELECT v.id, v.title, v.description, v.video_url, v.video_public_id,
        v.thumbnail_url, v.thumbnail_public_id, v.duration, v.views, v.is_published,
        v.created_at, v.updated_at, u.id, u.username, u.fullname, u.avatar_url
     FROM videos v
     JOIN users u ON u.id = v.owner_id";

impl Database {
    pub fn insert_video(&self, new: &NewVideo) -> Result<Video> {
        let id = Uuid::new_v4();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO videos (id, owner_id, title, description, video_url, video_public_id,
                                     thumbnail_url, thumbnail_public_id, duration, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
                params![
                    id.to_string(),
                    new.owner_id.to_string(),
                    new.title,
                    new.description,
                    new.video_file.url,
                    new.video_file.public_id,
                    new.thumbnail.url,
                    new.thumbnail.public_id,
                    new.duration,
                    now(),
                ],
            )?;
            query_video(conn, id)?
                .ok_or_else(|| anyhow::anyhow!("video {} vanished after insert", id))
        })
    }

    pub fn get_video(&self, id: Uuid) -> Result<Option<Video>> {
        self.with_conn(|conn| query_video(conn, id))
    }

    /// The video only if `owner_id` owns it. Missing and not-owned look the same.
    pub fn get_owned_video(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Video>> {
        self.with_conn(|conn| {
            Ok(query_video(conn, id)?.filter(|video| video.owner.id == owner_id))
        })
    }

    /// Bumps the view counter by one and returns the updated video.
    pub fn increment_views(&self, id: Uuid) -> Result<Option<Video>> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE videos SET views = views + 1 WHERE id = ?1",
                [id.to_string()],
            )?;
            query_video(conn, id)
        })
    }

    /// Owner-scoped edit. A new thumbnail replaces the stored one when given.
    pub fn update_owned_video(
        &self,
        id: Uuid,
        owner_id: Uuid,
        title: &str,
        description: &str,
        thumbnail: Option<&MediaAsset>,
    ) -> Result<Option<Video>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE videos
                 SET title = ?3,
                     description = ?4,
                     thumbnail_url = COALESCE(?5, thumbnail_url),
                     thumbnail_public_id = COALESCE(?6, thumbnail_public_id),
                     updated_at = ?7
                 WHERE id = ?1 AND owner_id = ?2",
                params![
                    id.to_string(),
                    owner_id.to_string(),
                    title,
                    description,
                    thumbnail.map(|t| t.url.as_str()),
                    thumbnail.map(|t| t.public_id.as_str()),
                    now(),
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_video(conn, id)
        })
    }

    /// Owner-scoped delete. Returns the removed video so its assets can be
    /// released.
    pub fn delete_owned_video(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Video>> {
        self.with_conn(|conn| {
            let Some(video) = query_video(conn, id)?.filter(|v| v.owner.id == owner_id) else {
                return Ok(None);
            };
            conn.execute(
                "DELETE FROM videos WHERE id = ?1 AND owner_id = ?2",
                params![id.to_string(), owner_id.to_string()],
            )?;
            Ok(Some(video))
        })
    }

    pub fn toggle_publish(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Video>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE videos SET is_published = NOT is_published, updated_at = ?3
                 WHERE id = ?1 AND owner_id = ?2",
                params![id.to_string(), owner_id.to_string(), now()],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_video(conn, id)
        })
    }

    /// A channel's videos as seen by the viewer, searched, sorted and paged.
    pub fn list_videos(&self, query: &VideoQuery, page: PageRequest) -> Result<Page<Video>> {
        let pattern = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);
        let owner = query.owner_id.to_string();
        let viewer = query.viewer_id.to_string();

        let filter = "WHERE v.owner_id = ?1
               AND (v.is_published = 1 OR v.owner_id = ?2)
               AND (?3 IS NULL OR v.title LIKE ?3 ESCAPE '\\' OR v.description LIKE ?3 ESCAPE '\\')";
        let direction = if query.sort.descending { "DESC" } else { "ASC" };

        self.with_conn(|conn| {
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM videos v {filter}"),
                params![owner, viewer, pattern],
                |row| row.get(0),
            )?;

            let mut stmt = conn.prepare(&format!(
                "{VIDEO_SELECT} {filter}
                 ORDER BY {column} {direction}, v.rowid {direction}
                 LIMIT ?4 OFFSET ?5",
                column = query.sort.field.column(),
            ))?;
            let docs = stmt
                .query_map(
                    params![owner, viewer, pattern, page.limit, page.offset() as i64],
                    video_from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(Page::new(docs, count(total), page))
        })
    }
}

pub(crate) fn query_video(conn: &Connection, id: Uuid) -> Result<Option<Video>> {
    conn.query_row(
        &format!("{VIDEO_SELECT} WHERE v.id = ?1"),
        [id.to_string()],
        video_from_row,
    )
    .optional()
}

pub(crate) fn video_from_row(row: &Row<'_>) -> rusqlite::Result<Video> {
    Ok(Video {
        id: uuid_at(row, 0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        video_file: MediaAsset {
            url: row.get(3)?,
            public_id: row.get(4)?,
        },
        thumbnail: MediaAsset {
            url: row.get(5)?,
            public_id: row.get(6)?,
        },
        duration: row.get(7)?,
        views: count(row.get(8)?),
        is_published: row.get(9)?,
        created_at: time_at(row, 10)?,
        updated_at: time_at(row, 11)?,
        owner: owner_at(row, 12)?,
    })
}

/// `%term%` with LIKE wildcards in the term escaped.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
