use anyhow::Result;
use rusqlite::{Connection, params};
use uuid::Uuid;

use vidtube_types::models::{Playlist, PlaylistSummary};
use vidtube_types::{Page, PageRequest};

use super::{OWNER_COLUMNS, OptionalExt, count, now, owner_at, time_at, uuid_at};
use crate::Database;

impl Database {
    pub fn create_playlist(
        &self,
        owner_id: Uuid,
        name: &str,
        description: &str,
    ) -> Result<Playlist> {
        let id = Uuid::new_v4();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO playlists (id, owner_id, name, description, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![id.to_string(), owner_id.to_string(), name, description, now()],
            )?;
            query_playlist(conn, id)?
                .ok_or_else(|| anyhow::anyhow!("playlist {} vanished after insert", id))
        })
    }

    pub fn get_playlist(&self, id: Uuid) -> Result<Option<Playlist>> {
        self.with_conn(|conn| query_playlist(conn, id))
    }

    pub fn list_user_playlists(
        &self,
        owner_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<PlaylistSummary>> {
        self.with_conn(|conn| {
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM playlists WHERE owner_id = ?1",
                [owner_id.to_string()],
                |row| row.get(0),
            )?;

            let mut stmt = conn.prepare(&format!(
                "SELECT p.id, p.name, p.description, p.created_at, p.updated_at,
                        (SELECT COUNT(*) FROM playlist_videos pv WHERE pv.playlist_id = p.id),
                        {OWNER_COLUMNS}
                 FROM playlists p
                 JOIN users u ON u.id = p.owner_id
                 WHERE p.owner_id = ?1
                 ORDER BY p.created_at DESC, p.rowid DESC
                 LIMIT ?2 OFFSET ?3"
            ))?;
            let docs = stmt
                .query_map(
                    params![owner_id.to_string(), page.limit, page.offset() as i64],
                    |row| {
                        Ok(PlaylistSummary {
                            id: uuid_at(row, 0)?,
                            name: row.get(1)?,
                            description: row.get(2)?,
                            created_at: time_at(row, 3)?,
                            updated_at: time_at(row, 4)?,
                            total_videos: count(row.get(5)?),
                            owner: owner_at(row, 6)?,
                        })
                    },
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(Page::new(docs, count(total), page))
        })
    }

    /// Owner-scoped edit; `None` leaves a field unchanged.
    pub fn update_owned_playlist(
        &self,
        id: Uuid,
        owner_id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Playlist>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE playlists
                 SET name = COALESCE(?3, name),
                     description = COALESCE(?4, description),
                     updated_at = ?5
                 WHERE id = ?1 AND owner_id = ?2",
                params![id.to_string(), owner_id.to_string(), name, description, now()],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_playlist(conn, id)
        })
    }

    pub fn delete_owned_playlist(&self, id: Uuid, owner_id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM playlists WHERE id = ?1 AND owner_id = ?2",
                params![id.to_string(), owner_id.to_string()],
            )?;
            Ok(removed > 0)
        })
    }

    /// Appends a video. The same video may be added more than once.
    pub fn add_video_to_playlist(
        &self,
        id: Uuid,
        owner_id: Uuid,
        video_id: Uuid,
    ) -> Result<Option<Playlist>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let changed = touch_owned(&tx, id, owner_id)?;
            if changed == 0 {
                return Ok(None);
            }
            tx.execute(
                "INSERT INTO playlist_videos (playlist_id, video_id) VALUES (?1, ?2)",
                params![id.to_string(), video_id.to_string()],
            )?;
            let playlist = query_playlist(&tx, id)?;
            tx.commit()?;
            Ok(playlist)
        })
    }

    /// Removes every occurrence of the video from the playlist.
    pub fn remove_video_from_playlist(
        &self,
        id: Uuid,
        owner_id: Uuid,
        video_id: Uuid,
    ) -> Result<Option<Playlist>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let changed = touch_owned(&tx, id, owner_id)?;
            if changed == 0 {
                return Ok(None);
            }
            tx.execute(
                "DELETE FROM playlist_videos WHERE playlist_id = ?1 AND video_id = ?2",
                params![id.to_string(), video_id.to_string()],
            )?;
            let playlist = query_playlist(&tx, id)?;
            tx.commit()?;
            Ok(playlist)
        })
    }
}

/// Bumps `updated_at` on an owned playlist; 0 rows means missing or not owned.
fn touch_owned(conn: &Connection, id: Uuid, owner_id: Uuid) -> Result<usize> {
    Ok(conn.execute(
        "UPDATE playlists SET updated_at = ?3 WHERE id = ?1 AND owner_id = ?2",
        params![id.to_string(), owner_id.to_string(), now()],
    )?)
}

fn query_playlist(conn: &Connection, id: Uuid) -> Result<Option<Playlist>> {
    let playlist = conn
        .query_row(
            &format!(
                "SELECT p.id, p.name, p.description, p.created_at, p.updated_at, {OWNER_COLUMNS}
                 FROM playlists p
                 JOIN users u ON u.id = p.owner_id
                 WHERE p.id = ?1"
            ),
            [id.to_string()],
            |row| {
                Ok(Playlist {
                    id: uuid_at(row, 0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    created_at: time_at(row, 3)?,
                    updated_at: time_at(row, 4)?,
                    owner: owner_at(row, 5)?,
                    videos: Vec::new(),
                })
            },
        )
        .optional()?;

    let Some(mut playlist) = playlist else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT video_id FROM playlist_videos WHERE playlist_id = ?1 ORDER BY position",
    )?;
    playlist.videos = stmt
        .query_map([id.to_string()], |row| uuid_at(row, 0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Some(playlist))
}
