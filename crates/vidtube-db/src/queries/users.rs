use anyhow::Result;
use rusqlite::{Connection, Row, params};
use uuid::Uuid;

use vidtube_types::models::{ChannelProfile, MediaAsset, Video};

use super::videos::{VIDEO_SELECT, video_from_row};
use super::{OptionalExt, count, now, time_at, uuid_at};
use crate::Database;
use crate::models::{NewUser, UserRow};

const USER_SELECT: &str = "SELECT id, username, email, fullname, password, avatar_url, avatar_public_id,
        cover_url, cover_public_id, refresh_token, created_at, updated_at
     FROM users";

impl Database {
    // -- Accounts --

    pub fn create_user(&self, new: &NewUser) -> Result<UserRow> {
        let id = Uuid::new_v4();
        let at = now();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, fullname, password, avatar_url, avatar_public_id,
                                    cover_url, cover_public_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
                params![
                    id.to_string(),
                    new.username,
                    new.email,
                    new.fullname,
                    new.password_hash,
                    new.avatar.url,
                    new.avatar.public_id,
                    new.cover_image.as_ref().map(|c| c.url.as_str()),
                    new.cover_image.as_ref().map(|c| c.public_id.as_str()),
                    at,
                ],
            )?;
            query_user(conn, "id = ?1", &id.to_string())?
                .ok_or_else(|| anyhow::anyhow!("user {} vanished after insert", id))
        })
    }

    pub fn get_user_by_id(&self, id: Uuid) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", &id.to_string()))
    }

    /// Look a user up by username or email, whichever is given.
    pub fn find_user_for_login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("{USER_SELECT} WHERE username = ?1 OR email = ?2 LIMIT 1"),
                params![username, email],
                user_from_row,
            )
            .optional()
        })
    }

    pub fn username_or_email_taken(&self, username: &str, email: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let taken = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1 OR email = ?2)",
                params![username, email],
                |row| row.get(0),
            )?;
            Ok(taken)
        })
    }

    pub fn email_taken_by_other(&self, email: &str, user_id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let taken = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1 AND id != ?2)",
                params![email, user_id.to_string()],
                |row| row.get(0),
            )?;
            Ok(taken)
        })
    }

    /// Overwrites the single active refresh token; `None` clears it.
    pub fn set_refresh_token(&self, user_id: Uuid, token: Option<&str>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET refresh_token = ?2 WHERE id = ?1",
                params![user_id.to_string(), token],
            )?;
            Ok(())
        })
    }

    pub fn set_password(&self, user_id: Uuid, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET password = ?2, updated_at = ?3 WHERE id = ?1",
                params![user_id.to_string(), password_hash, now()],
            )?;
            Ok(())
        })
    }

    pub fn update_account(
        &self,
        user_id: Uuid,
        fullname: &str,
        email: &str,
    ) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET fullname = ?2, email = ?3, updated_at = ?4 WHERE id = ?1",
                params![user_id.to_string(), fullname, email, now()],
            )?;
            query_user(conn, "id = ?1", &user_id.to_string())
        })
    }

    pub fn set_avatar(&self, user_id: Uuid, avatar: &MediaAsset) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET avatar_url = ?2, avatar_public_id = ?3, updated_at = ?4 WHERE id = ?1",
                params![user_id.to_string(), avatar.url, avatar.public_id, now()],
            )?;
            query_user(conn, "id = ?1", &user_id.to_string())
        })
    }

    pub fn set_cover_image(&self, user_id: Uuid, cover: &MediaAsset) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET cover_url = ?2, cover_public_id = ?3, updated_at = ?4 WHERE id = ?1",
                params![user_id.to_string(), cover.url, cover.public_id, now()],
            )?;
            query_user(conn, "id = ?1", &user_id.to_string())
        })
    }

    // -- Channel profile --

    /// A user seen as a channel by `viewer_id`, with subscription counts.
    pub fn channel_profile(
        &self,
        username: &str,
        viewer_id: Uuid,
    ) -> Result<Option<ChannelProfile>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT u.id, u.username, u.fullname, u.avatar_url, u.cover_url,
                        (SELECT COUNT(*) FROM subscriptions s WHERE s.channel_id = u.id),
                        (SELECT COUNT(*) FROM subscriptions s WHERE s.subscriber_id = u.id),
                        EXISTS(SELECT 1 FROM subscriptions s
                               WHERE s.channel_id = u.id AND s.subscriber_id = ?2)
                 FROM users u
                 WHERE u.username = ?1",
                params![username, viewer_id.to_string()],
                |row| {
                    Ok(ChannelProfile {
                        id: uuid_at(row, 0)?,
                        username: row.get(1)?,
                        fullname: row.get(2)?,
                        avatar: row.get(3)?,
                        cover_image: row.get(4)?,
                        subscribers_count: count(row.get(5)?),
                        channels_subscribed_to_count: count(row.get(6)?),
                        is_subscribed: row.get(7)?,
                    })
                },
            )
            .optional()
        })
    }

    // -- Watch history --

    /// Records a view. Re-watching moves the video back to the front.
    pub fn record_watch(&self, user_id: Uuid, video_id: Uuid) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM watch_history WHERE user_id = ?1 AND video_id = ?2",
                params![user_id.to_string(), video_id.to_string()],
            )?;
            tx.execute(
                "INSERT INTO watch_history (user_id, video_id, watched_at) VALUES (?1, ?2, ?3)",
                params![user_id.to_string(), video_id.to_string(), now()],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    /// Most recently watched first. Videos since unpublished by someone
    /// else drop out.
    pub fn watch_history(&self, user_id: Uuid) -> Result<Vec<Video>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{VIDEO_SELECT}
                 JOIN watch_history w ON w.video_id = v.id
                 WHERE w.user_id = ?1 AND (v.is_published = 1 OR v.owner_id = ?1)
                 ORDER BY w.watched_at DESC, w.rowid DESC"
            ))?;
            let rows = stmt
                .query_map([user_id.to_string()], video_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_user(conn: &Connection, predicate: &str, value: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("{USER_SELECT} WHERE {predicate}"))?;
    stmt.query_row([value], user_from_row).optional()
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    let cover_url: Option<String> = row.get(7)?;
    let cover_public_id: Option<String> = row.get(8)?;

    Ok(UserRow {
        id: uuid_at(row, 0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        fullname: row.get(3)?,
        password: row.get(4)?,
        avatar: MediaAsset {
            url: row.get(5)?,
            public_id: row.get(6)?,
        },
        cover_image: cover_url
            .zip(cover_public_id)
            .map(|(url, public_id)| MediaAsset { url, public_id }),
        refresh_token: row.get(9)?,
        created_at: time_at(row, 10)?,
        updated_at: time_at(row, 11)?,
    })
}
