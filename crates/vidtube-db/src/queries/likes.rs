use anyhow::Result;
use rusqlite::params;
use uuid::Uuid;

use vidtube_types::models::LikedVideo;
use vidtube_types::{LikeTarget, Page, PageRequest};

use super::{OWNER_COLUMNS, OptionalExt, count, now, owner_at, time_at, uuid_at};
use crate::Database;

impl Database {
    /// Toggle a like on a target. Returns true when the target is now liked.
    ///
    /// The target itself is not looked up; liking unknown content succeeds.
    pub fn toggle_like(&self, user_id: Uuid, target: LikeTarget) -> Result<bool> {
        let kind = target.kind().as_str();
        let target_id = target.id().to_string();

        self.with_conn(|conn| {
            let existing: Option<String> = conn
                .query_row(
                    "SELECT id FROM likes WHERE liked_by = ?1 AND target_kind = ?2 AND target_id = ?3",
                    params![user_id.to_string(), kind, target_id],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(like_id) = existing {
                conn.execute("DELETE FROM likes WHERE id = ?1", [&like_id])?;
                tracing::debug!(user = %user_id, %kind, target_id = %target_id, "like removed");
                Ok(false)
            } else {
                conn.execute(
                    "INSERT INTO likes (id, target_kind, target_id, liked_by, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT(liked_by, target_kind, target_id) DO NOTHING",
                    params![
                        Uuid::new_v4().to_string(),
                        kind,
                        target_id,
                        user_id.to_string(),
                        now()
                    ],
                )?;
                tracing::debug!(user = %user_id, %kind, target_id = %target_id, "like added");
                Ok(true)
            }
        })
    }

    pub fn is_liked(&self, user_id: Uuid, target: LikeTarget) -> Result<bool> {
        self.with_conn(|conn| {
            let liked = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM likes WHERE liked_by = ?1 AND target_kind = ?2 AND target_id = ?3)",
                params![user_id.to_string(), target.kind().as_str(), target.id().to_string()],
                |row| row.get(0),
            )?;
            Ok(liked)
        })
    }

    /// Number of likes on a single target.
    pub fn like_count(&self, target: LikeTarget) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM likes WHERE target_kind = ?1 AND target_id = ?2",
                params![target.kind().as_str(), target.id().to_string()],
                |row| row.get(0),
            )?;
            Ok(count(n))
        })
    }

    /// Videos the user liked, most recently liked first. Likes on videos that
    /// no longer exist, or that are unpublished and not the user's own, are
    /// skipped.
    pub fn list_liked_videos(&self, user_id: Uuid, page: PageRequest) -> Result<Page<LikedVideo>> {
        let from = "FROM likes l
             JOIN videos v ON v.id = l.target_id
             JOIN users u ON u.id = v.owner_id
             WHERE l.liked_by = ?1
               AND l.target_kind = 'video'
               AND (v.is_published = 1 OR v.owner_id = ?1)";

        self.with_conn(|conn| {
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) {from}"),
                [user_id.to_string()],
                |row| row.get(0),
            )?;

            let mut stmt = conn.prepare(&format!(
                "SELECT v.id, v.title, v.description, v.video_url, v.thumbnail_url, v.duration,
                        l.created_at, {OWNER_COLUMNS}
                 {from}
                 ORDER BY l.created_at DESC, l.rowid DESC
                 LIMIT ?2 OFFSET ?3"
            ))?;
            let docs = stmt
                .query_map(
                    params![user_id.to_string(), page.limit, page.offset() as i64],
                    |row| {
                        Ok(LikedVideo {
                            video_id: uuid_at(row, 0)?,
                            title: row.get(1)?,
                            description: row.get(2)?,
                            url: row.get(3)?,
                            thumbnail: row.get(4)?,
                            duration: row.get(5)?,
                            liked_at: time_at(row, 6)?,
                            owner: owner_at(row, 7)?,
                        })
                    },
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(Page::new(docs, count(total), page))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::fixtures;

    #[test]
    fn toggling_twice_returns_to_unliked() {
        let db = Database::open_in_memory().unwrap();
        let alice = fixtures::user(&db, "alice");
        let video = fixtures::video(&db, alice.id, "intro");
        let target = LikeTarget::Video(video.id);

        assert!(db.toggle_like(alice.id, target).unwrap());
        assert!(db.is_liked(alice.id, target).unwrap());
        assert_eq!(db.like_count(target).unwrap(), 1);

        assert!(!db.toggle_like(alice.id, target).unwrap());
        assert!(!db.is_liked(alice.id, target).unwrap());
        assert_eq!(db.like_count(target).unwrap(), 0);
    }

    #[test]
    fn same_id_under_different_kinds_is_a_different_like() {
        let db = Database::open_in_memory().unwrap();
        let alice = fixtures::user(&db, "alice");
        let id = Uuid::new_v4();

        assert!(db.toggle_like(alice.id, LikeTarget::Comment(id)).unwrap());
        assert!(db.toggle_like(alice.id, LikeTarget::Tweet(id)).unwrap());
        assert!(!db.is_liked(alice.id, LikeTarget::Video(id)).unwrap());
    }

    #[test]
    fn unknown_targets_can_be_liked() {
        let db = Database::open_in_memory().unwrap();
        let alice = fixtures::user(&db, "alice");

        assert!(db.toggle_like(alice.id, LikeTarget::Tweet(Uuid::new_v4())).unwrap());
    }

    #[test]
    fn liked_videos_join_owner_and_skip_other_kinds() {
        let db = Database::open_in_memory().unwrap();
        let alice = fixtures::user(&db, "alice");
        let bob = fixtures::user(&db, "bob");
        let first = fixtures::video(&db, alice.id, "first");
        let second = fixtures::video(&db, alice.id, "second");
        let hidden = fixtures::video(&db, alice.id, "hidden");
        db.toggle_publish(hidden.id, alice.id).unwrap();

        db.toggle_like(bob.id, LikeTarget::Video(first.id)).unwrap();
        db.toggle_like(bob.id, LikeTarget::Video(second.id)).unwrap();
        db.toggle_like(bob.id, LikeTarget::Video(hidden.id)).unwrap();
        db.toggle_like(bob.id, LikeTarget::Tweet(Uuid::new_v4())).unwrap();

        let page = db.list_liked_videos(bob.id, PageRequest::default()).unwrap();
        assert_eq!(page.total_docs, 2);
        assert_eq!(page.docs[0].video_id, second.id);
        assert_eq!(page.docs[0].owner.username, "alice");
        assert_eq!(page.docs[0].url, "https://media.test/second-file");
        assert_eq!(page.docs[1].video_id, first.id);
    }
}
