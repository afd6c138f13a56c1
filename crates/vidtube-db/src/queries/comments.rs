use anyhow::Result;
use rusqlite::{Connection, Row, params};
use uuid::Uuid;

use vidtube_types::models::Comment;
use vidtube_types::{Page, PageRequest};

use super::{OWNER_COLUMNS, OptionalExt, count, now, owner_at, time_at, uuid_at};
use crate::Database;

impl Database {
    pub fn insert_comment(&self, video_id: Uuid, owner_id: Uuid, content: &str) -> Result<Comment> {
        let id = Uuid::new_v4();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (id, video_id, owner_id, content, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![id.to_string(), video_id.to_string(), owner_id.to_string(), content, now()],
            )?;
            query_comment(conn, id)?
                .ok_or_else(|| anyhow::anyhow!("comment {} vanished after insert", id))
        })
    }

    /// Comments on a video, newest first.
    pub fn list_comments(&self, video_id: Uuid, page: PageRequest) -> Result<Page<Comment>> {
        self.with_conn(|conn| {
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM comments WHERE video_id = ?1",
                [video_id.to_string()],
                |row| row.get(0),
            )?;

            let mut stmt = conn.prepare(&format!(
                "SELECT c.id, c.content, c.video_id, c.created_at, c.updated_at, {OWNER_COLUMNS}
                 FROM comments c
                 JOIN users u ON u.id = c.owner_id
                 WHERE c.video_id = ?1
                 ORDER BY c.created_at DESC, c.rowid DESC
                 LIMIT ?2 OFFSET ?3"
            ))?;
            let docs = stmt
                .query_map(
                    params![video_id.to_string(), page.limit, page.offset() as i64],
                    comment_from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(Page::new(docs, count(total), page))
        })
    }

    pub fn update_owned_comment(
        &self,
        id: Uuid,
        owner_id: Uuid,
        content: &str,
    ) -> Result<Option<Comment>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE comments SET content = ?3, updated_at = ?4 WHERE id = ?1 AND owner_id = ?2",
                params![id.to_string(), owner_id.to_string(), content, now()],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_comment(conn, id)
        })
    }

    /// Returns false when nothing matched `{id, owner}`.
    pub fn delete_owned_comment(&self, id: Uuid, owner_id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM comments WHERE id = ?1 AND owner_id = ?2",
                params![id.to_string(), owner_id.to_string()],
            )?;
            Ok(removed > 0)
        })
    }
}

fn query_comment(conn: &Connection, id: Uuid) -> Result<Option<Comment>> {
    conn.query_row(
        &format!(
            "SELECT c.id, c.content, c.video_id, c.created_at, c.updated_at, {OWNER_COLUMNS}
             FROM comments c
             JOIN users u ON u.id = c.owner_id
             WHERE c.id = ?1"
        ),
        [id.to_string()],
        comment_from_row,
    )
    .optional()
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: uuid_at(row, 0)?,
        content: row.get(1)?,
        video_id: uuid_at(row, 2)?,
        created_at: time_at(row, 3)?,
        updated_at: time_at(row, 4)?,
        owner: owner_at(row, 5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::fixtures;

    #[test]
    fn comments_are_listed_newest_first_with_owner() {
        let db = Database::open_in_memory().unwrap();
        let alice = fixtures::user(&db, "alice");
        let bob = fixtures::user(&db, "bob");
        let video = fixtures::video(&db, alice.id, "intro");

        db.insert_comment(video.id, alice.id, "first").unwrap();
        db.insert_comment(video.id, bob.id, "second").unwrap();
        db.insert_comment(video.id, bob.id, "third").unwrap();

        let page = db.list_comments(video.id, PageRequest::new(1, 2)).unwrap();
        assert_eq!(page.total_docs, 3);
        assert_eq!(page.docs.len(), 2);
        assert_eq!(page.docs[0].content, "third");
        assert_eq!(page.docs[0].owner.username, "bob");
        assert_eq!(page.docs[1].content, "second");
    }

    #[test]
    fn only_the_owner_can_edit_or_delete() {
        let db = Database::open_in_memory().unwrap();
        let alice = fixtures::user(&db, "alice");
        let bob = fixtures::user(&db, "bob");
        let video = fixtures::video(&db, alice.id, "intro");
        let comment = db.insert_comment(video.id, bob.id, "hello").unwrap();

        assert!(db.update_owned_comment(comment.id, alice.id, "hijack").unwrap().is_none());
        assert!(!db.delete_owned_comment(comment.id, alice.id).unwrap());

        let edited = db.update_owned_comment(comment.id, bob.id, "edited").unwrap().unwrap();
        assert_eq!(edited.content, "edited");
        assert!(db.delete_owned_comment(comment.id, bob.id).unwrap());
        assert!(!db.delete_owned_comment(comment.id, bob.id).unwrap());
    }

    #[test]
    fn deleting_a_video_removes_its_comments() {
        let db = Database::open_in_memory().unwrap();
        let alice = fixtures::user(&db, "alice");
        let video = fixtures::video(&db, alice.id, "intro");
        db.insert_comment(video.id, alice.id, "hello").unwrap();

        db.delete_owned_video(video.id, alice.id).unwrap();
        let page = db.list_comments(video.id, PageRequest::default()).unwrap();
        assert_eq!(page.total_docs, 0);
    }
}
