use anyhow::Result;
use rusqlite::{Connection, Row, params};
use uuid::Uuid;

use vidtube_types::models::Tweet;
use vidtube_types::{Page, PageRequest};

use super::{OWNER_COLUMNS, OptionalExt, count, now, owner_at, time_at, uuid_at};
use crate::Database;

impl Database {
    pub fn insert_tweet(&self, owner_id: Uuid, content: &str) -> Result<Tweet> {
        let id = Uuid::new_v4();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tweets (id, owner_id, content, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
                params![id.to_string(), owner_id.to_string(), content, now()],
            )?;
            query_tweet(conn, id)?
                .ok_or_else(|| anyhow::anyhow!("tweet {} vanished after insert", id))
        })
    }

    pub fn list_user_tweets(&self, owner_id: Uuid, page: PageRequest) -> Result<Page<Tweet>> {
        self.with_conn(|conn| {
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM tweets WHERE owner_id = ?1",
                [owner_id.to_string()],
                |row| row.get(0),
            )?;

            let mut stmt = conn.prepare(&format!(
                "SELECT t.id, t.content, t.created_at, t.updated_at, {OWNER_COLUMNS}
                 FROM tweets t
                 JOIN users u ON u.id = t.owner_id
                 WHERE t.owner_id = ?1
                 ORDER BY t.created_at DESC, t.rowid DESC
                 LIMIT ?2 OFFSET ?3"
            ))?;
            let docs = stmt
                .query_map(
                    params![owner_id.to_string(), page.limit, page.offset() as i64],
                    tweet_from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(Page::new(docs, count(total), page))
        })
    }

    pub fn update_owned_tweet(
        &self,
        id: Uuid,
        owner_id: Uuid,
        content: &str,
    ) -> Result<Option<Tweet>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE tweets SET content = ?3, updated_at = ?4 WHERE id = ?1 AND owner_id = ?2",
                params![id.to_string(), owner_id.to_string(), content, now()],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_tweet(conn, id)
        })
    }

    pub fn delete_owned_tweet(&self, id: Uuid, owner_id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM tweets WHERE id = ?1 AND owner_id = ?2",
                params![id.to_string(), owner_id.to_string()],
            )?;
            Ok(removed > 0)
        })
    }
}

fn query_tweet(conn: &Connection, id: Uuid) -> Result<Option<Tweet>> {
    conn.query_row(
        &format!(
            "SELECT t.id, t.content, t.created_at, t.updated_at, {OWNER_COLUMNS}
             FROM tweets t
             JOIN users u ON u.id = t.owner_id
             WHERE t.id = ?1"
        ),
        [id.to_string()],
        tweet_from_row,
    )
    .optional()
}

fn tweet_from_row(row: &Row<'_>) -> rusqlite::Result<Tweet> {
    Ok(Tweet {
        id: uuid_at(row, 0)?,
        content: row.get(1)?,
        created_at: time_at(row, 2)?,
        updated_at: time_at(row, 3)?,
        owner: owner_at(row, 4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::fixtures;

    #[test]
    fn user_tweets_are_paged_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let alice = fixtures::user(&db, "alice");
        let bob = fixtures::user(&db, "bob");
        for text in ["a", "b", "c"] {
            db.insert_tweet(alice.id, text).unwrap();
        }
        db.insert_tweet(bob.id, "not alice").unwrap();

        let page = db.list_user_tweets(alice.id, PageRequest::new(2, 2)).unwrap();
        assert_eq!(page.total_docs, 3);
        assert_eq!(page.docs.len(), 1);
        assert_eq!(page.docs[0].content, "a");
        assert!(page.has_prev_page);
    }

    #[test]
    fn non_owner_mutation_matches_missing_tweet() {
        let db = Database::open_in_memory().unwrap();
        let alice = fixtures::user(&db, "alice");
        let bob = fixtures::user(&db, "bob");
        let tweet = db.insert_tweet(alice.id, "mine").unwrap();

        assert!(db.update_owned_tweet(tweet.id, bob.id, "x").unwrap().is_none());
        assert!(db.update_owned_tweet(Uuid::new_v4(), bob.id, "x").unwrap().is_none());
        assert!(!db.delete_owned_tweet(tweet.id, bob.id).unwrap());
        assert!(db.delete_owned_tweet(tweet.id, alice.id).unwrap());
    }
}
