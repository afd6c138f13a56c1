use anyhow::Result;
use rusqlite::params;
use uuid::Uuid;

use vidtube_types::models::SubscriptionEntry;
use vidtube_types::{Page, PageRequest};

use super::{OWNER_COLUMNS, OptionalExt, count, now, owner_at, time_at};
use crate::Database;

/// Which end of the subscription edge a listing walks.
#[derive(Clone, Copy)]
enum Side {
    /// Users subscribed to a channel.
    Subscribers,
    /// Channels a user subscribes to.
    Channels,
}

impl Database {
    /// Toggle a subscription: removes it if present, creates it otherwise.
    /// Returns true when the subscriber is now subscribed.
    pub fn toggle_subscription(&self, subscriber_id: Uuid, channel_id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let existing: Option<String> = conn
                .query_row(
                    "SELECT id FROM subscriptions WHERE subscriber_id = ?1 AND channel_id = ?2",
                    params![subscriber_id.to_string(), channel_id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(existing_id) = existing {
                conn.execute("DELETE FROM subscriptions WHERE id = ?1", [&existing_id])?;
                Ok(false)
            } else {
                conn.execute(
                    "INSERT INTO subscriptions (id, subscriber_id, channel_id, created_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(subscriber_id, channel_id) DO NOTHING",
                    params![
                        Uuid::new_v4().to_string(),
                        subscriber_id.to_string(),
                        channel_id.to_string(),
                        now()
                    ],
                )?;
                Ok(true)
            }
        })
    }

    pub fn is_subscribed(&self, subscriber_id: Uuid, channel_id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let subscribed = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM subscriptions WHERE subscriber_id = ?1 AND channel_id = ?2)",
                params![subscriber_id.to_string(), channel_id.to_string()],
                |row| row.get(0),
            )?;
            Ok(subscribed)
        })
    }

    pub fn list_subscribers(
        &self,
        channel_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<SubscriptionEntry>> {
        self.list_subscription_side(Side::Subscribers, channel_id, page)
    }

    pub fn list_subscribed_channels(
        &self,
        subscriber_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<SubscriptionEntry>> {
        self.list_subscription_side(Side::Channels, subscriber_id, page)
    }

    fn list_subscription_side(
        &self,
        side: Side,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<SubscriptionEntry>> {
        // (column matched against user_id, column joined to users)
        let (matched, joined) = match side {
            Side::Subscribers => ("channel_id", "subscriber_id"),
            Side::Channels => ("subscriber_id", "channel_id"),
        };

        self.with_conn(|conn| {
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM subscriptions WHERE {matched} = ?1"),
                [user_id.to_string()],
                |row| row.get(0),
            )?;

            let mut stmt = conn.prepare(&format!(
                "SELECT s.created_at, {OWNER_COLUMNS}
                 FROM subscriptions s
                 JOIN users u ON u.id = s.{joined}
                 WHERE s.{matched} = ?1
                 ORDER BY s.created_at DESC, s.rowid DESC
                 LIMIT ?2 OFFSET ?3"
            ))?;
            let docs = stmt
                .query_map(
                    params![user_id.to_string(), page.limit, page.offset() as i64],
                    |row| {
                        Ok(SubscriptionEntry {
                            subscribed_at: time_at(row, 0)?,
                            user: owner_at(row, 1)?,
                        })
                    },
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(Page::new(docs, count(total), page))
        })
    }
}
