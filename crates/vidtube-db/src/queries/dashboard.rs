use anyhow::Result;
use rusqlite::{Connection, params};
use uuid::Uuid;

use vidtube_types::models::{ChannelStats, LikeBreakdown, Video};
use vidtube_types::{Page, PageRequest, TargetKind};

use super::count;
use crate::Database;
use crate::models::{VideoQuery, VideoSort};

impl Database {
    /// Totals for a channel. Each figure is its own query; the numbers are
    /// not a consistent snapshot.
    pub fn channel_stats(&self, owner_id: Uuid) -> Result<ChannelStats> {
        let owner = owner_id.to_string();
        self.with_conn(|conn| {
            let (total_videos, total_views): (i64, i64) = conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(views), 0) FROM videos WHERE owner_id = ?1",
                [&owner],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            let total_subscribers: i64 = conn.query_row(
                "SELECT COUNT(*) FROM subscriptions WHERE channel_id = ?1",
                [&owner],
                |row| row.get(0),
            )?;

            let likes = LikeBreakdown {
                videos: likes_on(conn, TargetKind::Video, &owner)?,
                comments: likes_on(conn, TargetKind::Comment, &owner)?,
                tweets: likes_on(conn, TargetKind::Tweet, &owner)?,
            };

            Ok(ChannelStats {
                total_videos: count(total_videos),
                total_views: count(total_views),
                total_subscribers: count(total_subscribers),
                total_likes: likes.total(),
                likes,
            })
        })
    }

    /// Every video the owner uploaded, unpublished included, newest first.
    pub fn channel_videos(&self, owner_id: Uuid, page: PageRequest) -> Result<Page<Video>> {
        let query = VideoQuery {
            owner_id,
            viewer_id: owner_id,
            search: None,
            sort: VideoSort::default(),
        };
        self.list_videos(&query, page)
    }
}

/// Likes received on content of one kind owned by `owner`.
fn likes_on(conn: &Connection, kind: TargetKind, owner: &str) -> Result<u64> {
    let table = match kind {
        TargetKind::Video => "videos",
        TargetKind::Comment => "comments",
        TargetKind::Tweet => "tweets",
    };
    let n: i64 = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM likes l
             JOIN {table} t ON t.id = l.target_id
             WHERE l.target_kind = ?1 AND t.owner_id = ?2"
        ),
        params![kind.as_str(), owner],
        |row| row.get(0),
    )?;
    Ok(count(n))
}
