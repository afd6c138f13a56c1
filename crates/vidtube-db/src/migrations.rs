use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id                  TEXT PRIMARY KEY,
                username            TEXT NOT NULL UNIQUE,
                email               TEXT NOT NULL UNIQUE,
                fullname            TEXT NOT NULL,
                password            TEXT NOT NULL,
                avatar_url          TEXT NOT NULL,
                avatar_public_id    TEXT NOT NULL,
                cover_url           TEXT,
                cover_public_id     TEXT,
                refresh_token       TEXT,
                created_at          TEXT NOT NULL,
                updated_at          TEXT NOT NULL
            );

            CREATE TABLE videos (
                id                  TEXT PRIMARY KEY,
                owner_id            TEXT NOT NULL REFERENCES users(id),
                title               TEXT NOT NULL,
                description         TEXT NOT NULL,
                video_url           TEXT NOT NULL,
                video_public_id     TEXT NOT NULL,
                thumbnail_url       TEXT NOT NULL,
                thumbnail_public_id TEXT NOT NULL,
                duration            REAL NOT NULL DEFAULT 0,
                views               INTEGER NOT NULL DEFAULT 0,
                is_published        INTEGER NOT NULL DEFAULT 1,
                created_at          TEXT NOT NULL,
                updated_at          TEXT NOT NULL
            );

            CREATE INDEX idx_videos_owner ON videos(owner_id, created_at);

            CREATE TABLE comments (
                id          TEXT PRIMARY KEY,
                video_id    TEXT NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
                owner_id    TEXT NOT NULL REFERENCES users(id),
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE INDEX idx_comments_video ON comments(video_id, created_at);

            CREATE TABLE tweets (
                id          TEXT PRIMARY KEY,
                owner_id    TEXT NOT NULL REFERENCES users(id),
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE INDEX idx_tweets_owner ON tweets(owner_id, created_at);

            CREATE TABLE playlists (
                id          TEXT PRIMARY KEY,
                owner_id    TEXT NOT NULL REFERENCES users(id),
                name        TEXT NOT NULL,
                description TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE INDEX idx_playlists_owner ON playlists(owner_id, created_at);

            -- position keeps insertion order; the same video may appear twice
            CREATE TABLE playlist_videos (
                position    INTEGER PRIMARY KEY AUTOINCREMENT,
                playlist_id TEXT NOT NULL REFERENCES playlists(id) ON DELETE CASCADE,
                video_id    TEXT NOT NULL REFERENCES videos(id) ON DELETE CASCADE
            );

            CREATE INDEX idx_playlist_videos_playlist ON playlist_videos(playlist_id);

            CREATE TABLE subscriptions (
                id              TEXT PRIMARY KEY,
                subscriber_id   TEXT NOT NULL REFERENCES users(id),
                channel_id      TEXT NOT NULL REFERENCES users(id),
                created_at      TEXT NOT NULL,
                UNIQUE(subscriber_id, channel_id)
            );

            CREATE INDEX idx_subscriptions_channel ON subscriptions(channel_id, created_at);

            -- target_id has no foreign key: liking unknown content is allowed
            CREATE TABLE likes (
                id          TEXT PRIMARY KEY,
                target_kind TEXT NOT NULL CHECK (target_kind IN ('video', 'comment', 'tweet')),
                target_id   TEXT NOT NULL,
                liked_by    TEXT NOT NULL REFERENCES users(id),
                created_at  TEXT NOT NULL,
                UNIQUE(liked_by, target_kind, target_id)
            );

            CREATE INDEX idx_likes_target ON likes(target_kind, target_id);

            CREATE TABLE watch_history (
                user_id     TEXT NOT NULL REFERENCES users(id),
                video_id    TEXT NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
                watched_at  TEXT NOT NULL,
                PRIMARY KEY (user_id, video_id)
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn likes_reject_unknown_target_kind() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        conn.execute_batch(
            "INSERT INTO users (id, username, email, fullname, password, avatar_url, avatar_public_id, created_at, updated_at)
             VALUES ('u1', 'a', 'a@x.io', 'A', 'h', 'url', 'pid', '2026-01-01', '2026-01-01');",
        )
        .unwrap();

        let res = conn.execute(
            "INSERT INTO likes (id, target_kind, target_id, liked_by, created_at)
             VALUES ('l1', 'playlist', 'p1', 'u1', '2026-01-01')",
            [],
        );
        assert!(res.is_err());
    }
}
