use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub const LATEST_VERSION: i64 = 1;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                id                    INTEGER PRIMARY KEY AUTOINCREMENT,
                username              TEXT NOT NULL UNIQUE,
                email                 TEXT,
                password_hash         TEXT,
                channel               TEXT NOT NULL DEFAULT 'general',
                bio                   TEXT NOT NULL DEFAULT '',
                profile_pic           TEXT,
                security_question     TEXT NOT NULL DEFAULT '',
                security_answer_hash  TEXT,
                created_at            TEXT NOT NULL
            );

            CREATE TABLE blogs (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                title            TEXT NOT NULL,
                content          TEXT NOT NULL,
                author_username  TEXT NOT NULL REFERENCES users(username),
                channel          TEXT NOT NULL,
                images           TEXT NOT NULL DEFAULT '[]',
                created_at       TEXT NOT NULL
            );

            CREATE INDEX idx_blogs_created ON blogs(created_at);
            CREATE INDEX idx_blogs_author ON blogs(author_username, created_at);

            CREATE TABLE comments (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                blog_id       INTEGER NOT NULL REFERENCES blogs(id) ON DELETE CASCADE,
                username      TEXT NOT NULL REFERENCES users(username),
                comment_text  TEXT NOT NULL,
                created_at    TEXT NOT NULL
            );

            CREATE INDEX idx_comments_blog ON comments(blog_id, created_at);

            CREATE TABLE likes (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                blog_id     INTEGER NOT NULL REFERENCES blogs(id) ON DELETE CASCADE,
                username    TEXT NOT NULL REFERENCES users(username),
                created_at  TEXT NOT NULL,
                UNIQUE(blog_id, username)
            );

            CREATE TABLE follows (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                follower_username   TEXT NOT NULL REFERENCES users(username),
                following_username  TEXT NOT NULL REFERENCES users(username),
                created_at          TEXT NOT NULL,
                UNIQUE(follower_username, following_username),
                CHECK(follower_username <> following_username)
            );

            CREATE INDEX idx_follows_following ON follows(following_username);

            CREATE TABLE notifications (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                user_username  TEXT NOT NULL REFERENCES users(username),
                from_username  TEXT NOT NULL REFERENCES users(username),
                kind           TEXT NOT NULL CHECK(kind IN ('comment', 'like', 'follow')),
                message        TEXT NOT NULL,
                blog_id        INTEGER REFERENCES blogs(id) ON DELETE SET NULL,
                is_read        INTEGER NOT NULL DEFAULT 0,
                created_at     TEXT NOT NULL
            );

            CREATE INDEX idx_notifications_user ON notifications(user_username, is_read);

            CREATE TABLE messages (
                id                 INTEGER PRIMARY KEY AUTOINCREMENT,
                sender_username    TEXT NOT NULL REFERENCES users(username),
                receiver_username  TEXT NOT NULL REFERENCES users(username),
                message_text       TEXT NOT NULL,
                created_at         TEXT NOT NULL
            );

            CREATE INDEX idx_messages_pair
                ON messages(sender_username, receiver_username, created_at);

            -- One row per unordered pair: user1 always sorts first.
            CREATE TABLE conversations (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                user1_username   TEXT NOT NULL REFERENCES users(username),
                user2_username   TEXT NOT NULL REFERENCES users(username),
                last_message_id  INTEGER NOT NULL REFERENCES messages(id),
                updated_at       TEXT NOT NULL,
                UNIQUE(user1_username, user2_username),
                CHECK(user1_username < user2_username)
            );

            CREATE TABLE password_reset_tokens (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                username    TEXT NOT NULL REFERENCES users(username),
                token_hash  TEXT NOT NULL UNIQUE,
                created_at  TEXT NOT NULL,
                expires_at  TEXT NOT NULL,
                used_at     TEXT
            );

            -- At most one outstanding token per user.
            CREATE UNIQUE INDEX idx_reset_tokens_outstanding
                ON password_reset_tokens(username) WHERE used_at IS NULL;

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
