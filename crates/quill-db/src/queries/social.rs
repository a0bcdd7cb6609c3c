use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};

use crate::{Database, is_unique_violation, to_db_time};

impl Database {
    // -- Follows --

    /// Returns `false` if the pair already exists.
    pub fn insert_follow(
        &self,
        follower: &str,
        following: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO follows (follower_username, following_username, created_at)
                 VALUES (?1, ?2, ?3)",
                params![follower, following, to_db_time(now)],
            );

            match inserted {
                Ok(_) => Ok(true),
                Err(e) if is_unique_violation(&e) => Ok(false),
                Err(e) => Err(e.into()),
            }
        })
    }

    /// Returns whether a row was actually removed.
    pub fn delete_follow(&self, follower: &str, following: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM follows WHERE follower_username = ?1 AND following_username = ?2",
                params![follower, following],
            )?;
            Ok(removed > 0)
        })
    }

    pub fn is_following(&self, follower: &str, following: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM follows
                     WHERE follower_username = ?1 AND following_username = ?2",
                    params![follower, following],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    pub fn count_followers(&self, username: &str) -> Result<u64> {
        self.count("SELECT COUNT(*) FROM follows WHERE following_username = ?1", username)
    }

    pub fn count_following(&self, username: &str) -> Result<u64> {
        self.count("SELECT COUNT(*) FROM follows WHERE follower_username = ?1", username)
    }

    // -- Likes --

    /// Returns `false` if the user already likes the blog.
    pub fn insert_like(&self, blog_id: i64, username: &str, now: DateTime<Utc>) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO likes (blog_id, username, created_at) VALUES (?1, ?2, ?3)",
                params![blog_id, username, to_db_time(now)],
            );

            match inserted {
                Ok(_) => Ok(true),
                Err(e) if is_unique_violation(&e) => Ok(false),
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn delete_like(&self, blog_id: i64, username: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM likes WHERE blog_id = ?1 AND username = ?2",
                params![blog_id, username],
            )?;
            Ok(removed > 0)
        })
    }

    pub fn is_liked(&self, blog_id: i64, username: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM likes WHERE blog_id = ?1 AND username = ?2",
                    params![blog_id, username],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    pub fn count_likes(&self, blog_id: i64) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM likes WHERE blog_id = ?1",
                [blog_id],
                |r| r.get(0),
            )?;
            Ok(n as u64)
        })
    }

    pub(crate) fn count(&self, sql: &str, key: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(sql, [key], |r| r.get(0))?;
            Ok(n as u64)
        })
    }
}
