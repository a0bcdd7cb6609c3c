use anyhow::Result;
use rusqlite::params;

use crate::models::{NewNotification, NotificationRow};
use crate::{Database, time_col, to_db_time};

impl Database {
    pub fn insert_notification(&self, n: &NewNotification<'_>) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO notifications
                    (user_username, from_username, kind, message, blog_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    n.user_username,
                    n.from_username,
                    n.kind,
                    n.message,
                    n.blog_id,
                    to_db_time(n.created_at),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Newest first, at most `limit` rows.
    pub fn list_notifications(&self, username: &str, limit: u32) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_username, from_username, kind, message, blog_id, is_read,
                        created_at
                 FROM notifications
                 WHERE user_username = ?1
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?2",
            )?;

            let rows = stmt
                .query_map(params![username, limit], |row| {
                    Ok(NotificationRow {
                        id: row.get(0)?,
                        user_username: row.get(1)?,
                        from_username: row.get(2)?,
                        kind: row.get(3)?,
                        message: row.get(4)?,
                        blog_id: row.get(5)?,
                        is_read: row.get(6)?,
                        created_at: time_col(row, 7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn count_unread_notifications(&self, username: &str) -> Result<u64> {
        self.count(
            "SELECT COUNT(*) FROM notifications WHERE user_username = ?1 AND is_read = 0",
            username,
        )
    }

    /// Returns how many rows flipped from unread to read.
    pub fn mark_notifications_read(&self, username: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE notifications SET is_read = 1 WHERE user_username = ?1 AND is_read = 0",
                [username],
            )?;
            Ok(changed)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::{db_with_users, t0};
    use chrono::Duration;

    #[test]
    fn unread_rows_flip_once() {
        let db = db_with_users(&["alice", "bob"]);
        for i in 0..3 {
            db.insert_notification(&NewNotification {
                user_username: "alice",
                from_username: "bob",
                kind: "follow",
                message: "bob started following you",
                blog_id: None,
                created_at: t0() + Duration::seconds(i),
            })
            .unwrap();
        }

        assert_eq!(db.count_unread_notifications("alice").unwrap(), 3);
        assert_eq!(db.mark_notifications_read("alice").unwrap(), 3);
        assert_eq!(db.mark_notifications_read("alice").unwrap(), 0);
        assert_eq!(db.count_unread_notifications("alice").unwrap(), 0);

        let rows = db.list_notifications("alice", 2).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].created_at > rows[1].created_at);
        assert!(rows.iter().all(|r| r.is_read));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let db = db_with_users(&["alice", "bob"]);
        let result = db.insert_notification(&NewNotification {
            user_username: "alice",
            from_username: "bob",
            kind: "poke",
            message: "bob poked you",
            blog_id: None,
            created_at: t0(),
        });
        assert!(result.is_err());
    }
}
