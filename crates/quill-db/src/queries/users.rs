use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::models::{NewUser, UserRow};
use crate::{Database, is_unique_violation, time_col, to_db_time};

const USER_COLUMNS: &str = "id, username, email, password_hash, channel, bio, profile_pic, \
                            security_question, security_answer_hash, created_at";

impl Database {
    /// Insert a user. Returns `None` when the username is already taken; the
    /// UNIQUE constraint is the arbiter, not a prior lookup.
    pub fn create_user(&self, user: &NewUser<'_>) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users
                    (username, email, password_hash, channel, security_question,
                     security_answer_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    user.username,
                    user.email,
                    user.password_hash,
                    user.channel,
                    user.security_question,
                    user.security_answer_hash,
                    to_db_time(user.created_at),
                ],
            );

            match inserted {
                Ok(_) => Ok(Some(conn.last_insert_rowid())),
                Err(e) if is_unique_violation(&e) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, username))
    }

    pub fn user_exists(&self, username: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row("SELECT 1 FROM users WHERE username = ?1", [username], |_| Ok(()))
                .optional()?;
            Ok(found.is_some())
        })
    }

    pub fn update_bio(&self, username: &str, bio: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET bio = ?1 WHERE username = ?2",
                params![bio, username],
            )?;
            Ok(changed == 1)
        })
    }

    pub fn update_profile_pic(&self, username: &str, reference: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET profile_pic = ?1 WHERE username = ?2",
                params![reference, username],
            )?;
            Ok(changed == 1)
        })
    }
}

fn query_user(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([username], map_user).optional()?;
    Ok(row)
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        channel: row.get(4)?,
        bio: row.get(5)?,
        profile_pic: row.get(6)?,
        security_question: row.get(7)?,
        security_answer_hash: row.get(8)?,
        created_at: time_col(row, 9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::{db_with_users, t0};

    #[test]
    fn duplicate_username_is_reported_not_raised() {
        let db = db_with_users(&["alice"]);
        let again = db
            .create_user(&NewUser {
                username: "alice",
                email: None,
                password_hash: Some("other"),
                channel: "general",
                security_question: "",
                security_answer_hash: None,
                created_at: t0(),
            })
            .unwrap();
        assert!(again.is_none());

        let stored = db.get_user("alice").unwrap().unwrap();
        assert_eq!(stored.password_hash.as_deref(), Some("$argon2id$placeholder"));
    }

    #[test]
    fn updates_report_missing_users() {
        let db = db_with_users(&["alice"]);
        assert!(db.update_bio("alice", "hello").unwrap());
        assert!(!db.update_bio("nobody", "hello").unwrap());
        assert_eq!(db.get_user("alice").unwrap().unwrap().bio, "hello");
        assert!(db.user_exists("alice").unwrap());
        assert!(!db.user_exists("nobody").unwrap());
    }
}
