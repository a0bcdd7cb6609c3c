use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::models::ResetTokenRow;
use crate::{Database, opt_time_col, time_col, to_db_time};

impl Database {
    /// Store a new token hash for `username`, first retiring every token the
    /// user still has outstanding. Both steps share one transaction.
    pub fn issue_reset_token(
        &self,
        username: &str,
        token_hash: &str,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let now = to_db_time(now);

            tx.execute(
                "UPDATE password_reset_tokens SET used_at = ?1
                 WHERE username = ?2 AND used_at IS NULL",
                params![now, username],
            )?;
            tx.execute(
                "INSERT INTO password_reset_tokens (username, token_hash, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![username, token_hash, now, to_db_time(expires_at)],
            )?;

            tx.commit()?;
            Ok(())
        })
    }

    /// Owner of a token that is unconsumed and not yet expired at `now`.
    pub fn find_valid_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let username = conn
                .query_row(
                    "SELECT username FROM password_reset_tokens
                     WHERE token_hash = ?1 AND used_at IS NULL AND expires_at > ?2",
                    params![token_hash, to_db_time(now)],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(username)
        })
    }

    /// Mark a valid token consumed. The condition and the write are a single
    /// statement, so of several concurrent callers only one gets `Some`.
    pub fn consume_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>> {
        self.with_conn(|conn| consume(conn, token_hash, now))
    }

    /// Consume the token and install the new password hash atomically.
    /// Returns the user whose password changed, or `None` if the token was not
    /// valid (in which case nothing is written).
    pub fn reset_password_with_token(
        &self,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let Some(username) = consume(&tx, token_hash, now)? else {
                return Ok(None);
            };

            tx.execute(
                "UPDATE users SET password_hash = ?1 WHERE username = ?2",
                params![password_hash, username],
            )?;

            tx.commit()?;
            Ok(Some(username))
        })
    }

    pub fn reset_tokens_for(&self, username: &str) -> Result<Vec<ResetTokenRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, token_hash, created_at, expires_at, used_at
                 FROM password_reset_tokens
                 WHERE username = ?1
                 ORDER BY id",
            )?;

            let rows = stmt
                .query_map([username], |row| {
                    Ok(ResetTokenRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        token_hash: row.get(2)?,
                        created_at: time_col(row, 3)?,
                        expires_at: time_col(row, 4)?,
                        used_at: opt_time_col(row, 5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn consume(conn: &Connection, token_hash: &str, now: DateTime<Utc>) -> Result<Option<String>> {
    let now = to_db_time(now);
    let username = conn
        .query_row(
            "UPDATE password_reset_tokens SET used_at = ?2
             WHERE token_hash = ?1 AND used_at IS NULL AND expires_at > ?2
             RETURNING username",
            params![token_hash, now],
            |row| row.get(0),
        )
        .optional()?;
    Ok(username)
}

#[cfg(test)]
mod tests {
    use crate::queries::test_support::{db_with_users, t0};
    use chrono::Duration;

    #[test]
    fn issuing_retires_outstanding_tokens() {
        let db = db_with_users(&["alice"]);
        let ttl = Duration::minutes(30);

        db.issue_reset_token("alice", "h1", t0(), t0() + ttl).unwrap();
        db.issue_reset_token("alice", "h2", t0(), t0() + ttl).unwrap();

        assert_eq!(db.find_valid_reset_token("h1", t0()).unwrap(), None);
        assert_eq!(db.find_valid_reset_token("h2", t0()).unwrap().as_deref(), Some("alice"));

        let rows = db.reset_tokens_for("alice").unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].used_at.is_some());
        assert!(rows[1].used_at.is_none());
    }

    #[test]
    fn consume_succeeds_once() {
        let db = db_with_users(&["alice"]);
        db.issue_reset_token("alice", "h1", t0(), t0() + Duration::minutes(30)).unwrap();

        assert_eq!(db.consume_reset_token("h1", t0()).unwrap().as_deref(), Some("alice"));
        assert_eq!(db.consume_reset_token("h1", t0()).unwrap(), None);
    }

    #[test]
    fn expired_token_cannot_reset() {
        let db = db_with_users(&["alice"]);
        db.issue_reset_token("alice", "h1", t0(), t0() + Duration::minutes(30)).unwrap();

        let later = t0() + Duration::minutes(31);
        assert_eq!(db.reset_password_with_token("h1", "new-hash", later).unwrap(), None);
        assert_eq!(
            db.get_user("alice").unwrap().unwrap().password_hash.as_deref(),
            Some("$argon2id$placeholder")
        );
    }
}
