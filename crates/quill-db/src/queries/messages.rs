use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params};

use crate::models::{ConversationRow, MessageRow};
use crate::{Database, time_col, to_db_time};

/// Canonical ordering for an unordered pair of participants.
fn conversation_key<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b { (a, b) } else { (b, a) }
}

const CONVERSATION_SELECT: &str =
    "SELECT c.id, c.user1_username, c.user2_username, c.last_message_id, c.updated_at,
            m.id, m.sender_username, m.receiver_username, m.message_text, m.created_at
     FROM conversations c
     LEFT JOIN messages m ON m.id = c.last_message_id";

impl Database {
    /// Append a message and point the pair's conversation at it, creating the
    /// conversation on first contact. Returns the new message id.
    pub fn insert_message(
        &self,
        sender: &str,
        receiver: &str,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let now = to_db_time(now);

            tx.execute(
                "INSERT INTO messages (sender_username, receiver_username, message_text, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![sender, receiver, text, now],
            )?;
            let message_id = tx.last_insert_rowid();

            let (user1, user2) = conversation_key(sender, receiver);
            tx.execute(
                "INSERT INTO conversations
                     (user1_username, user2_username, last_message_id, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(user1_username, user2_username)
                 DO UPDATE SET last_message_id = excluded.last_message_id,
                               updated_at = excluded.updated_at",
                params![user1, user2, message_id, now],
            )?;

            tx.commit()?;
            Ok(message_id)
        })
    }

    /// The most recent `limit` messages between the pair, oldest first.
    pub fn messages_between(&self, a: &str, b: &str, limit: u32) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, sender_username, receiver_username, message_text, created_at
                 FROM messages
                 WHERE (sender_username = ?1 AND receiver_username = ?2)
                    OR (sender_username = ?2 AND receiver_username = ?1)
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?3",
            )?;

            let mut rows = stmt
                .query_map(params![a, b, limit], |row| map_message(row, 0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.reverse();

            Ok(rows)
        })
    }

    pub fn get_conversation(&self, a: &str, b: &str) -> Result<Option<ConversationRow>> {
        let (user1, user2) = conversation_key(a, b);
        self.with_conn(|conn| {
            let sql = format!(
                "{CONVERSATION_SELECT} WHERE c.user1_username = ?1 AND c.user2_username = ?2"
            );
            let row = conn
                .query_row(&sql, params![user1, user2], map_conversation)
                .optional()?;
            Ok(row)
        })
    }

    /// Every conversation `username` takes part in, most recently active first.
    pub fn conversations_for(&self, username: &str) -> Result<Vec<ConversationRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{CONVERSATION_SELECT}
                 WHERE c.user1_username = ?1 OR c.user2_username = ?1
                 ORDER BY c.updated_at DESC, c.id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([username], map_conversation)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn map_message(row: &Row<'_>, offset: usize) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(offset)?,
        sender_username: row.get(offset + 1)?,
        receiver_username: row.get(offset + 2)?,
        message_text: row.get(offset + 3)?,
        created_at: time_col(row, offset + 4)?,
    })
}

fn map_conversation(row: &Row<'_>) -> rusqlite::Result<ConversationRow> {
    let last_message = match row.get::<_, Option<i64>>(5)? {
        Some(_) => Some(map_message(row, 5)?),
        None => None,
    };

    Ok(ConversationRow {
        id: row.get(0)?,
        user1_username: row.get(1)?,
        user2_username: row.get(2)?,
        last_message_id: row.get(3)?,
        updated_at: time_col(row, 4)?,
        last_message,
    })
}

#[cfg(test)]
mod tests {
    use crate::queries::test_support::{db_with_users, t0};
    use chrono::Duration;

    #[test]
    fn both_directions_share_one_conversation() {
        let db = db_with_users(&["alice", "bob"]);
        db.insert_message("alice", "bob", "hi", t0()).unwrap();
        let reply = db
            .insert_message("bob", "alice", "hey", t0() + Duration::seconds(1))
            .unwrap();

        let count: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM conversations", [], |r| r.get(0))?)
            })
            .unwrap();
        assert_eq!(count, 1);

        let conv = db.get_conversation("bob", "alice").unwrap().unwrap();
        assert_eq!((conv.user1_username.as_str(), conv.user2_username.as_str()), ("alice", "bob"));
        assert_eq!(conv.last_message_id, reply);
        assert_eq!(conv.last_message.unwrap().message_text, "hey");
    }

    #[test]
    fn history_is_the_latest_window_in_chronological_order() {
        let db = db_with_users(&["alice", "bob", "carol"]);
        for i in 0..5 {
            let (from, to) = if i % 2 == 0 { ("alice", "bob") } else { ("bob", "alice") };
            db.insert_message(from, to, &format!("m{i}"), t0() + Duration::seconds(i))
                .unwrap();
        }
        db.insert_message("alice", "carol", "elsewhere", t0()).unwrap();

        let texts: Vec<String> = db
            .messages_between("bob", "alice", 3)
            .unwrap()
            .into_iter()
            .map(|m| m.message_text)
            .collect();
        assert_eq!(texts, vec!["m2", "m3", "m4"]);

        let convs = db.conversations_for("alice").unwrap();
        assert_eq!(convs.len(), 2);
        assert_eq!(convs[0].user2_username, "bob");
    }
}
