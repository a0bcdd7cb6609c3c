//! Typed statements, grouped by table. Every method is an `impl Database`
//! block so callers only ever see `db.some_query(..)`.

mod blogs;
mod messages;
mod notifications;
mod reset_tokens;
mod social;
mod users;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, TimeZone, Utc};

    use crate::Database;
    use crate::models::NewUser;

    pub fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    pub fn db_with_users(names: &[&str]) -> Database {
        let db = Database::open_in_memory().unwrap();
        for name in names {
            db.create_user(&NewUser {
                username: name,
                email: Some("someone@example.com"),
                password_hash: Some("$argon2id$placeholder"),
                channel: "general",
                security_question: "first pet?",
                security_answer_hash: None,
                created_at: t0(),
            })
            .unwrap()
            .expect("fresh username");
        }
        db
    }
}
