//! Database row types. These map directly to SQLite rows and stay distinct
//! from the quill-types models so the storage layer has no upward dependency.

use chrono::{DateTime, Utc};

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    /// `None` for legacy or social-login accounts.
    pub password_hash: Option<String>,
    pub channel: String,
    pub bio: String,
    pub profile_pic: Option<String>,
    pub security_question: String,
    pub security_answer_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: Option<&'a str>,
    pub password_hash: Option<&'a str>,
    pub channel: &'a str,
    pub security_question: &'a str,
    pub security_answer_hash: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

pub struct BlogRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_username: String,
    pub channel: String,
    /// JSON array of storage references.
    pub images: String,
    pub likes_count: u64,
    pub created_at: DateTime<Utc>,
}

pub struct NewBlog<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub author_username: &'a str,
    pub channel: &'a str,
    pub images: &'a str,
    pub created_at: DateTime<Utc>,
}

pub struct CommentRow {
    pub id: i64,
    pub blog_id: i64,
    pub username: String,
    pub comment_text: String,
    pub created_at: DateTime<Utc>,
}

pub struct NotificationRow {
    pub id: i64,
    pub user_username: String,
    pub from_username: String,
    pub kind: String,
    pub message: String,
    pub blog_id: Option<i64>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

pub struct NewNotification<'a> {
    pub user_username: &'a str,
    pub from_username: &'a str,
    pub kind: &'a str,
    pub message: &'a str,
    pub blog_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

pub struct MessageRow {
    pub id: i64,
    pub sender_username: String,
    pub receiver_username: String,
    pub message_text: String,
    pub created_at: DateTime<Utc>,
}

pub struct ConversationRow {
    pub id: i64,
    pub user1_username: String,
    pub user2_username: String,
    pub last_message_id: i64,
    pub updated_at: DateTime<Utc>,
    /// Joined from `messages`; `None` only if the row was removed underneath.
    pub last_message: Option<MessageRow>,
}

pub struct ResetTokenRow {
    pub id: i64,
    pub username: String,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}
