use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An account as seen by the rest of the system. Credentials never leave the
/// storage layer, so they are not part of this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub channel: String,
    pub bio: String,
    pub profile_pic: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Public profile with counts derived from the relation rows at read time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    pub channel: String,
    pub bio: String,
    pub profile_pic: Option<String>,
    pub followers_count: u64,
    pub following_count: u64,
    pub posts_count: u64,
    pub created_at: DateTime<Utc>,
}

/// The resolved identity handed back by a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub channel: String,
    pub authenticated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blog {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author: String,
    pub channel: String,
    pub images: Vec<String>,
    pub likes_count: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub blog_id: i64,
    pub username: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// What triggered a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Comment,
    Like,
    Follow,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::Like => "like",
            Self::Follow => "follow",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownNotificationKind(pub String);

impl fmt::Display for UnknownNotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown notification kind '{}'", self.0)
    }
}

impl std::error::Error for UnknownNotificationKind {}

impl FromStr for NotificationKind {
    type Err = UnknownNotificationKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "comment" => Ok(Self::Comment),
            "like" => Ok(Self::Like),
            "follow" => Ok(Self::Follow),
            other => Err(UnknownNotificationKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub recipient: String,
    pub actor: String,
    pub kind: NotificationKind,
    pub message: String,
    pub blog_id: Option<i64>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender: String,
    pub receiver: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Latest-message pointer for an unordered pair of users. `user1` always
/// sorts before `user2`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub user1: String,
    pub user2: String,
    pub last_message_id: i64,
    pub updated_at: DateTime<Utc>,
}

/// A conversation from one participant's point of view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub conversation_id: i64,
    pub other_user: String,
    pub last_message: Option<Message>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_kind_parses_its_own_names() {
        for kind in [NotificationKind::Comment, NotificationKind::Like, NotificationKind::Follow] {
            assert_eq!(kind.as_str().parse::<NotificationKind>(), Ok(kind));
        }
        assert!("mention".parse::<NotificationKind>().is_err());
    }
}
