//! Row to domain-record conversions.

use anyhow::Context;
use quill_db::models::{BlogRow, CommentRow, ConversationRow, MessageRow, NotificationRow, UserRow};
use quill_types::models::{
    Blog, Comment, Conversation, ConversationSummary, Message, Notification, NotificationKind,
    User,
};

use crate::error::Result;

pub(crate) fn user(row: UserRow) -> User {
    User {
        id: row.id,
        username: row.username,
        email: row.email,
        channel: row.channel,
        bio: row.bio,
        profile_pic: row.profile_pic,
        created_at: row.created_at,
    }
}

pub(crate) fn blog(row: BlogRow) -> Result<Blog> {
    let images: Vec<String> = serde_json::from_str(&row.images)
        .with_context(|| format!("blog {} has a malformed image list", row.id))?;

    Ok(Blog {
        id: row.id,
        title: row.title,
        content: row.content,
        author: row.author_username,
        channel: row.channel,
        images,
        likes_count: row.likes_count,
        created_at: row.created_at,
    })
}

pub(crate) fn blogs(rows: Vec<BlogRow>) -> Result<Vec<Blog>> {
    rows.into_iter().map(blog).collect()
}

pub(crate) fn comment(row: CommentRow) -> Comment {
    Comment {
        id: row.id,
        blog_id: row.blog_id,
        username: row.username,
        text: row.comment_text,
        created_at: row.created_at,
    }
}

pub(crate) fn notification(row: NotificationRow) -> Result<Notification> {
    let kind = row
        .kind
        .parse::<NotificationKind>()
        .with_context(|| format!("notification {} has a bad kind", row.id))?;

    Ok(Notification {
        id: row.id,
        recipient: row.user_username,
        actor: row.from_username,
        kind,
        message: row.message,
        blog_id: row.blog_id,
        is_read: row.is_read,
        created_at: row.created_at,
    })
}

pub(crate) fn message(row: MessageRow) -> Message {
    Message {
        id: row.id,
        sender: row.sender_username,
        receiver: row.receiver_username,
        text: row.message_text,
        created_at: row.created_at,
    }
}

pub(crate) fn conversation(row: ConversationRow) -> Conversation {
    Conversation {
        id: row.id,
        user1: row.user1_username,
        user2: row.user2_username,
        last_message_id: row.last_message_id,
        updated_at: row.updated_at,
    }
}

/// `viewer` must be one of the two participants.
pub(crate) fn summary(row: ConversationRow, viewer: &str) -> ConversationSummary {
    let other_user = if row.user1_username == viewer {
        row.user2_username
    } else {
        row.user1_username
    };

    ConversationSummary {
        conversation_id: row.id,
        other_user,
        last_message: row.last_message.map(message),
        updated_at: row.updated_at,
    }
}
