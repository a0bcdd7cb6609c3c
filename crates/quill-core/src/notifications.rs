use quill_db::models::NewNotification;
use quill_types::models::{Notification, NotificationKind};
use tracing::warn;

use crate::error::Result;
use crate::sanitize::truncate_chars;
use crate::{Core, records};

/// How much of a blog title is quoted in notification text.
pub const TITLE_PREFIX_CHARS: usize = 30;

/// The text shown to the recipient. Rendered once, at write time, so later
/// title edits leave old notifications alone.
pub fn render_message(kind: NotificationKind, actor: &str, blog_title: Option<&str>) -> String {
    let title = truncate_chars(blog_title.unwrap_or_default(), TITLE_PREFIX_CHARS);
    match kind {
        NotificationKind::Like => format!("{actor} liked your blog \"{title}...\""),
        NotificationKind::Comment => format!("{actor} commented on your blog \"{title}...\""),
        NotificationKind::Follow => format!("{actor} started following you"),
    }
}

impl Core {
    /// Plain append. Repeated events give repeated notifications.
    pub fn notify(
        &self,
        recipient: &str,
        actor: &str,
        kind: NotificationKind,
        message: &str,
        blog_id: Option<i64>,
    ) -> Result<i64> {
        Ok(self.db.insert_notification(&NewNotification {
            user_username: recipient,
            from_username: actor,
            kind: kind.as_str(),
            message,
            blog_id,
            created_at: self.now(),
        })?)
    }

    /// Fan-out hook for follow, like and comment. Never fails the caller and
    /// stays silent when someone acts on their own content.
    pub(crate) fn notify_best_effort(
        &self,
        recipient: &str,
        actor: &str,
        kind: NotificationKind,
        blog: Option<(i64, &str)>,
    ) {
        if recipient == actor {
            return;
        }

        let message = render_message(kind, actor, blog.map(|(_, title)| title));
        if let Err(e) = self.notify(recipient, actor, kind, &message, blog.map(|(id, _)| id)) {
            warn!("Dropped {kind} notification for {recipient} from {actor}: {e}");
        }
    }

    /// Newest first. `None` uses the configured default.
    pub fn list_notifications(
        &self,
        recipient: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Notification>> {
        let limit = limit.unwrap_or(self.config.notification_limit);
        self.db
            .list_notifications(recipient, limit)?
            .into_iter()
            .map(records::notification)
            .collect()
    }

    pub fn unread_count(&self, recipient: &str) -> Result<u64> {
        Ok(self.db.count_unread_notifications(recipient)?)
    }

    /// Returns how many notifications flipped to read.
    pub fn mark_all_read(&self, recipient: &str) -> Result<usize> {
        Ok(self.db.mark_notifications_read(recipient)?)
    }
}
