use quill_types::models::{Conversation, ConversationSummary, Message};

use crate::error::{Error, Result};
use crate::sanitize::clean;
use crate::{Core, records};

pub const MAX_MESSAGE_CHARS: usize = 1000;

impl Core {
    /// Appends the message and moves the pair's conversation to point at it.
    pub fn send(&self, sender: &str, receiver: &str, text: &str) -> Result<Message> {
        if sender == receiver {
            return Err(Error::invalid("receiver", "self"));
        }
        let text = clean(text, MAX_MESSAGE_CHARS);
        if text.is_empty() {
            return Err(Error::invalid("text", "empty"));
        }
        if !self.db.user_exists(receiver)? {
            return Err(Error::NotFound("user"));
        }

        let now = self.now();
        let id = self.db.insert_message(sender, receiver, &text, now)?;

        Ok(Message {
            id,
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            text,
            created_at: now,
        })
    }

    /// The latest `limit` messages between two users, oldest first.
    pub fn history(&self, a: &str, b: &str, limit: Option<u32>) -> Result<Vec<Message>> {
        let limit = limit.unwrap_or(self.config.message_history_limit);
        Ok(self
            .db
            .messages_between(a, b, limit)?
            .into_iter()
            .map(records::message)
            .collect())
    }

    pub fn conversation(&self, a: &str, b: &str) -> Result<Option<Conversation>> {
        Ok(self.db.get_conversation(a, b)?.map(records::conversation))
    }

    /// Most recently active first.
    pub fn conversations(&self, username: &str) -> Result<Vec<ConversationSummary>> {
        Ok(self
            .db
            .conversations_for(username)?
            .into_iter()
            .map(|row| records::summary(row, username))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::test_support::harness;

    #[test]
    fn pair_order_does_not_matter() {
        let h = harness();
        h.user("bob");
        h.user("alice");

        let first = h.core.send("bob", "alice", "hi alice").unwrap();
        let convo = h.core.conversation("alice", "bob").unwrap().unwrap();
        assert_eq!((convo.user1.as_str(), convo.user2.as_str()), ("alice", "bob"));
        assert_eq!(convo.last_message_id, first.id);

        h.clock.advance(Duration::seconds(5));
        let reply = h.core.send("alice", "bob", "hey bob").unwrap();
        let again = h.core.conversation("bob", "alice").unwrap().unwrap();
        assert_eq!(again.id, convo.id);
        assert_eq!(again.last_message_id, reply.id);
        assert!(again.updated_at > convo.updated_at);
    }

    #[test]
    fn history_is_chronological_and_bounded() {
        let h = harness();
        h.user("alice");
        h.user("bob");
        h.user("carol");

        for i in 0..4 {
            let (from, to) = if i % 2 == 0 { ("alice", "bob") } else { ("bob", "alice") };
            h.core.send(from, to, &format!("m{i}")).unwrap();
            h.clock.advance(Duration::seconds(1));
        }
        h.core.send("carol", "alice", "unrelated").unwrap();

        let texts = |msgs: Vec<Message>| msgs.into_iter().map(|m| m.text).collect::<Vec<_>>();
        assert_eq!(texts(h.core.history("bob", "alice", None).unwrap()), ["m0", "m1", "m2", "m3"]);
        assert_eq!(texts(h.core.history("alice", "bob", Some(2)).unwrap()), ["m2", "m3"]);
    }

    #[test]
    fn bad_messages_are_rejected() {
        let h = harness();
        h.user("alice");

        assert!(matches!(h.core.send("alice", "alice", "hello"), Err(Error::Validation(_))));
        assert!(matches!(h.core.send("alice", "ghost", "hello"), Err(Error::NotFound(_))));
        h.user("bob");
        assert!(matches!(h.core.send("alice", "bob", "<p> </p>"), Err(Error::Validation(_))));

        let long = h.core.send("alice", "bob", &"x".repeat(1500)).unwrap();
        assert_eq!(long.text.chars().count(), MAX_MESSAGE_CHARS);
    }

    #[test]
    fn conversation_list_shows_the_other_side() {
        let h = harness();
        h.user("alice");
        h.user("bob");
        h.user("carol");

        h.core.send("alice", "bob", "one").unwrap();
        h.clock.advance(Duration::seconds(1));
        h.core.send("carol", "alice", "two").unwrap();

        let list = h.core.conversations("alice").unwrap();
        let others: Vec<_> = list.iter().map(|c| c.other_user.as_str()).collect();
        assert_eq!(others, ["carol", "bob"]);
        assert_eq!(list[0].last_message.as_ref().map(|m| m.text.as_str()), Some("two"));
        assert!(h.core.conversations("dave").unwrap().is_empty());
    }
}
