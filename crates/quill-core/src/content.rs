//! Blogs, their images and their comments.

use std::path::Path;

use anyhow::Context;
use quill_db::models::NewBlog;
use quill_types::models::{Blog, Comment, NotificationKind};
use tracing::{info, warn};
use validator::Validate;

use crate::error::{Error, Result};
use crate::sanitize::{clean, strip_tags};
use crate::validation::BlogDraft;
use crate::{Core, records};

pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];
pub const MAX_COMMENT_CHARS: usize = 500;
pub const MIN_COMMENT_CHARS: usize = 3;

/// An uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Lower-cased extension of the client-side file name, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
    }
}

fn draft(title: &str, content: &str) -> Result<BlogDraft> {
    let draft = BlogDraft {
        title: strip_tags(title),
        content: strip_tags(content),
    };
    draft.validate()?;
    Ok(draft)
}

impl Core {
    /// Extension allow-list and size cap. Returns the extension to store under.
    pub(crate) fn check_image(&self, upload: &ImageUpload) -> Result<String> {
        let extension = upload
            .extension()
            .filter(|ext| ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()))
            .ok_or_else(|| Error::invalid("images", "unsupported_type"))?;

        if upload.bytes.is_empty() || upload.bytes.len() > self.config.max_image_bytes {
            return Err(Error::invalid("images", "size"));
        }

        Ok(extension)
    }

    /// Every image is checked before any of them is stored.
    pub fn create_blog(
        &self,
        author: &str,
        title: &str,
        content: &str,
        images: &[ImageUpload],
    ) -> Result<Blog> {
        let draft = draft(title, content)?;
        if images.is_empty() {
            return Err(Error::invalid("images", "required"));
        }
        let extensions = images
            .iter()
            .map(|image| self.check_image(image))
            .collect::<Result<Vec<_>>>()?;

        let user = self.db.get_user(author)?.ok_or(Error::NotFound("user"))?;

        let mut references = Vec::with_capacity(images.len());
        for (image, extension) in images.iter().zip(&extensions) {
            match self.files.put(&image.bytes, extension) {
                Ok(reference) => references.push(reference),
                Err(e) => {
                    self.discard_uploads(&references);
                    return Err(e.into());
                }
            }
        }

        let now = self.now();
        let inserted = serde_json::to_string(&references)
            .context("encoding image list")
            .and_then(|encoded| {
                self.db.insert_blog(&NewBlog {
                    title: &draft.title,
                    content: &draft.content,
                    author_username: author,
                    channel: &user.channel,
                    images: &encoded,
                    created_at: now,
                })
            });
        let id = match inserted {
            Ok(id) => id,
            Err(e) => {
                self.discard_uploads(&references);
                return Err(e.into());
            }
        };

        info!("{author} published blog {id}");

        Ok(Blog {
            id,
            title: draft.title,
            content: draft.content,
            author: author.to_string(),
            channel: user.channel,
            images: references,
            likes_count: 0,
            created_at: now,
        })
    }

    /// Drops uploads whose record never made it to the database.
    pub(crate) fn discard_uploads(&self, references: &[String]) {
        for reference in references {
            if let Err(e) = self.files.remove(reference) {
                warn!("Could not remove orphaned upload {reference}: {e}");
            }
        }
    }

    /// Looks the blog up first so a stranger gets `Forbidden` and a missing
    /// blog gets `NotFound`.
    fn owned_blog(&self, actor: &str, id: i64) -> Result<()> {
        let blog = self.db.get_blog(id)?.ok_or(Error::NotFound("blog"))?;
        if blog.author_username != actor {
            return Err(Error::Forbidden);
        }
        Ok(())
    }

    pub fn edit_blog(&self, actor: &str, id: i64, title: &str, content: &str) -> Result<Blog> {
        let draft = draft(title, content)?;
        self.owned_blog(actor, id)?;

        if !self.db.update_blog(id, actor, &draft.title, &draft.content)? {
            return Err(Error::NotFound("blog"));
        }
        self.get_blog(id)
    }

    pub fn delete_blog(&self, actor: &str, id: i64) -> Result<()> {
        self.owned_blog(actor, id)?;
        if !self.db.delete_blog(id, actor)? {
            return Err(Error::NotFound("blog"));
        }

        info!("{actor} deleted blog {id}");
        Ok(())
    }

    pub fn get_blog(&self, id: i64) -> Result<Blog> {
        let row = self.db.get_blog(id)?.ok_or(Error::NotFound("blog"))?;
        records::blog(row)
    }

    /// Newest first.
    pub fn list_blogs(&self, limit: Option<u32>) -> Result<Vec<Blog>> {
        let rows = self.db.list_blogs(limit.unwrap_or(self.config.blog_page_size))?;
        records::blogs(rows)
    }

    /// Substring match on title, content or author, ignoring ASCII case.
    pub fn search_blogs(&self, query: &str, limit: Option<u32>) -> Result<Vec<Blog>> {
        let query = query.trim();
        if query.is_empty() {
            return self.list_blogs(limit);
        }
        let rows = self
            .db
            .search_blogs(query, limit.unwrap_or(self.config.blog_page_size))?;
        records::blogs(rows)
    }

    pub fn blogs_by_author(&self, username: &str) -> Result<Vec<Blog>> {
        records::blogs(self.db.blogs_by_author(username)?)
    }

    // -- Comments --

    pub fn add_comment(&self, actor: &str, blog_id: i64, text: &str) -> Result<Comment> {
        let text = clean(text, MAX_COMMENT_CHARS);
        if text.chars().count() < MIN_COMMENT_CHARS {
            return Err(Error::invalid("text", "too_short"));
        }
        let blog = self.db.get_blog(blog_id)?.ok_or(Error::NotFound("blog"))?;

        let now = self.now();
        let id = self.db.insert_comment(blog_id, actor, &text, now)?;

        self.notify_best_effort(
            &blog.author_username,
            actor,
            NotificationKind::Comment,
            Some((blog.id, &blog.title)),
        );

        Ok(Comment {
            id,
            blog_id,
            username: actor.to_string(),
            text,
            created_at: now,
        })
    }

    /// Oldest first.
    pub fn comments(&self, blog_id: i64) -> Result<Vec<Comment>> {
        if self.db.get_blog(blog_id)?.is_none() {
            return Err(Error::NotFound("blog"));
        }
        Ok(self
            .db
            .list_comments(blog_id)?
            .into_iter()
            .map(records::comment)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::ErrorKind;
    use crate::test_support::harness;

    fn png() -> Vec<ImageUpload> {
        vec![ImageUpload::new("a.png", vec![1, 2, 3])]
    }

    #[test]
    fn create_sanitizes_and_stores_images() {
        let h = harness();
        h.user("alice");

        let blog = h
            .core
            .create_blog(
                "alice",
                "<h1>Trip</h1> notes",
                "<script>x</script>Lots of words here",
                &[
                    ImageUpload::new("a.PNG", vec![1]),
                    ImageUpload::new("b.webp", vec![2]),
                ],
            )
            .unwrap();

        assert_eq!(blog.title, "Trip notes");
        assert_eq!(blog.content, "xLots of words here");
        assert_eq!(blog.channel, "general");
        assert_eq!(blog.images.len(), 2);
        assert_ne!(blog.images[0], blog.images[1]);
        assert_eq!(h.files.len(), 2);

        let stored = h.core.get_blog(blog.id).unwrap();
        assert_eq!(stored.images, blog.images);
        assert_eq!(stored.title, blog.title);
    }

    #[test]
    fn create_validates_before_storing_anything() {
        let h = harness();
        h.user("alice");

        let short = h.core.create_blog("alice", "Hi", "long enough content", &png());
        assert_eq!(short.unwrap_err().kind(), ErrorKind::Validation);

        let thin = h.core.create_blog("alice", "Title", "<b></b>short", &png());
        assert_eq!(thin.unwrap_err().kind(), ErrorKind::Validation);

        let none = h.core.create_blog("alice", "Title", "long enough content", &[]);
        assert_eq!(none.unwrap_err().kind(), ErrorKind::Validation);

        let mixed = [
            ImageUpload::new("ok.png", vec![1]),
            ImageUpload::new("bad.svg", vec![1]),
        ];
        let bad_type = h.core.create_blog("alice", "Title", "long enough content", &mixed);
        assert_eq!(bad_type.unwrap_err().kind(), ErrorKind::Validation);

        let huge = [ImageUpload::new("big.png", vec![0; h.core.config().max_image_bytes + 1])];
        let too_big = h.core.create_blog("alice", "Title", "long enough content", &huge);
        assert_eq!(too_big.unwrap_err().kind(), ErrorKind::Validation);

        assert!(h.files.is_empty());
        assert!(h.core.list_blogs(None).unwrap().is_empty());
    }

    #[test]
    fn failed_insert_leaves_no_uploads_behind() {
        let h = harness();
        h.user("alice");
        h.core
            .database()
            .with_conn(|c| {
                Ok(c.execute_batch(
                    "CREATE TRIGGER reject_blogs BEFORE INSERT ON blogs
                     BEGIN SELECT RAISE(ABORT, 'read only'); END",
                )?)
            })
            .unwrap();

        let images = [
            ImageUpload::new("a.png", vec![1]),
            ImageUpload::new("b.jpg", vec![2]),
        ];
        let err = h
            .core
            .create_blog("alice", "Title", "long enough content", &images)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(h.files.is_empty());
    }

    #[test]
    fn only_the_author_edits_or_deletes() {
        let h = harness();
        h.user("alice");
        h.user("bob");
        let id = h.blog("alice", "Original title");

        let err = h.core.edit_blog("bob", id, "New title", "new content here").unwrap_err();
        assert!(matches!(err, Error::Forbidden));
        assert!(matches!(h.core.delete_blog("bob", id), Err(Error::Forbidden)));
        assert!(matches!(
            h.core.edit_blog("alice", 9999, "New title", "new content here"),
            Err(Error::NotFound(_))
        ));

        let edited = h.core.edit_blog("alice", id, "New title", "new content here").unwrap();
        assert_eq!(edited.title, "New title");

        h.core.delete_blog("alice", id).unwrap();
        assert!(matches!(h.core.get_blog(id), Err(Error::NotFound(_))));
        assert!(matches!(h.core.delete_blog("alice", id), Err(Error::NotFound(_))));
    }

    #[test]
    fn listing_and_search() {
        let h = harness();
        h.user("alice");
        h.user("bob");
        h.blog("alice", "Rust tips");
        h.clock.advance(Duration::seconds(1));
        h.blog("bob", "Cooking pasta");
        h.clock.advance(Duration::seconds(1));
        h.blog("alice", "More RUST");

        let titles = |blogs: Vec<Blog>| blogs.into_iter().map(|b| b.title).collect::<Vec<_>>();

        assert_eq!(
            titles(h.core.list_blogs(None).unwrap()),
            ["More RUST", "Cooking pasta", "Rust tips"]
        );
        assert_eq!(titles(h.core.list_blogs(Some(1)).unwrap()), ["More RUST"]);
        assert_eq!(titles(h.core.search_blogs("rust", None).unwrap()), ["More RUST", "Rust tips"]);
        assert_eq!(titles(h.core.search_blogs("bob", None).unwrap()), ["Cooking pasta"]);
        assert!(h.core.search_blogs("100%", None).unwrap().is_empty());
        assert_eq!(titles(h.core.blogs_by_author("bob").unwrap()), ["Cooking pasta"]);
    }

    #[test]
    fn comments_are_cleaned_and_notify_the_author() {
        let h = harness();
        h.user("alice");
        h.user("bob");
        let id = h.blog("alice", "A rather long blog title for quoting");

        let comment = h
            .core
            .add_comment("bob", id, &format!("<i>nice</i> {}", "!".repeat(600)))
            .unwrap();
        assert!(comment.text.starts_with("nice !"));
        assert_eq!(comment.text.chars().count(), MAX_COMMENT_CHARS);

        assert!(matches!(h.core.add_comment("bob", id, "<b>ok</b>"), Err(Error::Validation(_))));
        assert!(matches!(h.core.add_comment("bob", 9999, "hello"), Err(Error::NotFound(_))));

        h.clock.advance(Duration::seconds(1));
        h.core.add_comment("alice", id, "thanks!").unwrap();

        let texts: Vec<_> = h.core.comments(id).unwrap().into_iter().map(|c| c.username).collect();
        assert_eq!(texts, ["bob", "alice"]);

        let notes = h.core.list_notifications("alice", None).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationKind::Comment);
        assert_eq!(
            notes[0].message,
            "bob commented on your blog \"A rather long blog title for q...\""
        );
    }

    #[test]
    fn deleting_a_blog_keeps_notification_text() {
        let h = harness();
        h.user("alice");
        h.user("bob");
        let id = h.blog("alice", "Short lived");
        h.core.like("bob", id).unwrap();
        h.core.add_comment("bob", id, "first!").unwrap();

        h.core.delete_blog("alice", id).unwrap();
        assert!(matches!(h.core.comments(id), Err(Error::NotFound(_))));
        assert_eq!(h.core.likes_count(id).unwrap(), 0);

        let notes = h.core.list_notifications("alice", None).unwrap();
        assert_eq!(notes.len(), 2);
        assert!(notes.iter().all(|n| n.blog_id.is_none()));
        assert!(notes.iter().all(|n| n.message.contains("Short lived")));
    }
}
