//! Follow and like relations. Counts are always read off the relation rows.

use quill_types::models::NotificationKind;

use crate::Core;
use crate::error::{Error, Result};

impl Core {
    pub fn follow(&self, follower: &str, target: &str) -> Result<()> {
        if follower == target {
            return Err(Error::SelfFollow);
        }
        if !self.db.user_exists(target)? {
            return Err(Error::NotFound("user"));
        }
        if !self.db.insert_follow(follower, target, self.now())? {
            return Err(Error::AlreadyFollowing);
        }

        self.notify_best_effort(target, follower, NotificationKind::Follow, None);
        Ok(())
    }

    /// Succeeds whether or not the follow existed.
    pub fn unfollow(&self, follower: &str, target: &str) -> Result<()> {
        self.db.delete_follow(follower, target)?;
        Ok(())
    }

    pub fn is_following(&self, follower: &str, target: &str) -> Result<bool> {
        Ok(self.db.is_following(follower, target)?)
    }

    pub fn followers_count(&self, username: &str) -> Result<u64> {
        Ok(self.db.count_followers(username)?)
    }

    pub fn following_count(&self, username: &str) -> Result<u64> {
        Ok(self.db.count_following(username)?)
    }

    pub fn like(&self, username: &str, blog_id: i64) -> Result<()> {
        let blog = self.db.get_blog(blog_id)?.ok_or(Error::NotFound("blog"))?;
        if !self.db.insert_like(blog_id, username, self.now())? {
            return Err(Error::AlreadyLiked);
        }

        self.notify_best_effort(
            &blog.author_username,
            username,
            NotificationKind::Like,
            Some((blog.id, &blog.title)),
        );
        Ok(())
    }

    /// Succeeds whether or not the like existed.
    pub fn unlike(&self, username: &str, blog_id: i64) -> Result<()> {
        self.db.delete_like(blog_id, username)?;
        Ok(())
    }

    /// Flip the like state. Returns the new state and the resulting count.
    pub fn toggle_like(&self, username: &str, blog_id: i64) -> Result<(bool, u64)> {
        let liked = if self.db.is_liked(blog_id, username)? {
            self.unlike(username, blog_id)?;
            false
        } else {
            match self.like(username, blog_id) {
                // Lost a race with a concurrent like from the same user.
                Ok(()) | Err(Error::AlreadyLiked) => true,
                Err(e) => return Err(e),
            }
        };

        Ok((liked, self.likes_count(blog_id)?))
    }

    pub fn is_liked(&self, username: &str, blog_id: i64) -> Result<bool> {
        Ok(self.db.is_liked(blog_id, username)?)
    }

    pub fn likes_count(&self, blog_id: i64) -> Result<u64> {
        Ok(self.db.count_likes(blog_id)?)
    }
}
