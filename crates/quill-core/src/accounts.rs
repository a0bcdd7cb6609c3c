//! Identity and credentials: registration, login, the security-question
//! fallback and the password-reset token lifecycle.

use quill_db::models::NewUser;
use quill_types::models::{Profile, Session, User};
use tracing::{debug, info};
use validator::Validate;

use crate::content::ImageUpload;
use crate::credentials::{hash_token, new_reset_token, normalize_answer};
use crate::error::{Error, Result};
use crate::sanitize::{clean, strip_tags};
use crate::validation::{RESET_MIN_PASSWORD_LENGTH, Registration, check_password_strength};
use crate::{Core, records};

pub const DEFAULT_CHANNEL: &str = "general";
pub const MAX_BIO_CHARS: usize = 500;
const MAX_CHANNEL_CHARS: usize = 50;

impl Core {
    pub fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        channel: &str,
        security_question: &str,
        security_answer: &str,
    ) -> Result<User> {
        let form = Registration {
            username: username.trim().to_string(),
            email: email.trim().to_string(),
            security_question: strip_tags(security_question),
            security_answer: normalize_answer(security_answer),
        };
        form.validate()?;
        check_password_strength(password, self.config.min_password_length)?;

        let channel = match clean(channel, MAX_CHANNEL_CHARS) {
            c if c.is_empty() => DEFAULT_CHANNEL.to_string(),
            c => c,
        };
        let password_hash = self.hasher.hash(password)?;
        let answer_hash = self.hasher.hash(&form.security_answer)?;
        let now = self.now();

        let id = self
            .db
            .create_user(&NewUser {
                username: &form.username,
                email: Some(&form.email),
                password_hash: Some(&password_hash),
                channel: &channel,
                security_question: &form.security_question,
                security_answer_hash: Some(&answer_hash),
                created_at: now,
            })?
            .ok_or(Error::UsernameTaken)?;

        info!("Registered user {} (id {})", form.username, id);

        Ok(User {
            id,
            username: form.username,
            email: Some(form.email),
            channel,
            bio: String::new(),
            profile_pic: None,
            created_at: now,
        })
    }

    /// Unknown user and wrong password produce the same error.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Session> {
        let Some(user) = self.db.get_user(username.trim())? else {
            debug!("Login attempt for unknown user {username}");
            return Err(Error::InvalidCredentials);
        };

        let Some(stored) = user.password_hash.as_deref() else {
            debug!("Login attempt for {} which has no password set", user.username);
            return Err(Error::InvalidCredentials);
        };

        if !self.hasher.verify(password, stored) {
            debug!("Wrong password for {}", user.username);
            return Err(Error::InvalidCredentials);
        }

        Ok(Session {
            username: user.username,
            channel: user.channel,
            authenticated_at: self.now(),
        })
    }

    pub fn get_user(&self, username: &str) -> Result<User> {
        let row = self.db.get_user(username)?.ok_or(Error::NotFound("user"))?;
        Ok(records::user(row))
    }

    pub fn profile(&self, username: &str) -> Result<Profile> {
        let user = self.get_user(username)?;

        Ok(Profile {
            followers_count: self.db.count_followers(&user.username)?,
            following_count: self.db.count_following(&user.username)?,
            posts_count: self.db.count_posts(&user.username)?,
            username: user.username,
            channel: user.channel,
            bio: user.bio,
            profile_pic: user.profile_pic,
            created_at: user.created_at,
        })
    }

    /// Returns the bio as stored.
    pub fn update_bio(&self, username: &str, bio: &str) -> Result<String> {
        let bio = clean(bio, MAX_BIO_CHARS);
        if !self.db.update_bio(username, &bio)? {
            return Err(Error::NotFound("user"));
        }
        Ok(bio)
    }

    /// Stores the picture and returns its reference.
    pub fn set_profile_picture(&self, username: &str, upload: &ImageUpload) -> Result<String> {
        let extension = self.check_image(upload)?;
        if !self.db.user_exists(username)? {
            return Err(Error::NotFound("user"));
        }

        let reference = self.files.put(&upload.bytes, &extension)?;
        if let Err(e) = self.db.update_profile_pic(username, &reference) {
            self.discard_uploads(std::slice::from_ref(&reference));
            return Err(e.into());
        }
        Ok(reference)
    }

    // -- Security question --

    pub fn security_question(&self, username: &str) -> Result<Option<String>> {
        Ok(self
            .db
            .get_user(username.trim())?
            .map(|user| user.security_question)
            .filter(|question| !question.is_empty()))
    }

    pub fn verify_security_answer(&self, username: &str, answer: &str) -> Result<bool> {
        let Some(user) = self.db.get_user(username.trim())? else {
            return Ok(false);
        };
        let Some(stored) = user.security_answer_hash.as_deref() else {
            return Ok(false);
        };

        Ok(self.hasher.verify(&normalize_answer(answer), stored))
    }

    /// A correct answer earns a reset token, exactly like the e-mail path.
    pub fn recover_with_security_answer(&self, username: &str, answer: &str) -> Result<String> {
        if !self.verify_security_answer(username, answer)? {
            debug!("Wrong security answer for {username}");
            return Err(Error::InvalidCredentials);
        }
        self.issue_reset_token(username.trim())
    }

    // -- Reset tokens --

    /// Issues a token only when the e-mail on file matches (ignoring case).
    pub fn request_password_reset(&self, username: &str, email: &str) -> Result<String> {
        let matches = self
            .db
            .get_user(username.trim())?
            .and_then(|user| user.email)
            .is_some_and(|stored| stored.eq_ignore_ascii_case(email.trim()));

        if !matches {
            return Err(Error::NotFound("account"));
        }
        self.issue_reset_token(username.trim())
    }

    /// Retires every outstanding token of the user and returns a fresh one.
    /// Only its hash is kept.
    pub fn issue_reset_token(&self, username: &str) -> Result<String> {
        if !self.db.user_exists(username)? {
            return Err(Error::NotFound("user"));
        }

        let token = new_reset_token();
        let now = self.now();
        self.db.issue_reset_token(
            username,
            &hash_token(&token),
            now,
            now + self.config.reset_token_ttl,
        )?;

        info!("Issued password reset token for {username}");
        Ok(token)
    }

    pub fn verify_reset_token(&self, token: &str) -> Result<Option<String>> {
        Ok(self.db.find_valid_reset_token(&hash_token(token), self.now())?)
    }

    /// At most one caller ever gets `Some` for a given token.
    pub fn consume_reset_token(&self, token: &str) -> Result<Option<String>> {
        Ok(self.db.consume_reset_token(&hash_token(token), self.now())?)
    }

    /// Checks strength first, then swaps the hash and burns the token in one
    /// transaction. Returns the user whose password changed.
    pub fn reset_password(&self, token: &str, new_password: &str) -> Result<String> {
        let min_length = self.config.min_password_length.max(RESET_MIN_PASSWORD_LENGTH);
        check_password_strength(new_password, min_length)?;

        let password_hash = self.hasher.hash(new_password)?;
        let username = self
            .db
            .reset_password_with_token(&hash_token(token), &password_hash, self.now())?
            .ok_or(Error::InvalidToken)?;

        info!("Password reset for {username}");
        Ok(username)
    }
}
