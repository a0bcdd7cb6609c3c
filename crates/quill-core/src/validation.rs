//! Input rules shared by the services.

use std::sync::LazyLock;

use regex::Regex;
use validator::{Validate, ValidationError};

use crate::error::{Error, Result};

/// Characters that count towards the "special" class of a password.
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Floor for a new password set through a reset token, whatever the
/// configured minimum says.
pub const RESET_MIN_PASSWORD_LENGTH: usize = 8;

/// How many of the four character classes a password needs.
pub const REQUIRED_CHARACTER_CLASSES: usize = 3;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("static regex")
});

fn validate_username(username: &str) -> std::result::Result<(), ValidationError> {
    if username
        .chars()
        .any(|c| !(c.is_alphanumeric() || matches!(c, '_' | '-' | '.')))
    {
        return Err(ValidationError::new("charset")
            .with_message("may only contain letters, digits, '_', '-' and '.'".into()));
    }

    Ok(())
}

fn validate_email_shape(email: &str) -> std::result::Result<(), ValidationError> {
    if !EMAIL.is_match(email) {
        return Err(
            ValidationError::new("email").with_message("must look like name@domain.tld".into())
        );
    }

    Ok(())
}

#[derive(Debug, Validate)]
pub(crate) struct Registration {
    #[validate(
        length(min = 2, max = 32, message = "must be 2 to 32 characters"),
        custom(function = "validate_username")
    )]
    pub username: String,
    #[validate(custom(function = "validate_email_shape"))]
    pub email: String,
    #[validate(length(min = 1, max = 200, message = "is required"))]
    pub security_question: String,
    #[validate(length(min = 2, message = "must be at least 2 characters"))]
    pub security_answer: String,
}

#[derive(Debug, Validate)]
pub(crate) struct BlogDraft {
    #[validate(length(min = 3, max = 200, message = "must be 3 to 200 characters"))]
    pub title: String,
    #[validate(length(min = 10, max = 10000, message = "must be 10 to 10000 characters"))]
    pub content: String,
}

/// At least `min_length` characters and at least three of: upper case, lower
/// case, digit, special character.
pub fn check_password_strength(password: &str, min_length: usize) -> Result<()> {
    if password.chars().count() < min_length {
        return Err(Error::WeakPassword("password is too short"));
    }

    let classes = [
        password.chars().any(|c| c.is_uppercase()),
        password.chars().any(|c| c.is_lowercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)),
    ];

    if classes.iter().filter(|present| **present).count() < REQUIRED_CHARACTER_CLASSES {
        return Err(Error::WeakPassword(
            "password must contain at least 3 of: uppercase, lowercase, number, special character",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(username: &str, email: &str) -> Registration {
        Registration {
            username: username.into(),
            email: email.into(),
            security_question: "first pet?".into(),
            security_answer: "rex".into(),
        }
    }

    #[test]
    fn password_needs_three_classes() {
        assert!(check_password_strength("Abcd1234!", 8).is_ok());
        assert!(check_password_strength("Abcdefg1", 8).is_ok());
        assert!(matches!(check_password_strength("abcdefgh", 8), Err(Error::WeakPassword(_))));
        assert!(matches!(check_password_strength("ABCDEFG1", 8), Err(Error::WeakPassword(_))));
    }

    #[test]
    fn password_length_counts_characters() {
        assert!(check_password_strength("Ab1!", 8).is_err());
        assert!(check_password_strength("Ab1!", 4).is_ok());
    }

    #[test]
    fn email_needs_a_domain_with_tld() {
        assert!(registration("alice", "alice@example.com").validate().is_ok());
        assert!(registration("alice", "alice@localhost").validate().is_err());
        assert!(registration("alice", "alice.example.com").validate().is_err());
    }

    #[test]
    fn username_rules() {
        assert!(registration("a", "a@b.io").validate().is_err());
        assert!(registration("al", "a@b.io").validate().is_ok());
        assert!(registration("al ice", "a@b.io").validate().is_err());
        assert!(registration("al_ice-2", "a@b.io").validate().is_ok());
        assert!(registration("john.doe", "a@b.io").validate().is_ok());
        assert!(registration("al/ice", "a@b.io").validate().is_err());
    }

    #[test]
    fn blog_bounds() {
        let ok = BlogDraft { title: "abc".into(), content: "0123456789".into() };
        assert!(ok.validate().is_ok());
        let short = BlogDraft { title: "ab".into(), content: "0123456789".into() };
        assert!(short.validate().is_err());
        let long = BlogDraft { title: "abc".into(), content: "x".repeat(10_001) };
        assert!(long.validate().is_err());
    }
}
