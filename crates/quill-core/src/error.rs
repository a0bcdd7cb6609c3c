use validator::{ValidationError, ValidationErrors};

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the core can report.
///
/// The `Display` text is safe to show to the requester for every variant
/// except [`Error::Storage`], whose inner error is for logs only.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("{0}")]
    WeakPassword(&'static str),
    #[error("username already taken")]
    UsernameTaken,
    #[error("already following this user")]
    AlreadyFollowing,
    #[error("blog already liked")]
    AlreadyLiked,
    #[error("cannot follow yourself")]
    SelfFollow,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("not allowed to modify this resource")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    /// Unknown, expired and already-used tokens all land here on purpose.
    #[error("invalid or expired reset token")]
    InvalidToken,
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Coarse categories callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Duplicate,
    Authentication,
    Authorization,
    NotFound,
    Token,
    Storage,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(..) | Self::WeakPassword(..) | Self::SelfFollow => {
                ErrorKind::Validation
            }
            Self::UsernameTaken | Self::AlreadyFollowing | Self::AlreadyLiked => {
                ErrorKind::Duplicate
            }
            Self::InvalidCredentials => ErrorKind::Authentication,
            Self::Forbidden => ErrorKind::Authorization,
            Self::NotFound(..) => ErrorKind::NotFound,
            Self::InvalidToken => ErrorKind::Token,
            Self::Storage(..) => ErrorKind::Storage,
        }
    }

    /// Single-field validation failure.
    pub fn invalid(field: &'static str, code: &'static str) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, ValidationError::new(code));
        Self::Validation(errors)
    }

    /// Human-readable messages, one per failed rule.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Validation(errors) => errors
                .field_errors()
                .into_iter()
                .flat_map(|(field, errors)| {
                    errors.iter().map(move |error| match &error.message {
                        Some(message) => format!("{field}: {message}"),
                        None => format!("{field}: {}", error.code),
                    })
                })
                .collect(),
            Self::Storage(..) => Vec::new(),
            other => vec![other.to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_details_never_reach_messages() {
        let err = Error::Storage(anyhow::anyhow!("disk on fire at /var/lib/quill"));
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(err.messages().is_empty());
    }

    #[test]
    fn validation_messages_name_the_field() {
        let err = Error::invalid("title", "length");
        assert_eq!(err.messages(), vec!["title: length".to_string()]);
    }
}
