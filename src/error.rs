use thiserror::Error;

pub type LibraryResult<T> = Result<T, LibraryError>;

/// Failure taxonomy shared by the storage gateway, the session authenticator
/// and the word lifecycle manager. The web layer maps each variant to a status code.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("administrator session required")]
    Unauthorized,

    #[error("invalid username or password")]
    AuthFailed,

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] sqlx::Error),

    #[error("image storage failure: {0}")]
    Io(#[from] std::io::Error),
}

impl LibraryError {
    pub fn word_not_found() -> Self {
        Self::NotFound { entity: "word" }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed(message.into())
    }
}
