//! Storage gateway over the three persisted collections: words, admins and
//! sessions. Implementations carry no business rules; the lifecycle manager
//! and the session authenticator decide what each call means.

#[cfg(test)]
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{error::LibraryResult, session::verify_password};

pub use postgres::PgLibraryStore;

/// Moderation state persisted in the `approve` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[repr(i16)]
pub enum WordStatus {
    Pending = 0,
    Approved = 1,
}

impl WordStatus {
    pub fn label(self) -> &'static str {
        match self {
            WordStatus::Pending => "pending",
            WordStatus::Approved => "approved",
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Word {
    pub id: Uuid,
    pub word: String,
    pub description: String,
    pub image_name: String,
    #[sqlx(rename = "approve")]
    pub status: WordStatus,
    pub created_at: DateTime<Utc>,
}

impl Word {
    /// First sentence of the description, used for list previews.
    pub fn summary(&self) -> &str {
        self.description
            .split('.')
            .next()
            .unwrap_or_default()
            .trim()
    }
}

#[derive(Debug, Clone)]
pub struct NewWord {
    pub word: String,
    pub description: String,
    pub image_name: String,
    pub status: WordStatus,
}

/// Typed listing parameters consumed by [`LibraryStore::list_words`].
#[derive(Debug, Clone)]
pub struct WordQuery {
    pub status: WordStatus,
    pub page: u32,
    pub page_size: u32,
    pub filter: Option<String>,
}

impl WordQuery {
    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.page_size)
    }

    /// Filter text with surrounding whitespace removed; blank filters are ignored.
    pub fn filter_text(&self) -> Option<&str> {
        self.filter
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// One window of a listing plus the number of records matching the query overall.
#[derive(Debug, Clone, Default)]
pub struct WordPage {
    pub items: Vec<Word>,
    pub total: u64,
}

#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub token: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait LibraryStore: Send + Sync {
    async fn create_word(&self, draft: NewWord) -> LibraryResult<Uuid>;

    /// Replace the text fields, and the image reference when `image_name` is given.
    /// Returns `false` when no word has this id.
    async fn update_word(
        &self,
        id: Uuid,
        word: &str,
        description: &str,
        image_name: Option<&str>,
    ) -> LibraryResult<bool>;

    async fn set_word_status(&self, id: Uuid, status: WordStatus) -> LibraryResult<bool>;

    async fn delete_word(&self, id: Uuid) -> LibraryResult<bool>;

    async fn get_word(&self, id: Uuid) -> LibraryResult<Option<Word>>;

    async fn list_words(&self, query: &WordQuery) -> LibraryResult<WordPage>;

    /// Stored argon2 hash for an administrator, if the username exists.
    async fn admin_password_hash(&self, username: &str) -> LibraryResult<Option<String>>;

    async fn verify_credentials(&self, username: &str, password: &str) -> LibraryResult<bool> {
        Ok(self
            .admin_password_hash(username)
            .await?
            .is_some_and(|hash| verify_password(password, &hash)))
    }

    async fn create_session(&self, token: &str, created_at: DateTime<Utc>) -> LibraryResult<()>;

    async fn get_session(&self, token: &str) -> LibraryResult<Option<Session>>;

    /// Removing an unknown token is not an error.
    async fn delete_session(&self, token: &str) -> LibraryResult<()>;
}

/// Escape `%`, `_` and the escape character itself so user text is matched literally
/// inside an `ILIKE` pattern.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_quotes_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("cat"), "cat");
    }

    #[test]
    fn blank_filter_is_ignored() {
        let query = WordQuery {
            status: WordStatus::Approved,
            page: 2,
            page_size: 5,
            filter: Some("   ".to_string()),
        };
        assert_eq!(query.filter_text(), None);
        assert_eq!(query.offset(), 10);
    }

    #[test]
    fn summary_takes_first_sentence() {
        let word = Word {
            id: Uuid::new_v4(),
            word: "Cat".to_string(),
            description: "A small feline. Likes boxes.".to_string(),
            image_name: "abc.png".to_string(),
            status: WordStatus::Approved,
            created_at: Utc::now(),
        };
        assert_eq!(word.summary(), "A small feline");
    }
}
