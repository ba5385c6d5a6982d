use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    error::LibraryResult,
    session::hash_password,
    store::{LibraryStore, NewWord, Session, Word, WordPage, WordQuery, WordStatus, escape_like},
};

const WORD_COLUMNS: &str = "id, word, description, image_name, approve, created_at";

/// Postgres-backed gateway. Cloning shares the underlying pool.
#[derive(Clone)]
pub struct PgLibraryStore {
    pool: PgPool,
}

impl PgLibraryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert an administrator when none exist yet. Returns whether a row was written.
    pub async fn ensure_seed_admin(&self, username: &str, password: &str) -> anyhow::Result<bool> {
        let has_admin: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM admins)")
            .fetch_one(&self.pool)
            .await?;

        if has_admin {
            return Ok(false);
        }

        let password_hash = hash_password(password)
            .map_err(|err| anyhow::anyhow!("failed to hash seed admin password: {err}"))?;

        sqlx::query("INSERT INTO admins (username, password_hash) VALUES ($1, $2)")
            .bind(username)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        info!(%username, "seeded administrator account");
        Ok(true)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl LibraryStore for PgLibraryStore {
    async fn create_word(&self, draft: NewWord) -> LibraryResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO words (id, word, description, image_name, approve) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(&draft.word)
        .bind(&draft.description)
        .bind(&draft.image_name)
        .bind(draft.status)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn update_word(
        &self,
        id: Uuid,
        word: &str,
        description: &str,
        image_name: Option<&str>,
    ) -> LibraryResult<bool> {
        let result = sqlx::query(
            "UPDATE words SET word = $2, description = $3, image_name = COALESCE($4, image_name)
             WHERE id = $1",
        )
        .bind(id)
        .bind(word)
        .bind(description)
        .bind(image_name)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_word_status(&self, id: Uuid, status: WordStatus) -> LibraryResult<bool> {
        let result = sqlx::query("UPDATE words SET approve = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_word(&self, id: Uuid) -> LibraryResult<bool> {
        let result = sqlx::query("DELETE FROM words WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_word(&self, id: Uuid) -> LibraryResult<Option<Word>> {
        let word = sqlx::query_as::<_, Word>(&format!(
            "SELECT {WORD_COLUMNS} FROM words WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(word)
    }

    async fn list_words(&self, query: &WordQuery) -> LibraryResult<WordPage> {
        let pattern = query.filter_text().map(escape_like);

        // Count and window are read in one transaction so the page count
        // matches the rows returned.
        let mut tx = self.pool.begin().await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM words
             WHERE approve = $1 AND ($2::TEXT IS NULL OR word ILIKE '%' || $2 || '%')",
        )
        .bind(query.status)
        .bind(pattern.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        let items = sqlx::query_as::<_, Word>(&format!(
            "SELECT {WORD_COLUMNS} FROM words
             WHERE approve = $1 AND ($2::TEXT IS NULL OR word ILIKE '%' || $2 || '%')
             ORDER BY word COLLATE \"C\", id
             LIMIT $3 OFFSET $4"
        ))
        .bind(query.status)
        .bind(pattern.as_deref())
        .bind(i64::from(query.page_size))
        .bind(query.offset())
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            status = query.status.label(),
            page = query.page,
            total,
            returned = items.len(),
            "listed words"
        );

        Ok(WordPage {
            items,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn admin_password_hash(&self, username: &str) -> LibraryResult<Option<String>> {
        let hash: Option<String> = sqlx::query_scalar("SELECT password_hash FROM admins WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(hash)
    }

    async fn create_session(&self, token: &str, created_at: DateTime<Utc>) -> LibraryResult<()> {
        sqlx::query("INSERT INTO sessions (token, created_at) VALUES ($1, $2)")
            .bind(token)
            .bind(created_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_session(&self, token: &str) -> LibraryResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT token, created_at FROM sessions WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn delete_session(&self, token: &str) -> LibraryResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
