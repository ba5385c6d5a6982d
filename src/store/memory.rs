use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{LibraryError, LibraryResult},
    session::hash_password,
    store::{LibraryStore, NewWord, Session, Word, WordPage, WordQuery, WordStatus},
};

/// In-process gateway used by the test suite.
#[derive(Default)]
pub struct MemoryStore {
    words: RwLock<HashMap<Uuid, Word>>,
    admins: RwLock<HashMap<String, String>>,
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_admin(username: &str, password: &str) -> Self {
        let store = Self::new();
        let hash = hash_password(password).expect("hash test password");
        store
            .admins
            .try_write()
            .expect("fresh store is unlocked")
            .insert(username.to_string(), hash);
        store
    }

    pub async fn word_count(&self) -> usize {
        self.words.read().await.len()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl LibraryStore for MemoryStore {
    async fn create_word(&self, draft: NewWord) -> LibraryResult<Uuid> {
        let id = Uuid::new_v4();
        let word = Word {
            id,
            word: draft.word,
            description: draft.description,
            image_name: draft.image_name,
            status: draft.status,
            created_at: Utc::now(),
        };
        self.words.write().await.insert(id, word);
        Ok(id)
    }

    async fn update_word(
        &self,
        id: Uuid,
        word: &str,
        description: &str,
        image_name: Option<&str>,
    ) -> LibraryResult<bool> {
        let mut words = self.words.write().await;
        let Some(existing) = words.get_mut(&id) else {
            return Ok(false);
        };
        existing.word = word.to_string();
        existing.description = description.to_string();
        if let Some(image_name) = image_name {
            existing.image_name = image_name.to_string();
        }
        Ok(true)
    }

    async fn set_word_status(&self, id: Uuid, status: WordStatus) -> LibraryResult<bool> {
        let mut words = self.words.write().await;
        Ok(words
            .get_mut(&id)
            .map(|word| word.status = status)
            .is_some())
    }

    async fn delete_word(&self, id: Uuid) -> LibraryResult<bool> {
        Ok(self.words.write().await.remove(&id).is_some())
    }

    async fn get_word(&self, id: Uuid) -> LibraryResult<Option<Word>> {
        Ok(self.words.read().await.get(&id).cloned())
    }

    async fn list_words(&self, query: &WordQuery) -> LibraryResult<WordPage> {
        let needle = query.filter_text().map(str::to_lowercase);
        let words = self.words.read().await;

        let mut matching: Vec<&Word> = words
            .values()
            .filter(|word| word.status == query.status)
            .filter(|word| {
                needle
                    .as_deref()
                    .is_none_or(|needle| word.word.to_lowercase().contains(needle))
            })
            .collect();
        matching.sort_by(|a, b| a.word.cmp(&b.word).then(a.id.cmp(&b.id)));

        let total = matching.len() as u64;
        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let items = matching
            .into_iter()
            .skip(offset)
            .take(query.page_size as usize)
            .cloned()
            .collect();

        Ok(WordPage { items, total })
    }

    async fn admin_password_hash(&self, username: &str) -> LibraryResult<Option<String>> {
        Ok(self.admins.read().await.get(username).cloned())
    }

    async fn create_session(&self, token: &str, created_at: DateTime<Utc>) -> LibraryResult<()> {
        self.sessions.write().await.insert(
            token.to_string(),
            Session {
                token: token.to_string(),
                created_at,
            },
        );
        Ok(())
    }

    async fn get_session(&self, token: &str) -> LibraryResult<Option<Session>> {
        Ok(self.sessions.read().await.get(token).cloned())
    }

    async fn delete_session(&self, token: &str) -> LibraryResult<()> {
        self.sessions.write().await.remove(token);
        Ok(())
    }
}

/// Gateway operations that [`FaultyStore`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    CreateWord,
    UpdateWord,
    DeleteWord,
    ListWords,
    DeleteSession,
}

/// Wraps a [`MemoryStore`] and answers the armed operations with a storage fault.
#[derive(Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    faults: Mutex<HashSet<Fault>>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, fault: Fault) {
        self.faults.lock().expect("fault set").insert(fault);
    }

    fn check(&self, fault: Fault) -> LibraryResult<()> {
        if self.faults.lock().expect("fault set").contains(&fault) {
            return Err(LibraryError::StorageUnavailable(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl LibraryStore for FaultyStore {
    async fn create_word(&self, draft: NewWord) -> LibraryResult<Uuid> {
        self.check(Fault::CreateWord)?;
        self.inner.create_word(draft).await
    }

    async fn update_word(
        &self,
        id: Uuid,
        word: &str,
        description: &str,
        image_name: Option<&str>,
    ) -> LibraryResult<bool> {
        self.check(Fault::UpdateWord)?;
        self.inner
            .update_word(id, word, description, image_name)
            .await
    }

    async fn set_word_status(&self, id: Uuid, status: WordStatus) -> LibraryResult<bool> {
        self.inner.set_word_status(id, status).await
    }

    async fn delete_word(&self, id: Uuid) -> LibraryResult<bool> {
        self.check(Fault::DeleteWord)?;
        self.inner.delete_word(id).await
    }

    async fn get_word(&self, id: Uuid) -> LibraryResult<Option<Word>> {
        self.inner.get_word(id).await
    }

    async fn list_words(&self, query: &WordQuery) -> LibraryResult<WordPage> {
        self.check(Fault::ListWords)?;
        self.inner.list_words(query).await
    }

    async fn admin_password_hash(&self, username: &str) -> LibraryResult<Option<String>> {
        self.inner.admin_password_hash(username).await
    }

    async fn create_session(&self, token: &str, created_at: DateTime<Utc>) -> LibraryResult<()> {
        self.inner.create_session(token, created_at).await
    }

    async fn get_session(&self, token: &str) -> LibraryResult<Option<Session>> {
        self.inner.get_session(token).await
    }

    async fn delete_session(&self, token: &str) -> LibraryResult<()> {
        self.check(Fault::DeleteSession)?;
        self.inner.delete_session(token).await
    }
}
