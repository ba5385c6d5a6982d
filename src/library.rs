use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::{
    error::{LibraryError, LibraryResult},
    images::{ImageStore, UploadedImage},
    session::Viewer,
    store::{LibraryStore, NewWord, Word, WordQuery, WordStatus},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationDecision {
    Approve,
    Reject,
}

impl TryFrom<i32> for ModerationDecision {
    type Error = LibraryError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Approve),
            0 => Ok(Self::Reject),
            other => Err(LibraryError::validation(format!(
                "approve must be 0 or 1, got {other}"
            ))),
        }
    }
}

/// One page of words as shown to a viewer.
#[derive(Debug, Clone)]
pub struct Listing {
    pub status: WordStatus,
    pub items: Vec<Word>,
    pub page: u32,
    pub total_pages: u32,
    pub filter: Option<String>,
}

/// Owns the word lifecycle: pending proposals, approved entries, and deletion
/// together with the word's image.
#[derive(Clone)]
pub struct WordLibrary {
    store: Arc<dyn LibraryStore>,
    images: ImageStore,
    page_size: u32,
}

impl WordLibrary {
    pub fn new(store: Arc<dyn LibraryStore>, images: ImageStore, page_size: u32) -> Self {
        Self {
            store,
            images,
            page_size: page_size.max(1),
        }
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    /// Create a word. Administrators publish directly, everyone else queues a
    /// pending proposal.
    pub async fn propose(
        &self,
        viewer: &Viewer,
        word: &str,
        description: &str,
        image: UploadedImage,
    ) -> LibraryResult<Uuid> {
        let (word, description) = clean_text_fields(word, description)?;
        let status = if viewer.is_admin {
            WordStatus::Approved
        } else {
            WordStatus::Pending
        };

        let image_name = self
            .images
            .store(&image.bytes, &image.original_name)
            .await?;

        let draft = NewWord {
            word,
            description,
            image_name: image_name.clone(),
            status,
        };

        match self.store.create_word(draft).await {
            Ok(id) => {
                info!(%id, status = status.label(), "word proposed");
                Ok(id)
            }
            Err(err) => {
                self.discard_image(&image_name).await;
                Err(err)
            }
        }
    }

    pub async fn moderate(
        &self,
        viewer: &Viewer,
        id: Uuid,
        decision: ModerationDecision,
    ) -> LibraryResult<()> {
        viewer.require_admin()?;

        let word = self.fetch(id).await?;

        match decision {
            ModerationDecision::Approve => {
                if word.status != WordStatus::Pending {
                    return Err(LibraryError::validation("word is not awaiting moderation"));
                }
                if !self.store.set_word_status(id, WordStatus::Approved).await? {
                    return Err(LibraryError::word_not_found());
                }
                info!(%id, "word approved");
            }
            ModerationDecision::Reject => {
                self.delete_with_image(word).await?;
                info!(%id, "word rejected");
            }
        }

        Ok(())
    }

    /// Replace a word's text and optionally its image. A replacement image is
    /// written and referenced before the previous file is deleted.
    pub async fn edit(
        &self,
        viewer: &Viewer,
        id: Uuid,
        word: &str,
        description: &str,
        image: Option<UploadedImage>,
    ) -> LibraryResult<()> {
        viewer.require_admin()?;

        let (word, description) = clean_text_fields(word, description)?;
        let existing = self.fetch(id).await?;

        let Some(image) = image else {
            if !self.store.update_word(id, &word, &description, None).await? {
                return Err(LibraryError::word_not_found());
            }
            info!(%id, "word updated");
            return Ok(());
        };

        let new_image = self
            .images
            .store(&image.bytes, &image.original_name)
            .await?;

        let updated = match self
            .store
            .update_word(id, &word, &description, Some(&new_image))
            .await
        {
            Ok(updated) => updated,
            Err(err) => {
                self.discard_image(&new_image).await;
                return Err(err);
            }
        };

        if !updated {
            self.discard_image(&new_image).await;
            return Err(LibraryError::word_not_found());
        }

        // The record already points at the new file, so a leftover old file is
        // only logged.
        if existing.image_name != new_image {
            self.discard_image(&existing.image_name).await;
        }

        info!(%id, image_name = %new_image, "word updated with new image");
        Ok(())
    }

    pub async fn remove(&self, viewer: &Viewer, id: Uuid) -> LibraryResult<()> {
        viewer.require_admin()?;

        let word = self.fetch(id).await?;
        self.delete_with_image(word).await?;
        info!(%id, "word removed");
        Ok(())
    }

    pub async fn list(
        &self,
        viewer: &Viewer,
        status: WordStatus,
        page: u32,
        filter: Option<String>,
    ) -> LibraryResult<Listing> {
        if status == WordStatus::Pending {
            viewer.require_admin()?;
        }

        let query = WordQuery {
            status,
            page,
            page_size: self.page_size,
            filter,
        };
        let result = self.store.list_words(&query).await?;
        let total_pages = result.total.div_ceil(u64::from(self.page_size));

        Ok(Listing {
            status,
            items: result.items,
            page,
            total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
            filter: query.filter_text().map(str::to_string),
        })
    }

    pub async fn get(&self, id: Uuid) -> LibraryResult<Word> {
        self.fetch(id).await
    }

    async fn fetch(&self, id: Uuid) -> LibraryResult<Word> {
        self.store
            .get_word(id)
            .await?
            .ok_or_else(LibraryError::word_not_found)
    }

    async fn delete_with_image(&self, word: Word) -> LibraryResult<()> {
        if !self.store.delete_word(word.id).await? {
            return Err(LibraryError::word_not_found());
        }
        self.discard_image(&word.image_name).await;
        Ok(())
    }

    async fn discard_image(&self, image_name: &str) {
        if let Err(err) = self.images.remove(image_name).await {
            error!(?err, %image_name, "failed to discard orphaned image");
        }
    }
}

fn clean_text_fields(word: &str, description: &str) -> LibraryResult<(String, String)> {
    let word = word.trim();
    if word.is_empty() {
        return Err(LibraryError::validation("word must not be empty"));
    }

    let description = description.trim();
    if description.is_empty() {
        return Err(LibraryError::validation("description must not be empty"));
    }

    Ok((word.to_string(), description.to_string()))
}
