use std::collections::HashMap;

use axum::extract::Multipart;

use crate::{
    error::{LibraryError, LibraryResult},
    images::UploadedImage,
};

pub const WORD_FIELD: &str = "word";
pub const DESCRIPTION_FIELD: &str = "description";
pub const IMAGE_FIELD: &str = "file";

/// Fields of the propose/edit word forms.
#[derive(Debug, Default)]
pub struct WordForm {
    pub word: String,
    pub description: String,
    pub image: Option<UploadedImage>,
}

impl WordForm {
    pub fn require_image(&mut self) -> LibraryResult<UploadedImage> {
        self.image
            .take()
            .ok_or_else(|| LibraryError::validation("an image file is required"))
    }
}

/// Read a multipart word form into memory. Browsers send an empty file part
/// when no file is chosen; that part is treated as "no image".
pub async fn read_word_form(mut multipart: Multipart) -> LibraryResult<WordForm> {
    let mut text_fields: HashMap<String, String> = HashMap::new();
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| LibraryError::validation(format!("failed to parse upload form: {err}")))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        let Some(file_name) = field.file_name().map(str::to_string) else {
            let value = field.text().await.map_err(|err| {
                LibraryError::validation(format!("failed to read field `{field_name}`: {err}"))
            })?;
            text_fields.insert(field_name, value);
            continue;
        };

        if field_name != IMAGE_FIELD {
            return Err(LibraryError::validation(format!(
                "unsupported file field `{field_name}`"
            )));
        }

        if image.is_some() {
            return Err(LibraryError::validation("only one image may be uploaded"));
        }

        let bytes = field.bytes().await.map_err(|err| {
            LibraryError::validation(format!("failed to read uploaded image: {err}"))
        })?;

        if file_name.is_empty() && bytes.is_empty() {
            continue;
        }

        image = Some(UploadedImage {
            original_name: file_name,
            bytes: bytes.to_vec(),
        });
    }

    Ok(WordForm {
        word: text_fields.remove(WORD_FIELD).unwrap_or_default(),
        description: text_fields.remove(DESCRIPTION_FIELD).unwrap_or_default(),
        image,
    })
}
