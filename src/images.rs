//! Image naming and on-disk storage for word pictures.
//!
//! Stored names are `hex(sha256(salt || bytes)).ext` with a fresh random salt
//! per upload, so identical uploads never share a file and deleting one word's
//! image can never break another word. Files live in one flat directory.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use mime::Mime;
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::{LibraryError, LibraryResult};

pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];
const SALT_BYTES: usize = 32;

/// An image received from a form, not yet written to storage.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub original_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn ensure_root(&self) -> LibraryResult<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Write the image under its content name and return that name. The file is
    /// fully written before this returns.
    pub async fn store(&self, bytes: &[u8], original_filename: &str) -> LibraryResult<String> {
        if bytes.is_empty() {
            return Err(LibraryError::validation("image file is empty"));
        }

        let extension = image_extension(original_filename)?;
        let image_name = format!("{}.{}", salted_digest(bytes), extension);

        self.ensure_root().await?;
        tokio::fs::write(self.root.join(&image_name), bytes).await?;

        info!(%image_name, size = bytes.len(), "stored image");
        Ok(image_name)
    }

    /// Delete an image. Missing files and unsafe names are ignored.
    pub async fn remove(&self, image_name: &str) -> LibraryResult<()> {
        if !validate_name(image_name) {
            warn!(%image_name, "refusing to remove image with unsafe name");
            return Ok(());
        }

        match tokio::fs::remove_file(self.root.join(image_name)).await {
            Ok(()) => {
                info!(%image_name, "removed image");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    #[cfg(test)]
    pub async fn exists(&self, image_name: &str) -> bool {
        validate_name(image_name)
            && tokio::fs::try_exists(self.root.join(image_name))
                .await
                .unwrap_or(false)
    }

    /// Load a stored image for serving. The name is validated before it touches
    /// the filesystem.
    pub async fn read(&self, image_name: &str) -> LibraryResult<(Vec<u8>, Mime)> {
        if !validate_name(image_name) {
            return Err(LibraryError::validation("invalid image name"));
        }

        let bytes = match tokio::fs::read(self.root.join(image_name)).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(LibraryError::NotFound { entity: "image" });
            }
            Err(err) => return Err(err.into()),
        };

        let extension = image_name.rsplit('.').next().unwrap_or_default();
        Ok((bytes, content_type_for(extension)))
    }
}

/// Accepts only `base.ext` where both parts are non-empty ASCII alphanumerics.
/// Names with more than one dot (`a.b.c`) are rejected outright.
pub fn validate_name(image_name: &str) -> bool {
    let Some((base, extension)) = image_name.split_once('.') else {
        return false;
    };

    !base.is_empty()
        && !extension.is_empty()
        && base.chars().all(|c| c.is_ascii_alphanumeric())
        && extension.chars().all(|c| c.is_ascii_alphanumeric())
}

fn image_extension(original_filename: &str) -> LibraryResult<String> {
    let sanitized = sanitize_filename::sanitize(original_filename);
    let extension = Path::new(&sanitized)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    if extension.is_empty() {
        return Err(LibraryError::validation("image file has no extension"));
    }

    if !ALLOWED_IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return Err(LibraryError::validation(format!(
            "unsupported image type `{extension}`"
        )));
    }

    Ok(extension)
}

fn salted_digest(bytes: &[u8]) -> String {
    let mut salt = [0u8; SALT_BYTES];
    OsRng.fill_bytes(&mut salt);

    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn content_type_for(extension: &str) -> Mime {
    match extension.to_ascii_lowercase().as_str() {
        "png" => mime::IMAGE_PNG,
        "jpg" | "jpeg" => mime::IMAGE_JPEG,
        "gif" => mime::IMAGE_GIF,
        "bmp" => mime::IMAGE_BMP,
        "webp" => "image/webp"
            .parse()
            .unwrap_or(mime::APPLICATION_OCTET_STREAM),
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn validate_name_accepts_plain_names() {
        assert!(validate_name("abc123.png"));
        assert!(validate_name("ABC.JPG"));
    }

    #[test]
    fn validate_name_rejects_traversal_and_ambiguity() {
        assert!(!validate_name("../../etc/passwd"));
        assert!(!validate_name("a.b.c"));
        assert!(!validate_name("noextension"));
        assert!(!validate_name(".png"));
        assert!(!validate_name("abc."));
        assert!(!validate_name("abc/def.png"));
        assert!(!validate_name("abc%2F.png"));
        assert!(!validate_name(""));
    }

    #[test]
    fn extension_is_lowercased_and_checked() {
        assert_eq!(image_extension("Photo.final.PNG").expect("png"), "png");
        assert!(image_extension("script.sh").is_err());
        assert!(image_extension("README").is_err());
    }

    #[tokio::test]
    async fn identical_uploads_get_distinct_names() {
        let dir = tempdir().expect("temp dir");
        let images = ImageStore::new(dir.path());

        let first = images.store(b"pixels", "cat.png").await.expect("store");
        let second = images.store(b"pixels", "cat.png").await.expect("store");

        assert_ne!(first, second);
        assert!(validate_name(&first));
        assert!(first.ends_with(".png"));
        assert_eq!(first.len(), 64 + ".png".len());
        assert!(images.exists(&first).await);
        assert!(images.exists(&second).await);
    }

    #[tokio::test]
    async fn store_rejects_empty_and_unsupported_uploads() {
        let dir = tempdir().expect("temp dir");
        let images = ImageStore::new(dir.path());

        assert!(matches!(
            images.store(b"", "cat.png").await,
            Err(LibraryError::ValidationFailed(_))
        ));
        assert!(matches!(
            images.store(b"data", "cat.exe").await,
            Err(LibraryError::ValidationFailed(_))
        ));
    }

    #[tokio::test]
    async fn read_and_remove_stored_image() {
        let dir = tempdir().expect("temp dir");
        let images = ImageStore::new(dir.path().join("nested"));

        let name = images.store(b"gif89a", "anim.GIF").await.expect("store");
        let (bytes, content_type) = images.read(&name).await.expect("read");
        assert_eq!(bytes, b"gif89a");
        assert_eq!(content_type, mime::IMAGE_GIF);

        images.remove(&name).await.expect("remove");
        assert!(!images.exists(&name).await);
        images.remove(&name).await.expect("removing twice is a no-op");

        assert!(matches!(
            images.read(&name).await,
            Err(LibraryError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn read_rejects_unsafe_names() {
        let dir = tempdir().expect("temp dir");
        let images = ImageStore::new(dir.path());

        assert!(matches!(
            images.read("../../etc/passwd").await,
            Err(LibraryError::ValidationFailed(_))
        ));
    }
}
