//! Filesystem storage for post images.

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use sha2::{Digest, Sha256};
use slug::slugify;
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};
use uuid::Uuid;

/// Errors from interacting with the upload storage backend.
#[derive(Debug, Error)]
pub enum UploadStorageError {
    #[error("invalid stored path")]
    InvalidPath,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("uploaded file is empty")]
    EmptyPayload,
    #[error("uploaded file exceeds the configured size limit")]
    PayloadTooLarge,
    #[error("uploaded file is not a recognized image")]
    NotAnImage,
}

/// Result of storing an image payload.
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub stored_path: String,
    pub checksum: String,
    pub size_bytes: i64,
}

/// Filesystem-backed image storage rooted at the configured directory.
#[derive(Debug)]
pub struct UploadStorage {
    root: PathBuf,
    max_bytes: u64,
}

impl UploadStorage {
    /// Initialise storage, creating the root directory if necessary.
    pub fn new(root: PathBuf, max_bytes: u64) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root, max_bytes })
    }

    /// Validate and persist an image payload, returning its stored path.
    ///
    /// The payload must decode as a raster image; anything else is rejected
    /// before touching the filesystem.
    pub async fn store_image(
        &self,
        original_name: &str,
        data: Bytes,
    ) -> Result<StoredImage, UploadStorageError> {
        if data.is_empty() {
            return Err(UploadStorageError::EmptyPayload);
        }
        if data.len() as u64 > self.max_bytes {
            return Err(UploadStorageError::PayloadTooLarge);
        }
        imagesize::blob_size(&data).map_err(|_| UploadStorageError::NotAnImage)?;

        let stored_path = build_stored_path(original_name);
        let absolute = self.resolve(&stored_path)?;

        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&absolute).await?;
        file.write_all(&data).await?;
        file.flush().await?;

        let mut hasher = Sha256::new();
        hasher.update(&data);
        let checksum = hex::encode(hasher.finalize());

        Ok(StoredImage {
            stored_path,
            checksum,
            size_bytes: data.len() as i64,
        })
    }

    /// Read a stored image back, along with a guessed content type.
    pub async fn load(&self, stored_path: &str) -> Result<(Bytes, String), UploadStorageError> {
        let absolute = self.resolve(stored_path)?;
        let data = fs::read(&absolute).await?;
        let content_type = mime_guess::from_path(stored_path)
            .first_or_octet_stream()
            .to_string();
        Ok((Bytes::from(data), content_type))
    }

    /// Resolve a stored path under the root, rejecting traversal components.
    fn resolve(&self, stored_path: &str) -> Result<PathBuf, UploadStorageError> {
        let relative = Path::new(stored_path);
        let traversal_free = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if stored_path.is_empty() || !traversal_free {
            return Err(UploadStorageError::InvalidPath);
        }
        Ok(self.root.join(relative))
    }
}

fn build_stored_path(original_name: &str) -> String {
    let path = Path::new(original_name);
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(slugify)
        .filter(|slug| !slug.is_empty())
        .unwrap_or_else(|| "image".to_string());
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "bin".to_string());

    let tag = &Uuid::new_v4().simple().to_string()[..12];
    format!("posts/{tag}-{stem}.{extension}")
}

#[cfg(test)]
mod tests {
    use super::*;

    // Smallest valid 1x1 PNG.
    const PNG_1X1: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
        0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x62, 0x00,
        0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
        0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    fn temp_storage() -> UploadStorage {
        let root = std::env::temp_dir().join(format!("piazza-uploads-{}", Uuid::new_v4().simple()));
        UploadStorage::new(root, 1024 * 1024).expect("storage root")
    }

    #[test]
    fn stored_paths_are_slugged_and_unique() {
        let first = build_stored_path("Holiday Photo.PNG");
        let second = build_stored_path("Holiday Photo.PNG");
        assert!(first.starts_with("posts/"));
        assert!(first.ends_with("-holiday-photo.png"));
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn image_round_trip() {
        let storage = temp_storage();
        let stored = storage
            .store_image("pixel.png", Bytes::from_static(PNG_1X1))
            .await
            .expect("stored image");

        let (data, content_type) = storage.load(&stored.stored_path).await.expect("loaded");
        assert_eq!(data, Bytes::from_static(PNG_1X1));
        assert_eq!(content_type, "image/png");
        assert_eq!(stored.size_bytes, PNG_1X1.len() as i64);
    }

    #[tokio::test]
    async fn non_image_payload_is_rejected() {
        let storage = temp_storage();
        let result = storage
            .store_image("notes.txt", Bytes::from_static(b"plain text"))
            .await;
        assert!(matches!(result, Err(UploadStorageError::NotAnImage)));
    }

    #[tokio::test]
    async fn oversized_payload_is_rejected() {
        let root = std::env::temp_dir().join(format!("piazza-uploads-{}", Uuid::new_v4().simple()));
        let storage = UploadStorage::new(root, 16).expect("storage root");
        let result = storage
            .store_image("pixel.png", Bytes::from_static(PNG_1X1))
            .await;
        assert!(matches!(result, Err(UploadStorageError::PayloadTooLarge)));
    }

    #[tokio::test]
    async fn traversal_paths_are_rejected() {
        let storage = temp_storage();
        let result = storage.load("../secrets.txt").await;
        assert!(matches!(result, Err(UploadStorageError::InvalidPath)));
    }
}
