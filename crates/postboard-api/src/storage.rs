//! Image storage for post attachments
//!
//! Uploads are written below `<image_dir>/images/` and referenced by the
//! relative path `images/<uuid>-<name>`, which is also the URL path they are
//! served from.
//!
//! Author: hephaex@gmail.com

use async_trait::async_trait;
use axum::body::Bytes;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Content types accepted as post images
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/png", "image/jpg", "image/jpeg"];

/// Directory (relative to the image root) holding uploaded files
pub const IMAGE_SUBDIR: &str = "images";

/// Image storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("Image storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// An uploaded image as received from the client
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Whether a content type is accepted as a post image
pub fn is_allowed_image(content_type: &str) -> bool {
    ALLOWED_IMAGE_TYPES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(content_type))
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist an upload and return its relative path
    async fn save(&self, upload: ImageUpload) -> Result<String, StorageError>;

    /// Remove a previously saved image; failures are logged, never returned
    async fn remove(&self, image_path: &str);
}

/// Stores images on the local filesystem
pub struct LocalImageStore {
    root: PathBuf,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory served under `/images`
    pub fn public_dir(&self) -> PathBuf {
        self.root.join(IMAGE_SUBDIR)
    }

    /// Resolve a stored relative path, refusing anything that could leave the root
    fn resolve(&self, image_path: &str) -> Option<PathBuf> {
        let relative = Path::new(image_path);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));

        if safe && relative.starts_with(IMAGE_SUBDIR) {
            Some(self.root.join(relative))
        } else {
            None
        }
    }
}

/// Keep only characters that are safe in a file name
fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn save(&self, upload: ImageUpload) -> Result<String, StorageError> {
        if !is_allowed_image(&upload.content_type) {
            return Err(StorageError::UnsupportedType(upload.content_type));
        }

        let file_name = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(&upload.file_name));
        let dir = self.public_dir();
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&file_name), &upload.bytes).await?;

        tracing::debug!(file = %file_name, size = upload.bytes.len(), "Image stored");
        Ok(format!("{IMAGE_SUBDIR}/{file_name}"))
    }

    async fn remove(&self, image_path: &str) {
        let Some(path) = self.resolve(image_path) else {
            tracing::warn!(path = %image_path, "Refusing to remove image outside the image directory");
            return;
        };

        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!(path = %image_path, error = %e, "Failed to remove image");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn upload(name: &str, content_type: &str) -> ImageUpload {
        ImageUpload {
            file_name: name.to_string(),
            content_type: content_type.to_string(),
            bytes: Bytes::from_static(b"\x89PNG fake image"),
        }
    }

    #[test]
    fn test_allowed_image_types() {
        assert!(is_allowed_image("image/png"));
        assert!(is_allowed_image("image/jpg"));
        assert!(is_allowed_image("IMAGE/JPEG"));
        assert!(!is_allowed_image("image/gif"));
        assert!(!is_allowed_image("application/pdf"));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("photo.png"), "photo.png");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("my photo.jpg"), "my_photo.jpg");
        assert_eq!(sanitize_file_name(".."), "upload");
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let dir = TempDir::new().unwrap();
        let store = LocalImageStore::new(dir.path());

        let path = store.save(upload("cat.png", "image/png")).await.unwrap();
        assert!(path.starts_with("images/"));
        assert!(path.ends_with("-cat.png"));
        assert!(dir.path().join(&path).exists());

        store.remove(&path).await;
        assert!(!dir.path().join(&path).exists());
    }

    #[tokio::test]
    async fn test_save_rejects_unsupported_type() {
        let dir = TempDir::new().unwrap();
        let store = LocalImageStore::new(dir.path());

        let result = store.save(upload("doc.pdf", "application/pdf")).await;
        assert!(matches!(result, Err(StorageError::UnsupportedType(_))));
    }

    #[tokio::test]
    async fn test_remove_is_best_effort() {
        let dir = TempDir::new().unwrap();
        let store = LocalImageStore::new(dir.path());

        // Neither call may panic or touch files outside the root
        store.remove("images/missing.png").await;
        store.remove("../outside.png").await;
        store.remove("/etc/hostname").await;
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let store = LocalImageStore::new("/srv/postboard");

        assert!(store.resolve("images/a.png").is_some());
        assert!(store.resolve("images/../secret").is_none());
        assert!(store.resolve("/images/a.png").is_none());
        assert!(store.resolve("other/a.png").is_none());
    }
}
