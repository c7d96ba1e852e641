//! Blob storage collaborator.

use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::Context;
use uuid::Uuid;

use crate::error::{ShopError, ShopResult};

pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

const IMAGE_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// An uploaded file as extracted at the HTTP edge.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    /// Checks the upload is an acceptable image before it is persisted.
    pub fn validate_image(&self) -> ShopResult<()> {
        if !IMAGE_MIME_TYPES.contains(&self.content_type.as_str()) {
            return Err(ShopError::validation(format!(
                "unsupported image type: {}",
                self.content_type
            )));
        }
        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(ShopError::validation("image exceeds 2 MiB"));
        }
        Ok(())
    }
}

pub trait BlobStore: Clone + Send + Sync + 'static {
    /// Persists the upload under `dir`, returning the stored path.
    fn store(&self, upload: FileUpload, dir: &str) -> impl Future<Output = anyhow::Result<String>> + Send;
}

/// Filesystem store rooted at `BLOB_ROOT`.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl BlobStore for LocalBlobStore {
    async fn store(&self, upload: FileUpload, dir: &str) -> anyhow::Result<String> {
        let ext = Path::new(&upload.filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin");
        let relative = format!("{dir}/{}.{ext}", Uuid::new_v4());
        let target = self.root.join(&relative);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("creating blob directory")?;
        }
        tokio::fs::write(&target, &upload.bytes)
            .await
            .with_context(|| format!("writing blob {relative}"))?;
        Ok(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(content_type: &str, len: usize) -> FileUpload {
        FileUpload {
            filename: "photo.png".into(),
            content_type: content_type.into(),
            bytes: vec![0; len],
        }
    }

    #[test]
    fn accepts_supported_image_types() {
        for mime in ["image/jpeg", "image/png", "image/webp"] {
            assert!(upload(mime, 128).validate_image().is_ok());
        }
    }

    #[test]
    fn rejects_unsupported_type() {
        assert!(upload("application/pdf", 128).validate_image().is_err());
    }

    #[test]
    fn rejects_oversize_image() {
        assert!(upload("image/png", MAX_IMAGE_BYTES + 1).validate_image().is_err());
        assert!(upload("image/png", MAX_IMAGE_BYTES).validate_image().is_ok());
    }
}
