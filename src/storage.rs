//! Filesystem storage for uploaded images.
//!
//! Uploads are content-sniffed rather than trusted by extension, renamed
//! to a random id, and served back under `/uploads/`.

use std::path::{Path, PathBuf};

use nanoid::nanoid;
use tracing::{debug, warn};

use crate::config::UploadConfig;
use crate::error::{QuillError, Result};

/// A stored upload: where it lives on disk and how clients reach it.
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub path: String,
    pub url: String,
    pub filename: String,
    pub mime_type: String,
    pub size: u64,
}

#[derive(Clone)]
pub struct ImageStore {
    dir: PathBuf,
    max_file_size: usize,
    allowed_types: Vec<String>,
}

impl ImageStore {
    /// Creates the store, ensuring the upload directory exists.
    pub async fn new(config: &UploadConfig) -> Result<Self> {
        let dir = PathBuf::from(&config.dir);
        tokio::fs::create_dir_all(&dir).await?;

        Ok(Self {
            dir,
            max_file_size: config.max_file_size,
            allowed_types: config.allowed_types.clone(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Validates upload bytes against the size limit and allowed MIME
    /// types without writing anything. The type is sniffed from the
    /// content; the client-declared type and filename extension are not
    /// trusted.
    pub fn validate(&self, bytes: &[u8]) -> Result<infer::Type> {
        if bytes.is_empty() {
            return Err(QuillError::Validation("Uploaded file is empty".to_string()));
        }
        if bytes.len() > self.max_file_size {
            return Err(QuillError::Validation(format!(
                "File too large: {} bytes, maximum {}",
                bytes.len(),
                self.max_file_size
            )));
        }

        let kind = infer::get(bytes).ok_or_else(|| {
            QuillError::Validation("Could not determine file type".to_string())
        })?;
        let mime_type = kind.mime_type();
        if !self.allowed_types.iter().any(|t| t == mime_type) {
            return Err(QuillError::Validation(format!(
                "Unsupported file type '{mime_type}'. Only image files are allowed."
            )));
        }

        Ok(kind)
    }

    /// Validates and writes upload bytes to disk under a random filename.
    pub async fn save(&self, bytes: &[u8]) -> Result<StoredImage> {
        let kind = self.validate(bytes)?;
        let mime_type = kind.mime_type().to_string();
        let filename = format!("{}.{}", nanoid!(), kind.extension());
        let path = self.dir.join(&filename);
        tokio::fs::write(&path, bytes).await?;

        debug!(filename = %filename, size = bytes.len(), "image stored");

        Ok(StoredImage {
            path: path.to_string_lossy().into_owned(),
            url: format!("/uploads/{filename}"),
            filename,
            mime_type,
            size: bytes.len() as u64,
        })
    }

    /// Best-effort removal of a stored image. A missing or locked file is
    /// logged, not propagated.
    pub async fn remove(&self, path: &str) {
        if let Err(error) = tokio::fs::remove_file(path).await {
            warn!(path = %path, error = %error, "failed to remove stored image");
        }
    }
}
