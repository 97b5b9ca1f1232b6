//! Image storage service
//!
//! Validates uploaded images (content type, size) before anything is
//! written or sent anywhere, then stores them:
//! - on the configured remote image host, when one is set up
//! - otherwise on local disk under the upload path, served back from
//!   /uploads

use anyhow::{anyhow, Context};
use tokio::fs;
use uuid::Uuid;

use crate::config::{ImageHostConfig, UploadConfig};

/// Error types for image storage
#[derive(Debug, thiserror::Error)]
pub enum ImageStoreError {
    /// Rejected before any storage call was made
    #[error("Validation error: {0}")]
    Validation(String),

    /// Local disk or remote host failure
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

/// A stored image, addressable by URL
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoredImage {
    pub url: String,
    pub filename: String,
    pub size: u64,
    pub content_type: String,
}

/// Image storage backed by local disk with an optional remote host
pub struct ImageStore {
    upload: UploadConfig,
    remote: ImageHostConfig,
    http: reqwest::Client,
}

impl ImageStore {
    /// Create a new image store
    pub fn new(upload: UploadConfig, remote: ImageHostConfig) -> Self {
        Self {
            upload,
            remote,
            http: reqwest::Client::new(),
        }
    }

    /// Validate an upload before any storage call
    pub fn validate(&self, content_type: &str, size: u64) -> Result<(), ImageStoreError> {
        if !self.upload.is_type_allowed(content_type) {
            return Err(ImageStoreError::Validation(format!(
                "Invalid file type: {}. Allowed types: {:?}",
                content_type, self.upload.allowed_types
            )));
        }

        if size > self.upload.max_file_size {
            return Err(ImageStoreError::Validation(format!(
                "File too large. Maximum size: {} bytes ({} MB)",
                self.upload.max_file_size,
                self.upload.max_file_size / 1024 / 1024
            )));
        }

        Ok(())
    }

    /// Validate and store an image, returning its public URL
    pub async fn store(
        &self,
        original_filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<StoredImage, ImageStoreError> {
        self.validate(content_type, data.len() as u64)?;

        if self.remote.is_configured() {
            match self.store_remote(original_filename, content_type, data).await {
                Ok(image) => return Ok(image),
                Err(e) => {
                    tracing::warn!("Remote image host failed, falling back to disk: {}", e);
                }
            }
        }

        self.store_local(original_filename, content_type, data).await
    }

    /// Upload to the configured remote host
    async fn store_remote(
        &self,
        original_filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> anyhow::Result<StoredImage> {
        let url = self
            .remote
            .upload_url
            .as_deref()
            .ok_or_else(|| anyhow!("Remote image host not configured"))?;

        let part = reqwest::multipart::Part::bytes(data.to_vec())
            .file_name(original_filename.to_string())
            .mime_str(content_type)
            .context("Invalid content type for multipart upload")?;

        let mut form = reqwest::multipart::Form::new().part("file", part);
        if let Some(ref api_key) = self.remote.api_key {
            form = form.text("api_key", api_key.clone());
        }

        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .context("Failed to reach image host")?;

        if !response.status().is_success() {
            anyhow::bail!("Image host returned status {}", response.status());
        }

        #[derive(serde::Deserialize)]
        struct HostResponse {
            secure_url: Option<String>,
            url: Option<String>,
        }

        let body: HostResponse = response
            .json()
            .await
            .context("Invalid response from image host")?;

        let hosted_url = body
            .secure_url
            .or(body.url)
            .ok_or_else(|| anyhow!("Image host response carried no URL"))?;

        Ok(StoredImage {
            url: hosted_url,
            filename: original_filename.to_string(),
            size: data.len() as u64,
            content_type: content_type.to_string(),
        })
    }

    /// Save to local disk under the upload path
    async fn store_local(
        &self,
        original_filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<StoredImage, ImageStoreError> {
        if !self.upload.path.exists() {
            fs::create_dir_all(&self.upload.path)
                .await
                .context("Failed to create upload dir")?;
        }

        let ext = get_extension(original_filename, content_type);
        let filename = format!("{}.{}", Uuid::new_v4(), ext);
        let file_path = self.upload.path.join(&filename);

        fs::write(&file_path, data)
            .await
            .context("Failed to save file")?;

        Ok(StoredImage {
            url: format!("/uploads/{}", filename),
            filename,
            size: data.len() as u64,
            content_type: content_type.to_string(),
        })
    }
}

/// Get file extension from filename or content type
fn get_extension(filename: &str, content_type: &str) -> String {
    if let Some(ext) = filename.rsplit('.').next() {
        if !ext.is_empty() && ext.len() < 10 && ext != filename {
            return ext.to_lowercase();
        }
    }

    match content_type {
        "image/jpeg" | "image/jpg" => "jpg".to_string(),
        "image/png" => "png".to_string(),
        "image/webp" => "webp".to_string(),
        _ => "bin".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_limit(max: u64) -> ImageStore {
        let upload = UploadConfig {
            max_file_size: max,
            ..UploadConfig::default()
        };
        ImageStore::new(upload, ImageHostConfig::default())
    }

    #[test]
    fn test_rejects_wrong_content_type() {
        let store = store_with_limit(1024);
        let result = store.validate("application/pdf", 10);
        assert!(matches!(result, Err(ImageStoreError::Validation(_))));
    }

    #[test]
    fn test_rejects_oversized_file() {
        let store = store_with_limit(1024);
        let result = store.validate("image/png", 2048);
        assert!(matches!(result, Err(ImageStoreError::Validation(_))));
    }

    #[test]
    fn test_accepts_valid_upload() {
        let store = store_with_limit(1024);
        assert!(store.validate("image/png", 512).is_ok());
    }

    #[tokio::test]
    async fn test_store_rejects_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let upload = UploadConfig {
            path: dir.path().join("uploads"),
            max_file_size: 16,
            ..UploadConfig::default()
        };
        let store = ImageStore::new(upload, ImageHostConfig::default());

        let result = store
            .store("big.png", "image/png", &[0u8; 64])
            .await;
        assert!(matches!(result, Err(ImageStoreError::Validation(_))));

        // Nothing was written: the upload directory was never created
        assert!(!dir.path().join("uploads").exists());
    }

    #[tokio::test]
    async fn test_store_local_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let upload = UploadConfig {
            path: dir.path().join("uploads"),
            ..UploadConfig::default()
        };
        let store = ImageStore::new(upload, ImageHostConfig::default());

        let stored = store
            .store("photo.png", "image/png", &[1, 2, 3, 4])
            .await
            .expect("Upload should succeed");

        assert!(stored.url.starts_with("/uploads/"));
        assert!(stored.filename.ends_with(".png"));
        assert_eq!(stored.size, 4);
        assert!(dir.path().join("uploads").join(&stored.filename).exists());
    }

    #[test]
    fn test_get_extension() {
        assert_eq!(get_extension("photo.PNG", "image/png"), "png");
        assert_eq!(get_extension("noext", "image/jpeg"), "jpg");
        assert_eq!(get_extension("weird", "application/octet-stream"), "bin");
    }
}
