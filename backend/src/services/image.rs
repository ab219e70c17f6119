//! Product image files on local disk

use chrono::Utc;
use std::path::{Path, PathBuf};

use crate::config::UploadConfig;
use crate::error::{AppError, AppResult};

/// Public URL prefix under which `dir` is served
const URL_PREFIX: &str = "/uploads/";

/// Image files stored under `{dir}/products`
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl ImageStore {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            dir: PathBuf::from(&config.dir),
            max_bytes: config.max_image_bytes,
        }
    }

    /// Size limit and JPEG/PNG/GIF/WebP signature
    pub fn check(&self, bytes: &[u8]) -> AppResult<()> {
        if bytes.len() > self.max_bytes {
            return Err(AppError::validation(format!(
                "File size too large. Maximum size is {}MB",
                self.max_bytes / (1024 * 1024)
            )));
        }
        if !has_image_signature(bytes) {
            return Err(AppError::validation(
                "Invalid file type. Only JPEG, PNG, GIF, and WebP are allowed",
            ));
        }
        Ok(())
    }

    /// Write `bytes` as `{product_id}_{unix seconds}{ext}` and return its URL
    pub async fn save(&self, product_id: &str, filename: &str, bytes: &[u8]) -> AppResult<String> {
        let products_dir = self.dir.join("products");
        tokio::fs::create_dir_all(&products_dir).await?;

        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        let name = format!("{}_{}{}", product_id, Utc::now().timestamp(), ext);

        tokio::fs::write(products_dir.join(&name), bytes).await?;
        tracing::debug!("Stored product image {}", name);

        Ok(format!("{}products/{}", URL_PREFIX, name))
    }

    /// Delete the file behind `url`; failures are only logged
    pub async fn remove(&self, url: &str) {
        let relative = url.strip_prefix(URL_PREFIX).unwrap_or(url);
        if relative.split('/').any(|part| part == "..") {
            tracing::warn!("Refusing to delete image outside the upload directory: {}", url);
            return;
        }

        let path = self.dir.join(relative);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!("Failed to delete image file {}: {}", path.display(), e);
        }
    }

    pub fn path_of(&self, url: &str) -> PathBuf {
        self.dir.join(url.strip_prefix(URL_PREFIX).unwrap_or(url))
    }
}

fn has_image_signature(bytes: &[u8]) -> bool {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => true,
        [0x89, b'P', b'N', b'G', ..] => true,
        [b'G', b'I', b'F', b'8', ..] => true,
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => true,
        _ => false,
    }
}
