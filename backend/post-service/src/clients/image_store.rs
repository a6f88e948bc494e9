/// Cloudinary-compatible image upload
///
/// Uses signed uploads: `signature = sha1("timestamp=<ts><api_secret>")`.
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{multipart, Client};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use tracing::info;

use super::ImageStore;
use crate::config::ImageStoreConfig;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    error: Option<UploadError>,
}

#[derive(Debug, Deserialize)]
struct UploadError {
    message: String,
}

#[derive(Clone)]
pub struct CloudinaryImageStore {
    client: Client,
    upload_url: String,
    api_key: String,
    api_secret: String,
}

impl CloudinaryImageStore {
    pub fn new(config: &ImageStoreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .build()
            .context("Failed to build image store HTTP client")?;

        Ok(Self {
            client,
            upload_url: config.upload_endpoint(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        })
    }
}

fn sign(timestamp: i64, api_secret: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(format!("timestamp={}{}", timestamp, api_secret).as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl ImageStore for CloudinaryImageStore {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        let timestamp = Utc::now().timestamp();
        let size = bytes.len();

        let form = multipart::Form::new()
            .part(
                "file",
                multipart::Part::bytes(bytes).file_name(file_name.to_string()),
            )
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("signature", sign(timestamp, &self.api_secret));

        let response: UploadResponse = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .context("Image upload request failed")?
            .json()
            .await
            .context("Image upload returned an unreadable response")?;

        if let Some(err) = response.error {
            return Err(anyhow!("Image upload rejected: {}", err.message));
        }
        let url = response
            .secure_url
            .ok_or_else(|| anyhow!("Image upload response carried no secure_url"))?;

        info!(file_name, size, "Image uploaded");
        Ok(url)
    }
}
