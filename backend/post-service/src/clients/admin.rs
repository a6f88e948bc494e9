/// HTTP client for the admin (moderation) service
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use super::ModerationNotifier;
use crate::config::ServiceEndpoint;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PostCreatedRequest {
    id: Uuid,
    user_id: Uuid,
    removed: bool,
}

#[derive(Clone)]
pub struct AdminServiceClient {
    client: Client,
    base_url: String,
}

impl AdminServiceClient {
    pub fn new(endpoint: &ServiceEndpoint) -> Result<Self> {
        let client = Client::builder()
            .timeout(endpoint.timeout())
            .build()
            .context("Failed to build admin service HTTP client")?;

        Ok(Self {
            client,
            base_url: endpoint.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ModerationNotifier for AdminServiceClient {
    async fn notify_post_created(&self, post_id: Uuid, author_id: Uuid, removed: bool) -> Result<()> {
        let url = format!("{}/api/admin/posts", self.base_url);
        let body = PostCreatedRequest {
            id: post_id,
            user_id: author_id,
            removed,
        };

        self.client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("Admin service request failed")?
            .error_for_status()
            .context("Admin service rejected post notification")?;

        debug!(%post_id, "Admin service notified of new post");
        Ok(())
    }
}
