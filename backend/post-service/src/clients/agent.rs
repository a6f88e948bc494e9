/// HTTP client for the promotion scheduling agent
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::PromotionScheduler;
use crate::config::ServiceEndpoint;
use crate::domain::PostPromotion;

#[derive(Debug, Serialize)]
struct PostPromotionsRequest<'a> {
    promotions: &'a [PostPromotion],
}

#[derive(Clone)]
pub struct AgentServiceClient {
    client: Client,
    base_url: String,
}

impl AgentServiceClient {
    pub fn new(endpoint: &ServiceEndpoint) -> Result<Self> {
        let client = Client::builder()
            .timeout(endpoint.timeout())
            .build()
            .context("Failed to build agent service HTTP client")?;

        Ok(Self {
            client,
            base_url: endpoint.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PromotionScheduler for AgentServiceClient {
    async fn notify_promotions_scheduled(&self, promotions: &[PostPromotion]) -> Result<()> {
        if promotions.is_empty() {
            return Ok(());
        }

        let url = format!("{}/api/agent/postPromotions", self.base_url);
        self.client
            .post(&url)
            .json(&PostPromotionsRequest { promotions })
            .send()
            .await
            .context("Agent service request failed")?
            .error_for_status()
            .context("Agent service rejected promotions")?;

        debug!(count = promotions.len(), "Promotions handed to scheduler");
        Ok(())
    }
}
