/// Outbound collaborators: moderation notifier, promotion scheduler, image store
///
/// The traits are the seams the services depend on; the HTTP implementations talk to
/// the gateway and the image host.
pub mod admin;
pub mod agent;
pub mod image_store;

pub use admin::AdminServiceClient;
pub use agent::AgentServiceClient;
pub use image_store::CloudinaryImageStore;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::domain::PostPromotion;

/// Tells the moderation service a post exists.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModerationNotifier: Send + Sync {
    async fn notify_post_created(&self, post_id: Uuid, author_id: Uuid, removed: bool)
        -> Result<()>;
}

/// Hands promotion requests to the scheduler that later activates them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PromotionScheduler: Send + Sync {
    async fn notify_promotions_scheduled(&self, promotions: &[PostPromotion]) -> Result<()>;
}

/// Stores an uploaded image and returns a stable public URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String>;
}

#[derive(Clone)]
pub struct Clients {
    pub moderation: Arc<dyn ModerationNotifier>,
    pub scheduler: Arc<dyn PromotionScheduler>,
    pub images: Arc<dyn ImageStore>,
}

impl Clients {
    pub fn http(config: &Config) -> Result<Self> {
        Ok(Self {
            moderation: Arc::new(AdminServiceClient::new(&config.admin_service)?),
            scheduler: Arc::new(AgentServiceClient::new(&config.agent_service)?),
            images: Arc::new(CloudinaryImageStore::new(&config.image_store)?),
        })
    }
}
