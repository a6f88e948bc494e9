/// Post authoring: creation, comments and soft removal
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::promotions::PromotionService;
use crate::clients::{Clients, ImageStore, ModerationNotifier};
use crate::domain::{Comment, CommentView, NewPost, PostView, TargetingWindow};
use crate::error::{ServiceError, ServiceResult};
use crate::metrics::NOTIFIER_FAILURES_TOTAL;
use crate::repository::{AccountStore, CommentStore, PostStore, Stores};

/// Image part of a create-post form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Parsed create-post form.
#[derive(Debug, Clone)]
pub struct CreatePost {
    pub description: String,
    pub hidden: bool,
    pub exposure_date: Option<DateTime<Utc>>,
    pub targeting: TargetingWindow,
    pub tag_ids: Vec<Uuid>,
    pub campaign_dates: Vec<DateTime<Utc>>,
    pub image: ImageUpload,
}

#[derive(Clone)]
pub struct PostService {
    accounts: Arc<dyn AccountStore>,
    posts: Arc<dyn PostStore>,
    comments: Arc<dyn CommentStore>,
    images: Arc<dyn ImageStore>,
    moderation: Arc<dyn ModerationNotifier>,
    promotions: PromotionService,
}

impl PostService {
    pub fn new(stores: &Stores, clients: &Clients) -> Self {
        Self {
            accounts: stores.accounts.clone(),
            posts: stores.posts.clone(),
            comments: stores.comments.clone(),
            images: clients.images.clone(),
            moderation: clients.moderation.clone(),
            promotions: PromotionService::new(stores.posts.clone(), clients.scheduler.clone()),
        }
    }

    pub async fn create_post(&self, author_id: Uuid, form: CreatePost) -> ServiceResult<PostView> {
        let author = self
            .accounts
            .find_by_id(author_id)
            .await?
            .ok_or_else(ServiceError::user_not_found)?;

        let image = self
            .images
            .upload(&form.image.file_name, form.image.bytes)
            .await
            .map_err(|e| {
                warn!(%author_id, error = %e, "Image upload failed");
                ServiceError::UpstreamUnavailable("image upload failed".to_string())
            })?;

        let post = self
            .posts
            .insert(&NewPost {
                user_id: author.id,
                description: form.description,
                image,
                hidden: form.hidden,
                exposure_date: form.exposure_date,
                targeting: form.targeting,
                tag_ids: form.tag_ids,
            })
            .await?;

        info!(post_id = %post.id, %author_id, tags = post.tags.len(), "Post created");

        if let Err(e) = self
            .moderation
            .notify_post_created(post.id, author.id, post.removed)
            .await
        {
            NOTIFIER_FAILURES_TOTAL.with_label_values(&["admin"]).inc();
            warn!(post_id = %post.id, error = %e, "Failed to notify moderation service");
        }

        self.promotions.schedule(post.id, &form.campaign_dates).await;

        Ok(PostView {
            user: author.summary(),
            post,
        })
    }

    pub async fn add_comment(
        &self,
        author_id: Uuid,
        post_id: Uuid,
        content: String,
    ) -> ServiceResult<CommentView> {
        let (author, post) = tokio::try_join!(
            self.accounts.find_by_id(author_id),
            self.posts.find_by_id(post_id),
        )?;
        let author = author.ok_or_else(ServiceError::user_not_found)?;
        if post.is_none() {
            return Err(ServiceError::post_not_found());
        }

        let comment = self
            .comments
            .insert(&Comment {
                id: Uuid::new_v4(),
                post_id,
                user_id: author.id,
                content,
                creation_date: Utc::now(),
            })
            .await?;

        debug!(comment_id = %comment.id, %post_id, "Comment added");
        Ok(CommentView {
            user: author.summary(),
            comment,
        })
    }

    pub async fn remove_post(&self, post_id: Uuid) -> ServiceResult<()> {
        if !self.posts.mark_removed(post_id).await? {
            return Err(ServiceError::post_not_found());
        }
        info!(%post_id, "Post removed");
        Ok(())
    }
}
