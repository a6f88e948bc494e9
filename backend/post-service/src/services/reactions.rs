/// Like / dislike / save
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{PostRelation, PostRelationType};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::{AccountStore, PostRelationStore, PostStore, Stores};

#[derive(Clone)]
pub struct ReactionService {
    accounts: Arc<dyn AccountStore>,
    posts: Arc<dyn PostStore>,
    post_relations: Arc<dyn PostRelationStore>,
}

impl ReactionService {
    pub fn new(stores: &Stores) -> Self {
        Self {
            accounts: stores.accounts.clone(),
            posts: stores.posts.clone(),
            post_relations: stores.post_relations.clone(),
        }
    }

    /// Record a reaction. Like and Dislike replace each other.
    pub async fn react(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        kind: PostRelationType,
    ) -> ServiceResult<PostRelation> {
        self.require_user_and_post(user_id, post_id).await?;
        let relation = self.post_relations.put(post_id, user_id, kind).await?;
        debug!(%post_id, %user_id, ?kind, "Reaction stored");
        Ok(relation)
    }

    pub async fn unreact(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        kind: PostRelationType,
    ) -> ServiceResult<()> {
        self.require_user_and_post(user_id, post_id).await?;
        let deleted = self.post_relations.delete(post_id, user_id, kind).await?;
        debug!(%post_id, %user_id, ?kind, deleted, "Reaction removed");
        Ok(())
    }

    async fn require_user_and_post(&self, user_id: Uuid, post_id: Uuid) -> ServiceResult<()> {
        let (user, post) = tokio::try_join!(
            self.accounts.find_by_id(user_id),
            self.posts.find_by_id(post_id),
        )?;
        if user.is_none() {
            return Err(ServiceError::user_not_found());
        }
        if post.is_none() {
            return Err(ServiceError::post_not_found());
        }
        Ok(())
    }
}
