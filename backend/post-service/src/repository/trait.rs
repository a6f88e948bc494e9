use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Account, Comment, CommentWithAuthor, NewPost, Post, PostRelation, PostRelationType,
    PostView, PostWithAuthor, Relation, RelationType,
};

/// Optional-field filter over the relation table. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationFilter {
    pub subject_id: Option<Uuid>,
    pub object_id: Option<Uuid>,
    pub kind: Option<RelationType>,
    pub pending: Option<bool>,
}

impl RelationFilter {
    pub fn by_subject(subject_id: Uuid) -> Self {
        Self {
            subject_id: Some(subject_id),
            ..Self::default()
        }
    }

    pub fn by_object(object_id: Uuid) -> Self {
        Self {
            object_id: Some(object_id),
            ..Self::default()
        }
    }

    pub fn kind(mut self, kind: RelationType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn pending(mut self, pending: bool) -> Self {
        self.pending = Some(pending);
        self
    }

    pub fn matches(&self, relation: &Relation) -> bool {
        self.subject_id.map_or(true, |id| relation.subject_id == id)
            && self.object_id.map_or(true, |id| relation.object_id == id)
            && self.kind.map_or(true, |kind| relation.kind == kind)
            && self.pending.map_or(true, |pending| relation.pending == pending)
    }
}

/// Optional-field filter over posts. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFilter {
    pub author_id: Option<Uuid>,
    pub ids: Option<Vec<Uuid>>,
    pub campaign: Option<bool>,
    pub removed: Option<bool>,
}

impl PostFilter {
    pub fn by_author(author_id: Uuid) -> Self {
        Self {
            author_id: Some(author_id),
            ..Self::default()
        }
    }

    pub fn by_ids(ids: Vec<Uuid>) -> Self {
        Self {
            ids: Some(ids),
            ..Self::default()
        }
    }

    /// Campaign posts that have not been removed.
    pub fn live_campaigns() -> Self {
        Self {
            campaign: Some(true),
            removed: Some(false),
            ..Self::default()
        }
    }

    pub fn matches(&self, post: &Post) -> bool {
        self.author_id.map_or(true, |id| post.user_id == id)
            && self.ids.as_ref().map_or(true, |ids| ids.contains(&post.id))
            && self.campaign.map_or(true, |c| post.campaign == c)
            && self.removed.map_or(true, |r| post.removed == r)
    }
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>>;

    /// Accounts for the given ids; unknown ids are silently absent.
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Account>>;

    async fn insert(&self, account: &Account) -> Result<Account>;

    /// Returns false when no account has `account.id`.
    async fn update(&self, account: &Account) -> Result<bool>;
}

#[async_trait]
pub trait RelationStore: Send + Sync {
    async fn find_where(&self, filter: &RelationFilter) -> Result<Vec<Relation>>;

    /// Idempotent on (subject, object, type); an existing row keeps its identity
    /// and takes the new `pending` value.
    async fn upsert(&self, relation: &Relation) -> Result<Relation>;

    /// Returns false when the relation does not exist.
    async fn set_pending(
        &self,
        subject_id: Uuid,
        object_id: Uuid,
        kind: RelationType,
        pending: bool,
    ) -> Result<bool>;

    async fn delete(&self, subject_id: Uuid, object_id: Uuid, kind: RelationType) -> Result<bool>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostWithAuthor>>;

    async fn find_where(&self, filter: &PostFilter) -> Result<Vec<PostWithAuthor>>;

    /// Organic feed candidates for `viewer_id`, already projected for output:
    /// posts by accounts the viewer follows (accepted, non-pending), excluding
    /// banned authors, authors the viewer muted or blocked, authors blocking the
    /// viewer, and removed or hidden posts. Cost scales with the follow count.
    async fn followed_authors_feed(&self, viewer_id: Uuid) -> Result<Vec<PostView>>;

    async fn insert(&self, post: &NewPost) -> Result<Post>;

    /// Soft delete. Returns false when the post does not exist.
    async fn mark_removed(&self, id: Uuid) -> Result<bool>;

    /// Sets `campaign = true`, `hidden = false` and the new exposure date.
    /// Returns false when the post does not exist.
    async fn activate_campaign(&self, id: Uuid, exposure_date: DateTime<Utc>) -> Result<bool>;
}

#[async_trait]
pub trait PostRelationStore: Send + Sync {
    /// Stores the reaction and, in the same transaction, drops its opposite
    /// (Like replaces Dislike and vice versa).
    async fn put(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        kind: PostRelationType,
    ) -> Result<PostRelation>;

    async fn delete(&self, post_id: Uuid, user_id: Uuid, kind: PostRelationType) -> Result<bool>;

    async fn find_for_user(
        &self,
        user_id: Uuid,
        kind: PostRelationType,
    ) -> Result<Vec<PostRelation>>;

    async fn find_for_post(&self, post_id: Uuid) -> Result<Vec<PostRelation>>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn insert(&self, comment: &Comment) -> Result<Comment>;

    async fn find_for_post(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>>;
}
