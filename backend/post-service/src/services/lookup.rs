/// Tag, profile, reaction and single-post lookups
///
/// Unlike the home feed these are not scoped by the follow graph: every candidate
/// post is run through the visibility policy for the (possibly anonymous) viewer.
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use super::relation_index::RelationIndex;
use super::visibility::can_view;
use crate::domain::{
    CommentView, PostDetails, PostRelationType, PostView, PostWithAuthor,
};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::{
    AccountStore, CommentStore, PostFilter, PostRelationStore, PostStore, RelationStore, Stores,
};

#[derive(Clone)]
pub struct LookupService {
    accounts: Arc<dyn AccountStore>,
    relations: Arc<dyn RelationStore>,
    posts: Arc<dyn PostStore>,
    post_relations: Arc<dyn PostRelationStore>,
    comments: Arc<dyn CommentStore>,
}

impl LookupService {
    pub fn new(stores: &Stores) -> Self {
        Self {
            accounts: stores.accounts.clone(),
            relations: stores.relations.clone(),
            posts: stores.posts.clone(),
            post_relations: stores.post_relations.clone(),
            comments: stores.comments.clone(),
        }
    }

    /// Visible posts tagging an account whose username contains `username`
    /// (case-sensitive). An empty needle matches every post with at least one tag.
    pub async fn filter_by_tag(
        &self,
        viewer_id: Option<Uuid>,
        username: &str,
    ) -> ServiceResult<Vec<PostView>> {
        let all_posts = PostFilter::default();
        let (posts, index) = tokio::try_join!(
            self.posts.find_where(&all_posts),
            RelationIndex::load_for(self.relations.as_ref(), viewer_id),
        )?;

        Ok(posts
            .into_iter()
            .filter(|p| p.post.tags.iter().any(|tag| tag.username.contains(username)))
            .filter(|p| can_view(viewer_id, &index, &p.author, &p.post))
            .map(PostWithAuthor::into_view)
            .collect())
    }

    /// Visible posts by `author_id`, newest first. The author viewing their own
    /// profile also sees hidden posts.
    pub async fn filter_by_author(
        &self,
        viewer_id: Option<Uuid>,
        author_id: Uuid,
    ) -> ServiceResult<Vec<PostView>> {
        let by_author = PostFilter::by_author(author_id);
        let (author, posts, index) = tokio::try_join!(
            self.accounts.find_by_id(author_id),
            self.posts.find_where(&by_author),
            RelationIndex::load_for(self.relations.as_ref(), viewer_id),
        )?;
        if author.is_none() {
            return Err(ServiceError::not_found("user", "User not found!"));
        }

        let mut visible: Vec<PostView> = posts
            .into_iter()
            .filter(|p| can_view(viewer_id, &index, &p.author, &p.post))
            .map(PostWithAuthor::into_view)
            .collect();
        visible.sort_by(|a, b| {
            b.post
                .creation_date
                .cmp(&a.post.creation_date)
                .then_with(|| a.post.id.cmp(&b.post.id))
        });
        Ok(visible)
    }

    /// Posts the viewer reacted to with `kind`, restricted to what the viewer may
    /// still see (blocked authors in either direction drop out).
    pub async fn posts_by_relation(
        &self,
        viewer_id: Uuid,
        kind: PostRelationType,
    ) -> ServiceResult<Vec<PostView>> {
        let (reactions, index) = tokio::try_join!(
            self.post_relations.find_for_user(viewer_id, kind),
            RelationIndex::load(self.relations.as_ref(), viewer_id),
        )?;
        if reactions.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = reactions
            .iter()
            .map(|r| r.post_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let posts = self.posts.find_where(&PostFilter::by_ids(ids)).await?;

        Ok(posts
            .into_iter()
            .filter(|p| can_view(Some(viewer_id), &index, &p.author, &p.post))
            .map(PostWithAuthor::into_view)
            .collect())
    }

    /// A single post with its comments (newest first, banned commenters dropped)
    /// and reactions. Invisible posts are reported as not found.
    pub async fn get_post(
        &self,
        viewer_id: Option<Uuid>,
        post_id: Uuid,
    ) -> ServiceResult<PostDetails> {
        let (post, index) = tokio::try_join!(
            self.posts.find_by_id(post_id),
            RelationIndex::load_for(self.relations.as_ref(), viewer_id),
        )?;
        let post = post.ok_or_else(ServiceError::post_not_found)?;
        if !can_view(viewer_id, &index, &post.author, &post.post) {
            return Err(ServiceError::post_not_found());
        }

        let (comments, relations) = tokio::try_join!(
            self.comments.find_for_post(post_id),
            self.post_relations.find_for_post(post_id),
        )?;

        let mut comments: Vec<CommentView> = comments
            .into_iter()
            .filter(|c| !c.author.banned)
            .map(|c| CommentView {
                user: c.author.summary(),
                comment: c.comment,
            })
            .collect();
        comments.sort_by(|a, b| b.comment.creation_date.cmp(&a.comment.creation_date));

        Ok(PostDetails {
            view: post.into_view(),
            comments,
            relations,
        })
    }
}
