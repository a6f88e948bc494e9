/// Home feed assembly
///
/// The feed is the union of two candidate sets:
/// - organic: posts by accounts the viewer follows (see `PostStore::followed_authors_feed`)
/// - campaign: live promoted posts whose targeting window matches the viewer
///
/// Both sets are fetched concurrently, de-duplicated by post id (organic wins), and
/// ordered by exposure date, newest first. Ties are broken by ascending post id so the
/// order is deterministic.
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::relation_index::RelationIndex;
use super::targeting::{is_targeted, Audience};
use crate::domain::{PostView, PostWithAuthor};
use crate::error::{ServiceError, ServiceResult};
use crate::metrics::{FEED_BUILD_DURATION_SECONDS, FEED_POSTS_RETURNED};
use crate::repository::{AccountStore, PostFilter, PostStore, RelationStore, Stores};

#[derive(Clone)]
pub struct FeedService {
    accounts: Arc<dyn AccountStore>,
    relations: Arc<dyn RelationStore>,
    posts: Arc<dyn PostStore>,
}

impl FeedService {
    pub fn new(stores: &Stores) -> Self {
        Self {
            accounts: stores.accounts.clone(),
            relations: stores.relations.clone(),
            posts: stores.posts.clone(),
        }
    }

    /// Personalized feed for an authenticated viewer.
    pub async fn build_feed(&self, viewer_id: Uuid) -> ServiceResult<Vec<PostView>> {
        let timer = FEED_BUILD_DURATION_SECONDS.start_timer();
        let now = Utc::now();

        let live_campaigns = PostFilter::live_campaigns();
        let (viewer, organic, campaigns, index) = tokio::try_join!(
            self.accounts.find_by_id(viewer_id),
            self.posts.followed_authors_feed(viewer_id),
            self.posts.find_where(&live_campaigns),
            RelationIndex::load(self.relations.as_ref(), viewer_id),
        )?;
        let viewer = viewer.ok_or_else(ServiceError::user_not_found)?;

        let feed = assemble(organic, campaigns, &index, &Audience::of(&viewer, now), now);

        FEED_POSTS_RETURNED
            .with_label_values(&["organic"])
            .observe(feed.organic as f64);
        FEED_POSTS_RETURNED
            .with_label_values(&["campaign"])
            .observe(feed.campaign as f64);
        timer.observe_duration();

        debug!(
            %viewer_id,
            organic = feed.organic,
            campaign = feed.campaign,
            "Feed assembled"
        );
        Ok(feed.posts)
    }
}

/// Ordered feed plus how many entries each candidate set contributed.
#[derive(Debug, Default)]
pub struct AssembledFeed {
    pub posts: Vec<PostView>,
    pub organic: usize,
    pub campaign: usize,
}

/// Merge organic and campaign candidates into the final feed order.
///
/// Campaign candidates are dropped when their author is banned or in a block relation
/// with the viewer, when they miss the viewer's targeting, or when the post is
/// already present organically.
pub fn assemble(
    organic: Vec<PostView>,
    campaigns: Vec<PostWithAuthor>,
    index: &RelationIndex,
    audience: &Audience,
    now: DateTime<Utc>,
) -> AssembledFeed {
    let mut seen: HashSet<Uuid> = HashSet::with_capacity(organic.len() + campaigns.len());

    let mut feed: Vec<PostView> = organic
        .into_iter()
        .filter(|view| !view.post.removed && !view.post.hidden)
        .filter(|view| seen.insert(view.post.id))
        .collect();
    let organic_kept = feed.len();

    feed.extend(
        campaigns
            .into_iter()
            .filter(|candidate| !candidate.author.banned)
            .filter(|candidate| !index.is_blocked(candidate.author.id))
            .filter(|candidate| is_targeted(&candidate.post, audience, now))
            .filter(|candidate| seen.insert(candidate.post.id))
            .map(PostWithAuthor::into_view),
    );

    feed.sort_by(|a, b| {
        b.post
            .exposure_date
            .cmp(&a.post.exposure_date)
            .then_with(|| a.post.id.cmp(&b.post.id))
    });

    AssembledFeed {
        organic: organic_kept,
        campaign: feed.len() - organic_kept,
        posts: feed,
    }
}
