//! In-memory stores and fake clients for driving the services without Postgres.
#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use post_service::clients::{Clients, ImageStore, ModerationNotifier, PromotionScheduler};
use post_service::domain::{
    Account, AuthorSummary, Comment, CommentWithAuthor, Gender, NewPost, Post, PostPromotion,
    PostRelation, PostRelationType, PostView, PostWithAuthor, Relation, RelationType,
    TargetingWindow,
};
use post_service::repository::{
    AccountStore, CommentStore, PostFilter, PostRelationStore, PostStore, RelationFilter,
    RelationStore, Stores,
};

#[derive(Default)]
struct Tables {
    accounts: HashMap<Uuid, Account>,
    relations: Vec<Relation>,
    posts: Vec<Post>,
    post_relations: Vec<PostRelation>,
    comments: Vec<Comment>,
}

/// One shared in-memory database implementing every store trait.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn stores(&self) -> Stores {
        Stores {
            accounts: Arc::new(self.clone()),
            relations: Arc::new(self.clone()),
            posts: Arc::new(self.clone()),
            post_relations: Arc::new(self.clone()),
            comments: Arc::new(self.clone()),
        }
    }

    pub fn post(&self, id: Uuid) -> Option<Post> {
        let tables = self.tables.lock().unwrap();
        tables.posts.iter().find(|p| p.id == id).cloned()
    }

    pub fn post_relations(&self) -> Vec<PostRelation> {
        self.tables.lock().unwrap().post_relations.clone()
    }

    fn with_author(tables: &Tables, post: &Post) -> Option<PostWithAuthor> {
        tables.accounts.get(&post.user_id).map(|author| PostWithAuthor {
            post: post.clone(),
            author: author.clone(),
        })
    }

    fn has_relation(tables: &Tables, subject: Uuid, object: Uuid, kind: RelationType) -> bool {
        tables
            .relations
            .iter()
            .any(|r| r.subject_id == subject && r.object_id == object && r.kind == kind)
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self.tables.lock().unwrap().accounts.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Account>> {
        let tables = self.tables.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| tables.accounts.get(id).cloned())
            .collect())
    }

    async fn insert(&self, account: &Account) -> Result<Account> {
        let mut tables = self.tables.lock().unwrap();
        tables.accounts.insert(account.id, account.clone());
        Ok(account.clone())
    }

    async fn update(&self, account: &Account) -> Result<bool> {
        let mut tables = self.tables.lock().unwrap();
        match tables.accounts.get_mut(&account.id) {
            Some(existing) => {
                *existing = account.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl RelationStore for MemoryStore {
    async fn find_where(&self, filter: &RelationFilter) -> Result<Vec<Relation>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .relations
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn upsert(&self, relation: &Relation) -> Result<Relation> {
        let mut tables = self.tables.lock().unwrap();
        let existing = tables.relations.iter_mut().find(|r| {
            r.subject_id == relation.subject_id
                && r.object_id == relation.object_id
                && r.kind == relation.kind
        });
        match existing {
            Some(r) => r.pending = relation.pending,
            None => tables.relations.push(relation.clone()),
        }
        Ok(relation.clone())
    }

    async fn set_pending(
        &self,
        subject_id: Uuid,
        object_id: Uuid,
        kind: RelationType,
        pending: bool,
    ) -> Result<bool> {
        let mut tables = self.tables.lock().unwrap();
        let existing = tables
            .relations
            .iter_mut()
            .find(|r| r.subject_id == subject_id && r.object_id == object_id && r.kind == kind);
        Ok(match existing {
            Some(r) => {
                r.pending = pending;
                true
            }
            None => false,
        })
    }

    async fn delete(&self, subject_id: Uuid, object_id: Uuid, kind: RelationType) -> Result<bool> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.relations.len();
        tables
            .relations
            .retain(|r| !(r.subject_id == subject_id && r.object_id == object_id && r.kind == kind));
        Ok(tables.relations.len() != before)
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostWithAuthor>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .posts
            .iter()
            .find(|p| p.id == id)
            .and_then(|p| Self::with_author(&tables, p)))
    }

    async fn find_where(&self, filter: &PostFilter) -> Result<Vec<PostWithAuthor>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .posts
            .iter()
            .filter(|p| filter.matches(p))
            .filter_map(|p| Self::with_author(&tables, p))
            .collect())
    }

    async fn followed_authors_feed(&self, viewer_id: Uuid) -> Result<Vec<PostView>> {
        let tables = self.tables.lock().unwrap();
        let followed: Vec<Uuid> = tables
            .relations
            .iter()
            .filter(|r| r.subject_id == viewer_id && r.kind == RelationType::Follow && !r.pending)
            .map(|r| r.object_id)
            .collect();

        Ok(tables
            .posts
            .iter()
            .filter(|p| followed.contains(&p.user_id) && !p.removed && !p.hidden)
            .filter(|p| {
                !Self::has_relation(&tables, viewer_id, p.user_id, RelationType::Mute)
                    && !Self::has_relation(&tables, viewer_id, p.user_id, RelationType::Block)
                    && !Self::has_relation(&tables, p.user_id, viewer_id, RelationType::Block)
            })
            .filter_map(|p| Self::with_author(&tables, p))
            .filter(|p| !p.author.banned)
            .map(PostWithAuthor::into_view)
            .collect())
    }

    async fn insert(&self, post: &NewPost) -> Result<Post> {
        let mut tables = self.tables.lock().unwrap();
        let now = Utc::now();
        let tags: Vec<AuthorSummary> = post
            .tag_ids
            .iter()
            .filter_map(|id| tables.accounts.get(id).map(Account::summary))
            .collect();
        let stored = Post {
            id: Uuid::new_v4(),
            user_id: post.user_id,
            description: post.description.clone(),
            image: post.image.clone(),
            creation_date: now,
            exposure_date: post.exposure_date.unwrap_or(now),
            removed: false,
            hidden: post.hidden,
            campaign: false,
            gender_filter: post.targeting.gender,
            age_filter_low: post.targeting.age_low,
            age_filter_high: post.targeting.age_high,
            tags,
        };
        tables.posts.push(stored.clone());
        Ok(stored)
    }

    async fn mark_removed(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.lock().unwrap();
        Ok(match tables.posts.iter_mut().find(|p| p.id == id) {
            Some(p) => {
                p.removed = true;
                true
            }
            None => false,
        })
    }

    async fn activate_campaign(&self, id: Uuid, exposure_date: DateTime<Utc>) -> Result<bool> {
        let mut tables = self.tables.lock().unwrap();
        Ok(match tables.posts.iter_mut().find(|p| p.id == id) {
            Some(p) => {
                p.campaign = true;
                p.hidden = false;
                p.exposure_date = exposure_date;
                true
            }
            None => false,
        })
    }
}

#[async_trait]
impl PostRelationStore for MemoryStore {
    async fn put(&self, post_id: Uuid, user_id: Uuid, kind: PostRelationType) -> Result<PostRelation> {
        let mut tables = self.tables.lock().unwrap();
        let opposite = kind.opposite();
        tables.post_relations.retain(|r| {
            !(r.post_id == post_id && r.user_id == user_id && Some(r.kind) == opposite)
        });
        let relation = PostRelation {
            post_id,
            user_id,
            kind,
        };
        if !tables.post_relations.contains(&relation) {
            tables.post_relations.push(relation.clone());
        }
        Ok(relation)
    }

    async fn delete(&self, post_id: Uuid, user_id: Uuid, kind: PostRelationType) -> Result<bool> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.post_relations.len();
        tables
            .post_relations
            .retain(|r| !(r.post_id == post_id && r.user_id == user_id && r.kind == kind));
        Ok(tables.post_relations.len() != before)
    }

    async fn find_for_user(&self, user_id: Uuid, kind: PostRelationType) -> Result<Vec<PostRelation>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .post_relations
            .iter()
            .filter(|r| r.user_id == user_id && r.kind == kind)
            .cloned()
            .collect())
    }

    async fn find_for_post(&self, post_id: Uuid) -> Result<Vec<PostRelation>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .post_relations
            .iter()
            .filter(|r| r.post_id == post_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn insert(&self, comment: &Comment) -> Result<Comment> {
        self.tables.lock().unwrap().comments.push(comment.clone());
        Ok(comment.clone())
    }

    async fn find_for_post(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .filter_map(|c| {
                tables.accounts.get(&c.user_id).map(|author| CommentWithAuthor {
                    comment: c.clone(),
                    author: author.clone(),
                })
            })
            .collect())
    }
}

// ============================================================================
// Fake clients
// ============================================================================

#[derive(Default)]
pub struct RecordingClients {
    pub created: Mutex<Vec<Uuid>>,
    pub scheduled: Mutex<Vec<PostPromotion>>,
}

#[async_trait]
impl ModerationNotifier for RecordingClients {
    async fn notify_post_created(&self, post_id: Uuid, _author_id: Uuid, _removed: bool) -> Result<()> {
        self.created.lock().unwrap().push(post_id);
        Ok(())
    }
}

#[async_trait]
impl PromotionScheduler for RecordingClients {
    async fn notify_promotions_scheduled(&self, promotions: &[PostPromotion]) -> Result<()> {
        self.scheduled.lock().unwrap().extend_from_slice(promotions);
        Ok(())
    }
}

#[async_trait]
impl ImageStore for RecordingClients {
    async fn upload(&self, file_name: &str, _bytes: Vec<u8>) -> Result<String> {
        Ok(format!("https://images.test/{}", file_name))
    }
}

pub fn clients(recorder: &Arc<RecordingClients>) -> Clients {
    Clients {
        moderation: recorder.clone(),
        scheduler: recorder.clone(),
        images: recorder.clone(),
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Fixed clock for targeting assertions.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 6, 15, 12, 0, 0).unwrap()
}

/// Seeds accounts, relations and posts straight into a `MemoryStore`.
#[derive(Clone, Default)]
pub struct World {
    pub store: MemoryStore,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account(&self, username: &str) -> Account {
        self.account_with(username, Gender::Everyone, 1990, |_| {})
    }

    pub fn account_with(
        &self,
        username: &str,
        gender: Gender,
        birth_year: i32,
        tweak: impl FnOnce(&mut Account),
    ) -> Account {
        let mut account = Account {
            id: Uuid::new_v4(),
            username: username.to_string(),
            gender,
            birth_date: Utc.with_ymd_and_hms(birth_year, 1, 1, 0, 0, 0).unwrap(),
            banned: false,
            private: false,
        };
        tweak(&mut account);
        self.store
            .tables
            .lock()
            .unwrap()
            .accounts
            .insert(account.id, account.clone());
        account
    }

    pub fn relate(&self, subject: &Account, object: &Account, kind: RelationType, pending: bool) {
        self.store.tables.lock().unwrap().relations.push(Relation {
            subject_id: subject.id,
            object_id: object.id,
            kind,
            pending,
        });
    }

    pub fn follow(&self, subject: &Account, object: &Account) {
        self.relate(subject, object, RelationType::Follow, false);
    }

    pub fn block(&self, subject: &Account, object: &Account) {
        self.relate(subject, object, RelationType::Block, false);
    }

    /// A plain visible post exposed `hours_ago` before `now()`.
    pub fn post(&self, author: &Account, hours_ago: i64) -> Post {
        self.post_with(author, hours_ago, |_| {})
    }

    pub fn post_with(&self, author: &Account, hours_ago: i64, tweak: impl FnOnce(&mut Post)) -> Post {
        let at = now() - Duration::hours(hours_ago);
        let window = TargetingWindow::default();
        let mut post = Post {
            id: Uuid::new_v4(),
            user_id: author.id,
            description: format!("post by {}", author.username),
            image: "https://images.test/p.png".to_string(),
            creation_date: at,
            exposure_date: at,
            removed: false,
            hidden: false,
            campaign: false,
            gender_filter: window.gender,
            age_filter_low: window.age_low,
            age_filter_high: window.age_high,
            tags: Vec::new(),
        };
        tweak(&mut post);
        self.store.tables.lock().unwrap().posts.push(post.clone());
        post
    }
}
