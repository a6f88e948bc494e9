/// Per-request view of a viewer's social graph
///
/// Built from four independent relation queries that run concurrently. The index is
/// read-through: nothing is cached across requests.
use anyhow::Result;
use std::collections::HashSet;
use uuid::Uuid;

use crate::domain::{Relation, RelationType};
use crate::repository::{RelationFilter, RelationStore};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationIndex {
    /// Accounts the viewer follows with an accepted (non-pending) request.
    pub followed: HashSet<Uuid>,
    /// Accounts the viewer muted. Only the organic feed honours this set.
    pub muted: HashSet<Uuid>,
    pub blocked_by_me: HashSet<Uuid>,
    pub blocking_me: HashSet<Uuid>,
}

impl RelationIndex {
    /// Empty index used for anonymous requests.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub async fn load(store: &dyn RelationStore, viewer_id: Uuid) -> Result<Self> {
        let following = RelationFilter::by_subject(viewer_id)
            .kind(RelationType::Follow)
            .pending(false);
        let muting = RelationFilter::by_subject(viewer_id).kind(RelationType::Mute);
        let blocking = RelationFilter::by_subject(viewer_id).kind(RelationType::Block);
        let blocked_by = RelationFilter::by_object(viewer_id).kind(RelationType::Block);

        let (followed, muted, blocked_by_me, blocking_me) = tokio::try_join!(
            store.find_where(&following),
            store.find_where(&muting),
            store.find_where(&blocking),
            store.find_where(&blocked_by),
        )?;

        Ok(Self {
            followed: objects(&followed),
            muted: objects(&muted),
            blocked_by_me: objects(&blocked_by_me),
            blocking_me: subjects(&blocking_me),
        })
    }

    /// Load for an optional viewer; anonymous requests get the empty index.
    pub async fn load_for(store: &dyn RelationStore, viewer_id: Option<Uuid>) -> Result<Self> {
        match viewer_id {
            Some(id) => Self::load(store, id).await,
            None => Ok(Self::anonymous()),
        }
    }

    pub fn follows(&self, author_id: Uuid) -> bool {
        self.followed.contains(&author_id)
    }

    pub fn has_muted(&self, author_id: Uuid) -> bool {
        self.muted.contains(&author_id)
    }

    /// Block in either direction.
    pub fn is_blocked(&self, author_id: Uuid) -> bool {
        self.blocked_by_me.contains(&author_id) || self.blocking_me.contains(&author_id)
    }
}

// Duplicate rows collapse naturally into the sets.
fn objects(relations: &[Relation]) -> HashSet<Uuid> {
    relations.iter().map(|r| r.object_id).collect()
}

fn subjects(relations: &[Relation]) -> HashSet<Uuid> {
    relations.iter().map(|r| r.subject_id).collect()
}
