mod accounts;
mod comments;
mod post_relations;
mod posts;
mod relations;
mod r#trait;

pub use accounts::PgAccountStore;
pub use comments::PgCommentStore;
pub use post_relations::PgPostRelationStore;
pub use posts::PgPostStore;
pub use relations::PgRelationStore;
pub use r#trait::{
    AccountStore, CommentStore, PostFilter, PostRelationStore, PostStore, RelationFilter,
    RelationStore,
};

use sqlx::PgPool;
use std::sync::Arc;

/// The full set of data-access handles the services are built from.
#[derive(Clone)]
pub struct Stores {
    pub accounts: Arc<dyn AccountStore>,
    pub relations: Arc<dyn RelationStore>,
    pub posts: Arc<dyn PostStore>,
    pub post_relations: Arc<dyn PostRelationStore>,
    pub comments: Arc<dyn CommentStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            accounts: Arc::new(PgAccountStore::new(pool.clone())),
            relations: Arc::new(PgRelationStore::new(pool.clone())),
            posts: Arc::new(PgPostStore::new(pool.clone())),
            post_relations: Arc::new(PgPostRelationStore::new(pool.clone())),
            comments: Arc::new(PgCommentStore::new(pool)),
        }
    }
}
