/// Business logic layer for post-service
///
/// The visibility, targeting and relation-index modules are pure and synchronous;
/// the service structs around them do the store and client I/O.
pub mod accounts;
pub mod feed;
pub mod lookup;
pub mod posts;
pub mod promotions;
pub mod reactions;
pub mod relation_index;
pub mod targeting;
pub mod visibility;

pub use accounts::AccountService;
pub use feed::{AssembledFeed, FeedService};
pub use lookup::LookupService;
pub use posts::{CreatePost, ImageUpload, PostService};
pub use promotions::{ActivationReport, PromotionService};
pub use reactions::ReactionService;
pub use relation_index::RelationIndex;
pub use targeting::{age_in_years, is_targeted, Audience};
pub use visibility::can_view;
