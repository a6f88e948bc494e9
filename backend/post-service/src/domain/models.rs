use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ServiceError;

/// Lowest age a targeting window may start at.
pub const AGE_FILTER_MIN: i32 = 0;
/// Highest age a targeting window may end at.
pub const AGE_FILTER_MAX: i32 = 150;

// ============================================================================
// Enumerations (stored and transmitted as small integers)
// ============================================================================

/// Account gender. `Everyone` doubles as "unspecified" on accounts and as
/// "no restriction" on a campaign's gender filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum Gender {
    #[default]
    Everyone = 0,
    Male = 1,
    Female = 2,
    Other = 3,
}

impl TryFrom<i16> for Gender {
    type Error = ServiceError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Gender::Everyone),
            1 => Ok(Gender::Male),
            2 => Ok(Gender::Female),
            3 => Ok(Gender::Other),
            other => Err(ServiceError::InvalidArgument(format!(
                "unknown gender: {}",
                other
            ))),
        }
    }
}

impl From<Gender> for i16 {
    fn from(gender: Gender) -> Self {
        gender as i16
    }
}

/// Directed account-to-account relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum RelationType {
    Follow = 1,
    Mute = 2,
    Block = 3,
}

impl TryFrom<i16> for RelationType {
    type Error = ServiceError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(RelationType::Follow),
            2 => Ok(RelationType::Mute),
            3 => Ok(RelationType::Block),
            other => Err(ServiceError::InvalidArgument(format!(
                "unknown relation type: {}",
                other
            ))),
        }
    }
}

impl From<RelationType> for i16 {
    fn from(kind: RelationType) -> Self {
        kind as i16
    }
}

/// Reaction of an account to a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum PostRelationType {
    Like = 1,
    Dislike = 2,
    Save = 3,
}

impl PostRelationType {
    /// The reaction that cannot coexist with this one for the same (post, user).
    pub fn opposite(self) -> Option<Self> {
        match self {
            PostRelationType::Like => Some(PostRelationType::Dislike),
            PostRelationType::Dislike => Some(PostRelationType::Like),
            PostRelationType::Save => None,
        }
    }
}

impl TryFrom<i16> for PostRelationType {
    type Error = ServiceError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PostRelationType::Like),
            2 => Ok(PostRelationType::Dislike),
            3 => Ok(PostRelationType::Save),
            other => Err(ServiceError::InvalidArgument(format!(
                "unknown post relation type: {}",
                other
            ))),
        }
    }
}

impl From<PostRelationType> for i16 {
    fn from(kind: PostRelationType) -> Self {
        kind as i16
    }
}

/// Strict parse of a path segment such as `/byPostRelation/2`.
impl FromStr for PostRelationType {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().parse::<i16>().map_err(|_| {
            ServiceError::InvalidArgument(format!("post relation type must be numeric: {:?}", s))
        })?;
        PostRelationType::try_from(value)
    }
}

// ============================================================================
// Accounts and relations
// ============================================================================

/// Account mirrored from the identity service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    #[serde(default)]
    pub gender: Gender,
    pub birth_date: DateTime<Utc>,
    #[serde(default)]
    pub banned: bool,
    #[serde(default)]
    pub private: bool,
}

impl Account {
    pub fn summary(&self) -> AuthorSummary {
        AuthorSummary {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

/// Public projection of an account; the only author shape handed to feed consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    #[serde(rename = "subject")]
    pub subject_id: Uuid,
    #[serde(rename = "object")]
    pub object_id: Uuid,
    #[serde(rename = "type")]
    pub kind: RelationType,
    #[serde(default)]
    pub pending: bool,
}

// ============================================================================
// Posts
// ============================================================================

/// Age and gender window a campaign post is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetingWindow {
    pub gender: Gender,
    pub age_low: i32,
    pub age_high: i32,
}

impl Default for TargetingWindow {
    fn default() -> Self {
        Self {
            gender: Gender::Everyone,
            age_low: AGE_FILTER_MIN,
            age_high: AGE_FILTER_MAX,
        }
    }
}

impl TargetingWindow {
    /// Build a window from untrusted form values. Each malformed field falls back to
    /// its unrestricted default instead of failing the request.
    pub fn lenient(gender: Option<&str>, age_low: Option<&str>, age_high: Option<&str>) -> Self {
        let defaults = Self::default();
        let parse_age = |raw: Option<&str>| raw.and_then(|s| s.trim().parse::<i32>().ok());

        Self {
            gender: gender
                .and_then(|s| s.trim().parse::<i16>().ok())
                .and_then(|v| Gender::try_from(v).ok())
                .unwrap_or(defaults.gender),
            age_low: parse_age(age_low).unwrap_or(defaults.age_low),
            age_high: parse_age(age_high).unwrap_or(defaults.age_high),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub description: String,
    pub image: String,
    pub creation_date: DateTime<Utc>,
    pub exposure_date: DateTime<Utc>,
    pub removed: bool,
    pub hidden: bool,
    pub campaign: bool,
    pub gender_filter: Gender,
    pub age_filter_low: i32,
    pub age_filter_high: i32,
    pub tags: Vec<AuthorSummary>,
}

impl Post {
    pub fn targeting(&self) -> TargetingWindow {
        TargetingWindow {
            gender: self.gender_filter,
            age_low: self.age_filter_low,
            age_high: self.age_filter_high,
        }
    }
}

/// A post joined with its full author record. Internal only; never serialized.
#[derive(Debug, Clone)]
pub struct PostWithAuthor {
    pub post: Post,
    pub author: Account,
}

impl PostWithAuthor {
    pub fn into_view(self) -> PostView {
        PostView {
            user: self.author.summary(),
            post: self.post,
        }
    }
}

/// A post as returned to clients: the post fields plus a public author projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub user: AuthorSummary,
}

/// Input for persisting a new post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: Uuid,
    pub description: String,
    pub image: String,
    pub hidden: bool,
    pub exposure_date: Option<DateTime<Utc>>,
    pub targeting: TargetingWindow,
    pub tag_ids: Vec<Uuid>,
}

/// Request to turn a post into an active campaign at `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostPromotion {
    pub post_id: Uuid,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRelation {
    pub post_id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: PostRelationType,
}

// ============================================================================
// Comments
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub creation_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CommentWithAuthor {
    pub comment: Comment,
    pub author: Account,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub user: AuthorSummary,
}

/// Single-post view with its comment thread and reactions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostDetails {
    #[serde(flatten)]
    pub view: PostView,
    pub comments: Vec<CommentView>,
    pub relations: Vec<PostRelation>,
}
