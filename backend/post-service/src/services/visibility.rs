/// Visibility policy: may `viewer` ever see `post` by `author`?
///
/// Rules are evaluated in a fixed order and the first decisive rule wins:
///
/// 1. removed posts are invisible to everyone, the author included
/// 2. posts by banned authors are invisible to everyone, the author included
/// 3. the author sees their own posts (hidden, private and block rules skipped)
/// 4. hidden posts are invisible to everyone else
/// 5. a block in either direction hides the post
/// 6. private authors are visible only to accepted followers
/// 7. everything else is visible
///
/// Mutes do not apply here; they only shape the organic feed.
use uuid::Uuid;

use super::relation_index::RelationIndex;
use crate::domain::{Account, Post};

pub fn can_view(viewer_id: Option<Uuid>, index: &RelationIndex, author: &Account, post: &Post) -> bool {
    if post.removed {
        return false;
    }
    // Checked before self-view: a banned author cannot see their own posts either.
    if author.banned {
        return false;
    }
    if viewer_id == Some(author.id) {
        return true;
    }
    if post.hidden {
        return false;
    }
    if index.is_blocked(author.id) {
        return false;
    }
    if author.private {
        return index.follows(author.id);
    }
    true
}
