//! Per-viewer profile aggregation.

use serde::Serialize;

use crate::models::{Database, User};
use crate::Result;

/// How the follow button on a profile reads for the current viewer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowStatus {
    /// Nobody is signed in.
    NotAuthenticated,
    /// The viewer is looking at their own profile.
    #[serde(rename = "self")]
    Own,
    /// The viewer already follows this author.
    Following,
    /// The viewer doesn't follow this author yet.
    NotFollowing,
}

/// The relationship numbers shown on a profile page.
#[derive(Clone, Debug, Serialize)]
pub struct ProfileSummary {
    pub follow_status: FollowStatus,
    pub post_count: i64,
    pub follower_count: i64,
    pub following_count: i64,
}

/// Aggregate the profile numbers for `author` as seen by `viewer`.
///
/// Pure read; the viewer is passed in, never taken from ambient state.
pub fn summarize(
    db: &Database,
    viewer: Option<&User>,
    author: &User,
) -> Result<ProfileSummary> {
    let follow_status = match viewer {
        None => FollowStatus::NotAuthenticated,
        Some(viewer) if viewer.id == author.id => FollowStatus::Own,
        Some(viewer) => {
            if db.is_following(viewer.id, author.id)? {
                FollowStatus::Following
            } else {
                FollowStatus::NotFollowing
            }
        }
    };

    Ok(ProfileSummary {
        follow_status,
        post_count: db.num_posts_by(author.id)?,
        follower_count: db.follower_count(author.id)?,
        following_count: db.following_count(author.id)?,
    })
}
