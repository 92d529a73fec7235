//! Feed composition.
//!
//! A feed is one ordered page of posts for one of the four scopes the site
//! shows: everything, one group, one author, or the authors a viewer
//! follows. All four share the same ordering, newest first with insertion
//! order breaking timestamp ties.

use crate::models::{Database, Group, Post, User};
use crate::pagination::Pagination;
use crate::Result;

/// How many posts fit on one feed page.
pub const PAGE_WIDTH: u32 = 10;

/// One page of a feed, plus the pagination state to render under it.
#[derive(Debug)]
pub struct Feed {
    pub posts: Vec<Post>,
    pub pagination: Pagination,
}

/// The global feed: every post on the site.
pub fn global(db: &Database, requested_page: Option<u32>) -> Result<Feed> {
    let pagination =
        Pagination::resolve(db.num_posts()?, PAGE_WIDTH, requested_page);
    let posts = db.post_page(pagination.page())?;

    Ok(Feed { posts, pagination })
}

/// The feed of a single group, by slug.
pub fn group(
    db: &Database,
    slug: &str,
    requested_page: Option<u32>,
) -> Result<(Group, Feed)> {
    let group = db.group(slug)?;

    let pagination = Pagination::resolve(
        db.num_posts_in_group(group.id)?,
        PAGE_WIDTH,
        requested_page,
    );
    let posts = db.group_post_page(group.id, pagination.page())?;

    Ok((group, Feed { posts, pagination }))
}

/// The feed of a single author, by username.
pub fn author(
    db: &Database,
    username: &str,
    requested_page: Option<u32>,
) -> Result<(User, Feed)> {
    let author = db.user(username)?;

    let pagination = Pagination::resolve(
        db.num_posts_by(author.id)?,
        PAGE_WIDTH,
        requested_page,
    );
    let posts = db.author_post_page(author.id, pagination.page())?;

    Ok((author, Feed { posts, pagination }))
}

/// The personalized feed: posts by the authors the viewer follows.
///
/// Empty if the viewer follows no one.
pub fn following(
    db: &Database,
    viewer: &User,
    requested_page: Option<u32>,
) -> Result<Feed> {
    let pagination = Pagination::resolve(
        db.num_followed_posts(viewer.id)?,
        PAGE_WIDTH,
        requested_page,
    );
    let posts = db.followed_post_page(viewer.id, pagination.page())?;

    Ok(Feed { posts, pagination })
}
