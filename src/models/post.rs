//! Types related to posts.

use chrono::{DateTime, Utc};

use diesel::{delete, insert_into, prelude::*, update};

use serde::Serialize;

use crate::pagination::Page;
use crate::schema::post;
use crate::{Error, Result};

use super::{Database, GroupId, UserId};

/// A post ID.
pub type PostId = i32;

/// A user-made post.
#[derive(Clone, Debug, Queryable, Serialize)]
pub struct Post {
    /// The post's ID in the database.
    pub id: PostId,
    /// When the post was created. Never changes, even on edit.
    pub time_stamp: DateTime<Utc>,
    /// The contents of the post.
    pub body: String,
    /// The user who made the post.
    pub author: UserId,
    /// The group the post is filed under, if any.
    pub group_id: Option<GroupId>,
    /// The media path of the post's image, if it has one.
    pub image: Option<String>,
}

impl Post {
    /// The URI the post's image is served at, if it has one.
    pub fn image_uri(&self) -> Option<String> {
        self.image.as_ref().map(|name| format!("/media/{}", name))
    }
}

/// A new post to be inserted in the database.
#[derive(Debug, Insertable)]
#[diesel(table_name = post)]
pub struct NewPost {
    pub time_stamp: DateTime<Utc>,
    pub body: String,
    pub author: UserId,
    pub group_id: Option<GroupId>,
    pub image: Option<String>,
}

/// Changes an author can make to one of their posts.
///
/// A `None` image keeps whatever image the post already has; the group tag
/// is always rewritten, with `Some(None)` clearing it.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = post)]
pub struct UpdatePost {
    pub body: String,
    pub group_id: Option<Option<GroupId>>,
    pub image: Option<String>,
}

/// Convenience function to convert from diesel's error type into our error
/// type, when we're querying for a post.
fn conv_post_error(
    post_id: PostId,
) -> impl FnOnce(diesel::result::Error) -> Error {
    move |e| match e {
        diesel::result::Error::NotFound => Error::PostNotFound { post_id },
        _ => Error::from(e),
    }
}

impl Database {
    /// Get a post.
    pub fn post(&self, post_id: PostId) -> Result<Post> {
        use crate::schema::post::columns::id;
        use crate::schema::post::dsl::post;

        post.filter(id.eq(post_id))
            .limit(1)
            .first(&mut self.conn()?)
            .map_err(conv_post_error(post_id))
    }

    /// Insert a new post. Returns the ID of the inserted post.
    pub fn insert_post(&self, new_post: NewPost) -> Result<PostId> {
        use crate::schema::post::columns::id;
        use crate::schema::post::dsl::post;

        Ok(insert_into(post)
            .values(&new_post)
            .returning(id)
            .get_result(&mut self.conn()?)?)
    }

    /// Apply changes to a post.
    pub fn update_post(
        &self,
        post_id: PostId,
        changes: UpdatePost,
    ) -> Result<()> {
        use crate::schema::post::columns::id;
        use crate::schema::post::dsl::post;

        let changed = update(post.filter(id.eq(post_id)))
            .set(&changes)
            .execute(&mut self.conn()?)?;

        if changed == 0 {
            return Err(Error::PostNotFound { post_id });
        }

        Ok(())
    }

    /// Delete a post and the comments on it.
    pub fn delete_post(&self, pid: PostId) -> Result<()> {
        use crate::schema::comment::columns::post_id;
        use crate::schema::comment::dsl::comment;
        use crate::schema::post::columns::id;
        use crate::schema::post::dsl::post;

        self.conn()?.transaction::<_, Error, _>(|conn| {
            delete(comment.filter(post_id.eq(pid))).execute(conn)?;
            delete(post.filter(id.eq(pid))).execute(conn)?;

            Ok(())
        })
    }

    /// Get a single page of all posts, newest first.
    pub fn post_page(&self, page: Page) -> Result<Vec<Post>> {
        use crate::schema::post::columns::{id, time_stamp};
        use crate::schema::post::dsl::post;

        Ok(post
            .order_by(time_stamp.desc())
            .then_order_by(id.asc())
            .limit(page.width as i64)
            .offset(page.offset() as i64)
            .load(&mut self.conn()?)?)
    }

    /// Get the number of posts in the database.
    pub fn num_posts(&self) -> Result<i64> {
        use crate::schema::post::dsl::post;

        Ok(post.count().first(&mut self.conn()?)?)
    }

    /// Get a single page of the posts in a group, newest first.
    pub fn group_post_page(
        &self,
        gid: GroupId,
        page: Page,
    ) -> Result<Vec<Post>> {
        use crate::schema::post::columns::{group_id, id, time_stamp};
        use crate::schema::post::dsl::post;

        Ok(post
            .filter(group_id.eq(gid))
            .order_by(time_stamp.desc())
            .then_order_by(id.asc())
            .limit(page.width as i64)
            .offset(page.offset() as i64)
            .load(&mut self.conn()?)?)
    }

    /// Get the number of posts in a group.
    pub fn num_posts_in_group(&self, gid: GroupId) -> Result<i64> {
        use crate::schema::post::columns::group_id;
        use crate::schema::post::dsl::post;

        Ok(post
            .filter(group_id.eq(gid))
            .count()
            .first(&mut self.conn()?)?)
    }

    /// Get a single page of the posts by an author, newest first.
    pub fn author_post_page(
        &self,
        author_id: UserId,
        page: Page,
    ) -> Result<Vec<Post>> {
        use crate::schema::post::columns::{author, id, time_stamp};
        use crate::schema::post::dsl::post;

        Ok(post
            .filter(author.eq(author_id))
            .order_by(time_stamp.desc())
            .then_order_by(id.asc())
            .limit(page.width as i64)
            .offset(page.offset() as i64)
            .load(&mut self.conn()?)?)
    }

    /// Get the number of posts an author has made.
    pub fn num_posts_by(&self, author_id: UserId) -> Result<i64> {
        use crate::schema::post::columns::author;
        use crate::schema::post::dsl::post;

        Ok(post
            .filter(author.eq(author_id))
            .count()
            .first(&mut self.conn()?)?)
    }

    /// Get a single page of the posts by authors a user follows, newest
    /// first.
    pub fn followed_post_page(
        &self,
        follower_id: UserId,
        page: Page,
    ) -> Result<Vec<Post>> {
        use crate::schema::follow::columns as follow_columns;
        use crate::schema::follow::dsl::follow;
        use crate::schema::post::columns as post_columns;
        use crate::schema::post::dsl::post;

        let followed = follow
            .filter(follow_columns::follower.eq(follower_id))
            .select(follow_columns::author);

        Ok(post
            .filter(post_columns::author.eq_any(followed))
            .order_by(post_columns::time_stamp.desc())
            .then_order_by(post_columns::id.asc())
            .limit(page.width as i64)
            .offset(page.offset() as i64)
            .load(&mut self.conn()?)?)
    }

    /// Get the number of posts by authors a user follows.
    pub fn num_followed_posts(&self, follower_id: UserId) -> Result<i64> {
        use crate::schema::follow::columns as follow_columns;
        use crate::schema::follow::dsl::follow;
        use crate::schema::post::columns as post_columns;
        use crate::schema::post::dsl::post;

        let followed = follow
            .filter(follow_columns::follower.eq(follower_id))
            .select(follow_columns::author);

        Ok(post
            .filter(post_columns::author.eq_any(followed))
            .count()
            .first(&mut self.conn()?)?)
    }
}
