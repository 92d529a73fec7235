//! Types related to follow relationships.

use diesel::{delete, insert_or_ignore_into, prelude::*};

use serde::Serialize;

use crate::schema::follow;
use crate::{Error, Result};

use super::{Database, User, UserId};

/// A follow ID.
pub type FollowId = i32;

/// A directed edge meaning "follower sees author's posts in their following
/// feed".
#[derive(Clone, Debug, Queryable, Serialize)]
pub struct Follow {
    /// The edge's ID in the database.
    pub id: FollowId,
    /// The user who follows.
    pub follower: UserId,
    /// The user being followed.
    pub author: UserId,
}

/// A new follow edge to be inserted in the database.
#[derive(Debug, Insertable)]
#[diesel(table_name = follow)]
pub struct NewFollow {
    pub follower: UserId,
    pub author: UserId,
}

impl Database {
    /// Record that `follower` follows `author`.
    ///
    /// Following someone twice is a no-op thanks to the unique index on the
    /// pair; following yourself is an error. Returns whether a new edge was
    /// created.
    pub fn insert_follow(
        &self,
        follower: &User,
        author: &User,
    ) -> Result<bool> {
        use crate::schema::follow::dsl::follow;

        if follower.id == author.id {
            return Err(Error::SelfFollow {
                username: follower.username.clone(),
            });
        }

        let created = insert_or_ignore_into(follow)
            .values(&NewFollow {
                follower: follower.id,
                author: author.id,
            })
            .execute(&mut self.conn()?)?;

        Ok(created > 0)
    }

    /// Remove the follow edge from `follower` to `author`, if there is one.
    ///
    /// Returns whether an edge was removed; unfollowing someone you don't
    /// follow is a no-op.
    pub fn delete_follow(
        &self,
        follower: &User,
        author: &User,
    ) -> Result<bool> {
        use crate::schema::follow::columns;
        use crate::schema::follow::dsl::follow;

        let removed = delete(
            follow.filter(
                columns::follower
                    .eq(follower.id)
                    .and(columns::author.eq(author.id)),
            ),
        )
        .execute(&mut self.conn()?)?;

        Ok(removed > 0)
    }

    /// Whether `follower_id` follows `author_id`.
    pub fn is_following(
        &self,
        follower_id: UserId,
        author_id: UserId,
    ) -> Result<bool> {
        use diesel::dsl::exists;
        use diesel::select;

        use crate::schema::follow::columns;
        use crate::schema::follow::dsl::follow;

        Ok(select(exists(follow.filter(
            columns::follower
                .eq(follower_id)
                .and(columns::author.eq(author_id)),
        )))
        .get_result(&mut self.conn()?)?)
    }

    /// How many users follow `author_id`.
    pub fn follower_count(&self, author_id: UserId) -> Result<i64> {
        use crate::schema::follow::columns::author;
        use crate::schema::follow::dsl::follow;

        Ok(follow
            .filter(author.eq(author_id))
            .count()
            .first(&mut self.conn()?)?)
    }

    /// How many authors `follower_id` follows.
    pub fn following_count(&self, follower_id: UserId) -> Result<i64> {
        use crate::schema::follow::columns::follower;
        use crate::schema::follow::dsl::follow;

        Ok(follow
            .filter(follower.eq(follower_id))
            .count()
            .first(&mut self.conn()?)?)
    }

    /// Get the authors a user follows, ordered by username.
    pub fn followed_authors(&self, follower_id: UserId) -> Result<Vec<User>> {
        use crate::schema::follow::columns as follow_columns;
        use crate::schema::follow::dsl::follow;
        use crate::schema::user::columns as user_columns;
        use crate::schema::user::dsl::user;

        Ok(follow
            .inner_join(user)
            .filter(follow_columns::follower.eq(follower_id))
            .select((
                user_columns::id,
                user_columns::username,
                user_columns::display_name,
                user_columns::password_hash,
                user_columns::joined,
            ))
            .order_by(user_columns::username.asc())
            .load(&mut self.conn()?)?)
    }
}
