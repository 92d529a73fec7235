//! Types related to user accounts.

use chrono::{DateTime, Utc};

use diesel::result::DatabaseErrorKind;
use diesel::{delete, insert_into, prelude::*};

use rocket::uri;

use serde::Serialize;

use crate::schema::user;
use crate::{Error, Result};

use super::Database;

/// A user ID.
pub type UserId = i32;

/// A registered author.
#[derive(Clone, Debug, Queryable, Serialize)]
pub struct User {
    /// The user's ID in the database.
    pub id: UserId,
    /// The unique handle the user signs in with and is linked by.
    pub username: String,
    /// The name shown beside the user's posts.
    pub display_name: String,
    /// The argon2 hash of the user's password.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// When the account was created.
    pub joined: DateTime<Utc>,
}

impl User {
    /// The URI for the user's profile.
    pub fn uri(&self) -> String {
        uri!(crate::routes::profile(&self.username, _)).to_string()
    }
}

/// A new user to be inserted in the database.
#[derive(Debug, Insertable)]
#[diesel(table_name = user)]
pub struct NewUser {
    pub username: String,
    pub display_name: String,
    pub password_hash: String,
    pub joined: DateTime<Utc>,
}

/// Convenience function to convert from diesel's error type into our error
/// type, when we're querying for a user.
fn conv_user_error<S>(name: S) -> impl FnOnce(diesel::result::Error) -> Error
where
    S: Into<String>,
{
    move |e| match e {
        diesel::result::Error::NotFound => Error::UserNotFound {
            username: name.into(),
        },
        _ => Error::from(e),
    }
}

impl Database {
    /// Get a user by username.
    pub fn user<S>(&self, name: S) -> Result<User>
    where
        S: Into<String>,
    {
        use crate::schema::user::columns::username;
        use crate::schema::user::dsl::user;

        let name = name.into();

        user.filter(username.eq(&name))
            .limit(1)
            .first(&mut self.conn()?)
            .map_err(conv_user_error(name))
    }

    /// Get a user by ID.
    pub fn user_by_id(&self, user_id: UserId) -> Result<User> {
        use crate::schema::user::columns::id;
        use crate::schema::user::dsl::user;

        Ok(user
            .filter(id.eq(user_id))
            .limit(1)
            .first(&mut self.conn()?)?)
    }

    /// Insert a new user. The username must not be taken.
    pub fn insert_user(&self, new_user: NewUser) -> Result<User> {
        use crate::schema::user::dsl::user;

        insert_into(user)
            .values(&new_user)
            .get_result(&mut self.conn()?)
            .map_err(|e| match e {
                diesel::result::Error::DatabaseError(
                    DatabaseErrorKind::UniqueViolation,
                    _,
                ) => Error::UsernameTaken {
                    username: new_user.username,
                },
                _ => Error::from(e),
            })
    }

    /// Delete a user and everything linked to them.
    ///
    /// Removes the user's sessions, the comments on their posts, their own
    /// comments elsewhere, their follows in both directions, and their
    /// posts, then the account itself.
    pub fn delete_user<S>(&self, name: S) -> Result<()>
    where
        S: Into<String>,
    {
        use crate::schema::comment::columns as comment_columns;
        use crate::schema::comment::dsl::comment;
        use crate::schema::follow::columns as follow_columns;
        use crate::schema::follow::dsl::follow;
        use crate::schema::post::columns as post_columns;
        use crate::schema::post::dsl::post;
        use crate::schema::session::columns as session_columns;
        use crate::schema::session::dsl::session;
        use crate::schema::user::columns as user_columns;
        use crate::schema::user::dsl::user;

        let name = name.into();

        self.conn()?.transaction::<_, Error, _>(|conn| {
            let uid: UserId = user
                .filter(user_columns::username.eq(&name))
                .select(user_columns::id)
                .limit(1)
                .first(conn)
                .map_err(conv_user_error(&name))?;

            delete(session.filter(session_columns::user_id.eq(uid)))
                .execute(conn)?;

            let own_posts = post
                .filter(post_columns::author.eq(uid))
                .select(post_columns::id);
            delete(comment.filter(comment_columns::post_id.eq_any(own_posts)))
                .execute(conn)?;
            delete(comment.filter(comment_columns::author.eq(uid)))
                .execute(conn)?;

            delete(follow.filter(
                follow_columns::follower
                    .eq(uid)
                    .or(follow_columns::author.eq(uid)),
            ))
            .execute(conn)?;

            delete(post.filter(post_columns::author.eq(uid))).execute(conn)?;
            delete(user.filter(user_columns::id.eq(uid))).execute(conn)?;

            Ok(())
        })
    }
}
