//! Types related to comments.

use chrono::{DateTime, Utc};

use diesel::{insert_into, prelude::*};

use serde::Serialize;

use crate::schema::comment;
use crate::Result;

use super::{Database, PostId, UserId};

/// A comment ID.
pub type CommentId = i32;

/// A comment on a post.
#[derive(Clone, Debug, Queryable, Serialize)]
pub struct Comment {
    /// The comment's ID in the database.
    pub id: CommentId,
    /// When the comment was made.
    pub time_stamp: DateTime<Utc>,
    /// The contents of the comment.
    pub body: String,
    /// The post the comment was made on.
    pub post_id: PostId,
    /// The user who made the comment.
    pub author: UserId,
}

/// A new comment to be inserted in the database.
#[derive(Debug, Insertable)]
#[diesel(table_name = comment)]
pub struct NewComment {
    pub time_stamp: DateTime<Utc>,
    pub body: String,
    pub post_id: PostId,
    pub author: UserId,
}

impl Database {
    /// Insert a new comment.
    pub fn insert_comment(&self, new_comment: NewComment) -> Result<()> {
        use crate::schema::comment::dsl::comment;

        insert_into(comment)
            .values(&new_comment)
            .execute(&mut self.conn()?)?;

        Ok(())
    }

    /// Get all of the comments on a post, oldest first.
    pub fn comments_on_post(&self, pid: PostId) -> Result<Vec<Comment>> {
        use crate::schema::comment::columns::{id, post_id, time_stamp};
        use crate::schema::comment::dsl::comment;

        Ok(comment
            .filter(post_id.eq(pid))
            .order_by(time_stamp.asc())
            .then_order_by(id.asc())
            .load(&mut self.conn()?)?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::super::test_support::*;
    use super::*;

    #[test]
    fn comments_read_oldest_first() -> Result<()> {
        let db = open_test_database();
        let ada = add_user(&db, "ada");
        let grace = add_user(&db, "grace");

        let post_id = add_post(&db, &ada, "discuss", 0);

        for (body, offset) in [("second", 10), ("first", 5), ("third", 15)] {
            db.insert_comment(NewComment {
                time_stamp: base_time() + Duration::seconds(offset),
                body: body.into(),
                post_id,
                author: grace.id,
            })?;
        }

        let bodies: Vec<String> = db
            .comments_on_post(post_id)?
            .into_iter()
            .map(|c| c.body)
            .collect();
        assert_eq!(bodies, vec!["first", "second", "third"]);

        Ok(())
    }
}
