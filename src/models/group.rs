//! Types related to groups.

use diesel::result::DatabaseErrorKind;
use diesel::{delete, insert_into, prelude::*, update};

use rocket::uri;

use serde::Serialize;

use crate::schema::group;
use crate::{Error, Result};

use super::Database;

/// A group ID.
pub type GroupId = i32;

/// A topic that posts can be filed under.
///
/// Groups are created by administrators, not through the site.
#[derive(Clone, Debug, Queryable, Serialize)]
pub struct Group {
    /// The group's ID in the database.
    pub id: GroupId,
    /// The display title of the group.
    pub title: String,
    /// The unique slug the group's feed lives at.
    pub slug: String,
    /// An optional description of the group.
    pub description: Option<String>,
}

impl Group {
    /// The URI for the group's feed.
    pub fn uri(&self) -> String {
        uri!(crate::routes::group(&self.slug, _)).to_string()
    }
}

/// A new group to be inserted in the database.
#[derive(Debug, Insertable)]
#[diesel(table_name = group)]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
}

/// Convenience function to convert from diesel's error type into our error
/// type, when we're querying for a group.
fn conv_group_error<S>(slug: S) -> impl FnOnce(diesel::result::Error) -> Error
where
    S: Into<String>,
{
    move |e| match e {
        diesel::result::Error::NotFound => Error::GroupNotFound {
            slug: slug.into(),
        },
        _ => Error::from(e),
    }
}

impl Database {
    /// Get a group by slug.
    pub fn group<S>(&self, group_slug: S) -> Result<Group>
    where
        S: Into<String>,
    {
        use crate::schema::group::columns::slug;
        use crate::schema::group::dsl::group;

        let group_slug = group_slug.into();

        group
            .filter(slug.eq(&group_slug))
            .limit(1)
            .first(&mut self.conn()?)
            .map_err(conv_group_error(group_slug))
    }

    /// Get a group by ID.
    pub fn group_by_id(&self, group_id: GroupId) -> Result<Group> {
        use crate::schema::group::columns::id;
        use crate::schema::group::dsl::group;

        Ok(group
            .filter(id.eq(group_id))
            .limit(1)
            .first(&mut self.conn()?)?)
    }

    /// Get all groups, ordered by title.
    pub fn all_groups(&self) -> Result<Vec<Group>> {
        use crate::schema::group::columns::title;
        use crate::schema::group::dsl::group;

        Ok(group.order_by(title.asc()).load(&mut self.conn()?)?)
    }

    /// Insert a new group. The slug must not be taken.
    pub fn insert_group(&self, new_group: NewGroup) -> Result<Group> {
        use crate::schema::group::dsl::group;

        insert_into(group)
            .values(&new_group)
            .get_result(&mut self.conn()?)
            .map_err(|e| match e {
                diesel::result::Error::DatabaseError(
                    DatabaseErrorKind::UniqueViolation,
                    _,
                ) => Error::GroupSlugTaken {
                    slug: new_group.slug,
                },
                _ => Error::from(e),
            })
    }

    /// Delete a group.
    ///
    /// Posts filed under the group lose their tag but are kept.
    pub fn delete_group<S>(&self, group_slug: S) -> Result<()>
    where
        S: Into<String>,
    {
        use crate::schema::group::columns as group_columns;
        use crate::schema::group::dsl::group;
        use crate::schema::post::columns as post_columns;
        use crate::schema::post::dsl::post;

        let group_slug = group_slug.into();

        self.conn()?.transaction::<_, Error, _>(|conn| {
            let gid: GroupId = group
                .filter(group_columns::slug.eq(&group_slug))
                .select(group_columns::id)
                .limit(1)
                .first(conn)
                .map_err(conv_group_error(&group_slug))?;

            update(post.filter(post_columns::group_id.eq(gid)))
                .set(post_columns::group_id.eq::<Option<GroupId>>(None))
                .execute(conn)?;

            delete(group.filter(group_columns::id.eq(gid))).execute(conn)?;

            Ok(())
        })
    }
}
