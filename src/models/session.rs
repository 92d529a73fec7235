//! Types related to login sessions.

use chrono::{DateTime, Utc};

use diesel::{delete, insert_into, prelude::*};

use crate::schema::session;
use crate::{Error, Result};

use super::{Database, User, UserId};

/// A session for a logged-in user.
#[derive(Clone, Debug)]
pub struct Session {
    /// The random ID carried in the session cookie.
    pub id: String,
    /// When the session stops being valid.
    pub expires: DateTime<Utc>,
    /// The user the session belongs to.
    pub user: User,
}

/// The database model for a session.
#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = session)]
struct DbSession {
    id: String,
    expires: DateTime<Utc>,
    user_id: UserId,
}

impl Database {
    /// Get a session by its cookie ID.
    ///
    /// An expired session is deleted on first touch and reported as expired.
    pub fn session<S>(&self, session_id: S) -> Result<Session>
    where
        S: AsRef<str>,
    {
        use crate::schema::session::columns::id;
        use crate::schema::session::dsl::session;

        let db_session: DbSession = session
            .filter(id.eq(session_id.as_ref()))
            .limit(1)
            .first(&mut self.conn()?)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => Error::SessionNotFound,
                _ => Error::from(e),
            })?;

        if db_session.expires < Utc::now() {
            self.delete_session(&db_session.id)?;
            return Err(Error::ExpiredSession);
        }

        let user = self.user_by_id(db_session.user_id)?;

        Ok(Session {
            id: db_session.id,
            expires: db_session.expires,
            user,
        })
    }

    /// Insert a session.
    pub fn insert_session(&self, new_session: Session) -> Result<()> {
        use crate::schema::session::dsl::session;

        let new_session = DbSession {
            id: new_session.id,
            expires: new_session.expires,
            user_id: new_session.user.id,
        };

        insert_into(session)
            .values(&new_session)
            .execute(&mut self.conn()?)?;

        Ok(())
    }

    /// Delete a session.
    pub fn delete_session<S>(&self, session_id: S) -> Result<()>
    where
        S: AsRef<str>,
    {
        use crate::schema::session::columns::id;
        use crate::schema::session::dsl::session;

        delete(session.filter(id.eq(session_id.as_ref())))
            .execute(&mut self.conn()?)?;

        Ok(())
    }
}
