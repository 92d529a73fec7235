//! Models and types related to the database.

use std::fmt::Debug;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{
    ConnectionManager, CustomizeConnection, Pool, PooledConnection,
};
use diesel::SqliteConnection;

use diesel_migrations::{
    embed_migrations, EmbeddedMigrations, MigrationHarness,
};

use crate::{Error, Result};

pub mod comment;
pub mod follow;
pub mod group;
pub mod post;
pub mod session;
pub mod user;

pub use comment::*;
pub use follow::*;
pub use group::*;
pub use post::*;
pub use session::*;
pub use user::*;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// A pooled connection, ready to run queries.
pub(crate) type Connection =
    PooledConnection<ConnectionManager<SqliteConnection>>;

/// Options applied to every pooled connection.
///
/// SQLite enforces foreign keys per-connection, and concurrent writers need
/// a busy timeout instead of an immediate `SQLITE_BUSY`.
#[derive(Clone, Debug)]
struct ConnectionOptions;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error>
    for ConnectionOptions
{
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> std::result::Result<(), diesel::r2d2::Error> {
        conn.batch_execute(
            "PRAGMA busy_timeout = 1000; PRAGMA foreign_keys = ON;",
        )
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// A connection to the database. Used for creating and retrieving data.
pub struct Database {
    pool: Pool<ConnectionManager<SqliteConnection>>,
}

impl Debug for Database {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        let state = self.pool.state();

        write!(
            fmt,
            "<#Database connections={} idle_connections={}>",
            state.connections, state.idle_connections,
        )?;

        Ok(())
    }
}

impl Database {
    /// Open a connection pool to the database and run pending migrations.
    ///
    /// An in-memory database is capped at a single connection; every pooled
    /// connection would otherwise get its own empty database.
    pub fn open<S>(url: S) -> Result<Database>
    where
        S: AsRef<str>,
    {
        let mut builder =
            Pool::builder().connection_customizer(Box::new(ConnectionOptions));

        if url.as_ref().contains(":memory:") {
            builder = builder.max_size(1);
        }

        let pool = builder.build(ConnectionManager::new(url.as_ref()))?;

        pool.get()?
            .run_pending_migrations(MIGRATIONS)
            .map_err(Error::MigrationError)?;

        Ok(Database { pool })
    }

    pub(crate) fn conn(&self) -> Result<Connection> {
        Ok(self.pool.get()?)
    }
}
