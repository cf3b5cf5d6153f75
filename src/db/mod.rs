//! SQLite-based persistence for the dashboard.
//!
//! The database lives at `~/.sal-ta-dashboard/dashboard.db` and holds every
//! table the dashboard presents: departments, advisors, calendars,
//! timesheets, proposals, country focal points, and the static reference
//! tables. Generic CRUD lives in [`store`]; the per-entity modules add typed
//! row mapping and the aggregations behind each dashboard view.

use std::path::PathBuf;

use rusqlite::Connection;

pub mod advisors;
pub mod calendar;
pub mod country_focals;
pub mod departments;
pub mod proposals;
pub mod reference;
pub mod store;
pub mod timesheet;
pub mod types;

pub use store::{Filter, Op, ResultSet, Table, Value};
pub use types::*;

/// Connection wrapper for the dashboard store.
///
/// This is intentionally NOT `Clone` or `Sync`. It is held behind a
/// `std::sync::Mutex` in `AppState` so that UI-facing operations can
/// access it safely.
pub struct DashboardDb {
    conn: Connection,
}

impl DashboardDb {
    /// Borrow the underlying connection for ad-hoc queries.
    pub fn conn_ref(&self) -> &Connection {
        &self.conn
    }

    /// Execute a closure within a SQLite transaction.
    /// Commits on Ok, rolls back on Err.
    pub fn with_transaction<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<DbError>,
    {
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| E::from(DbError::Sqlite(e)))?;
        match f(self) {
            Ok(val) => {
                self.conn
                    .execute_batch("COMMIT")
                    .map_err(|e| E::from(DbError::Sqlite(e)))?;
                Ok(val)
            }
            Err(e) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }

    /// Open (or create) the database at the default path and apply the schema.
    pub fn open() -> Result<Self, DbError> {
        let path = Self::db_path()?;
        Self::open_at(path)
    }

    /// Open a database at an explicit path. Useful for testing.
    pub fn open_at(path: PathBuf) -> Result<Self, DbError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(DbError::CreateDir)?;
            }
        }

        let conn = Connection::open(&path)?;

        // Enable WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        crate::migrations::run_migrations(&conn).map_err(DbError::Migration)?;

        Ok(Self { conn })
    }

    /// Open an in-memory database with the full schema. Testing only.
    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Self {
        let conn = Connection::open_in_memory().expect("in-memory db");
        crate::migrations::run_migrations(&conn).expect("migrations");
        Self { conn }
    }

    /// Resolve the default database path: `~/.sal-ta-dashboard/dashboard.db`.
    fn db_path() -> Result<PathBuf, DbError> {
        let home = dirs::home_dir().ok_or(DbError::HomeDirNotFound)?;
        Ok(home.join(".sal-ta-dashboard").join("dashboard.db"))
    }
}
