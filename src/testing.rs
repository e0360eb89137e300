//! Test utilities for database setup.
//!
//! Provides helpers that reuse authoritative schema initialization,
//! eliminating schema duplication in test code.

use rusqlite::Connection;
use tempfile::TempDir;

/// Test environment with a migrated on-disk database.
///
/// The temporary directory is kept alive for the lifetime of the
/// environment so the database file persists until the test ends.
pub struct TestEnv {
    /// Temporary directory (kept alive for database file persistence)
    #[allow(dead_code)]
    pub temp: TempDir,
    /// Connection with the full schema applied
    pub conn: Connection,
}

impl TestEnv {
    /// Create a test environment backed by `crate::db::schema::run_migrations`.
    pub fn new() -> rusqlite::Result<Self> {
        let temp =
            TempDir::new().map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let db_path = temp.path().join("quizdeck.db");
        let conn = Connection::open(&db_path)?;
        crate::db::schema::run_migrations(&conn)?;

        Ok(Self { temp, conn })
    }
}
