use std::path::Path;

use migrun_common::{Error, Result};
use rusqlite::Connection;
use tracing::{debug, info};

/// One open connection to the target SQLite file.
///
/// A run opens two of these in sequence (apply, then report). Call
/// [`Database::close`] to surface close errors; dropping also closes.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(db_path: &Path) -> Result<Self> {
        info!("opening database at {}", db_path.display());
        let conn = Connection::open(db_path).map_err(|e| {
            Error::Database(format!("failed to open {}: {e}", db_path.display()))
        })?;
        Self::init(conn)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Database(format!("failed to open in-memory database: {e}")))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| Error::Database(format!("failed to set pragmas: {e}")))?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, e)| Error::Database(format!("failed to close database: {e}")))?;
        debug!("database closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.db");
        assert!(!path.exists());

        let db = Database::open(&path).unwrap();
        db.close().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn open_in_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no/such/dir/app.db");

        assert!(matches!(Database::open(&path), Err(Error::Database(_))));
    }

    #[test]
    fn foreign_keys_are_enabled() {
        let db = Database::in_memory().unwrap();
        let enabled: i64 = db
            .connection()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }
}
