//! Access to the database file.
//!
//! The migrator never holds on to a connection: every unit of work asks the
//! provider for a fresh one and drops it when done.

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;

/// Source of scoped database connections.
pub trait ConnectionProvider {
    /// Open a connection to the database, creating the file if needed.
    fn acquire(&self) -> Result<Connection>;

    /// Whether the database already exists.
    fn database_exists(&self) -> bool;

    /// Human-readable location used in log messages.
    fn location(&self) -> String;

    /// Run `f` with a freshly acquired connection.
    ///
    /// The connection is released when `f` returns, on success and on error
    /// alike.
    fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        Self: Sized,
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.acquire()?;
        f(&mut conn)
    }
}

/// A database stored in a single SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteFile {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: Duration::from_secs(5),
        }
    }

    #[must_use]
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConnectionProvider for SqliteFile {
    fn acquire(&self) -> Result<Connection> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        Ok(conn)
    }

    fn database_exists(&self) -> bool {
        self.path.is_file()
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
