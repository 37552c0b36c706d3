//! SQLite task store bootstrap and schema migration entry points.
//!
//! # Responsibility
//! - Resolve the store connection string into a concrete SQLite location.
//! - Open and configure SQLite connections for the task store.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - No task data is read or written before migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory, open_store};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    InvalidConnectionString(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::InvalidConnectionString(value) => {
                write!(f, "invalid store connection string `{value}`")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } | Self::InvalidConnectionString(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Where the task store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Memory,
    File(PathBuf),
}

impl StoreLocation {
    /// Parses `:memory:`, `sqlite::memory:`, `sqlite://<path>`, `sqlite:<path>`
    /// or a bare file path.
    pub fn parse(connection_string: &str) -> DbResult<Self> {
        let trimmed = connection_string.trim();
        let path = trimmed
            .strip_prefix("sqlite://")
            .or_else(|| trimmed.strip_prefix("sqlite:"))
            .unwrap_or(trimmed);

        if path == ":memory:" {
            return Ok(Self::Memory);
        }
        if path.is_empty() || path.contains("://") {
            return Err(DbError::InvalidConnectionString(trimmed.to_string()));
        }
        Ok(Self::File(PathBuf::from(path)))
    }
}

#[cfg(test)]
mod tests {
    use super::{DbError, StoreLocation};
    use std::path::PathBuf;

    #[test]
    fn parse_accepts_memory_forms() {
        assert_eq!(StoreLocation::parse(":memory:").unwrap(), StoreLocation::Memory);
        assert_eq!(
            StoreLocation::parse("sqlite::memory:").unwrap(),
            StoreLocation::Memory
        );
    }

    #[test]
    fn parse_strips_sqlite_scheme() {
        assert_eq!(
            StoreLocation::parse("sqlite://data/tasks.db").unwrap(),
            StoreLocation::File(PathBuf::from("data/tasks.db"))
        );
        assert_eq!(
            StoreLocation::parse(" tasks.sqlite3 ").unwrap(),
            StoreLocation::File(PathBuf::from("tasks.sqlite3"))
        );
    }

    #[test]
    fn parse_rejects_foreign_schemes_and_empty_input() {
        assert!(matches!(
            StoreLocation::parse("mongodb://localhost/tasks"),
            Err(DbError::InvalidConnectionString(_))
        ));
        assert!(matches!(
            StoreLocation::parse("  "),
            Err(DbError::InvalidConnectionString(_))
        ));
    }
}
