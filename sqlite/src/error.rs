//! Error types for the SQLite storage engine.

use thiserror::Error;

/// Errors that can occur inside the SQLite engine.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// SQLite operation failure.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Filesystem failure while managing database files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A database, table, or field name is not a usable identifier.
    #[error("invalid identifier '{0}': use letters, digits, and underscores, not starting with a digit")]
    InvalidName(String),

    /// Creating a table that already exists.
    #[error("table '{0}' already exists")]
    TableExists(String),

    /// Deleting a table that does not exist.
    #[error("no such table '{0}'")]
    NoSuchTable(String),

    /// Engine-generated keys cannot be combined with a composite key path.
    #[error("table '{0}': autoincrement cannot be combined with a composite key path")]
    AutoincrementCompositeKey(String),

    /// Opening at a version below the stored one.
    #[error("requested version {requested} is below stored version {current}")]
    VersionTooLow {
        /// Version asked for.
        requested: u32,
        /// Version currently stored.
        current: u32,
    },

    /// Using a connection after it was closed.
    #[error("connection is closed")]
    Closed,
}

/// Convenience alias for results with [`SqliteError`].
pub type Result<T> = std::result::Result<T, SqliteError>;
