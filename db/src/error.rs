//! Error types for database handle operations.
//!
//! Covers the four failure families: normalization contradictions, state
//! preconditions (recording while connected, opening twice), creation
//! policy (a new database must define at least one table), and engine
//! failures, which are always wrapped with the engine's native error
//! preserved as the cause.

use storeplan_core::NormalizeError;
use thiserror::Error;

/// Errors that can occur on a database handle.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Table description normalization failure (for example, a key shape
    /// that implies autoincrement combined with an explicit `false`).
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    /// The operation requires no live connection, but one is attached.
    #[error("connection is already open")]
    AlreadyOpen,

    /// The operation requires a live connection, but none is attached.
    #[error("connection is not open")]
    NotOpen,

    /// The handle has no database name to open or delete.
    #[error("database name is not set")]
    MissingName,

    /// Requested version is outside the engine's accepted range.
    #[error("invalid database version {0}: versions start at 1")]
    InvalidVersion(u32),

    /// Opening a database that does not exist yet while the operation log
    /// holds no table-creation record.
    #[error("cannot create database '{0}' with no tables")]
    CannotCreateWithoutTables(String),

    /// Failure reported by the storage engine, preserved as the cause.
    #[error("storage engine error: {0}")]
    Engine(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl DatabaseError {
    /// Wraps an engine-native error without losing it.
    pub fn engine(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        DatabaseError::Engine(Box::new(err))
    }
}

/// Convenience alias for results with [`DatabaseError`].
pub type Result<T> = std::result::Result<T, DatabaseError>;
