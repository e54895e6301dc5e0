//! The storage-engine collaborator seam.
//!
//! A [`StorageEngine`] manages a namespace of versioned databases. Engine
//! operations (open, delete, enumerate) are asynchronous; the schema
//! transaction handed to the upgrade hook is synchronous, mirroring engines
//! where table creation inside a version-change transaction does not
//! suspend.
//!
//! The engine's contract around [`open`](StorageEngine::open):
//!
//! - the upgrade hook runs exactly when the requested version exceeds the
//!   stored one, or the database is newly created (stored version `0`);
//! - an error returned from the hook aborts the upgrade — no partial
//!   schema change may be committed — and fails the open with that error;
//! - requesting a version lower than the stored one fails the open;
//! - engine-native errors (creating a table that exists, deleting one that
//!   does not) are reported as-is, never masked.

use serde::{Deserialize, Serialize};
use storeplan_core::KeyPath;

/// Name and stored version of one existing database.
///
/// Returned by [`StorageEngine::databases`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInfo {
    /// Database name.
    pub name: String,
    /// Currently stored schema version (at least 1 for an existing
    /// database).
    pub version: u32,
}

/// Version pair passed to the upgrade hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpgradeEvent {
    /// Previously stored version; `0` when the database did not exist.
    pub old_version: u32,
    /// Version being upgraded to.
    pub new_version: u32,
}

/// The hook invoked inside a schema-upgrade transaction.
pub type UpgradeHook<'a, Tx, E> =
    &'a mut dyn FnMut(&mut Tx, &UpgradeEvent) -> std::result::Result<(), E>;

/// An asynchronous engine hosting named, versioned key-value databases.
#[allow(async_fn_in_trait)]
pub trait StorageEngine {
    /// Live connection to one database.
    type Connection: Connection;
    /// Schema transaction handed to the upgrade hook.
    type Tx: SchemaTx<Error = Self::Error>;
    /// Engine-native error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Opens (creating or upgrading as needed) the named database at the
    /// given version.
    async fn open(
        &self,
        name: &str,
        version: u32,
        upgrade: UpgradeHook<'_, Self::Tx, Self::Error>,
    ) -> std::result::Result<Self::Connection, Self::Error>;

    /// Deletes the named database. Ensures absence: deleting a database
    /// that does not exist is not an error.
    async fn delete_database(&self, name: &str) -> std::result::Result<(), Self::Error>;

    /// Enumerates all existing databases.
    async fn databases(&self) -> std::result::Result<Vec<DatabaseInfo>, Self::Error>;
}

/// A live connection to one database.
pub trait Connection {
    /// Name of the connected database.
    fn name(&self) -> &str;
    /// Version the database was opened at.
    fn version(&self) -> u32;
    /// Releases the connection. Idempotent.
    fn close(&mut self);
}

/// Schema-level operations available inside an upgrade transaction.
pub trait SchemaTx {
    /// Engine-native error type.
    type Error;

    /// Creates a table with the given key path and autoincrement flag.
    fn create_table(
        &mut self,
        name: &str,
        key_path: Option<&KeyPath>,
        autoincrement: bool,
    ) -> std::result::Result<(), Self::Error>;

    /// Deletes the named table.
    fn delete_table(&mut self, name: &str) -> std::result::Result<(), Self::Error>;
}
