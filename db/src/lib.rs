//! Declarative schema changes for versioned key-value databases.
//!
//! A [`Database`] handle accumulates table creations and drops as an
//! ordered operation log while no connection is attached, then replays the
//! whole log inside the storage engine's upgrade transaction when the
//! database is opened. The engine itself is pluggable through the
//! [`StorageEngine`] trait; `storeplan-sqlite` ships a file-backed
//! implementation.
//!
//! # Quick start
//!
//! ```no_run
//! # async fn demo<E: storeplan_db::StorageEngine + Clone>(engine: E) -> storeplan_db::Result<()> {
//! use storeplan_core::KeySpec;
//! use storeplan_db::Database;
//!
//! // Describe the schema; nothing touches the engine yet.
//! let mut db = Database::named(engine.clone(), "library");
//! db.create_tables([
//!     ("books", KeySpec::field("isbn")),
//!     ("loans", KeySpec::Autoincrement),
//! ])?;
//!
//! // Opening replays the queued operations in one upgrade transaction.
//! db.open().await?;
//! db.close();
//!
//! // Enumerate and clean up.
//! for handle in storeplan_db::databases(&engine).await? {
//!     println!("{:?} v{:?}", handle.name(), handle.version());
//! }
//! storeplan_db::remove_database(&engine, "library").await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Ordering and failure model
//!
//! Recording is synchronous and strictly ordered; replay drains the log
//! FIFO, so a drop and a later re-add of the same table apply exactly as
//! issued. Errors are never retried or logged away: precondition and
//! contradiction failures surface synchronously, engine failures come back
//! through the returned futures with the engine's own error as the cause.

mod engine;
mod error;
mod handle;
mod replay;

pub use engine::{Connection, DatabaseInfo, SchemaTx, StorageEngine, UpgradeEvent, UpgradeHook};
pub use error::{DatabaseError, Result};
pub use handle::{Database, databases, open, remove_database};
