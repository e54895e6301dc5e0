//! SQLite storage engine for storeplan databases.
//!
//! Implements the [`StorageEngine`](storeplan_db::StorageEngine)
//! collaborator over plain SQLite files: each named database is one
//! `<name>.sqlite` file in the engine's directory, the schema version is
//! kept in `PRAGMA user_version`, and every queued table operation becomes
//! a generated `CREATE TABLE` / `DROP TABLE` statement applied inside a
//! single transaction together with the version bump.
//!
//! # Quick start
//!
//! ```no_run
//! # async fn demo() -> storeplan_db::Result<()> {
//! use storeplan_core::KeySpec;
//! use storeplan_db::Database;
//! use storeplan_sqlite::SqliteEngine;
//!
//! let engine = SqliteEngine::new("databases/");
//! let mut db = Database::named(engine.clone(), "library");
//! db.create_tables([
//!     ("books", KeySpec::field("isbn")),
//!     ("loans", KeySpec::Autoincrement),
//! ])?;
//! db.open().await?;
//!
//! for info in storeplan_db::databases(&engine).await? {
//!     println!("{:?} v{:?}", info.name(), info.version());
//! }
//! # Ok(())
//! # }
//! ```

mod engine;
mod error;
mod schema;

pub use engine::{SqliteConnection, SqliteEngine, SqliteTx};
pub use error::{Result, SqliteError};
pub use schema::{create_table_sql, drop_table_sql};
