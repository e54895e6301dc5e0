//! Core types for declarative object-store schema changes.
//!
//! This crate defines the data model shared by every storeplan backend:
//!
//! - [`KeySpec`] / [`KeyPart`] — the caller-facing key notation, including
//!   the autoincrement marker.
//! - [`KeyPath`] — the engine-facing key path with all markers resolved.
//! - [`TableDef`] / [`TableOptions`] — raw table descriptions, normalized
//!   by [`normalize_table`] into a [`TableSpec`].
//! - [`Operation`] / [`OperationLog`] — the FIFO queue of pending schema
//!   changes a database handle accumulates and replays during an upgrade.
//!
//! Everything here is pure bookkeeping; no storage engine is touched.
//!
//! # Example
//!
//! ```
//! use storeplan_core::*;
//!
//! // Describe a table whose compound key embeds the autoincrement marker.
//! let def = TableDef::new("articles").with_key(KeySpec::Sequence(vec![
//!     "year".into(),
//!     "issue".into(),
//!     KeyPart::Autoincrement,
//! ]));
//!
//! // Normalization extracts the marker into the autoincrement flag.
//! let spec = normalize_table(def).unwrap();
//! assert_eq!(
//!     spec.key,
//!     Some(KeyPath::Composite(vec!["year".to_string(), "issue".to_string()]))
//! );
//! assert_eq!(spec.autoincrement, Some(true));
//!
//! // Queue it for the next upgrade.
//! let mut log = OperationLog::new();
//! log.push(Operation::AddTable(spec));
//! assert!(log.has_add_table());
//! ```

mod key;
mod oplist;
mod table;

pub use key::{KeyPart, KeyPath, KeySpec};
pub use oplist::{Operation, OperationLog};
pub use table::{NormalizeError, TableDef, TableOptions, TableSpec, normalize_table};
