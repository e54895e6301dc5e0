//! Schema operation records and the operation log.
//!
//! Every call that describes a schema change produces one [`Operation`]
//! appended to an [`OperationLog`]. The log is strictly first-in first-out:
//! operations replay against the engine in exactly the order they were
//! recorded, so a drop followed by a re-add of the same table name applies
//! as the caller issued it, never reordered or deduplicated.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::table::TableSpec;

/// A single queued schema change.
///
/// Records are immutable once appended: they move into the log by value,
/// and the log only ever hands out shared references (or pops the record
/// for replay).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Create a table with the given normalized description.
    AddTable(TableSpec),
    /// Delete the named table.
    DropTable {
        /// Name of the table to delete.
        name: String,
    },
}

impl Operation {
    /// Returns `true` for table-creation records.
    pub fn is_add_table(&self) -> bool {
        matches!(self, Operation::AddTable(_))
    }
}

/// An ordered queue of pending schema changes, owned by one database
/// handle.
///
/// The log starts empty, grows by one record per recording call, and is
/// drained front-to-back exactly once, during upgrade replay. After a
/// successful replay it is empty again.
///
/// # Examples
///
/// ```
/// use storeplan_core::{Operation, OperationLog, TableSpec};
///
/// let mut log = OperationLog::new();
/// log.push(Operation::DropTable { name: "old".to_string() });
/// log.push(Operation::AddTable(TableSpec {
///     name: "old".to_string(),
///     key: None,
///     autoincrement: None,
/// }));
///
/// assert_eq!(log.len(), 2);
/// assert!(log.has_add_table());
/// assert!(matches!(log.pop_front(), Some(Operation::DropTable { .. })));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OperationLog {
    ops: VecDeque<Operation>,
}

impl OperationLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns `true` when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Appends a record at the back of the queue.
    pub fn push(&mut self, op: Operation) {
        self.ops.push_back(op);
    }

    /// Removes and returns the oldest record, if any.
    pub fn pop_front(&mut self) -> Option<Operation> {
        self.ops.pop_front()
    }

    /// The most recently appended record, if any.
    pub fn last(&self) -> Option<&Operation> {
        self.ops.back()
    }

    /// Iterates the queued records oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.ops.iter()
    }

    /// Returns `true` when at least one table-creation record is queued.
    ///
    /// Opening a database that does not exist yet requires this; a log of
    /// only drops cannot create anything.
    pub fn has_add_table(&self) -> bool {
        self.ops.iter().any(Operation::is_add_table)
    }
}
