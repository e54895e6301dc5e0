//! Upgrade replay: draining the operation log against a schema
//! transaction.

use storeplan_core::{Operation, OperationLog};
use tracing::trace;

use crate::engine::SchemaTx;

/// Applies every queued operation, oldest first, against a live schema
/// transaction.
///
/// Each record is removed from the log as it is processed, so after a
/// fully successful replay the log is empty. On the first engine error the
/// drain stops: the failing record has been consumed, the remaining ones
/// stay queued, and the error propagates to fail the surrounding open.
///
/// No validation happens here — every record was checked when it was
/// recorded.
pub(crate) fn apply<T: SchemaTx>(tx: &mut T, log: &mut OperationLog) -> Result<(), T::Error> {
    while let Some(op) = log.pop_front() {
        match op {
            Operation::AddTable(spec) => {
                trace!(table = %spec.name, "creating table");
                tx.create_table(
                    &spec.name,
                    spec.key.as_ref(),
                    spec.autoincrement.unwrap_or(false),
                )?;
            }
            Operation::DropTable { name } => {
                trace!(table = %name, "deleting table");
                tx.delete_table(&name)?;
            }
        }
    }
    Ok(())
}
