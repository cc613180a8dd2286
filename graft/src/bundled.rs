//! Migrations shipped with graft.

use crate::{ColumnSpec, ColumnType, Error, Guard, Migration};

/// Adds `changesets.notified_cia`, an integer defaulting to `0`.
///
/// Reverting it only drops the column when a table named `notified_cia` exists,
/// a changesets schema without such a table keeps the column on rollback.
pub fn extend_changesets_notified_cia() -> Result<Migration, Error> {
    let column = ColumnSpec::new("changesets", "notified_cia", ColumnType::Integer, 0)?;
    Migration::new(
        "2011072600000_extend_changesets_notified_cia",
        column,
        Guard::TableExists("notified_cia".into()),
    )
}
