pub mod column;
pub mod config;
mod drivers;
pub mod error;
mod ledger;
mod migration;
mod runner;
pub mod traits;
mod util;

pub use crate::column::{ColumnSpec, ColumnType, Value};
pub use crate::drivers::memory::{MemoryDatabase, MemoryError};
pub use crate::error::{Error, SchemaError};
pub use crate::ledger::MigrationLedger;
pub use crate::migration::{
    AppliedMigration, Change, Direction, Guard, Migration, Outcome, SchemaVersion,
};
pub use crate::runner::{Report, RollbackTarget, RunIterator, Runner, Target};
pub use crate::traits::{Migrate, SchemaObject};
pub use crate::util::{
    find_migration_files, load_migration_files, parse_migration, parse_migration_name,
};

#[cfg(feature = "rusqlite")]
pub use rusqlite;
