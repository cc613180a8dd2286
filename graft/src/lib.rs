/*!
Reversible column migrations for Rust.

`graft` runs migrations that each add one column to a table going forward and remove it going backward.
Migrations are run on a provided database connection, together with the [`MigrationLedger`] that records which of them have been applied.\
currently [`Rusqlite`](https://crates.io/crates/rusqlite) and an in-memory database ([`MemoryDatabase`]) are supported.

## Usage

- Migrations can be defined in .toml files or built in code with [`Migration::new`].
- Migrations must be named in the format `V{1}__{2}` or `{1}_{2}` where `{1}` represents the migration version and `{2}` the name.
- Removing a column is guarded by an existence check, see [`Guard`].
- Migrations can be run either from Rust code with a [`Runner`], or via `graft_cli`.

### Example
```rust
use graft::{bundled, ColumnType, MemoryDatabase, MigrationLedger, Runner, Value};

let mut db = MemoryDatabase::new();
db.create_table("changesets", &[("id", ColumnType::Integer)]).unwrap();
db.insert("changesets", &[("id", Value::Integer(1))]).unwrap();

let mut ledger = MigrationLedger::load_default(&mut db).unwrap();
let runner = Runner::new(&[bundled::extend_changesets_notified_cia().unwrap()]);
runner.run(&mut db, &mut ledger).unwrap();

assert_eq!(vec![Value::Integer(0)], db.select("changesets", "notified_cia").unwrap());
assert_eq!(Some(2011072600000), ledger.current_version());
```
*/

pub mod bundled;

pub use graft_core::config;
pub use graft_core::error::{Kind, WrapMigrationError};
pub use graft_core::traits;
pub use graft_core::{
    find_migration_files, load_migration_files, parse_migration, parse_migration_name,
    AppliedMigration, Change, ColumnSpec, ColumnType, Direction, Error, Guard, MemoryDatabase,
    MemoryError, Migrate, Migration, MigrationLedger, Outcome, Report, RollbackTarget,
    RunIterator, Runner, SchemaError, SchemaObject, SchemaVersion, Target, Value,
};

#[cfg(feature = "rusqlite")]
pub use graft_core::rusqlite;
