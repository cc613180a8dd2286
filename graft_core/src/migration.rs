use serde::{Deserialize, Serialize};
use siphasher::sip::SipHasher13;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use time::OffsetDateTime;

use crate::column::ColumnSpec;
use crate::traits::{Migrate, SchemaObject};
use crate::util::parse_migration_name;
use crate::Error;

/// The type of a migration version.
/// Wide enough for timestamp versions such as `2011072600000`.
pub type SchemaVersion = i64;

/// The direction a migration is run in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Backward => write!(f, "backward"),
        }
    }
}

/// The existence check consulted before a column is removed
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Guard {
    /// Always remove, fails if the column is missing
    Unguarded,
    /// Remove only if the column being removed exists
    #[default]
    ColumnExists,
    /// Remove only if the named table exists
    TableExists(String),
}

impl Guard {
    /// Evaluate the guard for the removal of `column`
    pub fn permits<C: Migrate>(&self, conn: &mut C, column: &ColumnSpec) -> Result<bool, Error> {
        match self {
            Guard::Unguarded => Ok(true),
            Guard::ColumnExists => conn.exists(SchemaObject::Column {
                table: column.table(),
                column: column.name(),
            }),
            Guard::TableExists(table) => conn.exists(SchemaObject::Table(table)),
        }
    }
}

impl Hash for Guard {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Guard::Unguarded => write!(f, "unguarded"),
            Guard::ColumnExists => write!(f, "column_exists"),
            Guard::TableExists(table) => write!(f, "table_exists({})", table),
        }
    }
}

/// A single structural change, derived from a migration and a [`Direction`]
#[derive(Clone, Copy, Debug)]
pub enum Change<'a> {
    AddColumn(&'a ColumnSpec),
    RemoveColumn {
        column: &'a ColumnSpec,
        guard: &'a Guard,
    },
}

/// What running a [`Change`] did to the schema
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Added,
    Removed,
    /// The removal guard did not permit the change, the schema was left untouched
    Skipped,
}

impl Change<'_> {
    pub fn execute<C: Migrate>(self, conn: &mut C) -> Result<Outcome, Error> {
        match self {
            Change::AddColumn(column) => {
                conn.add_column(column)?;
                Ok(Outcome::Added)
            }
            Change::RemoveColumn { column, guard } => {
                if !guard.permits(conn, column)? {
                    log::warn!(
                        "guard {} not satisfied, leaving column {}.{} in place",
                        guard,
                        column.table(),
                        column.name()
                    );
                    return Ok(Outcome::Skipped);
                }
                conn.remove_column(column.table(), column.name())?;
                Ok(Outcome::Removed)
            }
        }
    }
}

/// Represents a migration unit: one column that is added going forward
/// and removed going backward, identified by its version.
#[derive(Clone, Debug)]
pub struct Migration {
    name: String,
    version: SchemaVersion,
    column: ColumnSpec,
    guard: Guard,
    checksum: u64,
}

impl Migration {
    /// Create a migration, name and version are parsed from the input_name,
    /// which must be named in the format V{1}__{2} or {1}_{2} where {1} represents the migration version and {2} the name.
    pub fn new(input_name: &str, column: ColumnSpec, guard: Guard) -> Result<Migration, Error> {
        let (version, name) = parse_migration_name(input_name)?;

        let mut hasher = SipHasher13::new();
        name.hash(&mut hasher);
        version.hash(&mut hasher);
        column.hash(&mut hasher);
        guard.hash(&mut hasher);
        let checksum = hasher.finish();

        Ok(Migration {
            name,
            version,
            column,
            guard,
            checksum,
        })
    }

    /// The structural change this migration makes when run in `direction`
    pub fn change(&self, direction: Direction) -> Change<'_> {
        match direction {
            Direction::Forward => Change::AddColumn(&self.column),
            Direction::Backward => Change::RemoveColumn {
                column: &self.column,
                guard: &self.guard,
            },
        }
    }

    pub fn run<C: Migrate>(&self, direction: Direction, conn: &mut C) -> Result<Outcome, Error> {
        self.change(direction).execute(conn)
    }

    /// Add the column. Fails with a [`SchemaError`](crate::SchemaError) if it is already there.
    pub fn apply<C: Migrate>(&self, conn: &mut C) -> Result<(), Error> {
        self.run(Direction::Forward, conn).map(|_| ())
    }

    /// Remove the column if the guard permits it
    pub fn revert<C: Migrate>(&self, conn: &mut C) -> Result<Outcome, Error> {
        self.run(Direction::Backward, conn)
    }

    /// Get the Migration version
    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    /// Get the Migration name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column(&self) -> &ColumnSpec {
        &self.column
    }

    pub fn guard(&self) -> &Guard {
        &self.guard
    }

    /// Get the Migration checksum. Checksum is formed from the name, version, column and guard of the Migration
    pub fn checksum(&self) -> u64 {
        self.checksum
    }
}

impl fmt::Display for Migration {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "V{}__{}", self.version, self.name)
    }
}

impl Eq for Migration {}

impl PartialEq for Migration {
    fn eq(&self, other: &Migration) -> bool {
        self.version == other.version
            && self.name == other.name
            && self.checksum() == other.checksum()
    }
}

impl Ord for Migration {
    fn cmp(&self, other: &Migration) -> Ordering {
        self.version.cmp(&other.version)
    }
}

impl PartialOrd for Migration {
    fn partial_cmp(&self, other: &Migration) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A row of the migration ledger
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppliedMigration {
    name: String,
    version: SchemaVersion,
    checksum: u64,
    applied_on: OffsetDateTime,
}

impl AppliedMigration {
    pub fn new(
        version: SchemaVersion,
        name: String,
        applied_on: OffsetDateTime,
        checksum: u64,
    ) -> AppliedMigration {
        AppliedMigration {
            name,
            version,
            checksum,
            applied_on,
        }
    }

    pub(crate) fn from_migration(migration: &Migration) -> AppliedMigration {
        AppliedMigration::new(
            migration.version(),
            migration.name().to_string(),
            OffsetDateTime::now_utc(),
            migration.checksum(),
        )
    }

    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn checksum(&self) -> u64 {
        self.checksum
    }

    pub fn applied_on(&self) -> &OffsetDateTime {
        &self.applied_on
    }

    /// True if `migration` is the migration this row was recorded for
    pub fn matches(&self, migration: &Migration) -> bool {
        self.version == migration.version()
            && self.name == migration.name()
            && self.checksum == migration.checksum()
    }
}

impl fmt::Display for AppliedMigration {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "V{}__{}", self.version, self.name)
    }
}
