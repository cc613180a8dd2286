pub mod sync;

use std::fmt;

use crate::migration::AppliedMigration;
use crate::{error::Kind, Error, Migration};

pub use self::sync::{Alter, Inspect, Migrate, Record};

/// A structural element whose existence can be checked
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaObject<'a> {
    Table(&'a str),
    Column { table: &'a str, column: &'a str },
}

impl fmt::Display for SchemaObject<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaObject::Table(table) => write!(f, "table {}", table),
            SchemaObject::Column { table, column } => write!(f, "column {}.{}", table, column),
        }
    }
}

// Verifies applied and to be applied migrations returning Error if:
// - `abort_divergent` is true and there are applied migrations with a different name and checksum but same version as a migration to be applied.
// - `abort_missing` is true and there are applied migrations that are missing from the migration set,
//   or migrations older than the current version that were never applied
// - there are repeated migrations with the same version to be applied
pub(crate) fn verify_migrations(
    applied: &[AppliedMigration],
    mut migrations: Vec<Migration>,
    abort_divergent: bool,
    abort_missing: bool,
) -> Result<Vec<Migration>, Error> {
    migrations.sort();

    if let Some(pair) = migrations
        .windows(2)
        .find(|pair| pair[0].version() == pair[1].version())
    {
        return Err(Error::new(Kind::RepeatedVersion(pair[1].clone()), None));
    }

    for app in applied.iter() {
        // iterate applied migrations on the ledger and assert all of them
        // exist on the migration set and have the same checksum
        match migrations.iter().find(|m| m.version() == app.version()) {
            None => {
                if abort_missing {
                    return Err(Error::new(Kind::MissingVersion(app.clone()), None));
                } else {
                    log::error!(target: "graft_core::traits::missing", "migration {} is missing from the migration set", app);
                }
            }
            Some(migration) => {
                if !app.matches(migration) {
                    if abort_divergent {
                        return Err(Error::new(
                            Kind::DivergentVersion(app.clone(), migration.clone()),
                            None,
                        ));
                    } else {
                        log::error!(
                            target: "graft_core::traits::divergent",
                            "applied migration {} is different than {}",
                            app,
                            migration
                        );
                    }
                }
            }
        }
    }

    let current = match applied.last() {
        Some(last) => {
            log::info!("current version: {}", last.version());
            Some(last.version())
        }
        None => {
            log::info!("migration ledger is empty, going to apply all migrations");
            None
        }
    };

    let mut to_be_applied = Vec::new();
    // select to be applied all migrations with version greater than current,
    // the ones below it that were never applied are reported as out of order
    for migration in migrations.into_iter() {
        if applied.iter().any(|app| app.version() == migration.version()) {
            continue;
        }
        match current {
            Some(current) if current >= migration.version() => {
                if abort_missing {
                    return Err(Error::new(Kind::OutOfOrder(migration), None));
                } else {
                    log::error!(target: "graft_core::traits::missing", "found migration {} older than the current version, not applied", migration);
                }
            }
            _ => to_be_applied.push(migration),
        }
    }

    Ok(to_be_applied)
}

pub(crate) const ASSERT_LEDGER_TABLE_QUERY: &str = "CREATE TABLE IF NOT EXISTS %LEDGER_TABLE_NAME%(
             version INTEGER PRIMARY KEY,
             name TEXT NOT NULL,
             applied_on TEXT NOT NULL,
             checksum TEXT NOT NULL);";

pub(crate) const GET_LEDGER_ENTRIES_QUERY: &str = "SELECT version, name, applied_on, checksum \
    FROM %LEDGER_TABLE_NAME% ORDER BY version ASC;";

pub(crate) const INSERT_LEDGER_ENTRY_QUERY: &str =
    "INSERT INTO %LEDGER_TABLE_NAME% (version, name, applied_on, checksum) VALUES (?1, ?2, ?3, ?4)";

pub(crate) const DELETE_LEDGER_ENTRY_QUERY: &str =
    "DELETE FROM %LEDGER_TABLE_NAME% WHERE version = ?1";

pub(crate) const DEFAULT_LEDGER_TABLE_NAME: &str = "graft_schema_history";
