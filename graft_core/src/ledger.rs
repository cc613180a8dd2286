use crate::column::is_identifier;
use crate::error::{Kind, WrapMigrationError};
use crate::migration::{AppliedMigration, SchemaVersion};
use crate::traits::DEFAULT_LEDGER_TABLE_NAME;
use crate::{Error, Migrate, Migration};

/// The record of which migrations have been applied, in increasing version order.
///
/// A `MigrationLedger` is loaded from a connection and handed to the [`Runner`](crate::Runner),
/// which keeps it in step with the ledger table as migrations are applied or reverted.
#[derive(Clone, Debug)]
pub struct MigrationLedger {
    table_name: String,
    entries: Vec<AppliedMigration>,
}

impl MigrationLedger {
    /// Load the ledger stored in `table_name`, creating the table if it does not exist.
    ///
    /// `table_name` is interpolated into the ledger queries, so it must be a plain identifier.
    pub fn load<C: Migrate>(conn: &mut C, table_name: &str) -> Result<MigrationLedger, Error> {
        if !is_identifier(table_name) {
            return Err(Error::new(
                Kind::ConfigError(format!(
                    "ledger table name {:?} is not a valid identifier",
                    table_name
                )),
                None,
            ));
        }

        conn.assert_ledger_table(table_name)
            .migration_err("error asserting ledger table", None)?;
        let mut entries = conn
            .ledger_entries(table_name)
            .migration_err("error getting applied migrations", None)?;
        entries.sort_by_key(AppliedMigration::version);

        Ok(MigrationLedger {
            table_name: table_name.to_string(),
            entries,
        })
    }

    /// Load the ledger stored in the default `graft_schema_history` table
    pub fn load_default<C: Migrate>(conn: &mut C) -> Result<MigrationLedger, Error> {
        MigrationLedger::load(conn, DEFAULT_LEDGER_TABLE_NAME)
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// All applied migrations, oldest first
    pub fn entries(&self) -> &[AppliedMigration] {
        &self.entries
    }

    /// The last applied migration, None if there aren't applied migrations
    pub fn current(&self) -> Option<&AppliedMigration> {
        self.entries.last()
    }

    pub fn current_version(&self) -> Option<SchemaVersion> {
        self.current().map(AppliedMigration::version)
    }

    pub fn contains(&self, version: SchemaVersion) -> bool {
        self.entries.iter().any(|entry| entry.version() == version)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record `migration` as applied, its version must be greater than the current one
    pub(crate) fn record<C: Migrate>(
        &mut self,
        conn: &mut C,
        migration: &Migration,
    ) -> Result<(), Error> {
        if let Some(current) = self.current_version() {
            if migration.version() <= current {
                return Err(Error::new(Kind::OutOfOrder(migration.clone()), None));
            }
        }

        let entry = AppliedMigration::from_migration(migration);
        conn.insert_ledger_entry(&self.table_name, &entry)
            .migration_err(&format!("error recording migration {}", migration), None)?;
        self.entries.push(entry);
        Ok(())
    }

    /// Remove the ledger row of `version`
    pub(crate) fn erase<C: Migrate>(
        &mut self,
        conn: &mut C,
        version: SchemaVersion,
    ) -> Result<(), Error> {
        conn.delete_ledger_entry(&self.table_name, version)
            .migration_err(&format!("error erasing migration version {}", version), None)?;
        self.entries.retain(|entry| entry.version() != version);
        Ok(())
    }
}
