use crate::column::ColumnSpec;
use crate::error::{SchemaError, WrapMigrationError};
use crate::ledger::MigrationLedger;
use crate::migration::{AppliedMigration, SchemaVersion};
use crate::traits::SchemaObject;
use crate::Error;

/// Side-effect free existence checks, the base of the existence guard
pub trait Inspect {
    type Error: std::error::Error + Send + Sync + 'static;

    fn table_exists(&mut self, table: &str) -> Result<bool, Self::Error>;

    fn column_exists(&mut self, table: &str, column: &str) -> Result<bool, Self::Error>;
}

/// Raw structural changes. Implementations can assume the change was already
/// checked against the schema by [`Migrate`].
pub trait Alter: Inspect {
    fn execute_add_column(&mut self, column: &ColumnSpec) -> Result<(), Self::Error>;

    fn execute_drop_column(&mut self, table: &str, column: &str) -> Result<(), Self::Error>;
}

/// Storage of the migration ledger
pub trait Record: Inspect {
    fn assert_ledger_table(&mut self, table_name: &str) -> Result<(), Self::Error>;

    fn ledger_entries(&mut self, table_name: &str) -> Result<Vec<AppliedMigration>, Self::Error>;

    fn insert_ledger_entry(
        &mut self,
        table_name: &str,
        entry: &AppliedMigration,
    ) -> Result<(), Self::Error>;

    fn delete_ledger_entry(
        &mut self,
        table_name: &str,
        version: SchemaVersion,
    ) -> Result<(), Self::Error>;
}

pub trait Migrate: Alter + Record
where
    Self: Sized,
{
    /// Check whether a table or column exists
    fn exists(&mut self, object: SchemaObject<'_>) -> Result<bool, Error> {
        match object {
            SchemaObject::Table(table) => self
                .table_exists(table)
                .migration_err(&format!("error checking {}", object), None),
            SchemaObject::Column { table, column } => self
                .column_exists(table, column)
                .migration_err(&format!("error checking {}", object), None),
        }
    }

    /// Add a column, fails if the table does not exist or already has the column
    fn add_column(&mut self, column: &ColumnSpec) -> Result<(), Error> {
        if !self.exists(SchemaObject::Table(column.table()))? {
            return Err(SchemaError::MissingTable(column.table().to_string()).into());
        }
        if self.exists(SchemaObject::Column {
            table: column.table(),
            column: column.name(),
        })? {
            return Err(SchemaError::DuplicateColumn {
                table: column.table().to_string(),
                column: column.name().to_string(),
            }
            .into());
        }

        self.execute_add_column(column)
            .migration_err(&format!("error adding column {}", column), None)
    }

    /// Remove a column, fails if the table or the column do not exist
    fn remove_column(&mut self, table: &str, column: &str) -> Result<(), Error> {
        if !self.exists(SchemaObject::Table(table))? {
            return Err(SchemaError::MissingTable(table.to_string()).into());
        }
        if !self.exists(SchemaObject::Column { table, column })? {
            return Err(SchemaError::MissingColumn {
                table: table.to_string(),
                column: column.to_string(),
            }
            .into());
        }

        self.execute_drop_column(table, column)
            .migration_err(&format!("error removing column {}.{}", table, column), None)
    }

    /// Load the migration ledger stored in `table_name`, creating it if needed
    fn load_ledger(&mut self, table_name: &str) -> Result<MigrationLedger, Error> {
        MigrationLedger::load(self, table_name)
    }
}
