use crate::column::ColumnSpec;
use crate::config::{Config, ConfigDbType};
use crate::migration::{AppliedMigration, SchemaVersion};
use crate::traits::{Alter, Inspect, Migrate, Record};
use crate::Error;

#[cfg(feature = "rusqlite")]
use crate::error::WrapMigrationError;

// opens a connection for the configured database and runs $op on it,
// this is written as macro so that we don't have to deal with type signatures
macro_rules! with_connection {
    ($config:ident, $op: expr) => {
        match $config.db_type() {
            ConfigDbType::Sqlite => {
                cfg_if::cfg_if! {
                    if #[cfg(feature = "rusqlite")] {
                        //may have been checked earlier on config parsing, even if not let it fail with a Rusqlite db file not found error
                        let path = $config.db_path().map(|p| p.to_path_buf()).unwrap_or_default();
                        let mut conn = rusqlite::Connection::open_with_flags(path, rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE)
                            .migration_err("could not open database", None)?;
                        $op(&mut conn).migration_err("error running sqlite operation", None)
                    } else {
                        Err(Error::new(
                            crate::error::Kind::ConfigError("tried to migrate from config for a sqlite database, but feature rusqlite not enabled!".into()),
                            None,
                        ))
                    }
                }
            }
        }
    };
}

impl Inspect for Config {
    type Error = Error;

    fn table_exists(&mut self, table: &str) -> Result<bool, Self::Error> {
        with_connection!(self, |conn: &mut _| Inspect::table_exists(conn, table))
    }

    fn column_exists(&mut self, table: &str, column: &str) -> Result<bool, Self::Error> {
        with_connection!(self, |conn: &mut _| Inspect::column_exists(conn, table, column))
    }
}

impl Alter for Config {
    fn execute_add_column(&mut self, column: &ColumnSpec) -> Result<(), Self::Error> {
        with_connection!(self, |conn: &mut _| Alter::execute_add_column(conn, column))
    }

    fn execute_drop_column(&mut self, table: &str, column: &str) -> Result<(), Self::Error> {
        with_connection!(self, |conn: &mut _| Alter::execute_drop_column(
            conn, table, column
        ))
    }
}

impl Record for Config {
    fn assert_ledger_table(&mut self, table_name: &str) -> Result<(), Self::Error> {
        with_connection!(self, |conn: &mut _| Record::assert_ledger_table(
            conn, table_name
        ))
    }

    fn ledger_entries(&mut self, table_name: &str) -> Result<Vec<AppliedMigration>, Self::Error> {
        with_connection!(self, |conn: &mut _| Record::ledger_entries(conn, table_name))
    }

    fn insert_ledger_entry(
        &mut self,
        table_name: &str,
        entry: &AppliedMigration,
    ) -> Result<(), Self::Error> {
        with_connection!(self, |conn: &mut _| Record::insert_ledger_entry(
            conn, table_name, entry
        ))
    }

    fn delete_ledger_entry(
        &mut self,
        table_name: &str,
        version: SchemaVersion,
    ) -> Result<(), Self::Error> {
        with_connection!(self, |conn: &mut _| Record::delete_ledger_entry(
            conn, table_name, version
        ))
    }
}

impl Migrate for Config {}
