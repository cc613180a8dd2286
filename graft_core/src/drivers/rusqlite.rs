use crate::column::ColumnSpec;
use crate::migration::{AppliedMigration, SchemaVersion};
use crate::traits::{
    Alter, Inspect, Migrate, Record, ASSERT_LEDGER_TABLE_QUERY, DELETE_LEDGER_ENTRY_QUERY,
    GET_LEDGER_ENTRIES_QUERY, INSERT_LEDGER_ENTRY_QUERY,
};

use rusqlite::types::Type;
use rusqlite::{params, Connection as RqlConnection, Error as RqlError};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

fn ledger_query(query: &str, table_name: &str) -> String {
    query.replace("%LEDGER_TABLE_NAME%", &format!("\"{}\"", table_name))
}

fn query_ledger_entries(
    conn: &RqlConnection,
    query: &str,
) -> Result<Vec<AppliedMigration>, RqlError> {
    let mut stmt = conn.prepare(query)?;
    let mut rows = stmt.query([])?;
    let mut applied = Vec::new();
    while let Some(row) = rows.next()? {
        let version: SchemaVersion = row.get(0)?;
        let applied_on: String = row.get(2)?;
        let applied_on = OffsetDateTime::parse(&applied_on, &Rfc3339)
            .map_err(|err| RqlError::FromSqlConversionFailure(2, Type::Text, Box::new(err)))?;

        let checksum: String = row.get(3)?;
        let checksum = checksum
            .parse::<u64>()
            .map_err(|err| RqlError::FromSqlConversionFailure(3, Type::Text, Box::new(err)))?;

        applied.push(AppliedMigration::new(
            version,
            row.get(1)?,
            applied_on,
            checksum,
        ));
    }
    Ok(applied)
}

impl Inspect for RqlConnection {
    type Error = RqlError;

    fn table_exists(&mut self, table: &str) -> Result<bool, Self::Error> {
        let count: i64 = self.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn column_exists(&mut self, table: &str, column: &str) -> Result<bool, Self::Error> {
        let count: i64 = self.query_row(
            "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
            params![table, column],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

impl Alter for RqlConnection {
    fn execute_add_column(&mut self, column: &ColumnSpec) -> Result<(), Self::Error> {
        let query = format!(
            "ALTER TABLE \"{}\" ADD COLUMN \"{}\" {} NOT NULL DEFAULT {}",
            column.table(),
            column.name(),
            column.column_type(),
            column.default_value().to_sql_literal()
        );
        self.execute_batch(&query)
    }

    fn execute_drop_column(&mut self, table: &str, column: &str) -> Result<(), Self::Error> {
        let query = format!("ALTER TABLE \"{}\" DROP COLUMN \"{}\"", table, column);
        self.execute_batch(&query)
    }
}

impl Record for RqlConnection {
    fn assert_ledger_table(&mut self, table_name: &str) -> Result<(), Self::Error> {
        self.execute_batch(&ledger_query(ASSERT_LEDGER_TABLE_QUERY, table_name))
    }

    fn ledger_entries(&mut self, table_name: &str) -> Result<Vec<AppliedMigration>, Self::Error> {
        query_ledger_entries(self, &ledger_query(GET_LEDGER_ENTRIES_QUERY, table_name))
    }

    fn insert_ledger_entry(
        &mut self,
        table_name: &str,
        entry: &AppliedMigration,
    ) -> Result<(), Self::Error> {
        let applied_on = entry
            .applied_on()
            .format(&Rfc3339)
            .map_err(|err| RqlError::ToSqlConversionFailure(Box::new(err)))?;
        self.execute(
            &ledger_query(INSERT_LEDGER_ENTRY_QUERY, table_name),
            params![
                entry.version(),
                entry.name(),
                applied_on,
                entry.checksum().to_string()
            ],
        )?;
        Ok(())
    }

    fn delete_ledger_entry(
        &mut self,
        table_name: &str,
        version: SchemaVersion,
    ) -> Result<(), Self::Error> {
        self.execute(
            &ledger_query(DELETE_LEDGER_ENTRY_QUERY, table_name),
            params![version],
        )?;
        Ok(())
    }
}

impl Migrate for RqlConnection {}
