//! An in-memory database holding tables of typed columns and rows.
//!
//! Useful to exercise migrations without a database server, every table keeps
//! its columns in declaration order and adding a column fills the existing rows
//! with the column default.

use std::collections::BTreeMap;
use thiserror::Error as TError;

use crate::column::{ColumnSpec, ColumnType, Value};
use crate::migration::{AppliedMigration, SchemaVersion};
use crate::traits::{Alter, Inspect, Migrate, Record};

#[derive(Debug, Clone, PartialEq, TError)]
pub enum MemoryError {
    #[error("table {0} does not exist")]
    NoSuchTable(String),
    #[error("table {0} already exists")]
    TableExists(String),
    #[error("column {column} does not exist on table {table}")]
    NoSuchColumn { table: String, column: String },
    #[error("column {column} already exists on table {table}")]
    ColumnExists { table: String, column: String },
    #[error("column {column} expects {column_type}, got {value}")]
    TypeMismatch {
        column: String,
        column_type: ColumnType,
        value: Value,
    },
    #[error("ledger {table} already records version {version}")]
    DuplicateEntry {
        table: String,
        version: SchemaVersion,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct Column {
    name: String,
    column_type: ColumnType,
    default: Value,
}

#[derive(Debug, Clone, Default)]
struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == column)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    tables: BTreeMap<String, Table>,
    ledgers: BTreeMap<String, Vec<AppliedMigration>>,
}

impl MemoryDatabase {
    pub fn new() -> MemoryDatabase {
        MemoryDatabase::default()
    }

    /// Create a table with the given columns, columns created this way default to `Null`
    pub fn create_table(
        &mut self,
        name: &str,
        columns: &[(&str, ColumnType)],
    ) -> Result<(), MemoryError> {
        if self.tables.contains_key(name) {
            return Err(MemoryError::TableExists(name.to_string()));
        }
        let mut table = Table::default();
        for (column, column_type) in columns {
            if table.position(column).is_some() {
                return Err(MemoryError::ColumnExists {
                    table: name.to_string(),
                    column: column.to_string(),
                });
            }
            table.columns.push(Column {
                name: column.to_string(),
                column_type: *column_type,
                default: Value::Null,
            });
        }
        self.tables.insert(name.to_string(), table);
        Ok(())
    }

    pub fn drop_table(&mut self, name: &str) -> Result<(), MemoryError> {
        self.tables
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| MemoryError::NoSuchTable(name.to_string()))
    }

    /// Insert a row, columns not given take their default value
    pub fn insert(&mut self, table: &str, values: &[(&str, Value)]) -> Result<(), MemoryError> {
        let target = self.table_mut(table)?;
        let mut row: Vec<Value> = target.columns.iter().map(|c| c.default.clone()).collect();

        for (column, value) in values {
            let position = target
                .position(column)
                .ok_or_else(|| MemoryError::NoSuchColumn {
                    table: table.to_string(),
                    column: column.to_string(),
                })?;
            let column_type = target.columns[position].column_type;
            if !column_type.accepts(value) {
                return Err(MemoryError::TypeMismatch {
                    column: format!("{}.{}", table, column),
                    column_type,
                    value: value.clone(),
                });
            }
            row[position] = value.clone().coerce(column_type);
        }

        target.rows.push(row);
        Ok(())
    }

    /// Read the values of `column` for every row, in insertion order
    pub fn select(&self, table: &str, column: &str) -> Result<Vec<Value>, MemoryError> {
        let target = self.table(table)?;
        let position = target
            .position(column)
            .ok_or_else(|| MemoryError::NoSuchColumn {
                table: table.to_string(),
                column: column.to_string(),
            })?;
        Ok(target.rows.iter().map(|row| row[position].clone()).collect())
    }

    /// The column names of `table`, in declaration order
    pub fn columns(&self, table: &str) -> Result<Vec<String>, MemoryError> {
        Ok(self
            .table(table)?
            .columns
            .iter()
            .map(|c| c.name.clone())
            .collect())
    }

    fn table(&self, name: &str) -> Result<&Table, MemoryError> {
        self.tables
            .get(name)
            .ok_or_else(|| MemoryError::NoSuchTable(name.to_string()))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table, MemoryError> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| MemoryError::NoSuchTable(name.to_string()))
    }

    fn ledger_mut(&mut self, name: &str) -> Result<&mut Vec<AppliedMigration>, MemoryError> {
        self.ledgers
            .get_mut(name)
            .ok_or_else(|| MemoryError::NoSuchTable(name.to_string()))
    }
}

impl Inspect for MemoryDatabase {
    type Error = MemoryError;

    fn table_exists(&mut self, table: &str) -> Result<bool, Self::Error> {
        Ok(self.tables.contains_key(table))
    }

    fn column_exists(&mut self, table: &str, column: &str) -> Result<bool, Self::Error> {
        Ok(self
            .tables
            .get(table)
            .map(|t| t.position(column).is_some())
            .unwrap_or(false))
    }
}

impl Alter for MemoryDatabase {
    fn execute_add_column(&mut self, column: &ColumnSpec) -> Result<(), Self::Error> {
        let table = self.table_mut(column.table())?;
        if table.position(column.name()).is_some() {
            return Err(MemoryError::ColumnExists {
                table: column.table().to_string(),
                column: column.name().to_string(),
            });
        }
        table.columns.push(Column {
            name: column.name().to_string(),
            column_type: column.column_type(),
            default: column.default_value().clone(),
        });
        for row in table.rows.iter_mut() {
            row.push(column.default_value().clone());
        }
        Ok(())
    }

    fn execute_drop_column(&mut self, table: &str, column: &str) -> Result<(), Self::Error> {
        let target = self.table_mut(table)?;
        let position = target
            .position(column)
            .ok_or_else(|| MemoryError::NoSuchColumn {
                table: table.to_string(),
                column: column.to_string(),
            })?;
        target.columns.remove(position);
        for row in target.rows.iter_mut() {
            row.remove(position);
        }
        Ok(())
    }
}

impl Record for MemoryDatabase {
    fn assert_ledger_table(&mut self, table_name: &str) -> Result<(), Self::Error> {
        self.ledgers.entry(table_name.to_string()).or_default();
        Ok(())
    }

    fn ledger_entries(&mut self, table_name: &str) -> Result<Vec<AppliedMigration>, Self::Error> {
        Ok(self.ledger_mut(table_name)?.clone())
    }

    fn insert_ledger_entry(
        &mut self,
        table_name: &str,
        entry: &AppliedMigration,
    ) -> Result<(), Self::Error> {
        let ledger = self.ledger_mut(table_name)?;
        if ledger.iter().any(|e| e.version() == entry.version()) {
            return Err(MemoryError::DuplicateEntry {
                table: table_name.to_string(),
                version: entry.version(),
            });
        }
        ledger.push(entry.clone());
        ledger.sort_by_key(AppliedMigration::version);
        Ok(())
    }

    fn delete_ledger_entry(
        &mut self,
        table_name: &str,
        version: SchemaVersion,
    ) -> Result<(), Self::Error> {
        self.ledger_mut(table_name)?
            .retain(|entry| entry.version() != version);
        Ok(())
    }
}

impl Migrate for MemoryDatabase {}
