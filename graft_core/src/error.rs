use crate::column::{ColumnType, Value};
use crate::migration::{AppliedMigration, SchemaVersion};
use crate::{Migration, Report};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error as TError;

/// An Error occurred during a migration cycle
#[derive(Debug)]
pub struct Error {
    kind: Box<Kind>,
    report: Option<Report>,
}

impl Error {
    /// Instantiate a new Error
    pub(crate) fn new(kind: Kind, report: Option<Report>) -> Error {
        Error {
            kind: Box::new(kind),
            report,
        }
    }

    /// Wrap the error of a migration that failed inside a migration cycle
    pub(crate) fn failed(migration: &Migration, cause: Error, report: Report) -> Error {
        Error::new(
            Kind::Failed(migration.clone(), Box::new(cause)),
            Some(report),
        )
    }

    /// Return the Report of the migration cycle if any
    pub fn report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    /// Return the kind of error occurred
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Return the migration that failed, if the error was raised while running one
    pub fn failed_migration(&self) -> Option<&Migration> {
        match self.kind() {
            Kind::Failed(migration, _) => Some(migration),
            _ => None,
        }
    }

    /// Return the schema error behind this error, looking through a failed migration
    pub fn schema_error(&self) -> Option<&SchemaError> {
        match self.kind() {
            Kind::Schema(err) => Some(err),
            Kind::Failed(_, cause) => cause.schema_error(),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}

/// Structural errors raised when a column change does not match the schema
#[derive(Debug, Clone, PartialEq, Eq, TError)]
pub enum SchemaError {
    #[error("table {0} does not exist")]
    MissingTable(String),
    #[error("column {column} already exists on table {table}")]
    DuplicateColumn { table: String, column: String },
    #[error("column {column} does not exist on table {table}")]
    MissingColumn { table: String, column: String },
}

/// Enum listing possible errors from graft.
#[derive(Debug, TError)]
pub enum Kind {
    /// An Error from an invalid migration name
    #[error("migration name must be in the format V{{number}}__{{name}} or {{number}}_{{name}}")]
    InvalidName,
    /// An Error from an invalid version on a migration name
    #[error("migration version must be a valid integer")]
    InvalidVersion,
    /// An Error from a table or column name that is not a plain identifier
    #[error("{0:?} is not a valid identifier")]
    InvalidIdentifier(String),
    /// An Error from a column default that can't be stored in the column type
    #[error("default {default} of column {column} is not representable as {column_type}")]
    InvalidDefault {
        column: String,
        column_type: ColumnType,
        default: Value,
    },
    /// An Error from two migration files sharing a version
    #[error("migration version {0} is used by more than one file")]
    DuplicateVersion(SchemaVersion),
    /// An Error from a repeated version, migration version numbers must be unique
    #[error("migration {0} is repeated, migration versions must be unique")]
    RepeatedVersion(Migration),
    /// An Error from an divergent version, the applied version is different to the one given to the runner
    #[error("applied migration {0} is different than {1}")]
    DivergentVersion(AppliedMigration, Migration),
    /// An Error from an applied version that is missing from the migrations given to the runner
    #[error("migration {0} is missing from the migration set")]
    MissingVersion(AppliedMigration),
    /// An Error from a migration older than the current version that was never applied
    #[error("migration {0} is older than the current version and was never applied")]
    OutOfOrder(Migration),
    /// An Error from an invalid migrations path location
    #[error("invalid migrations path {0}, {1}")]
    InvalidMigrationPath(PathBuf, std::io::Error),
    /// An Error from an invalid migration file (not UTF-8, not valid TOML etc)
    #[error("invalid migration file at path {0}, {1}")]
    InvalidMigrationFile(PathBuf, String),
    /// An Error parsing graft Config
    #[error("Error parsing config: {0}")]
    ConfigError(String),
    /// An Error from a column change that does not match the schema
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// An Error raised while running a migration inside a migration cycle
    #[error("migration {0} failed")]
    Failed(Migration, #[source] Box<Error>),
    /// An Error from an underlying database connection Error
    #[error("`{0}`, `{1}`")]
    Connection(String, #[source] Box<dyn std::error::Error + Sync + Send>),
}

impl From<SchemaError> for Error {
    fn from(err: SchemaError) -> Error {
        Error::new(Kind::Schema(err), None)
    }
}

// Helper trait for adding custom messages and applied migrations to Connection error's.
pub trait WrapMigrationError<T, E> {
    fn migration_err(self, msg: &str, report: Option<Report>) -> Result<T, Error>;
}

impl<T, E> WrapMigrationError<T, E> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn migration_err(self, msg: &str, report: Option<Report>) -> Result<T, Error> {
        match self {
            Ok(report) => Ok(report),
            Err(err) => Err(Error {
                kind: Box::new(Kind::Connection(msg.into(), Box::new(err))),
                report,
            }),
        }
    }
}
