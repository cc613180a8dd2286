//! Defines the CLI application

use std::num::NonZeroU32;
use std::path::PathBuf;

use clap::{Args, Parser, ValueEnum};
use graft_core::ColumnType;

#[derive(Parser)]
#[command(version)]
pub enum Cli {
    /// Run the graft setup hooks to generate the config file
    Setup(SetupArgs),

    /// Apply the pending migrations
    Migrate(MigrateArgs),

    /// Revert applied migrations, by default only the last one
    Rollback(RollbackArgs),

    /// List applied and pending migrations
    Status(StatusArgs),

    /// Generate a new migration file
    Generate(GenerateArgs),
}

#[derive(Args)]
pub struct SetupArgs {
    /// Where to write the config file
    #[arg(short, long, default_value = "./graft.toml")]
    pub config: PathBuf,
}

/// Arguments shared by every command that talks to the database
#[derive(Args)]
pub struct DatabaseArgs {
    /// Config file location
    #[arg(short, long, env = "GRAFT_CONFIG", default_value = "./graft.toml")]
    pub config: PathBuf,

    /// Migrations directory path
    #[arg(short, long, default_value = "./migrations")]
    pub path: PathBuf,

    /// Load the database url from the given environment variable instead of the config file
    #[arg(short, long)]
    pub env_var: Option<String>,

    /// Set the ledger table name
    #[arg(long, default_value = "graft_schema_history")]
    pub table_name: String,

    /// Don't abort if divergent migrations are found
    #[arg(short, long)]
    pub divergent: bool,

    /// Don't abort if missing migrations are found
    #[arg(short, long)]
    pub missing: bool,
}

#[derive(Args)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,

    /// Do not actually run migrations, just record them on the ledger
    #[arg(short, long)]
    pub fake: bool,

    /// Migrate up to the specified target version
    #[arg(short, long)]
    pub target: Option<i64>,
}

#[derive(Args)]
pub struct RollbackArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,

    /// Revert every applied migration with a version greater than the specified one
    #[arg(short, long)]
    pub target: Option<i64>,

    /// Number of migrations to revert
    #[arg(long)]
    pub count: Option<NonZeroU32>,

    /// Revert every applied migration
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Name of the migration, used in its file name
    pub name: String,

    /// Migrations directory path
    #[arg(short, long, default_value = "./migrations")]
    pub path: PathBuf,

    /// Table the column is added to
    #[arg(long)]
    pub table: String,

    /// Name of the column
    #[arg(long)]
    pub column: String,

    /// Type of the column
    #[arg(long = "type", value_enum, default_value_t = ColumnKind::Integer)]
    pub column_type: ColumnKind,

    /// Default value of the column, defaults to the zero value of its type
    #[arg(long)]
    pub default: Option<String>,

    /// Only drop the column on rollback if this table exists
    #[arg(long, conflicts_with = "unguarded")]
    pub guard_table: Option<String>,

    /// Drop the column on rollback without checking it exists
    #[arg(long)]
    pub unguarded: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ColumnKind {
    Integer,
    Text,
    Boolean,
    Real,
}

impl From<ColumnKind> for ColumnType {
    fn from(kind: ColumnKind) -> ColumnType {
        match kind {
            ColumnKind::Integer => ColumnType::Integer,
            ColumnKind::Text => ColumnType::Text,
            ColumnKind::Boolean => ColumnType::Boolean,
            ColumnKind::Real => ColumnType::Real,
        }
    }
}
