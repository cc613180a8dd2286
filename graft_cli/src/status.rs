use std::fmt;

use graft_core::config::ConfigDbType;
use graft_core::{Migration, MigrationLedger};

use crate::cli::StatusArgs;
use crate::{config, util};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Applied,
    Pending,
    /// applied with a different definition than the one on disk
    Divergent,
    /// applied but not found on disk
    Missing,
    /// older than the current version and never applied
    OutOfOrder,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            State::Applied => "applied",
            State::Pending => "pending",
            State::Divergent => "divergent",
            State::Missing => "missing",
            State::OutOfOrder => "out of order",
        };
        write!(f, "{:<12}", state)
    }
}

pub fn handle_status_command(args: StatusArgs) -> anyhow::Result<()> {
    let database = &args.database;
    let migrations = util::load_migrations(&database.path)?;
    let mut config = config(&database.config, database.env_var.as_deref())?;

    match config.db_type() {
        ConfigDbType::Sqlite => {
            cfg_if::cfg_if! {
                if #[cfg(feature = "sqlite")] {
                    let ledger = MigrationLedger::load(&mut config, &database.table_name)?;
                    for (state, name) in statuses(&ledger, &migrations) {
                        println!("{} {}", state, name);
                    }
                    match ledger.current() {
                        Some(current) => println!("current version: {}", current.version()),
                        None => println!("current version: none"),
                    }
                } else {
                    anyhow::bail!("tried to read the status of a sqlite database, but sqlite feature was not enabled!");
                }
            }
        }
    }

    Ok(())
}

// every ledger row and every migration on disk, ordered by version
fn statuses(ledger: &MigrationLedger, migrations: &[Migration]) -> Vec<(State, String)> {
    let mut lines = Vec::new();

    for entry in ledger.entries() {
        let state = match migrations.iter().find(|m| m.version() == entry.version()) {
            Some(migration) if entry.matches(migration) => State::Applied,
            Some(_) => State::Divergent,
            None => State::Missing,
        };
        lines.push((entry.version(), state, entry.to_string()));
    }

    let current = ledger.current_version();
    for migration in migrations.iter().filter(|m| !ledger.contains(m.version())) {
        let state = match current {
            Some(current) if current >= migration.version() => State::OutOfOrder,
            _ => State::Pending,
        };
        lines.push((migration.version(), state, migration.to_string()));
    }

    lines.sort_by_key(|(version, _, _)| *version);
    lines
        .into_iter()
        .map(|(_, state, name)| (state, name))
        .collect()
}
