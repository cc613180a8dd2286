use graft_core::config::ConfigDbType;
use graft_core::{MigrationLedger, Runner, Target};

use crate::cli::{DatabaseArgs, MigrateArgs};
use crate::{config, util};

pub fn handle_migration_command(args: MigrateArgs) -> anyhow::Result<()> {
    let target = match (args.fake, args.target) {
        (true, Some(version)) => Target::FakeVersion(version),
        (true, None) => Target::Fake,
        (false, Some(version)) => Target::Version(version),
        (false, None) => Target::Latest,
    };

    run_migrations(&args.database, target)
}

fn run_migrations(database: &DatabaseArgs, target: Target) -> anyhow::Result<()> {
    let migrations = util::load_migrations(&database.path)?;
    let mut config = config(&database.config, database.env_var.as_deref())?;

    match config.db_type() {
        ConfigDbType::Sqlite => {
            cfg_if::cfg_if! {
                if #[cfg(feature = "sqlite")] {
                    let mut ledger = MigrationLedger::load(&mut config, &database.table_name)?;
                    let report = Runner::new(&migrations)
                        .set_target(target)
                        .set_abort_divergent(!database.divergent)
                        .set_abort_missing(!database.missing)
                        .run(&mut config, &mut ledger)?;

                    log::info!("applied {} migrations", report.applied_migrations().len());
                    if let Some(current) = ledger.current() {
                        log::info!("database is at version {}", current);
                    }
                } else {
                    anyhow::bail!("tried to migrate from config for a sqlite database, but sqlite feature was not enabled!");
                }
            }
        }
    }

    Ok(())
}
