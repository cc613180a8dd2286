use std::num::NonZeroU32;

use anyhow::bail;
use graft_core::config::ConfigDbType;
use graft_core::{MigrationLedger, RollbackTarget, Runner};

use crate::cli::{DatabaseArgs, RollbackArgs};
use crate::{config, util};

pub fn handle_rollback_command(args: RollbackArgs) -> anyhow::Result<()> {
    let target = parse_target(args.target, args.count, args.all)?;
    run_rollback(&args.database, target)
}

fn parse_target(
    target: Option<i64>,
    rollback_count: Option<NonZeroU32>,
    rollback_all: bool,
) -> anyhow::Result<RollbackTarget> {
    let conflicting_targets = [rollback_count.is_some(), rollback_all, target.is_some()]
        .iter()
        .filter(|x| **x)
        .count()
        > 1;

    if conflicting_targets {
        bail!("You can only specify one of --count, --all or --target options at a time.");
    }

    if rollback_all {
        Ok(RollbackTarget::All)
    } else if let Some(count) = rollback_count {
        Ok(RollbackTarget::Count(count))
    } else if let Some(version) = target {
        Ok(RollbackTarget::Version(version))
    } else {
        Ok(RollbackTarget::default())
    }
}

fn run_rollback(database: &DatabaseArgs, target: RollbackTarget) -> anyhow::Result<()> {
    let migrations = util::load_migrations(&database.path)?;
    let mut config = config(&database.config, database.env_var.as_deref())?;

    match config.db_type() {
        ConfigDbType::Sqlite => {
            cfg_if::cfg_if! {
                if #[cfg(feature = "sqlite")] {
                    let mut ledger = MigrationLedger::load(&mut config, &database.table_name)?;
                    let report = Runner::new(&migrations)
                        .set_rollback_target(target)
                        .set_abort_divergent(!database.divergent)
                        .set_abort_missing(!database.missing)
                        .rollback(&mut config, &mut ledger)?;

                    log::info!("reverted {} migrations", report.applied_migrations().len());
                    for skipped in report.skipped_removals() {
                        log::warn!("{} was reverted but its column was kept", skipped);
                    }
                } else {
                    bail!("tried to roll back from config for a sqlite database, but sqlite feature was not enabled!");
                }
            }
        }
    }

    Ok(())
}
