use std::collections::VecDeque;
use std::num::NonZeroU32;

use crate::error::Kind;
use crate::ledger::MigrationLedger;
use crate::migration::{Direction, Outcome, SchemaVersion};
use crate::traits::verify_migrations;
use crate::{Error, Migrate, Migration};

/// An enum that represents the target version up to which graft should migrate.
/// It is used by [Runner].
#[derive(Clone, Copy, Debug)]
pub enum Target {
    Latest,
    Version(SchemaVersion),
    Fake,
    FakeVersion(SchemaVersion),
}

impl Target {
    fn is_fake(&self) -> bool {
        matches!(self, Target::Fake | Target::FakeVersion(_))
    }

    fn stops_before(&self, migration: &Migration) -> bool {
        match self {
            Target::Version(target) | Target::FakeVersion(target) => *target < migration.version(),
            Target::Latest | Target::Fake => false,
        }
    }
}

/// An enum that represents how far back graft should roll back.
/// It is used by [Runner].
#[derive(Clone, Copy, Debug)]
pub enum RollbackTarget {
    /// Revert the given number of most recently applied migrations
    Count(NonZeroU32),
    /// Revert every applied migration with a version greater than the given one
    Version(SchemaVersion),
    /// Revert every applied migration
    All,
}

impl Default for RollbackTarget {
    fn default() -> Self {
        RollbackTarget::Count(NonZeroU32::MIN)
    }
}

/// Struct that represents the report of the migration cycle.
/// A `Report` instance is returned by the [`Runner::run`] and [`Runner::rollback`] methods
/// via [`Result`]`<Report, Error>`. If there is an [`Error`] during a migration, you can access
/// the `Report` with [`Error::report`].
#[derive(Clone, Debug)]
pub struct Report {
    direction: Direction,
    migrations: Vec<Migration>,
    skipped: Vec<Migration>,
}

impl Report {
    /// Instantiate a new Report
    pub(crate) fn new(direction: Direction, migrations: Vec<Migration>, skipped: Vec<Migration>) -> Report {
        Report {
            direction,
            migrations,
            skipped,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Retrieves the list of migrations applied, or reverted, in the migration cycle
    pub fn applied_migrations(&self) -> &Vec<Migration> {
        &self.migrations
    }

    /// Retrieves the reverted migrations whose column was left in place because the guard didn't permit the removal
    pub fn skipped_removals(&self) -> &Vec<Migration> {
        &self.skipped
    }
}

/// Struct that represents the entrypoint to run the migrations.
pub struct Runner {
    abort_divergent: bool,
    abort_missing: bool,
    migrations: Vec<Migration>,
    target: Target,
    rollback_target: RollbackTarget,
}

impl Runner {
    /// instantiate a new Runner
    pub fn new(migrations: &[Migration]) -> Runner {
        Runner {
            target: Target::Latest,
            rollback_target: RollbackTarget::default(),
            abort_divergent: true,
            abort_missing: true,
            migrations: migrations.to_vec(),
        }
    }

    /// Get the gathered migrations.
    pub fn get_migrations(&self) -> &Vec<Migration> {
        &self.migrations
    }

    /// Set the target version up to which graft should migrate, Latest migrates to the latest version available
    /// Version migrates to a user provided version, a Version with a higher version than the latest will be ignored,
    /// and Fake doesn't actually run any migration, just records them on the ledger
    /// by default this is set to Latest
    pub fn set_target(self, target: Target) -> Runner {
        Runner { target, ..self }
    }

    /// Set how far [`Runner::rollback`] goes back, by default only the last applied migration is reverted
    pub fn set_rollback_target(self, rollback_target: RollbackTarget) -> Runner {
        Runner {
            rollback_target,
            ..self
        }
    }

    /// Set true if migration process should abort if divergent migrations are found
    /// i.e. applied migrations with the same version but different name or checksum from the ones given to the runner.
    /// By default this is set to true.
    pub fn set_abort_divergent(self, abort_divergent: bool) -> Runner {
        Runner {
            abort_divergent,
            ..self
        }
    }

    /// Set true if migration process should abort if missing migrations are found
    /// i.e. applied migrations that are not given to the runner,
    /// or migrations with a version inferior to the last one applied but not applied.
    /// By default this is set to true.
    pub fn set_abort_missing(self, abort_missing: bool) -> Runner {
        Runner {
            abort_missing,
            ..self
        }
    }

    /// Returns the migrations that [`Runner::run`] would apply, in order
    pub fn get_unapplied_migrations(&self, ledger: &MigrationLedger) -> Result<Vec<Migration>, Error> {
        verify_migrations(
            ledger.entries(),
            self.migrations.clone(),
            self.abort_divergent,
            self.abort_missing,
        )
    }

    /// Creates an iterator over pending migrations, applying each before returning
    /// the result from `next()`. If a migration fails, the iterator will return that
    /// result and further calls to `next()` will return `None`.
    pub fn run_iter<'a, C>(
        &self,
        connection: &'a mut C,
        ledger: &'a mut MigrationLedger,
    ) -> RunIterator<'a, C>
    where
        C: Migrate,
    {
        RunIterator::new(self, connection, ledger)
    }

    /// Applies the pending migrations in the supplied database connection, in increasing version order
    pub fn run<C>(&self, connection: &mut C, ledger: &mut MigrationLedger) -> Result<Report, Error>
    where
        C: Migrate,
    {
        let migrations = self.get_unapplied_migrations(ledger)?;
        migrate(connection, ledger, migrations, self.target)
    }

    /// Reverts applied migrations in the supplied database connection, in decreasing version order.
    /// Ledger rows that are missing from, or diverge from, the migration set are left in place.
    pub fn rollback<C>(&self, connection: &mut C, ledger: &mut MigrationLedger) -> Result<Report, Error>
    where
        C: Migrate,
    {
        // same checks as a forward run, so a diverged ledger is never rolled back
        self.get_unapplied_migrations(ledger)?;
        rollback(
            connection,
            ledger,
            &self.migrations,
            self.rollback_target,
            self.abort_missing,
        )
    }
}

fn apply_migration<C: Migrate>(
    connection: &mut C,
    ledger: &mut MigrationLedger,
    migration: &Migration,
    fake: bool,
) -> Result<(), Error> {
    if fake {
        log::info!("recording migration {} without applying it", migration);
    } else {
        log::info!("applying migration: {} ...", migration);
        migration.apply(connection)?;
    }
    ledger.record(connection, migration)?;
    log::info!("applied migration: {}", migration);
    Ok(())
}

pub(crate) fn migrate<C: Migrate>(
    connection: &mut C,
    ledger: &mut MigrationLedger,
    migrations: Vec<Migration>,
    target: Target,
) -> Result<Report, Error> {
    let mut applied_migrations = Vec::new();

    if target.is_fake() {
        log::info!("not going to apply any migration as fake flag is enabled.");
    }

    for migration in migrations.into_iter() {
        if target.stops_before(&migration) {
            log::info!("stopping at migration: {}, due to user option", migration);
            break;
        }

        apply_migration(connection, ledger, &migration, target.is_fake()).map_err(|err| {
            Error::failed(
                &migration,
                err,
                Report::new(Direction::Forward, applied_migrations.clone(), Vec::new()),
            )
        })?;

        // faked migrations are recorded but not reported
        if !target.is_fake() {
            applied_migrations.push(migration);
        }
    }

    Ok(Report::new(Direction::Forward, applied_migrations, Vec::new()))
}

pub(crate) fn rollback<C: Migrate>(
    connection: &mut C,
    ledger: &mut MigrationLedger,
    migrations: &[Migration],
    target: RollbackTarget,
    abort_missing: bool,
) -> Result<Report, Error> {
    // only rows with a matching definition count towards the target
    let mut selected = Vec::new();
    for entry in ledger.entries().iter().rev() {
        match target {
            RollbackTarget::Version(version) if entry.version() <= version => break,
            RollbackTarget::Count(count) if selected.len() >= count.get() as usize => break,
            _ => {}
        }

        match migrations.iter().find(|m| m.version() == entry.version()) {
            Some(migration) if entry.matches(migration) => {
                selected.push((entry.version(), migration.clone()))
            }
            Some(migration) => {
                log::error!(
                    target: "graft_core::traits::divergent",
                    "applied migration {} is different than {}, can't revert it",
                    entry,
                    migration
                );
            }
            None if abort_missing => {
                return Err(Error::new(
                    Kind::MissingVersion(entry.clone()),
                    Some(Report::new(Direction::Backward, Vec::new(), Vec::new())),
                ));
            }
            None => {
                log::error!(target: "graft_core::traits::missing", "migration {} is missing from the migration set, can't revert it", entry);
            }
        }
    }

    log::info!("going to revert {} migrations.", selected.len());

    let mut reverted = Vec::new();
    let mut skipped = Vec::new();

    for (version, migration) in selected {
        log::info!("reverting migration: {} ...", migration);
        let outcome = migration
            .revert(connection)
            .and_then(|outcome| ledger.erase(connection, version).map(|_| outcome))
            .map_err(|err| {
                Error::failed(
                    &migration,
                    err,
                    Report::new(Direction::Backward, reverted.clone(), skipped.clone()),
                )
            })?;
        log::info!("reverted migration: {}", migration);

        if outcome == Outcome::Skipped {
            skipped.push(migration.clone());
        }
        reverted.push(migration);
    }

    Ok(Report::new(Direction::Backward, reverted, skipped))
}

pub struct RunIterator<'a, C> {
    connection: &'a mut C,
    ledger: &'a mut MigrationLedger,
    target: Target,
    items: VecDeque<Migration>,
    error: Option<Error>,
    failed: bool,
}

impl<'a, C> RunIterator<'a, C>
where
    C: Migrate,
{
    pub(crate) fn new(
        runner: &Runner,
        connection: &'a mut C,
        ledger: &'a mut MigrationLedger,
    ) -> RunIterator<'a, C> {
        let (items, error) = match runner.get_unapplied_migrations(ledger) {
            Ok(items) => (VecDeque::from(items), None),
            Err(err) => (VecDeque::new(), Some(err)),
        };
        RunIterator {
            connection,
            ledger,
            target: runner.target,
            items,
            error,
            failed: false,
        }
    }
}

impl<C> Iterator for RunIterator<'_, C>
where
    C: Migrate,
{
    type Item = Result<Migration, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.error.take() {
            self.failed = true;
            return Some(Err(err));
        }
        if self.failed {
            return None;
        }

        let migration = self.items.pop_front()?;
        if self.target.stops_before(&migration) {
            log::info!("stopping at migration: {}, due to user option", migration);
            self.items.clear();
            return None;
        }

        let result = apply_migration(
            self.connection,
            self.ledger,
            &migration,
            self.target.is_fake(),
        );
        match result {
            Ok(()) => Some(Ok(migration)),
            Err(err) => {
                log::error!("migration failed: {}", err);
                self.failed = true;
                let report = Report::new(Direction::Forward, Vec::new(), Vec::new());
                Some(Err(Error::failed(&migration, err, report)))
            }
        }
    }
}
