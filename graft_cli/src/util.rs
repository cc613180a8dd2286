use std::path::Path;

use anyhow::Context;
use graft_core::{find_migration_files, load_migration_files, Migration};

/// Reads every migration file under `path`, sorted by version
pub(crate) fn load_migrations(path: &Path) -> anyhow::Result<Vec<Migration>> {
    let migration_files = find_migration_files(path)
        .with_context(|| format!("could not read migrations directory {}", path.display()))?;
    let migrations = load_migration_files(migration_files)?;
    if migrations.is_empty() {
        log::warn!("no migration files found in {}", path.display());
    }
    Ok(migrations)
}
