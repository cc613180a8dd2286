use crate::column::{ColumnSpec, ColumnType, Value};
use crate::error::{Error, Kind};
use crate::migration::{Guard, SchemaVersion};
use crate::Migration;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::{DirEntry, WalkDir};

const STEM_RE: &str = r"(?:V(\d+)__(\w+)|(\d+)_(\w+))";

fn migration_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!("^{}$", STEM_RE)).expect("migration name regex must be valid")
    })
}

fn migration_file_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"^{}\.toml$", STEM_RE)).expect("migration file regex must be valid")
    })
}

/// Parse a migration name in the format `V{1}__{2}` or `{1}_{2}`,
/// where {1} represents the migration version and {2} the name.
pub fn parse_migration_name(name: &str) -> Result<(SchemaVersion, String), Error> {
    let captures = migration_name_re()
        .captures(name)
        .ok_or_else(|| Error::new(Kind::InvalidName, None))?;

    // one of the two alternatives always matched, each has both groups
    let (version, name) = match (captures.get(1), captures.get(2)) {
        (Some(version), Some(name)) => (version, name),
        _ => match (captures.get(3), captures.get(4)) {
            (Some(version), Some(name)) => (version, name),
            _ => return Err(Error::new(Kind::InvalidName, None)),
        },
    };

    let version: SchemaVersion = version
        .as_str()
        .parse()
        .map_err(|_| Error::new(Kind::InvalidVersion, None))?;

    Ok((version, name.as_str().to_string()))
}

/// find migration files on file system recursively across directories given a location.
/// Migration files are named `V{1}__{2}.toml` or `{1}_{2}.toml`, two files with the same version
/// are an error.
pub fn find_migration_files(location: impl AsRef<Path>) -> Result<impl Iterator<Item = PathBuf>, Error> {
    let location: &Path = location.as_ref();
    let location = location.canonicalize().map_err(|err| {
        Error::new(
            Kind::InvalidMigrationPath(location.to_path_buf(), err),
            None,
        )
    })?;

    let file_paths: Vec<PathBuf> = WalkDir::new(location)
        .into_iter()
        .filter_map(Result::ok)
        .map(DirEntry::into_path)
        .filter(|path| path.is_file())
        .collect();

    let mut occurrence: HashMap<SchemaVersion, PathBuf> = HashMap::with_capacity(file_paths.len());
    let mut result = Vec::with_capacity(file_paths.len());

    for entry in file_paths {
        let Some(file_name) = entry.file_name().and_then(OsStr::to_str) else {
            continue;
        };

        if !migration_file_re().is_match(file_name) {
            if entry.extension().and_then(OsStr::to_str) == Some("toml") {
                log::warn!(
                    "File \"{}\" does not adhere to the migration naming convention. Migrations must be named in the format V{{1}}__{{2}}.toml or {{1}}_{{2}}.toml, where {{1}} represents the migration version and {{2}} the name.",
                    file_name
                );
            }
            continue;
        }

        let (version, _) = parse_migration_name(file_stem(&entry)?)?;
        if occurrence.insert(version, entry.clone()).is_some() {
            return Err(Error::new(Kind::DuplicateVersion(version), None));
        }
        result.push(entry);
    }

    result.sort();
    Ok(result.into_iter())
}

fn file_stem(path: &Path) -> Result<&str, Error> {
    path.file_stem().and_then(OsStr::to_str).ok_or_else(|| {
        Error::new(
            Kind::InvalidMigrationFile(path.to_path_buf(), "file name is not valid UTF-8".into()),
            None,
        )
    })
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct MigrationFile {
    column: ColumnDefinition,
    #[serde(default)]
    down: DownDefinition,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ColumnDefinition {
    table: String,
    name: String,
    #[serde(rename = "type")]
    column_type: ColumnType,
    default: toml::Value,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DownDefinition {
    #[serde(default)]
    guard: Guard,
}

fn toml_to_value(value: toml::Value) -> Result<Value, String> {
    match value {
        toml::Value::Integer(i) => Ok(Value::Integer(i)),
        toml::Value::Float(r) => Ok(Value::Real(r)),
        toml::Value::Boolean(b) => Ok(Value::Boolean(b)),
        toml::Value::String(s) => Ok(Value::Text(s)),
        other => Err(format!("unsupported default value {}", other)),
    }
}

/// Parse the content of a migration file named `name`
pub fn parse_migration(name: &str, content: &str) -> Result<Migration, Error> {
    let invalid = |msg: String| Error::new(Kind::InvalidMigrationFile(PathBuf::from(name), msg), None);

    let file: MigrationFile = toml::from_str(content).map_err(|err| invalid(err.to_string()))?;
    let default = toml_to_value(file.column.default).map_err(invalid)?;
    let column = ColumnSpec::new(
        file.column.table,
        file.column.name,
        file.column.column_type,
        default,
    )?;

    Migration::new(name, column, file.down.guard)
}

/// Read and parse the migration files given, returning the migrations sorted by version
pub fn load_migration_files(
    migration_files: impl Iterator<Item = PathBuf>,
) -> Result<Vec<Migration>, Error> {
    let mut migrations = Vec::new();

    for path in migration_files {
        let content = std::fs::read_to_string(path.as_path()).map_err(|err| {
            Error::new(
                Kind::InvalidMigrationFile(path.clone(), err.to_string()),
                None,
            )
        })?;

        let migration = parse_migration(file_stem(&path)?, &content).map_err(|err| match err.kind() {
            Kind::InvalidMigrationFile(_, msg) => Error::new(
                Kind::InvalidMigrationFile(path.clone(), msg.clone()),
                None,
            ),
            _ => err,
        })?;
        migrations.push(migration);
    }

    migrations.sort();
    Ok(migrations)
}
