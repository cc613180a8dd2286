use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context};
use chrono::Utc;
use graft_core::{parse_migration, ColumnSpec, ColumnType, Guard, Value};

use crate::cli::GenerateArgs;

pub fn handle_generate_command(args: GenerateArgs) -> anyhow::Result<()> {
    let migration_name = sanitize_name(&args.name);
    if migration_name.is_empty() {
        bail!("migration name {:?} has no usable characters", args.name);
    }
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    let file_stem = format!("{}_{}", timestamp, migration_name);

    let column_type = ColumnType::from(args.column_type);
    let default = parse_default(column_type, args.default.as_deref())?;
    let column = ColumnSpec::new(args.table.as_str(), args.column.as_str(), column_type, default)?;
    let guard = match (args.guard_table, args.unguarded) {
        (Some(table), _) => Guard::TableExists(table),
        (None, true) => Guard::Unguarded,
        (None, false) => Guard::ColumnExists,
    };

    let content = render_migration(&column, &guard)?;
    // the file must load back as the migration it describes
    parse_migration(&file_stem, &content)?;

    create_migration(&args.path, &file_stem, &content)
}

fn sanitize_name(name: &str) -> String {
    let lowercase = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .to_lowercase();

    let mut result = String::with_capacity(lowercase.len());
    for c in lowercase.chars() {
        if c == '_' && result.ends_with('_') {
            continue;
        }
        result.push(c);
    }

    result.trim_matches('_').to_string()
}

fn parse_default(column_type: ColumnType, default: Option<&str>) -> anyhow::Result<Value> {
    let value = match (column_type, default) {
        (ColumnType::Integer, None) => Value::Integer(0),
        (ColumnType::Text, None) => Value::Text(String::new()),
        (ColumnType::Boolean, None) => Value::Boolean(false),
        (ColumnType::Real, None) => Value::Real(0.0),
        (ColumnType::Integer, Some(s)) => Value::Integer(
            s.parse()
                .with_context(|| format!("default {:?} is not an integer", s))?,
        ),
        (ColumnType::Text, Some(s)) => Value::Text(s.to_string()),
        (ColumnType::Boolean, Some(s)) => Value::Boolean(
            s.parse()
                .with_context(|| format!("default {:?} is not a boolean", s))?,
        ),
        (ColumnType::Real, Some(s)) => Value::Real(
            s.parse()
                .with_context(|| format!("default {:?} is not a number", s))?,
        ),
    };
    Ok(value)
}

fn render_migration(column: &ColumnSpec, guard: &Guard) -> anyhow::Result<String> {
    let default = match column.default_value() {
        Value::Integer(i) => toml::Value::Integer(*i),
        Value::Text(s) => toml::Value::String(s.clone()),
        Value::Boolean(b) => toml::Value::Boolean(*b),
        Value::Real(r) => toml::Value::Float(*r),
        Value::Null => return Err(anyhow!("column {} has no default", column)),
    };

    let mut table = toml::Table::new();
    table.insert("table".into(), column.table().into());
    table.insert("name".into(), column.name().into());
    table.insert("type".into(), toml::Value::try_from(column.column_type())?);
    table.insert("default".into(), default);

    let mut down = toml::Table::new();
    down.insert("guard".into(), toml::Value::try_from(guard)?);

    let mut migration = toml::Table::new();
    migration.insert("column".into(), toml::Value::Table(table));
    migration.insert("down".into(), toml::Value::Table(down));

    Ok(toml::to_string(&migration)?)
}

fn create_migration(base_path: &Path, file_stem: &str, content: &str) -> anyhow::Result<()> {
    if !base_path.exists() {
        fs::create_dir_all(base_path).with_context(|| {
            format!(
                "Failed to create migrations directory at {}",
                base_path.display()
            )
        })?;
    }

    let migration_path = base_path.join(format!("{}.toml", file_stem));
    if migration_path.exists() {
        bail!("Migration file already exists at {}", migration_path.display());
    }

    fs::write(&migration_path, content).with_context(|| {
        format!(
            "Failed to write migration file at {}",
            migration_path.display()
        )
    })?;

    println!("Created migration: {}", migration_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{parse_default, render_migration, sanitize_name};
    use graft_core::{parse_migration, ColumnSpec, ColumnType, Guard, Value};

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("extend_changesets"), "extend_changesets");
        assert_eq!(sanitize_name("ExtendChangesets"), "extendchangesets");
        assert_eq!(sanitize_name("extend-changesets"), "extend_changesets");
        assert_eq!(sanitize_name("extend changesets notified cia"), "extend_changesets_notified_cia");
        assert_eq!(sanitize_name("__Extend--Changesets!@#__"), "extend_changesets");
        assert_eq!(sanitize_name("extend__changesets___cia"), "extend_changesets_cia");
    }

    #[test]
    fn parses_defaults_for_each_type() {
        assert_eq!(Value::Integer(0), parse_default(ColumnType::Integer, None).unwrap());
        assert_eq!(Value::Integer(7), parse_default(ColumnType::Integer, Some("7")).unwrap());
        assert_eq!(
            Value::Boolean(true),
            parse_default(ColumnType::Boolean, Some("true")).unwrap()
        );
        assert_eq!(
            Value::Text("master".into()),
            parse_default(ColumnType::Text, Some("master")).unwrap()
        );
        assert!(parse_default(ColumnType::Integer, Some("zero")).is_err());
    }

    #[test]
    fn rendered_migration_loads_back() {
        let column = ColumnSpec::new("changesets", "notified_cia", ColumnType::Integer, 0).unwrap();
        let guard = Guard::TableExists("notified_cia".into());
        let content = render_migration(&column, &guard).unwrap();

        let migration =
            parse_migration("2011072600000_extend_changesets_notified_cia", &content).unwrap();
        assert_eq!(&column, migration.column());
        assert_eq!(&guard, migration.guard());
    }

    #[test]
    fn renders_unguarded_text_column() {
        let column = ColumnSpec::new("changesets", "branch", ColumnType::Text, "master").unwrap();
        let content = render_migration(&column, &Guard::Unguarded).unwrap();
        assert!(content.contains("type = \"text\""));
        assert!(content.contains("guard = \"unguarded\""));

        let migration = parse_migration("V1__add_branch", &content).unwrap();
        assert_eq!(&Guard::Unguarded, migration.guard());
    }
}
