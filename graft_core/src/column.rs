use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{Error, Kind};

/// The storage type of a column
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Text,
    Boolean,
    Real,
}

impl ColumnType {
    /// Returns true if `value` can be stored in a column of this type.
    /// `Null` is accepted by every type, an `Integer` is accepted by `Real`.
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (_, Value::Null)
                | (ColumnType::Integer, Value::Integer(_))
                | (ColumnType::Text, Value::Text(_))
                | (ColumnType::Boolean, Value::Boolean(_))
                | (ColumnType::Real, Value::Real(_))
                | (ColumnType::Real, Value::Integer(_))
        )
    }
}

// hashed by name so checksums don't depend on variant order or platform
impl Hash for ColumnType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Text => "TEXT",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Real => "REAL",
        };
        write!(f, "{}", name)
    }
}

/// A single cell value, used both for column defaults and for row data
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Text(String),
    Boolean(bool),
    Real(f64),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Text(_) => "text",
            Value::Boolean(_) => "boolean",
            Value::Real(_) => "real",
        }
    }

    /// Coerce the value into the representation used by `column_type`,
    /// i.e. integers stored in a real column become reals.
    pub(crate) fn coerce(self, column_type: ColumnType) -> Value {
        match (column_type, self) {
            (ColumnType::Real, Value::Integer(i)) => Value::Real(i as f64),
            (_, value) => value,
        }
    }

    /// Render the value as an SQL literal
    pub fn to_sql_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
            Value::Boolean(b) => if *b { "1" } else { "0" }.to_string(),
            Value::Real(r) => format!("{:?}", r),
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_name().hash(state);
        match self {
            Value::Null => {}
            Value::Integer(i) => i.hash(state),
            Value::Text(s) => s.hash(state),
            Value::Boolean(b) => b.hash(state),
            Value::Real(r) => r.to_bits().hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Real(r) => write!(f, "{}", r),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(r: f64) -> Self {
        Value::Real(r)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// The definition of the column a migration adds and removes.
///
/// The default value must be representable in the column type,
/// this is checked on construction. Reals must be finite.
#[derive(Clone, Debug, PartialEq, Hash)]
pub struct ColumnSpec {
    table: String,
    name: String,
    column_type: ColumnType,
    default: Value,
}

impl ColumnSpec {
    pub fn new(
        table: impl Into<String>,
        name: impl Into<String>,
        column_type: ColumnType,
        default: impl Into<Value>,
    ) -> Result<ColumnSpec, Error> {
        let table = table.into();
        let name = name.into();
        let default = default.into();

        for identifier in [&table, &name] {
            if !is_identifier(identifier) {
                return Err(Error::new(
                    Kind::InvalidIdentifier(identifier.clone()),
                    None,
                ));
            }
        }

        let representable = match &default {
            Value::Null => false,
            Value::Real(r) => r.is_finite() && column_type.accepts(&default),
            _ => column_type.accepts(&default),
        };
        if !representable {
            return Err(Error::new(
                Kind::InvalidDefault {
                    column: format!("{}.{}", table, name),
                    column_type,
                    default,
                },
                None,
            ));
        }

        Ok(ColumnSpec {
            table,
            name,
            column_type,
            default: default.coerce(column_type),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }
}

impl fmt::Display for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} {} DEFAULT {}",
            self.table,
            self.name,
            self.column_type,
            self.default.to_sql_literal()
        )
    }
}
