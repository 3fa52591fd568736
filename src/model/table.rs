//! Relational table descriptions shared by the SQL builder and the stores.

use serde_json::Value;

/// Name of the primary key column on every table.
pub const ID_COLUMN: &str = "id";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    /// Auto-assigned 64-bit primary key.
    Id,
    Varchar(u32),
    Integer,
    Numeric { precision: u32, scale: u32 },
    Boolean,
}

impl ColumnType {
    /// PostgreSQL type used in DDL.
    pub fn ddl(&self) -> String {
        match self {
            ColumnType::Id => "BIGSERIAL PRIMARY KEY".into(),
            ColumnType::Varchar(n) => format!("VARCHAR({})", n),
            ColumnType::Integer => "INTEGER".into(),
            ColumnType::Numeric { precision, scale } => {
                format!("NUMERIC({}, {})", precision, scale)
            }
            ColumnType::Boolean => "BOOLEAN".into(),
        }
    }

    /// Cast applied to text-bound parameters.
    pub fn cast(&self) -> &'static str {
        match self {
            ColumnType::Id => "bigint",
            ColumnType::Varchar(_) => "varchar",
            ColumnType::Integer => "integer",
            ColumnType::Numeric { .. } => "numeric",
            ColumnType::Boolean => "boolean",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnDefault {
    None,
    Bool(bool),
}

impl ColumnDefault {
    pub fn sql(&self) -> Option<&'static str> {
        match self {
            ColumnDefault::None => None,
            ColumnDefault::Bool(true) => Some("TRUE"),
            ColumnDefault::Bool(false) => Some("FALSE"),
        }
    }

    pub fn value(&self) -> Value {
        match self {
            ColumnDefault::None => Value::Null,
            ColumnDefault::Bool(b) => Value::Bool(*b),
        }
    }
}

#[derive(Debug)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
    pub unique: bool,
    pub default: ColumnDefault,
}

impl Column {
    pub const fn new(name: &'static str, ty: ColumnType) -> Self {
        Column {
            name,
            ty,
            unique: false,
            default: ColumnDefault::None,
        }
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub const fn default_bool(mut self, value: bool) -> Self {
        self.default = ColumnDefault::Bool(value);
        self
    }
}

#[derive(Debug)]
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}
