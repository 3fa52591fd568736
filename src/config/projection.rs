//! Static projection specs: which columns an entity exposes on the wire,
//! under which name, and whether they are read-only or write-only.

use crate::store::Row;
use serde_json::{Map, Value};

/// Wire-level kind of a field; drives input validation and normalisation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text, whitespace-trimmed, not blank.
    Text { max_length: usize },
    /// Login name: text restricted to letters, digits and `@.+-_`.
    Username { max_length: usize },
    /// Credential: accepted as text, stored hashed.
    Password,
    /// 32-bit signed integer.
    Integer,
    /// Fixed-point decimal, serialised as a string with `decimal_places` digits.
    Decimal { max_digits: u32, decimal_places: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    ReadWrite,
    ReadOnly,
    WriteOnly,
}

#[derive(Debug)]
pub struct FieldSpec {
    pub wire: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
    pub access: Access,
    /// Checked against existing rows before insert/update.
    pub unique: bool,
}

impl FieldSpec {
    pub const fn new(wire: &'static str, column: &'static str, kind: FieldKind) -> Self {
        FieldSpec {
            wire,
            column,
            kind,
            access: Access::ReadWrite,
            unique: false,
        }
    }

    pub const fn read_only(mut self) -> Self {
        self.access = Access::ReadOnly;
        self
    }

    pub const fn write_only(mut self) -> Self {
        self.access = Access::WriteOnly;
        self
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn is_writable(&self) -> bool {
        self.access != Access::ReadOnly
    }

    pub fn is_readable(&self) -> bool {
        self.access != Access::WriteOnly
    }
}

#[derive(Debug)]
pub struct Projection {
    /// Lower-case model name; permission codenames are `<action>_<model>`.
    pub model: &'static str,
    pub fields: &'static [FieldSpec],
}

impl Projection {
    /// Render a stored row as its wire object: readable fields only, in declaration order.
    /// Write-only columns (credentials) never leave this function.
    pub fn render(&self, row: &Row) -> Value {
        let mut out = Map::new();
        for field in self.fields.iter().filter(|f| f.is_readable()) {
            let value = row.get(field.column).cloned().unwrap_or(Value::Null);
            out.insert(field.wire.to_string(), value);
        }
        Value::Object(out)
    }

    pub fn writable(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.is_writable())
    }

    pub fn unique_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.unique)
    }

    pub fn field_for_column(&self, column: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.column == column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    static FIELDS: &[FieldSpec] = &[
        FieldSpec::new("id", "id", FieldKind::Integer).read_only(),
        FieldSpec::new("username", "username", FieldKind::Username { max_length: 150 }).unique(),
        FieldSpec::new("password", "password", FieldKind::Password).write_only(),
    ];
    static PROJECTION: Projection = Projection {
        model: "user",
        fields: FIELDS,
    };

    #[test]
    fn render_drops_write_only_and_unlisted_columns() {
        let row = json!({
            "id": 7,
            "username": "ana",
            "password": "$argon2id$...",
            "is_superuser": true
        });
        let row = row.as_object().unwrap().clone();
        assert_eq!(PROJECTION.render(&row), json!({ "id": 7, "username": "ana" }));
    }

    #[test]
    fn writable_skips_read_only() {
        let names: Vec<_> = PROJECTION.writable().map(|f| f.wire).collect();
        assert_eq!(names, vec!["username", "password"]);
    }
}
