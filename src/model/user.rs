use super::{Column, ColumnType, Resource, Table};
use crate::auth::password;
use crate::config::{FieldKind, FieldSpec, Projection};
use serde::Deserialize;

/// Account with credentials. `password` always holds an argon2 PHC string.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub is_superuser: bool,
    pub is_active: bool,
}

impl User {
    pub fn check_password(&self, raw: &str) -> bool {
        password::verify_password(raw, &self.password)
    }
}

const COLUMNS: &[Column] = &[
    Column::new("id", ColumnType::Id),
    Column::new("username", ColumnType::Varchar(150)).unique(),
    Column::new("password", ColumnType::Varchar(255)),
    Column::new("is_superuser", ColumnType::Boolean).default_bool(false),
    Column::new("is_active", ColumnType::Boolean).default_bool(true),
];

pub const USER_TABLE: Table = Table {
    name: "users",
    columns: COLUMNS,
};

const FIELDS: &[FieldSpec] = &[
    FieldSpec::new("id", "id", FieldKind::Integer).read_only(),
    FieldSpec::new("username", "username", FieldKind::Username { max_length: 150 }).unique(),
    FieldSpec::new("password", "password", FieldKind::Password).write_only(),
];

pub const USER_PROJECTION: Projection = Projection {
    model: "user",
    fields: FIELDS,
};

impl Resource for User {
    const NAME: &'static str = "User";
    const TABLE: &'static Table = &USER_TABLE;
    const PROJECTION: &'static Projection = &USER_PROJECTION;
}
