//! Builds parameterized DDL, INSERT, SELECT, UPDATE, DELETE from a table description.

use super::params::to_sql_text;
use crate::model::{ColumnType, Table, ID_COLUMN};
use crate::store::Changes;

/// Quote identifier for PostgreSQL (safe: only from static table descriptions).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Option<String>>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Returns the placeholder with its cast, e.g. `$2::numeric`.
    fn push_param(&mut self, value: Option<String>, ty: ColumnType) -> String {
        self.params.push(value);
        format!("${}::{}", self.params.len(), ty.cast())
    }
}

/// SELECT list: numeric columns come back as text so the scale is preserved.
fn select_column_list(table: &Table) -> String {
    table
        .columns
        .iter()
        .map(|c| {
            let q = quoted(c.name);
            match c.ty {
                ColumnType::Numeric { .. } => format!("{}::text AS {}", q, q),
                _ => q,
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// CREATE TABLE IF NOT EXISTS from the column list.
pub fn create_table(table: &Table) -> String {
    let defs: Vec<String> = table
        .columns
        .iter()
        .map(|c| {
            let mut def = format!("{} {}", quoted(c.name), c.ty.ddl());
            if c.ty != ColumnType::Id {
                def.push_str(" NOT NULL");
            }
            if c.unique {
                def.push_str(" UNIQUE");
            }
            if let Some(d) = c.default.sql() {
                def.push_str(" DEFAULT ");
                def.push_str(d);
            }
            def
        })
        .collect();
    format!("CREATE TABLE IF NOT EXISTS {} ({})", quoted(table.name), defs.join(", "))
}

pub fn select_list(table: &Table) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT {} FROM {} ORDER BY {}",
        select_column_list(table),
        quoted(table.name),
        quoted(ID_COLUMN)
    );
    q
}

pub fn select_by_id(table: &Table, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let p = q.push_param(Some(id.to_string()), ColumnType::Id);
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        select_column_list(table),
        quoted(table.name),
        quoted(ID_COLUMN),
        p
    );
    q
}

/// `None` when the column is not part of the table.
pub fn select_by_column(
    table: &Table,
    column: &str,
    value: &serde_json::Value,
) -> Option<QueryBuf> {
    let col = table.column(column)?;
    let mut q = QueryBuf::new();
    let p = q.push_param(to_sql_text(value), col.ty);
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {} ORDER BY {} LIMIT 1",
        select_column_list(table),
        quoted(table.name),
        quoted(col.name),
        p,
        quoted(ID_COLUMN)
    );
    Some(q)
}

/// INSERT ... RETURNING. Columns absent from `changes` take their DB default.
/// Unknown column names are skipped.
pub fn insert(table: &Table, changes: &Changes) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for (name, value) in changes {
        let Some(col) = table.column(name) else {
            continue;
        };
        cols.push(quoted(col.name));
        placeholders.push(q.push_param(to_sql_text(value), col.ty));
    }
    let returning = select_column_list(table);
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", quoted(table.name), returning)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            quoted(table.name),
            cols.join(", "),
            placeholders.join(", "),
            returning
        )
    };
    q
}

/// UPDATE ... WHERE id RETURNING. With nothing to set this degrades to a SELECT by id.
pub fn update(table: &Table, id: i64, changes: &Changes) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for (name, value) in changes {
        let Some(col) = table.column(name) else {
            continue;
        };
        if col.ty == ColumnType::Id {
            continue;
        }
        let p = q.push_param(to_sql_text(value), col.ty);
        sets.push(format!("{} = {}", quoted(col.name), p));
    }
    if sets.is_empty() {
        return select_by_id(table, id);
    }
    let id_param = q.push_param(Some(id.to_string()), ColumnType::Id);
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
        quoted(table.name),
        sets.join(", "),
        quoted(ID_COLUMN),
        id_param,
        select_column_list(table)
    );
    q
}

pub fn delete(table: &Table, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let p = q.push_param(Some(id.to_string()), ColumnType::Id);
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {} RETURNING {}",
        quoted(table.name),
        quoted(ID_COLUMN),
        p,
        quoted(ID_COLUMN)
    );
    q
}
