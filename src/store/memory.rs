//! Process-local backend. Same contract as PostgreSQL: ids from a per-table
//! sequence, column defaults, unique columns, cascade of permissions on user delete.

use super::{Changes, Row, Store};
use crate::error::AppError;
use crate::model::{ColumnType, Resource, Table, User, ID_COLUMN};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct TableData {
    next_id: i64,
    rows: BTreeMap<i64, Row>,
}

#[derive(Default)]
struct Inner {
    tables: HashMap<&'static str, TableData>,
    permissions: HashMap<i64, BTreeSet<String>>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, AppError> {
        self.inner
            .read()
            .map_err(|_| AppError::Internal("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, AppError> {
        self.inner
            .write()
            .map_err(|_| AppError::Internal("memory store lock poisoned".into()))
    }
}

/// Column named in `changes` whose value another row already holds.
fn unique_clash(
    table: &Table,
    data: &TableData,
    changes: &Changes,
    exclude: Option<i64>,
) -> Option<&'static str> {
    table
        .columns
        .iter()
        .filter(|c| c.unique)
        .find(|c| {
            changes.get(c.name).is_some_and(|v| {
                data.rows
                    .iter()
                    .any(|(id, row)| Some(*id) != exclude && row.get(c.name) == Some(v))
            })
        })
        .map(|c| c.name)
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        self.read().map(|_| ())
    }

    async fn list(&self, table: &'static Table) -> Result<Vec<Row>, AppError> {
        let inner = self.read()?;
        Ok(inner
            .tables
            .get(table.name)
            .map(|t| t.rows.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn fetch(&self, table: &'static Table, id: i64) -> Result<Option<Row>, AppError> {
        let inner = self.read()?;
        Ok(inner.tables.get(table.name).and_then(|t| t.rows.get(&id).cloned()))
    }

    async fn find_by(
        &self,
        table: &'static Table,
        column: &str,
        value: &Value,
    ) -> Result<Option<Row>, AppError> {
        if table.column(column).is_none() {
            return Err(AppError::Internal(format!("unknown column {}.{}", table.name, column)));
        }
        let inner = self.read()?;
        Ok(inner
            .tables
            .get(table.name)
            .and_then(|t| t.rows.values().find(|row| row.get(column) == Some(value)).cloned()))
    }

    async fn insert(&self, table: &'static Table, changes: &Changes) -> Result<Row, AppError> {
        let mut inner = self.write()?;
        let data = inner.tables.entry(table.name).or_default();
        if let Some(column) = unique_clash(table, data, changes, None) {
            return Err(AppError::Conflict(column.to_string()));
        }
        data.next_id += 1;
        let id = data.next_id;
        let mut row = Row::new();
        for col in table.columns {
            let value = if col.ty == ColumnType::Id {
                Value::from(id)
            } else {
                changes.get(col.name).cloned().unwrap_or_else(|| col.default.value())
            };
            row.insert(col.name.to_string(), value);
        }
        data.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        table: &'static Table,
        id: i64,
        changes: &Changes,
    ) -> Result<Option<Row>, AppError> {
        let mut inner = self.write()?;
        let data = inner.tables.entry(table.name).or_default();
        if !data.rows.contains_key(&id) {
            return Ok(None);
        }
        if let Some(column) = unique_clash(table, data, changes, Some(id)) {
            return Err(AppError::Conflict(column.to_string()));
        }
        let Some(row) = data.rows.get_mut(&id) else {
            return Ok(None);
        };
        for (name, value) in changes {
            if *name != ID_COLUMN && table.column(name).is_some() {
                row.insert(name.to_string(), value.clone());
            }
        }
        Ok(Some(row.clone()))
    }

    async fn delete(&self, table: &'static Table, id: i64) -> Result<bool, AppError> {
        let mut inner = self.write()?;
        let removed = inner
            .tables
            .get_mut(table.name)
            .and_then(|t| t.rows.remove(&id))
            .is_some();
        if removed && table.name == User::TABLE.name {
            inner.permissions.remove(&id);
        }
        Ok(removed)
    }

    async fn permissions(&self, user_id: i64) -> Result<Vec<String>, AppError> {
        let inner = self.read()?;
        Ok(inner
            .permissions
            .get(&user_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn grant_permission(&self, user_id: i64, codename: &str) -> Result<(), AppError> {
        let mut inner = self.write()?;
        let user_exists = inner
            .tables
            .get(User::TABLE.name)
            .is_some_and(|t| t.rows.contains_key(&user_id));
        if !user_exists {
            return Err(AppError::NotFound);
        }
        inner.permissions.entry(user_id).or_default().insert(codename.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Booking;
    use serde_json::json;

    fn changes(pairs: &[(&'static str, Value)]) -> Changes {
        pairs.iter().cloned().collect()
    }

    #[tokio::test]
    async fn ids_are_sequential_per_table() {
        let store = MemoryStore::new();
        let a = store
            .insert(Booking::TABLE, &changes(&[("name", json!("A")), ("no_of_guests", json!(2))]))
            .await
            .unwrap();
        let b = store
            .insert(Booking::TABLE, &changes(&[("name", json!("B")), ("no_of_guests", json!(3))]))
            .await
            .unwrap();
        assert_eq!(a["id"], json!(1));
        assert_eq!(b["id"], json!(2));
        assert_eq!(store.list(Booking::TABLE).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn defaults_and_unique_columns() {
        let store = MemoryStore::new();
        let row = store
            .insert(User::TABLE, &changes(&[("username", json!("ana")), ("password", json!("h"))]))
            .await
            .unwrap();
        assert_eq!(row["is_active"], json!(true));
        assert_eq!(row["is_superuser"], json!(false));
        let dup = store
            .insert(User::TABLE, &changes(&[("username", json!("ana")), ("password", json!("h"))]))
            .await;
        assert!(matches!(dup, Err(AppError::Conflict(c)) if c == "username"));
    }

    #[tokio::test]
    async fn delete_user_drops_permissions() {
        let store = MemoryStore::new();
        let row = store
            .insert(User::TABLE, &changes(&[("username", json!("ana")), ("password", json!("h"))]))
            .await
            .unwrap();
        let id = row["id"].as_i64().unwrap();
        store.grant_permission(id, "add_menu").await.unwrap();
        assert_eq!(store.permissions(id).await.unwrap(), vec!["add_menu".to_string()]);
        assert!(store.delete(User::TABLE, id).await.unwrap());
        assert!(store.permissions(id).await.unwrap().is_empty());
        assert!(!store.delete(User::TABLE, id).await.unwrap());
        assert!(matches!(store.grant_permission(id, "add_menu").await, Err(AppError::NotFound)));
    }
}
