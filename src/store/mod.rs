//! Row storage behind one trait, with a PostgreSQL backend and a process-local backend.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{ensure_database_exists, ensure_tables, PgStore};

use crate::config::{Settings, StorageBackend};
use crate::error::AppError;
use crate::model::{Resource, Table};
use crate::service::CrudService;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

/// A stored row keyed by column name, `id` included.
pub type Row = Map<String, Value>;

/// Column values to write, already validated and normalised.
pub type Changes = BTreeMap<&'static str, Value>;

/// Single-row operations against a table. Every write is one atomic statement.
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> Result<(), AppError>;
    /// All rows ordered by id.
    async fn list(&self, table: &'static Table) -> Result<Vec<Row>, AppError>;
    async fn fetch(&self, table: &'static Table, id: i64) -> Result<Option<Row>, AppError>;
    /// First row whose `column` equals `value`.
    async fn find_by(
        &self,
        table: &'static Table,
        column: &str,
        value: &Value,
    ) -> Result<Option<Row>, AppError>;
    /// Unique violations surface as [`AppError::Conflict`] naming the column.
    async fn insert(&self, table: &'static Table, changes: &Changes) -> Result<Row, AppError>;
    async fn update(
        &self,
        table: &'static Table,
        id: i64,
        changes: &Changes,
    ) -> Result<Option<Row>, AppError>;
    async fn delete(&self, table: &'static Table, id: i64) -> Result<bool, AppError>;
    async fn permissions(&self, user_id: i64) -> Result<Vec<String>, AppError>;
    async fn grant_permission(&self, user_id: i64, codename: &str) -> Result<(), AppError>;
}

/// Open the configured backend. For PostgreSQL this creates the database and tables if missing.
pub async fn connect(settings: &Settings) -> Result<Arc<dyn Store>, AppError> {
    match settings.storage {
        StorageBackend::Postgres => {
            ensure_database_exists(&settings.database_url).await?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(settings.max_connections)
                .connect(&settings.database_url)
                .await?;
            ensure_tables(&pool).await?;
            Ok(Arc::new(PgStore::new(pool)))
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

pub fn decode<R: DeserializeOwned>(row: Row) -> Result<R, AppError> {
    serde_json::from_value(Value::Object(row))
        .map_err(|e| AppError::Internal(format!("row decode: {}", e)))
}

/// Typed access to one entity's rows. Writes go through the same validation as the API.
pub struct Repository<R> {
    store: Arc<dyn Store>,
    _marker: PhantomData<fn() -> R>,
}

impl<R: Resource> Repository<R> {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Repository {
            store,
            _marker: PhantomData,
        }
    }

    pub async fn all(&self) -> Result<Vec<R>, AppError> {
        self.store.list(R::TABLE).await?.into_iter().map(decode).collect()
    }

    pub async fn get(&self, id: i64) -> Result<Option<R>, AppError> {
        self.store.fetch(R::TABLE, id).await?.map(decode).transpose()
    }

    pub async fn find_by(&self, column: &str, value: &Value) -> Result<Option<R>, AppError> {
        self.store.find_by(R::TABLE, column, value).await?.map(decode).transpose()
    }

    pub async fn exists(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.store.fetch(R::TABLE, id).await?.is_some())
    }

    /// Create from a wire-format payload (e.g. `{"Title": ..}`).
    pub async fn create(&self, payload: &Map<String, Value>) -> Result<R, AppError> {
        decode(CrudService::create::<R>(self.store.as_ref(), payload).await?)
    }

    pub async fn update(
        &self,
        id: i64,
        payload: &Map<String, Value>,
        partial: bool,
    ) -> Result<Option<R>, AppError> {
        CrudService::update::<R>(self.store.as_ref(), id, payload, partial)
            .await?
            .map(decode)
            .transpose()
    }

    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        CrudService::destroy::<R>(self.store.as_ref(), id).await
    }
}
