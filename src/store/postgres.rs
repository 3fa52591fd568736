//! PostgreSQL backend: bootstrap DDL and single-statement CRUD.

use super::{Changes, Row, Store};
use crate::error::{AppError, ConfigError};
use crate::model::{Booking, Menu, Resource, Table, User};
use crate::sql::{self, QueryBuf};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    async fn fetch_optional(&self, q: &QueryBuf) -> Result<Option<Row>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        let row = query.fetch_optional(&self.pool).await.map_err(unique_violation)?;
        Ok(row.map(|r| row_to_json(&r)))
    }
}

/// Create the application tables if they do not exist. Idempotent.
pub async fn ensure_tables(pool: &PgPool) -> Result<(), AppError> {
    for table in [Menu::TABLE, Booking::TABLE, User::TABLE] {
        sqlx::query(&sql::create_table(table)).execute(pool).await?;
    }
    let permissions_ddl = format!(
        r#"
        CREATE TABLE IF NOT EXISTS user_permissions (
            user_id BIGINT NOT NULL REFERENCES "{}"(id) ON DELETE CASCADE,
            codename VARCHAR(100) NOT NULL,
            PRIMARY KEY (user_id, codename)
        )
        "#,
        User::TABLE.name
    );
    sqlx::query(&permissions_ddl).execute(pool).await?;
    Ok(())
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| invalid_url(e.to_string()))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(&db_name)
            .fetch_one(&mut conn)
            .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn invalid_url(message: String) -> AppError {
    AppError::Config(ConfigError::Invalid {
        key: "DATABASE_URL",
        message,
    })
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| invalid_url("no database path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn unique_violation(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(db.constraint().unwrap_or_default().to_string())
        }
        _ => AppError::Db(e),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }

    async fn list(&self, table: &'static Table) -> Result<Vec<Row>, AppError> {
        let q = sql::select_list(table);
        tracing::debug!(sql = %q.sql, "query");
        let rows = sqlx::query(&q.sql).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn fetch(&self, table: &'static Table, id: i64) -> Result<Option<Row>, AppError> {
        self.fetch_optional(&sql::select_by_id(table, id)).await
    }

    async fn find_by(
        &self,
        table: &'static Table,
        column: &str,
        value: &Value,
    ) -> Result<Option<Row>, AppError> {
        let q = sql::select_by_column(table, column, value).ok_or_else(|| {
            AppError::Internal(format!("unknown column {}.{}", table.name, column))
        })?;
        self.fetch_optional(&q).await
    }

    async fn insert(&self, table: &'static Table, changes: &Changes) -> Result<Row, AppError> {
        self.fetch_optional(&sql::insert(table, changes))
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    async fn update(
        &self,
        table: &'static Table,
        id: i64,
        changes: &Changes,
    ) -> Result<Option<Row>, AppError> {
        self.fetch_optional(&sql::update(table, id, changes)).await
    }

    async fn delete(&self, table: &'static Table, id: i64) -> Result<bool, AppError> {
        Ok(self.fetch_optional(&sql::delete(table, id)).await?.is_some())
    }

    async fn permissions(&self, user_id: i64) -> Result<Vec<String>, AppError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT codename FROM user_permissions WHERE user_id = $1 ORDER BY codename",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(c,)| c).collect())
    }

    async fn grant_permission(&self, user_id: i64, codename: &str) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO user_permissions (user_id, codename) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(codename)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => AppError::NotFound,
            _ => AppError::Db(e),
        })?;
        Ok(())
    }
}

fn row_to_json(row: &PgRow) -> Row {
    use sqlx::Column;
    use sqlx::Row as _;
    let mut map = Row::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    map
}

fn cell_to_value(row: &PgRow, name: &str) -> Value {
    use sqlx::Row as _;
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    Value::Null
}
