//! Generic create/update flow shared by the API and the typed repositories.

use super::RequestValidator;
use crate::auth::password;
use crate::config::{FieldKind, Projection};
use crate::error::{AppError, FieldErrors};
use crate::model::{Resource, Table, ID_COLUMN};
use crate::store::{Changes, Row, Store};
use serde_json::{Map, Value};

pub struct CrudService;

impl CrudService {
    /// Validate a wire payload and insert it.
    pub async fn create<R: Resource>(
        store: &dyn Store,
        payload: &Map<String, Value>,
    ) -> Result<Row, AppError> {
        Self::create_with::<R>(store, payload, Changes::new()).await
    }

    /// Like [`CrudService::create`], with server-side column values that bypass the projection
    /// (e.g. `is_superuser`).
    pub async fn create_with<R: Resource>(
        store: &dyn Store,
        payload: &Map<String, Value>,
        extra: Changes,
    ) -> Result<Row, AppError> {
        let mut changes = RequestValidator::validate(R::PROJECTION, payload, false)?;
        check_unique(store, R::TABLE, R::PROJECTION, &changes, None).await?;
        hash_credentials(R::PROJECTION, &mut changes)?;
        changes.extend(extra);
        let row = store
            .insert(R::TABLE, &changes)
            .await
            .map_err(|e| conflict_to_field_error(R::PROJECTION, e))?;
        tracing::info!(model = R::PROJECTION.model, id = ?row.get(ID_COLUMN), "created");
        Ok(row)
    }

    /// Validate and apply a full (`partial == false`) or partial update. `None` when no such row.
    /// Callers that need a 404 ahead of body errors check existence first.
    pub async fn update<R: Resource>(
        store: &dyn Store,
        id: i64,
        payload: &Map<String, Value>,
        partial: bool,
    ) -> Result<Option<Row>, AppError> {
        let mut changes = RequestValidator::validate(R::PROJECTION, payload, partial)?;
        check_unique(store, R::TABLE, R::PROJECTION, &changes, Some(id)).await?;
        hash_credentials(R::PROJECTION, &mut changes)?;
        let row = store
            .update(R::TABLE, id, &changes)
            .await
            .map_err(|e| conflict_to_field_error(R::PROJECTION, e))?;
        if row.is_some() {
            tracing::info!(model = R::PROJECTION.model, id, partial, "updated");
        }
        Ok(row)
    }

    /// `false` when no such row.
    pub async fn destroy<R: Resource>(store: &dyn Store, id: i64) -> Result<bool, AppError> {
        let deleted = store.delete(R::TABLE, id).await?;
        if deleted {
            tracing::info!(model = R::PROJECTION.model, id, "deleted");
        }
        Ok(deleted)
    }
}

fn unique_message(projection: &Projection, wire: &str) -> String {
    format!("A {} with that {} already exists.", projection.model, wire)
}

async fn check_unique(
    store: &dyn Store,
    table: &'static Table,
    projection: &Projection,
    changes: &Changes,
    exclude: Option<i64>,
) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    for field in projection.unique_fields() {
        let Some(value) = changes.get(field.column) else {
            continue;
        };
        let existing = store.find_by(table, field.column, value).await?;
        let taken =
            existing.is_some_and(|row| row.get(ID_COLUMN).and_then(Value::as_i64) != exclude);
        if taken {
            errors.add(field.wire, unique_message(projection, field.wire));
        }
    }
    errors.into_result()
}

fn hash_credentials(projection: &Projection, changes: &mut Changes) -> Result<(), AppError> {
    for field in projection.fields.iter().filter(|f| f.kind == FieldKind::Password) {
        if let Some(Value::String(raw)) = changes.get(field.column) {
            let hashed = password::hash_password(raw)?;
            changes.insert(field.column, Value::String(hashed));
        }
    }
    Ok(())
}

/// A unique violation that slipped past [`check_unique`] (concurrent writers)
/// becomes a field error.
fn conflict_to_field_error(projection: &Projection, err: AppError) -> AppError {
    match err {
        AppError::Conflict(column) => match projection
            .unique_fields()
            .find(|f| column.contains(f.column))
        {
            Some(field) => AppError::Validation(FieldErrors::single(
                field.wire,
                unique_message(projection, field.wire),
            )),
            None => {
                tracing::warn!(model = projection.model, constraint = %column, "unique violation");
                AppError::Conflict(column)
            }
        },
        other => other,
    }
}
