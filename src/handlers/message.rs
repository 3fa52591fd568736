use crate::auth::{Identity, Policy};
use crate::error::AppError;
use axum::{http::Method, Json};
use serde_json::{json, Value};

/// Protected sample endpoint; any authenticated user may read it.
pub async fn message(method: Method, identity: Identity) -> Result<Json<Value>, AppError> {
    Policy::IsAuthenticated.check(&method, &identity)?;
    Ok(Json(json!({ "message": "This view is protected" })))
}
