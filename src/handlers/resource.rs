//! Generic resource handlers: list, create, retrieve, update, partial update, destroy, options.
//! Every handler checks the view policy before touching the body or the store.

use crate::auth::{Identity, Policy};
use crate::error::AppError;
use crate::extractors::Payload;
use crate::model::Resource;
use crate::response::{created, no_content, ok};
use crate::service::CrudService;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, Method},
    response::{IntoResponse, Response},
    Extension,
};
use serde_json::{json, Value};

/// Per-route configuration injected as an extension.
#[derive(Clone, Debug)]
pub struct View {
    pub policy: Policy,
    /// Value of the `Allow` header, e.g. `GET, POST, HEAD, OPTIONS`.
    pub allow: String,
    pub name: String,
}

/// Ids are integers; anything else cannot match a row.
fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse().map_err(|_| AppError::NotFound)
}

async fn ensure_exists<R: Resource>(state: &AppState, id: i64) -> Result<(), AppError> {
    match state.store.fetch(R::TABLE, id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound),
    }
}

pub async fn list<R: Resource>(
    State(state): State<AppState>,
    Extension(view): Extension<View>,
    method: Method,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    view.policy.check(&method, &identity)?;
    let rows = state.store.list(R::TABLE).await?;
    let items: Vec<Value> = rows.iter().map(|row| R::PROJECTION.render(row)).collect();
    Ok(ok(items))
}

pub async fn create<R: Resource>(
    State(state): State<AppState>,
    Extension(view): Extension<View>,
    method: Method,
    identity: Identity,
    payload: Result<Payload, AppError>,
) -> Result<impl IntoResponse, AppError> {
    view.policy.check(&method, &identity)?;
    let Payload(body) = payload?;
    let row = CrudService::create::<R>(state.store.as_ref(), &body).await?;
    Ok(created(R::PROJECTION.render(&row)))
}

pub async fn retrieve<R: Resource>(
    State(state): State<AppState>,
    Extension(view): Extension<View>,
    method: Method,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    view.policy.check(&method, &identity)?;
    let id = parse_id(&id)?;
    let row = state.store.fetch(R::TABLE, id).await?.ok_or(AppError::NotFound)?;
    Ok(ok(R::PROJECTION.render(&row)))
}

async fn write<R: Resource>(
    state: AppState,
    view: View,
    method: Method,
    identity: Identity,
    id: String,
    payload: Result<Payload, AppError>,
    partial: bool,
) -> Result<Response, AppError> {
    view.policy.check(&method, &identity)?;
    let id = parse_id(&id)?;
    ensure_exists::<R>(&state, id).await?;
    let Payload(body) = payload?;
    let row = CrudService::update::<R>(state.store.as_ref(), id, &body, partial)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ok(R::PROJECTION.render(&row)).into_response())
}

/// PUT: every writable field required.
pub async fn update<R: Resource>(
    State(state): State<AppState>,
    Extension(view): Extension<View>,
    method: Method,
    identity: Identity,
    Path(id): Path<String>,
    payload: Result<Payload, AppError>,
) -> Result<Response, AppError> {
    write::<R>(state, view, method, identity, id, payload, false).await
}

/// PATCH: only the supplied fields are validated and changed.
pub async fn partial_update<R: Resource>(
    State(state): State<AppState>,
    Extension(view): Extension<View>,
    method: Method,
    identity: Identity,
    Path(id): Path<String>,
    payload: Result<Payload, AppError>,
) -> Result<Response, AppError> {
    write::<R>(state, view, method, identity, id, payload, true).await
}

pub async fn destroy<R: Resource>(
    State(state): State<AppState>,
    Extension(view): Extension<View>,
    method: Method,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    view.policy.check(&method, &identity)?;
    let id = parse_id(&id)?;
    if !CrudService::destroy::<R>(state.store.as_ref(), id).await? {
        return Err(AppError::NotFound);
    }
    Ok(no_content())
}

fn with_allow(mut response: Response, allow: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(allow) {
        response.headers_mut().insert(header::ALLOW, value);
    }
    response
}

pub async fn options(
    Extension(view): Extension<View>,
    method: Method,
    identity: Identity,
) -> Result<Response, AppError> {
    view.policy.check(&method, &identity)?;
    let body = json!({
        "name": view.name,
        "description": "",
        "renders": ["application/json"],
        "parses": ["application/json", "application/x-www-form-urlencoded"],
    });
    Ok(with_allow(ok(body).into_response(), &view.allow))
}

/// Fallback for verbs the route does not serve.
pub async fn method_not_allowed(Extension(view): Extension<View>, method: Method) -> Response {
    let response = AppError::MethodNotAllowed(method.as_str().to_string()).into_response();
    with_allow(response, &view.allow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_integer_ids_are_not_found() {
        assert_eq!(parse_id("12").unwrap(), 12);
        assert!(matches!(parse_id("abc"), Err(AppError::NotFound)));
        assert!(matches!(parse_id("1.5"), Err(AppError::NotFound)));
    }
}
