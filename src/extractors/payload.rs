//! Request body as a flat object, from JSON or an urlencoded form.

use crate::error::{AppError, FieldErrors};
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header, StatusCode},
    Form,
};
use serde_json::{Map, Value};

/// Decoded write payload. Form fields arrive as strings; validation coerces them.
/// A non-empty body needs a JSON or form `Content-Type`.
#[derive(Clone, Debug, Default)]
pub struct Payload(pub Map<String, Value>);

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

fn body_error(status: StatusCode, text: String) -> AppError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::BadRequest(text)
    }
}

fn parse_json(bytes: &[u8]) -> Result<Map<String, Value>, AppError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| AppError::BadRequest(format!("JSON parse error - {}", e)))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(AppError::Validation(FieldErrors::single(
            "non_field_errors",
            format!("Invalid data. Expected a dictionary, but got {}.", json_type_name(&other)),
        ))),
    }
}

async fn parse_form<S: Send + Sync>(
    req: Request,
    state: &S,
) -> Result<Map<String, Value>, AppError> {
    let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
        .await
        .map_err(|e| body_error(e.status(), e.body_text()))?;
    // Last value wins for repeated keys.
    Ok(pairs.into_iter().map(|(k, v)| (k, Value::String(v))).collect())
}

#[async_trait]
impl<S> FromRequest<S> for Payload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let mime = content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(|m| m.trim().to_ascii_lowercase());
        if mime.as_deref() == Some("application/x-www-form-urlencoded") {
            return parse_form(req, state).await.map(Payload);
        }
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| body_error(e.status(), e.body_text()))?;
        let map = match mime.as_deref() {
            _ if bytes.is_empty() => Map::new(),
            Some("application/json") => parse_json(&bytes)?,
            Some(m) if m.ends_with("+json") => parse_json(&bytes)?,
            // A body without a media type cannot be parsed.
            None | Some(_) => {
                return Err(AppError::UnsupportedMediaType(content_type.unwrap_or_default()));
            }
        };
        Ok(Payload(map))
    }
}
