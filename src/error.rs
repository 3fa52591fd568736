//! Typed errors and HTTP mapping.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use thiserror::Error;

/// Realm advertised in `WWW-Authenticate` on 401 responses.
pub const AUTH_REALM: &str = "Basic realm=\"api\"";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing setting: {0}")]
    Missing(&'static str),
    #[error("invalid setting {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Field-level validation messages, in field declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<(String, Vec<String>)>);

impl FieldErrors {
    pub fn new() -> Self {
        FieldErrors(Vec::new())
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        let message = message.into();
        match self.0.iter_mut().find(|(name, _)| name == field) {
            Some((_, messages)) => messages.push(message),
            None => self.0.push((field.to_string(), vec![message])),
        }
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, messages)| messages.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

impl Serialize for FieldErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (field, messages) in &self.0 {
            map.serialize_entry(field, messages)?;
        }
        map.end()
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("not found")]
    NotFound,
    #[error("validation: {0}")]
    Validation(FieldErrors),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("authentication credentials were not provided")]
    NotAuthenticated,
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),
    #[error("request body too large")]
    PayloadTooLarge,
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("password hash: {0}")]
    Hash(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::BadRequest(_) | AppError::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotAuthenticated | AppError::AuthenticationFailed(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::Config(_) | AppError::Db(_) | AppError::Hash(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-facing message for the `detail` key.
    fn detail(&self) -> String {
        match self {
            AppError::NotFound => "Not found.".into(),
            AppError::NotAuthenticated => "Authentication credentials were not provided.".into(),
            AppError::AuthenticationFailed(message) => message.clone(),
            AppError::PermissionDenied(_) => {
                "You do not have permission to perform this action.".into()
            }
            AppError::MethodNotAllowed(method) => format!("Method \"{}\" not allowed.", method),
            AppError::PayloadTooLarge => "Request body too large.".into(),
            AppError::UnsupportedMediaType(media) => {
                format!("Unsupported media type \"{}\" in request.", media)
            }
            AppError::BadRequest(message) => message.clone(),
            AppError::Conflict(_) => "A conflicting record already exists.".into(),
            AppError::Validation(errors) => errors.to_string(),
            AppError::Config(_) | AppError::Db(_) | AppError::Hash(_) | AppError::Internal(_) => {
                "A server error occurred.".into()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let mut response = match self {
            AppError::Validation(errors) => (status, Json(errors)).into_response(),
            other => (status, Json(crate::response::detail_body(other.detail()))).into_response(),
        };
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(AUTH_REALM));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_keep_declaration_order() {
        let mut errors = FieldErrors::new();
        errors.add("Title", "This field is required.");
        errors.add("Price", "A valid number is required.");
        errors.add("Title", "second");
        let json = serde_json::to_string(&errors).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"Title":["This field is required.","second"],"#,
                r#""Price":["A valid number is required."]}"#
            )
        );
    }

    #[test]
    fn unauthorized_carries_challenge() {
        let response = AppError::NotAuthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            AUTH_REALM
        );
    }

    #[test]
    fn conflict_hides_constraint_name() {
        let response = AppError::Conflict("users_username_key".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = AppError::Conflict("users_username_key".into()).detail();
        assert_eq!(body, "A conflicting record already exists.");
    }

    #[test]
    fn forbidden_has_no_challenge() {
        let response = AppError::PermissionDenied("add_menu".into()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }
}
