//! Request identity from HTTP Basic credentials.

use crate::error::AppError;
use crate::model::User;
use crate::state::AppState;
use crate::store::Repository;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::Value;
use std::collections::HashSet;

/// Authenticated caller with its effective permission codenames.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub is_superuser: bool,
    pub permissions: HashSet<String>,
}

impl CurrentUser {
    pub fn has_permission(&self, codename: &str) -> bool {
        self.is_superuser || self.permissions.contains(codename)
    }
}

#[derive(Clone, Debug)]
pub enum Identity {
    Anonymous,
    User(CurrentUser),
}

impl Identity {
    pub fn user(&self) -> Option<&CurrentUser> {
        match self {
            Identity::Anonymous => None,
            Identity::User(user) => Some(user),
        }
    }
}

/// Decode an `Authorization` header value. `Ok(None)` when the scheme is not Basic.
pub fn parse_basic(header_value: &str) -> Result<Option<(String, String)>, AppError> {
    let mut parts = header_value.split_whitespace();
    match parts.next() {
        Some(scheme) if scheme.eq_ignore_ascii_case("basic") => {}
        _ => return Ok(None),
    }
    let encoded = match (parts.next(), parts.next()) {
        (Some(encoded), None) => encoded,
        (None, _) => {
            return Err(AppError::AuthenticationFailed(
                "Invalid basic header. No credentials provided.".into(),
            ))
        }
        (Some(_), Some(_)) => {
            return Err(AppError::AuthenticationFailed(
                "Invalid basic header. Credentials string should not contain spaces.".into(),
            ))
        }
    };
    let decoded = STANDARD
        .decode(encoded)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or_else(|| {
            AppError::AuthenticationFailed(
                "Invalid basic header. Credentials not correctly base64 encoded.".into(),
            )
        })?;
    let (username, password) = decoded.split_once(':').ok_or_else(|| {
        AppError::AuthenticationFailed(
            "Invalid basic header. Credentials not correctly base64 encoded.".into(),
        )
    })?;
    Ok(Some((username.to_string(), password.to_string())))
}

/// Resolve credentials against stored users. Inactive accounts never authenticate.
pub async fn authenticate(
    state: &AppState,
    username: &str,
    password: &str,
) -> Result<CurrentUser, AppError> {
    let invalid = || AppError::AuthenticationFailed("Invalid username/password.".into());
    let users = Repository::<User>::new(state.store.clone());
    let user = users
        .find_by("username", &Value::String(username.to_string()))
        .await?
        .ok_or_else(invalid)?;
    if !user.check_password(password) {
        return Err(invalid());
    }
    if !user.is_active {
        return Err(AppError::AuthenticationFailed("User inactive or deleted.".into()));
    }
    let permissions = state.store.permissions(user.id).await?;
    Ok(CurrentUser {
        id: user.id,
        username: user.username,
        is_superuser: user.is_superuser,
        permissions: permissions.into_iter().collect(),
    })
}

#[async_trait]
impl FromRequestParts<AppState> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Identity>() {
            return Ok(identity.clone());
        }
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let credentials = match header_value {
            Some(v) => parse_basic(v)?,
            None => None,
        };
        let identity = match credentials {
            Some((username, password)) => match authenticate(state, &username, &password).await {
                Ok(user) => Identity::User(user),
                Err(e) => {
                    tracing::warn!(username = %username, uri = %parts.uri, "authentication failed");
                    return Err(e);
                }
            },
            None => Identity::Anonymous,
        };
        parts.extensions.insert(identity.clone());
        Ok(identity)
    }
}
