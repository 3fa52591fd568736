//! Per-endpoint authorization policies.

use super::Identity;
use crate::error::AppError;
use axum::http::Method;

/// Model-level action a mutating verb maps to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Add,
    Change,
    Delete,
}

impl Action {
    /// `None` for safe methods.
    pub fn for_method(method: &Method) -> Option<Action> {
        match *method {
            Method::POST => Some(Action::Add),
            Method::PUT | Method::PATCH => Some(Action::Change),
            Method::DELETE => Some(Action::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Add => "add",
            Action::Change => "change",
            Action::Delete => "delete",
        }
    }
}

/// Permission codename for an action on a model, e.g. `add_menu`.
pub fn codename(action: Action, model: &str) -> String {
    format!("{}_{}", action.as_str(), model)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Policy {
    AllowAny,
    IsAuthenticated,
    /// Safe methods for everyone; writes need the model permission for the verb.
    ModelPermissionsOrAnonReadOnly { model: &'static str },
}

impl Policy {
    pub fn check(&self, method: &Method, identity: &Identity) -> Result<(), AppError> {
        match self {
            Policy::AllowAny => Ok(()),
            Policy::IsAuthenticated => identity
                .user()
                .map(|_| ())
                .ok_or(AppError::NotAuthenticated),
            Policy::ModelPermissionsOrAnonReadOnly { model } => {
                let Some(action) = Action::for_method(method) else {
                    return Ok(());
                };
                let user = identity.user().ok_or(AppError::NotAuthenticated)?;
                let required = codename(action, model);
                if user.has_permission(&required) {
                    Ok(())
                } else {
                    tracing::warn!(
                        user_id = user.id,
                        username = %user.username,
                        permission = %required,
                        "permission denied"
                    );
                    Err(AppError::PermissionDenied(required))
                }
            }
        }
    }
}
