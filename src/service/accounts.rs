//! Account bootstrap and permission grants.

use super::CrudService;
use crate::auth::{codename, Action};
use crate::config::AdminAccount;
use crate::error::AppError;
use crate::model::{Resource, User, ID_COLUMN};
use crate::store::{Changes, Store};
use serde_json::{json, Value};

/// Create the configured superuser unless the username is taken.
/// Returns whether a user was created.
pub async fn ensure_superuser(store: &dyn Store, admin: &AdminAccount) -> Result<bool, AppError> {
    let username = Value::String(admin.username.clone());
    if store.find_by(User::TABLE, "username", &username).await?.is_some() {
        tracing::debug!(username = %admin.username, "superuser already present");
        return Ok(false);
    }
    let payload = json!({ "username": admin.username, "password": admin.password });
    let payload = payload.as_object().cloned().unwrap_or_default();
    let mut extra = Changes::new();
    extra.insert("is_superuser", Value::Bool(true));
    let row = CrudService::create_with::<User>(store, &payload, extra).await?;
    tracing::info!(username = %admin.username, id = ?row.get(ID_COLUMN), "superuser created");
    Ok(true)
}

/// Grant `<action>_<model>` for each action.
pub async fn grant_model_permissions<R: Resource>(
    store: &dyn Store,
    user_id: i64,
    actions: &[Action],
) -> Result<(), AppError> {
    for action in actions {
        let name = codename(*action, R::PROJECTION.model);
        store.grant_permission(user_id, &name).await?;
        tracing::info!(user_id, permission = %name, "permission granted");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Menu;
    use crate::store::MemoryStore;

    fn admin() -> AdminAccount {
        AdminAccount {
            username: "admin".into(),
            password: "12345".into(),
        }
    }

    #[tokio::test]
    async fn superuser_is_created_once() {
        let store = MemoryStore::new();
        assert!(ensure_superuser(&store, &admin()).await.unwrap());
        assert!(!ensure_superuser(&store, &admin()).await.unwrap());

        let row = store
            .find_by(User::TABLE, "username", &json!("admin"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.get("is_superuser"), Some(&json!(true)));
        assert_ne!(row.get("password"), Some(&json!("12345")));
    }

    #[tokio::test]
    async fn grants_codenames_for_model() {
        let store = MemoryStore::new();
        ensure_superuser(&store, &admin()).await.unwrap();
        grant_model_permissions::<Menu>(&store, 1, &[Action::Add, Action::Change])
            .await
            .unwrap();
        let mut perms = store.permissions(1).await.unwrap();
        perms.sort();
        assert_eq!(perms, vec!["add_menu".to_string(), "change_menu".to_string()]);
        assert!(grant_model_permissions::<Menu>(&store, 42, &[Action::Add]).await.is_err());
    }
}
