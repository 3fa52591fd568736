//! Process settings read from the environment (a `.env` file is loaded by the binary).

use crate::error::ConfigError;
use std::str::FromStr;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/restaurant";
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Which `Store` implementation backs the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    /// Process-local rows; lost on restart.
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(ConfigError::Invalid {
                key: "STORAGE_BACKEND",
                message: format!("{} (expected postgres or memory)", other),
            }),
        }
    }
}

/// Superuser created at startup when absent.
#[derive(Clone, Debug)]
pub struct AdminAccount {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub bind_addr: String,
    pub storage: StorageBackend,
    pub database_url: String,
    pub max_connections: u32,
    pub body_limit: usize,
    pub admin: Option<AdminAccount>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage = match lookup("STORAGE_BACKEND") {
            Some(v) => v.parse()?,
            None => StorageBackend::Postgres,
        };
        let max_connections = parse_or(
            "DATABASE_MAX_CONNECTIONS",
            lookup("DATABASE_MAX_CONNECTIONS"),
            5,
        )?;
        let body_limit = parse_or(
            "BODY_LIMIT_BYTES",
            lookup("BODY_LIMIT_BYTES"),
            DEFAULT_BODY_LIMIT,
        )?;

        let admin = match (lookup("ADMIN_USERNAME"), lookup("ADMIN_PASSWORD")) {
            (Some(username), Some(password)) if !username.is_empty() => {
                Some(AdminAccount { username, password })
            }
            (Some(_), None) => return Err(ConfigError::Missing("ADMIN_PASSWORD")),
            _ => None,
        };

        Ok(Settings {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            storage,
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            max_connections,
            body_limit,
            admin,
        })
    }
}

fn parse_or<T: FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
            key,
            message: format!("cannot parse {:?}", v),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults_apply() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(s.storage, StorageBackend::Postgres);
        assert_eq!(s.max_connections, 5);
        assert_eq!(s.body_limit, DEFAULT_BODY_LIMIT);
        assert!(s.admin.is_none());
    }

    #[test]
    fn memory_backend_and_admin() {
        let s = settings(&[
            ("STORAGE_BACKEND", "Memory"),
            ("ADMIN_USERNAME", "admin"),
            ("ADMIN_PASSWORD", "12345"),
        ])
        .unwrap();
        assert_eq!(s.storage, StorageBackend::Memory);
        assert_eq!(s.admin.unwrap().username, "admin");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(settings(&[("STORAGE_BACKEND", "sqlite")]).is_err());
        assert!(settings(&[("DATABASE_MAX_CONNECTIONS", "many")]).is_err());
        assert!(matches!(
            settings(&[("ADMIN_USERNAME", "admin")]),
            Err(ConfigError::Missing("ADMIN_PASSWORD"))
        ));
    }
}
