//! Restaurant API: menu items, table bookings and user accounts over REST,
//! with HTTP Basic authentication and per-model permissions.

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod model;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use auth::{Action, Identity, Policy};
pub use config::{AdminAccount, Settings, StorageBackend};
pub use error::{AppError, ConfigError, FieldErrors};
pub use model::{Booking, Menu, Resource, User};
pub use routes::{api_routes, build_router, common_routes, Operation, ViewSet};
pub use service::{ensure_superuser, grant_model_permissions, CrudService};
pub use state::AppState;
pub use store::{MemoryStore, PgStore, Repository, Store};
