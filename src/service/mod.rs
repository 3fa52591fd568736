//! Validation and write flow for resources.

mod accounts;
mod crud;
mod validation;
pub use accounts::{ensure_superuser, grant_model_permissions};
pub use crud::CrudService;
pub use validation::RequestValidator;
