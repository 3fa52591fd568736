//! Authentication and authorization:
//! - [`Identity`] - request extractor resolving HTTP Basic credentials
//! - [`Policy`] - per-endpoint permission rules
//! - [`password`] - argon2 hashing

pub mod identity;
pub mod password;
pub mod policy;

pub use identity::{authenticate, parse_basic, CurrentUser, Identity};
pub use policy::{codename, Action, Policy};
