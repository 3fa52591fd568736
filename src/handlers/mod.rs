//! HTTP handlers.

pub mod message;
pub mod resource;
pub mod root;
pub use message::message;
pub use resource::View;
pub use root::{api_root, RootListing};
