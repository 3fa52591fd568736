//! Entities: table layout, typed row and wire projection for each resource.

mod booking;
mod menu;
pub mod table;
mod user;

pub use booking::Booking;
pub use menu::Menu;
pub use table::{Column, ColumnDefault, ColumnType, Table, ID_COLUMN};
pub use user::User;

use crate::config::Projection;
use serde::de::DeserializeOwned;

/// An entity served by the generic CRUD views.
pub trait Resource: DeserializeOwned + Send + Sync + 'static {
    /// Display name used in OPTIONS metadata.
    const NAME: &'static str;
    const TABLE: &'static Table;
    const PROJECTION: &'static Projection;
}
