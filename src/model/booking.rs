use super::{Column, ColumnType, Resource, Table};
use crate::config::{FieldKind, FieldSpec, Projection};
use serde::Deserialize;

/// A table reservation. Nothing prevents two bookings for the same slot.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub name: String,
    pub no_of_guests: i32,
}

const COLUMNS: &[Column] = &[
    Column::new("id", ColumnType::Id),
    Column::new("name", ColumnType::Varchar(255)),
    Column::new("no_of_guests", ColumnType::Integer),
];

pub const BOOKING_TABLE: Table = Table {
    name: "booking",
    columns: COLUMNS,
};

const FIELDS: &[FieldSpec] = &[
    FieldSpec::new("id", "id", FieldKind::Integer).read_only(),
    FieldSpec::new("Name", "name", FieldKind::Text { max_length: 255 }),
    FieldSpec::new("No_of_guests", "no_of_guests", FieldKind::Integer),
];

pub const BOOKING_PROJECTION: Projection = Projection {
    model: "booking",
    fields: FIELDS,
};

impl Resource for Booking {
    const NAME: &'static str = "Booking";
    const TABLE: &'static Table = &BOOKING_TABLE;
    const PROJECTION: &'static Projection = &BOOKING_PROJECTION;
}
