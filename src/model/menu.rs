use super::{Column, ColumnType, Resource, Table};
use crate::config::{FieldKind, FieldSpec, Projection};
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Menu {
    pub id: i64,
    pub title: String,
    pub price: Decimal,
    pub inventory: i32,
}

const COLUMNS: &[Column] = &[
    Column::new("id", ColumnType::Id),
    Column::new("title", ColumnType::Varchar(255)),
    Column::new("price", ColumnType::Numeric { precision: 10, scale: 2 }),
    Column::new("inventory", ColumnType::Integer),
];

pub const MENU_TABLE: Table = Table {
    name: "menu",
    columns: COLUMNS,
};

// The id is not part of the menu representation.
const FIELDS: &[FieldSpec] = &[
    FieldSpec::new("Title", "title", FieldKind::Text { max_length: 255 }),
    FieldSpec::new(
        "Price",
        "price",
        FieldKind::Decimal {
            max_digits: 10,
            decimal_places: 2,
        },
    ),
    FieldSpec::new("Inventory", "inventory", FieldKind::Integer),
];

pub const MENU_PROJECTION: Projection = Projection {
    model: "menu",
    fields: FIELDS,
};

impl Resource for Menu {
    const NAME: &'static str = "Menu";
    const TABLE: &'static Table = &MENU_TABLE;
    const PROJECTION: &'static Projection = &MENU_PROJECTION;
}
