/// Semantic type of a column. A closed set: filter predicates and sort keys
/// dispatch on this tag, never on the runtime shape of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Text,
    Boolean,
}

/// One column of the fixed row schema. The ordinal is the column's position
/// in [`COLUMNS`] and defines the physical row layout.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnType,
}

pub const COLUMN_COUNT: usize = 8;

/// The eight-column message schema, in storage order.
pub const COLUMNS: [Column; COLUMN_COUNT] = [
    Column {
        name: "message_id",
        kind: ColumnType::Integer,
    },
    Column {
        name: "version",
        kind: ColumnType::Integer,
    },
    Column {
        name: "item_id",
        kind: ColumnType::Integer,
    },
    Column {
        name: "location",
        kind: ColumnType::Text,
    },
    Column {
        name: "quantity",
        kind: ColumnType::Integer,
    },
    Column {
        name: "transaction_datetime",
        kind: ColumnType::Text,
    },
    Column {
        name: "transaction_number",
        kind: ColumnType::Integer,
    },
    Column {
        name: "duplicate",
        kind: ColumnType::Boolean,
    },
];

pub const MESSAGE_ID: usize = 0;
pub const VERSION: usize = 1;
pub const ITEM_ID: usize = 2;
pub const LOCATION: usize = 3;
pub const QUANTITY: usize = 4;
pub const TRANSACTION_DATETIME: usize = 5;
pub const TRANSACTION_NUMBER: usize = 6;
pub const DUPLICATE: usize = 7;

/// Human heading for a column name: underscores to spaces, Title Case.
pub fn heading_title(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
