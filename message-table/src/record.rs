use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::TableError;
use crate::schema;

/// A message payload as published, before typing. Integer-valued fields
/// arrive as JSON numbers or numeric strings depending on the publisher, so
/// they are deserialized loosely and parsed in [`Record::from_wire`].
#[derive(Debug, Deserialize)]
pub struct RawMessage {
    pub message_id: Value,
    pub item_id: Value,
    pub location: String,
    pub quantity: Value,
    // Some publishers still send the misspelled key.
    #[serde(alias = "transation_datetime")]
    pub transaction_datetime: String,
    pub transaction_number: Value,
}

impl RawMessage {
    pub fn from_bytes(bytes: &[u8]) -> Result<RawMessage, TableError> {
        tracing::debug!(len = bytes.len(), "decoding new message");
        Ok(serde_json::from_slice::<RawMessage>(bytes)?)
    }
}

/// One persisted row: every field typed per its column's declared type.
/// Immutable once stored; `duplicate` is derived at insert time and is a
/// fact about arrival order, never revised afterwards.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Record {
    pub message_id: i64,
    pub version: i64,
    pub item_id: i64,
    pub location: String,
    pub quantity: i64,
    pub transaction_datetime: String,
    pub transaction_number: i64,
    pub duplicate: bool,
}

/// A borrowed view of one cell, tagged with its column type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellValue<'r> {
    Int(i64),
    Text(&'r str),
    Bool(bool),
}

impl Record {
    /// Type a raw payload and its delivery attributes into a `Record`,
    /// attaching the derived duplicate flag.
    pub fn from_wire(
        raw: &RawMessage,
        attributes: &HashMap<String, String>,
        duplicate: bool,
    ) -> Result<Record, TableError> {
        let version = attributes
            .get("version")
            .ok_or(TableError::MissingAttribute("version"))?;

        Ok(Record {
            message_id: parse_integer("message_id", &raw.message_id)?,
            version: version.parse().map_err(|_| TableError::InvalidField {
                field: "version",
                value: version.clone(),
            })?,
            item_id: parse_integer("item_id", &raw.item_id)?,
            location: raw.location.clone(),
            quantity: parse_integer("quantity", &raw.quantity)?,
            transaction_datetime: raw.transaction_datetime.clone(),
            transaction_number: parse_integer("transaction_number", &raw.transaction_number)?,
            duplicate,
        })
    }

    pub fn cell(&self, ordinal: usize) -> CellValue<'_> {
        match ordinal {
            schema::MESSAGE_ID => CellValue::Int(self.message_id),
            schema::VERSION => CellValue::Int(self.version),
            schema::ITEM_ID => CellValue::Int(self.item_id),
            schema::LOCATION => CellValue::Text(&self.location),
            schema::QUANTITY => CellValue::Int(self.quantity),
            schema::TRANSACTION_DATETIME => CellValue::Text(&self.transaction_datetime),
            schema::TRANSACTION_NUMBER => CellValue::Int(self.transaction_number),
            schema::DUPLICATE => CellValue::Bool(self.duplicate),
            _ => unreachable!("column ordinal {} out of range", ordinal),
        }
    }

    /// The cell rendered as text, the way the presentation layer and the
    /// sort keys see it. Booleans render as the stored 0/1.
    pub fn cell_text(&self, ordinal: usize) -> String {
        match self.cell(ordinal) {
            CellValue::Int(v) => v.to_string(),
            CellValue::Text(t) => t.to_owned(),
            CellValue::Bool(b) => String::from(if b { "1" } else { "0" }),
        }
    }
}

fn parse_integer(field: &'static str, value: &Value) -> Result<i64, TableError> {
    match value {
        Value::Number(number) => number.as_i64().ok_or(TableError::InvalidField {
            field,
            value: number.to_string(),
        }),
        Value::String(text) => text.parse().map_err(|_| TableError::InvalidField {
            field,
            value: text.clone(),
        }),
        other => Err(TableError::InvalidField {
            field,
            value: other.to_string(),
        }),
    }
}
