use std::collections::HashMap;

use crate::record::{CellValue, Record};
use crate::schema::{self, ColumnType};

/// Observed `{min, max}` of one Integer column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: i64,
    pub max: i64,
}

/// Running min/max per Integer column, recomputed from scratch on every scan
/// so stale bounds never outlive the population they were computed from.
/// Bounds cover the unfiltered scan population; they exist to seed filter
/// dialog defaults, not to describe the visible set.
#[derive(Debug, Default)]
pub struct ColumnBounds {
    bounds: HashMap<usize, Bounds>,
}

impl ColumnBounds {
    pub fn reset(&mut self) {
        self.bounds.clear();
    }

    /// Fold one record's Integer cells into the running bounds.
    pub fn observe(&mut self, record: &Record) {
        for (ordinal, column) in schema::COLUMNS.iter().enumerate() {
            if column.kind != ColumnType::Integer {
                continue;
            }
            let CellValue::Int(value) = record.cell(ordinal) else {
                continue;
            };
            self.bounds
                .entry(ordinal)
                .and_modify(|bounds| {
                    bounds.min = bounds.min.min(value);
                    bounds.max = bounds.max.max(value);
                })
                .or_insert(Bounds {
                    min: value,
                    max: value,
                });
        }
    }

    /// `None` until at least one record was observed for the column, or for
    /// non-Integer columns.
    pub fn get(&self, ordinal: usize) -> Option<Bounds> {
        self.bounds.get(&ordinal).copied()
    }
}
