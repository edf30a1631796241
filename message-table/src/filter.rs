use std::collections::HashMap;

use regex::Regex;

use crate::error::TableError;
use crate::record::{CellValue, Record};
use crate::schema::{self, ColumnType};

/// A per-column filter condition. Constructors take the raw dialog input and
/// validate it up front, so a predicate that exists is always evaluable.
#[derive(Debug, Clone)]
pub enum Predicate {
    IntegerRange { min: i64, max: i64 },
    TextPattern { regex: Regex },
    BooleanFlags { accept_true: bool, accept_false: bool },
}

impl Predicate {
    /// Inclusive integer range. Bounds arrive as dialog text; a non-numeric
    /// bound rejects the commit.
    pub fn integer_range(min: &str, max: &str) -> Result<Predicate, TableError> {
        let min = min.trim().parse().map_err(|_| TableError::InvalidFilterBound {
            bound: "min",
            value: min.to_owned(),
        })?;
        let max = max.trim().parse().map_err(|_| TableError::InvalidFilterBound {
            bound: "max",
            value: max.to_owned(),
        })?;
        Ok(Predicate::IntegerRange { min, max })
    }

    /// Unanchored substring search over the cell text.
    pub fn text_pattern(pattern: &str) -> Result<Predicate, TableError> {
        Ok(Predicate::TextPattern {
            regex: Regex::new(pattern)?,
        })
    }

    pub fn boolean_flags(accept_true: bool, accept_false: bool) -> Predicate {
        Predicate::BooleanFlags {
            accept_true,
            accept_false,
        }
    }

    fn kind(&self) -> ColumnType {
        match self {
            Predicate::IntegerRange { .. } => ColumnType::Integer,
            Predicate::TextPattern { .. } => ColumnType::Text,
            Predicate::BooleanFlags { .. } => ColumnType::Boolean,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Predicate::IntegerRange { .. } => "integer range",
            Predicate::TextPattern { .. } => "text pattern",
            Predicate::BooleanFlags { .. } => "boolean",
        }
    }

    fn matches(&self, cell: CellValue) -> bool {
        match (self, cell) {
            (Predicate::IntegerRange { min, max }, CellValue::Int(value)) => {
                value >= *min && value <= *max
            }
            (Predicate::TextPattern { regex }, CellValue::Text(text)) => regex.is_match(text),
            (Predicate::BooleanFlags { accept_true, accept_false }, CellValue::Bool(value)) => {
                if value {
                    *accept_true
                } else {
                    *accept_false
                }
            }
            // `FilterSpec::set` rejects predicates whose kind does not match
            // the column type, so a mismatch here is a defect, not a pass.
            (predicate, cell) => {
                unreachable!("{} predicate evaluated against {:?}", predicate.name(), cell)
            }
        }
    }
}

/// Zero or one active predicate per column. Committing a predicate for a
/// column replaces any prior predicate for that column; a rejected commit
/// leaves the prior entry in place.
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    predicates: HashMap<usize, Predicate>,
}

impl FilterSpec {
    pub fn new() -> FilterSpec {
        FilterSpec::default()
    }

    pub fn set(&mut self, ordinal: usize, predicate: Predicate) -> Result<(), TableError> {
        let column = schema::COLUMNS
            .get(ordinal)
            .ok_or(TableError::UnknownColumn(ordinal))?;
        if predicate.kind() != column.kind {
            return Err(TableError::FilterTypeMismatch {
                predicate: predicate.name(),
                column: column.name,
            });
        }
        self.predicates.insert(ordinal, predicate);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.predicates.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn is_filtered(&self, ordinal: usize) -> bool {
        self.predicates.contains_key(&ordinal)
    }

    /// The active predicate for a column, for seeding the filter dialog.
    pub fn get(&self, ordinal: usize) -> Option<&Predicate> {
        self.predicates.get(&ordinal)
    }

    /// A record is visible only if it passes every active predicate.
    pub fn passes(&self, record: &Record) -> bool {
        self.predicates
            .iter()
            .all(|(ordinal, predicate)| predicate.matches(record.cell(*ordinal)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(location: &str, quantity: i64, duplicate: bool) -> Record {
        Record {
            message_id: 1,
            version: 1,
            item_id: 100,
            location: location.to_owned(),
            quantity,
            transaction_datetime: String::from("2023-09-05 12:00:00"),
            transaction_number: 7,
            duplicate,
        }
    }

    #[test]
    fn integer_range_bounds_are_inclusive() {
        let mut spec = FilterSpec::new();
        spec.set(schema::QUANTITY, Predicate::integer_range("5", "15").unwrap())
            .unwrap();

        assert!(!spec.passes(&record("Georgia", 4, false)));
        assert!(spec.passes(&record("Georgia", 5, false)));
        assert!(spec.passes(&record("Georgia", 15, false)));
        assert!(!spec.passes(&record("Georgia", 16, false)));
    }

    #[test]
    fn text_pattern_is_an_unanchored_search() {
        let mut spec = FilterSpec::new();
        spec.set(schema::LOCATION, Predicate::text_pattern("org").unwrap())
            .unwrap();

        assert!(spec.passes(&record("Georgia", 1, false)));
        assert!(!spec.passes(&record("Texas", 1, false)));
    }

    #[test]
    fn boolean_flags_gate_each_value() {
        let mut spec = FilterSpec::new();
        spec.set(schema::DUPLICATE, Predicate::boolean_flags(true, false))
            .unwrap();

        assert!(spec.passes(&record("Georgia", 1, true)));
        assert!(!spec.passes(&record("Georgia", 1, false)));
    }

    #[test]
    fn predicates_conjoin_across_columns() {
        let mut spec = FilterSpec::new();
        spec.set(schema::QUANTITY, Predicate::integer_range("5", "15").unwrap())
            .unwrap();
        spec.set(schema::LOCATION, Predicate::text_pattern("^Geo").unwrap())
            .unwrap();

        assert!(spec.passes(&record("Georgia", 10, false)));
        assert!(!spec.passes(&record("Georgia", 20, false)));
        assert!(!spec.passes(&record("Texas", 10, false)));
    }

    #[test]
    fn empty_spec_passes_everything() {
        let spec = FilterSpec::new();
        assert!(spec.passes(&record("Texas", 0, true)));
    }

    #[test]
    fn committing_replaces_the_prior_predicate() {
        let mut spec = FilterSpec::new();
        spec.set(schema::QUANTITY, Predicate::integer_range("0", "5").unwrap())
            .unwrap();
        spec.set(schema::QUANTITY, Predicate::integer_range("10", "20").unwrap())
            .unwrap();

        assert!(!spec.passes(&record("Georgia", 3, false)));
        assert!(spec.passes(&record("Georgia", 12, false)));
    }

    #[test]
    fn rejected_commit_leaves_the_prior_predicate_in_place() {
        let mut spec = FilterSpec::new();
        spec.set(schema::QUANTITY, Predicate::integer_range("5", "15").unwrap())
            .unwrap();

        let result = spec.set(schema::QUANTITY, Predicate::text_pattern("1.*").unwrap());
        assert!(matches!(result, Err(TableError::FilterTypeMismatch { .. })));
        assert!(spec.passes(&record("Georgia", 10, false)));
        assert!(!spec.passes(&record("Georgia", 20, false)));
    }

    #[test]
    fn non_numeric_bounds_reject_the_commit() {
        assert!(matches!(
            Predicate::integer_range("low", "15"),
            Err(TableError::InvalidFilterBound { bound: "min", .. })
        ));
        assert!(matches!(
            Predicate::integer_range("5", "high"),
            Err(TableError::InvalidFilterBound { bound: "max", .. })
        ));
    }

    #[test]
    fn invalid_patterns_reject_the_commit() {
        assert!(matches!(
            Predicate::text_pattern("("),
            Err(TableError::PatternCompileError(_))
        ));
    }

    #[test]
    fn unknown_columns_are_rejected() {
        let mut spec = FilterSpec::new();
        let result = spec.set(42, Predicate::boolean_flags(true, true));
        assert!(matches!(result, Err(TableError::UnknownColumn(42))));
    }

    #[test]
    fn clear_removes_every_predicate() {
        let mut spec = FilterSpec::new();
        spec.set(schema::LOCATION, Predicate::text_pattern("^Geo").unwrap())
            .unwrap();
        spec.clear();

        assert!(spec.is_empty());
        assert!(spec.passes(&record("Texas", 1, false)));
    }
}
