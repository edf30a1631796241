use thiserror::Error;

/// Enumeration of errors for operations on the message table.
/// Errors can originate from sqlx or regex and are wrapped by us to provide
/// additional context.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("failed to parse message payload: {0}")]
    PayloadParsingError(#[from] serde_json::Error),
    #[error("message is missing the {0} attribute")]
    MissingAttribute(&'static str),
    #[error("message field {field} does not hold an integer: {value}")]
    InvalidField { field: &'static str, value: String },

    #[error("connection to the row store failed with: {error}")]
    ConnectionError { error: sqlx::Error },
    #[error("{command} query failed with: {error}")]
    QueryError {
        command: String,
        error: sqlx::Error,
    },

    #[error("column {0} is not part of the schema")]
    UnknownColumn(usize),
    #[error("a {predicate} filter does not apply to the {column} column")]
    FilterTypeMismatch {
        predicate: &'static str,
        column: &'static str,
    },
    #[error("filter {bound} bound is not an integer: {value}")]
    InvalidFilterBound { bound: &'static str, value: String },
    #[error("invalid filter pattern: {0}")]
    PatternCompileError(#[from] regex::Error),
}

impl TableError {
    /// True for errors raised before any record was built: the message itself
    /// is bad and redelivery cannot fix it.
    pub fn is_malformed_message(&self) -> bool {
        matches!(
            self,
            TableError::PayloadParsingError(_)
                | TableError::MissingAttribute(_)
                | TableError::InvalidField { .. }
        )
    }
}
