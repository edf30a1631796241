use thiserror::Error;

use message_table::error::TableError;

/// Enumeration of errors fatal to the consumer process. Per-message errors
/// are handled inside the loop and never surface here.
#[derive(Error, Debug)]
pub enum ConsumerError {
    #[error("an error occurred in the message table: {0}")]
    Table(#[from] TableError),
}
