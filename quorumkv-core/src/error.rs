//! Domain errors for command parsing and write routing.

use thiserror::Error;

/// Why a client command could not be turned into an operation.
///
/// The service layer maps these onto the fixed response vocabulary: a
/// malformed command answers `"NULL"`, an unknown operation answers
/// `"Invalid command"`. Neither enters consensus.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// A recognized operation with the wrong shape (missing key or value).
    #[error("malformed command: {0:?}")]
    Malformed(String),

    /// The leading token is not one of PUT, GET, DELETE.
    #[error("unknown operation: {0:?}")]
    UnknownOperation(String),
}
