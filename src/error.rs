//! Error types for StudentLedger
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using LedgerError
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Unified error type for StudentLedger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    // -------------------------------------------------------------------------
    // Request Errors
    // -------------------------------------------------------------------------
    #[error("{0}")]
    InvalidArgument(String),

    #[error("Received unknown function invocation")]
    UnknownFunction(String),

    // -------------------------------------------------------------------------
    // Record State Errors
    // -------------------------------------------------------------------------
    #[error("This student already exists: {0}")]
    AlreadyExists(String),

    #[error("student does not exist: {0}")]
    NotFound(String),

    /// Update of an absent record; the message does not name the key
    #[error("student does not exist")]
    UpdateTargetMissing(String),

    #[error("Failed to decode JSON of: {key}")]
    CorruptState { key: String, reason: String },

    #[error("Write conflict on key {0}: state changed since it was read")]
    WriteConflict(String),

    // -------------------------------------------------------------------------
    // Backend Errors
    // -------------------------------------------------------------------------
    #[error("Backend failure: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification of a failure, as reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    AlreadyExists,
    NotFound,
    CorruptState,
    Conflict,
    BackendFailure,
}

impl LedgerError {
    /// Classify this error
    ///
    /// Everything raised below the record layer (I/O, WAL, transport)
    /// surfaces as a backend failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::InvalidArgument(_) | LedgerError::UnknownFunction(_) => {
                ErrorKind::InvalidArgument
            }
            LedgerError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            LedgerError::NotFound(_) | LedgerError::UpdateTargetMissing(_) => ErrorKind::NotFound,
            LedgerError::CorruptState { .. } => ErrorKind::CorruptState,
            LedgerError::WriteConflict(_) => ErrorKind::Conflict,
            LedgerError::Backend(_)
            | LedgerError::Io(_)
            | LedgerError::WalCorruption(_)
            | LedgerError::Serialization(_)
            | LedgerError::Network(_)
            | LedgerError::Protocol(_)
            | LedgerError::Config(_) => ErrorKind::BackendFailure,
        }
    }

    /// Build an InvalidArgument for an empty positional argument (0-based)
    pub fn empty_argument(position: usize) -> Self {
        let ordinal = match position {
            0 => "1st".to_string(),
            1 => "2nd".to_string(),
            2 => "3rd".to_string(),
            n => format!("{}th", n + 1),
        };
        LedgerError::InvalidArgument(format!("{} argument must be a non-empty string", ordinal))
    }

    /// Build an InvalidArgument for a wrong argument count
    pub fn arity(expected: usize) -> Self {
        let expecting = if expected == 0 {
            "None".to_string()
        } else {
            expected.to_string()
        };
        LedgerError::InvalidArgument(format!(
            "Incorrect number of arguments. Expecting {}",
            expecting
        ))
    }
}
