//! Response definitions
//!
//! Represents responses to clients.

use crate::error::{ErrorKind, LedgerError};

use super::OperationKind;

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    NotFound = 0x01,
    Error = 0x02,
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Optional payload (result on OK, message otherwise)
    pub payload: Option<Vec<u8>>,
}

impl Response {
    /// Create an OK response with optional payload
    pub fn ok(payload: Option<Vec<u8>>) -> Self {
        Self {
            status: Status::Ok,
            payload,
        }
    }

    /// Create a NOT_FOUND response
    pub fn not_found(message: &str) -> Self {
        Self {
            status: Status::NotFound,
            payload: Some(message.as_bytes().to_vec()),
        }
    }

    /// Create an ERROR response
    pub fn error(message: &str) -> Self {
        Self {
            status: Status::Error,
            payload: Some(message.as_bytes().to_vec()),
        }
    }

    /// Render a failed operation
    ///
    /// Lookup-style operations (read, delete, history) report state and
    /// backend failures as `{"Error":"..."}`; everything else is plain text.
    pub fn from_error(kind: Option<OperationKind>, err: &LedgerError) -> Self {
        let message = err.to_string();
        let json_wrapped = kind.is_some_and(|k| k.reports_json_errors())
            && matches!(
                err.kind(),
                ErrorKind::NotFound | ErrorKind::CorruptState | ErrorKind::BackendFailure
            );

        let message = if json_wrapped {
            serde_json::json!({ "Error": message }).to_string()
        } else {
            message
        };

        match err.kind() {
            ErrorKind::NotFound => Self::not_found(&message),
            _ => Self::error(&message),
        }
    }

    /// Whether the operation succeeded
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Payload as text (lossy)
    pub fn payload_str(&self) -> String {
        self.payload
            .as_deref()
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .unwrap_or_default()
    }
}
