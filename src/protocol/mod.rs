//! Protocol Module
//!
//! Defines the operation set and the wire protocol for client-server
//! communication.
//!
//! ## Protocol Format (V1 - Simple Binary)
//!
//! ### Request Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Tag (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Invocation Payload (tag 0x10)
//! ```text
//! name_len (4) + name + argc (4) + [arg_len (4) + arg]*
//! ```
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Status Codes
//! - 0x00: OK
//! - 0x01: NOT_FOUND
//! - 0x02: ERROR

mod command;
mod response;
mod codec;

pub use command::{Invocation, Operation, OperationKind};
pub use response::{Response, Status};
pub use codec::{
    decode_invocation, decode_response, encode_invocation, encode_response, read_invocation,
    read_response, write_invocation, write_response, HEADER_SIZE, INVOKE_TAG, MAX_PAYLOAD_SIZE,
};
