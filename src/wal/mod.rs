//! Write-Ahead Log (WAL) Module
//!
//! The durable, append-only change log behind
//! [`DurableLedger`](crate::ledger::DurableLedger).
//!
//! ## Responsibilities
//! - Append one frame per committed mutation, before it becomes visible
//! - CRC32 checksums for corruption detection
//! - Log Sequence Numbers (LSN) for ordering; LSNs double as commit sequence
//! - Recovery on open (skip corrupt frames, cut partial tails)
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Entry 1                                 │
//! │ ┌─────────┬─────────┬────────┬────────┐ │
//! │ │ LSN (8) │ CRC (4) │Len (4) │ Data   │ │
//! │ └─────────┴─────────┴────────┴────────┘ │
//! ├─────────────────────────────────────────┤
//! │ Entry 2                                 │
//! │ ┌─────────┬─────────┬────────┬────────┐ │
//! │ │ LSN (8) │ CRC (4) │Len (4) │ Data   │ │
//! │ └─────────┴─────────┴────────┴────────┘ │
//! └─────────────────────────────────────────┘
//! ```
//! All integers little-endian; `Data` is the bincode-encoded [`WalEntry`].

mod entry;
mod writer;
mod reader;
mod recovery;

pub use entry::{WalEntry, Mutation, HEADER_SIZE, MAX_ENTRY_SIZE};
pub use writer::{LogFile, WalWriter};
pub use reader::{WalReader, WalIterator};
pub use recovery::{WalRecovery, RecoveryResult};
