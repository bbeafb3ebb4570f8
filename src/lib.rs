//! # StudentLedger
//!
//! Student record management on an append-only, versioned key-value ledger:
//! - Create / update / read / delete of student records with existence checks
//! - Full-keyspace listing assembled straight from a range scan
//! - Version history of any record, deletions included, from the change log
//! - Durable ledger backed by a CRC-checked write-ahead log
//! - TCP-based client protocol
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │               (function name + arguments)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Engine                                 │
//! │              (closed Operation enum dispatch)                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!     ┌─────────────────┼──────────────────┐
//!     ▼                 ▼                  ▼
//! ┌─────────┐    ┌─────────────┐    ┌─────────────┐
//! │  Store  │    │ Range Query │    │   History   │
//! └────┬────┘    └──────┬──────┘    └──────┬──────┘
//!      └────────────────┼──────────────────┘
//!                       ▼
//!               ┌──────────────┐
//!               │    Ledger    │──── WAL (append-only)
//!               └──────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod wal;
pub mod ledger;
pub mod contract;
pub mod network;
pub mod protocol;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ErrorKind, LedgerError, Result};
pub use config::Config;
pub use engine::Engine;
pub use ledger::{DurableLedger, Ledger, MemoryLedger};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of StudentLedger
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
