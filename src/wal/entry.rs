//! WAL Entry definitions
//!
//! Defines the structure of individual WAL log entries and their framing.

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::ledger::Timestamp;

/// Frame header: LSN (8) + CRC (4) + payload length (4)
pub const HEADER_SIZE: usize = 16;

/// Largest payload a frame may declare (64 MB)
pub const MAX_ENTRY_SIZE: u32 = 64 * 1024 * 1024;

/// A single entry in the WAL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// Commit time of the mutation
    pub timestamp: Timestamp,

    /// The mutation that was committed
    pub mutation: Mutation,
}

/// Mutations that can be logged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutation {
    /// Write a value under a key
    Put { key: String, value: Vec<u8> },

    /// Remove a key
    Delete { key: String },
}

impl Mutation {
    /// The key this mutation touches
    pub fn key(&self) -> &str {
        match self {
            Mutation::Put { key, .. } => key,
            Mutation::Delete { key } => key,
        }
    }
}

impl WalEntry {
    pub fn new(lsn: u64, timestamp: Timestamp, mutation: Mutation) -> Self {
        Self {
            lsn,
            timestamp,
            mutation,
        }
    }

    /// Encode this entry as a complete frame (header + payload)
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let payload = bincode::serialize(self)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;

        if payload.len() > MAX_ENTRY_SIZE as usize {
            return Err(LedgerError::Serialization(format!(
                "WAL entry too large: {} bytes (max {})",
                payload.len(),
                MAX_ENTRY_SIZE
            )));
        }

        let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
        frame.extend_from_slice(&self.lsn.to_le_bytes());
        frame.extend_from_slice(&compute_crc(&payload).to_le_bytes());
        frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        frame.extend_from_slice(&payload);
        Ok(frame)
    }

    /// Decode a frame payload
    pub fn deserialize(payload: &[u8]) -> Result<Self> {
        bincode::deserialize(payload).map_err(|e| LedgerError::WalCorruption(e.to_string()))
    }
}

/// CRC32 over a frame payload
pub fn compute_crc(payload: &[u8]) -> u32 {
    crc32fast::hash(payload)
}
