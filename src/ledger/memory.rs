//! In-memory ledger
//!
//! A complete ledger that never touches disk. Useful for tests, benches,
//! and as the read side of [`DurableLedger`](super::DurableLedger).

use parking_lot::RwLock;

use crate::error::Result;
use crate::wal::Mutation;

use super::{
    HistoryIterator, Ledger, LedgerState, ScanTracker, SnapshotIter, StateIterator, Timestamp,
    Versioned,
};

/// Ledger kept entirely in memory
///
/// ## Concurrency:
/// - `state`: RwLock (many concurrent readers, exclusive writer)
/// - A version check and the write it guards happen under one write lock
#[derive(Default)]
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
    scans: ScanTracker,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap already-replayed state
    pub(crate) fn from_state(state: LedgerState) -> Self {
        Self {
            state: RwLock::new(state),
            scans: ScanTracker::default(),
        }
    }

    /// Number of range scans / history reads currently open
    pub fn open_iterators(&self) -> usize {
        self.scans.open_count()
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.state.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().is_empty()
    }

    /// Sequence number of the last commit
    pub fn last_sequence(&self) -> u64 {
        self.state.read().last_sequence()
    }

    /// Check a version precondition against the current state
    pub(crate) fn check_version(&self, key: &str, expected: Option<&str>) -> Result<()> {
        self.state.read().check_version(key, expected)
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.state.read().contains(key)
    }

    /// Apply a mutation that has already been made durable elsewhere
    pub(crate) fn apply_committed(
        &self,
        sequence: u64,
        timestamp: Timestamp,
        mutation: Mutation,
    ) -> String {
        self.state.write().apply(sequence, timestamp, mutation)
    }

    fn commit(&self, mutation: Mutation, expected: Option<Option<&str>>) -> Result<String> {
        let mut state = self.state.write();
        if let Some(expected) = expected {
            state.check_version(mutation.key(), expected)?;
        }
        let sequence = state.last_sequence() + 1;
        Ok(state.apply(sequence, Timestamp::now(), mutation))
    }
}

impl Ledger for MemoryLedger {
    fn get_versioned(&self, key: &str) -> Result<Option<Versioned>> {
        Ok(self.state.read().get(key).cloned())
    }

    fn put_state(&self, key: &str, value: &[u8]) -> Result<String> {
        self.commit(
            Mutation::Put {
                key: key.to_string(),
                value: value.to_vec(),
            },
            None,
        )
    }

    fn put_state_if(&self, key: &str, value: &[u8], expected: Option<&str>) -> Result<String> {
        self.commit(
            Mutation::Put {
                key: key.to_string(),
                value: value.to_vec(),
            },
            Some(expected),
        )
    }

    fn delete_state(&self, key: &str) -> Result<()> {
        let mut state = self.state.write();
        if !state.contains(key) {
            return Ok(());
        }
        let sequence = state.last_sequence() + 1;
        state.apply(
            sequence,
            Timestamp::now(),
            Mutation::Delete {
                key: key.to_string(),
            },
        );
        Ok(())
    }

    fn state_by_range(&self, start: &str, end: &str) -> Result<StateIterator<'_>> {
        let guard = self.scans.acquire();
        let items = self.state.read().range(start, end);
        Ok(Box::new(SnapshotIter::new(items, guard)))
    }

    fn history_for_key(&self, key: &str) -> Result<HistoryIterator<'_>> {
        let guard = self.scans.acquire();
        let events = self.state.read().history(key);
        Ok(Box::new(SnapshotIter::new(events, guard)))
    }
}
