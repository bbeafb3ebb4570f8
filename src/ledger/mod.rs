//! Ledger Module
//!
//! The versioned key-value backend the student records live on.
//!
//! ## Responsibilities
//! - Atomic per-key get/put/delete
//! - Lexicographic range scans over the current state
//! - An immutable, time-ordered change log per key
//! - Transaction ids and timestamps for every committed mutation
//!
//! ## Scoped Scans
//! Range scans and history reads hand out boxed iterators. A scan stays
//! open for as long as its iterator is alive and is released when the
//! iterator is dropped, whichever exit path the caller takes.
//!
//! ## Backends
//! - [`MemoryLedger`]: in-process state, lost on drop
//! - [`DurableLedger`]: the same state rebuilt from an append-only WAL

mod durable;
mod memory;
mod state;

pub use durable::DurableLedger;
pub use memory::MemoryLedger;
pub use state::LedgerState;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Iterator over `(key, value)` pairs of a range scan
pub type StateIterator<'a> = Box<dyn Iterator<Item = Result<KeyValue>> + Send + 'a>;

/// Iterator over the change events of one key
pub type HistoryIterator<'a> = Box<dyn Iterator<Item = Result<ChangeEvent>> + Send + 'a>;

/// The backend contract consumed by the record layer
pub trait Ledger: Send + Sync {
    /// Current value and the transaction that wrote it
    fn get_versioned(&self, key: &str) -> Result<Option<Versioned>>;

    /// Current value of a key
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.get_versioned(key)?.map(|v| v.value))
    }

    /// Unconditionally write a value, returning the transaction id
    fn put_state(&self, key: &str, value: &[u8]) -> Result<String>;

    /// Write a value only if the key is still at `expected`
    ///
    /// `None` requires the key to be absent; `Some(tx_id)` requires the
    /// current value to have been written by that transaction. Fails with
    /// `WriteConflict` otherwise.
    fn put_state_if(&self, key: &str, value: &[u8], expected: Option<&str>) -> Result<String>;

    /// Remove a key (no-op when absent)
    fn delete_state(&self, key: &str) -> Result<()>;

    /// Scan `[start, end)`; an empty bound is unbounded on that side
    fn state_by_range(&self, start: &str, end: &str) -> Result<StateIterator<'_>>;

    /// Change log for one key, in the order given by `history_order`
    fn history_for_key(&self, key: &str) -> Result<HistoryIterator<'_>>;

    /// Order in which `history_for_key` yields events
    fn history_order(&self) -> HistoryOrder {
        HistoryOrder::OldestFirst
    }
}

/// Native order of a backend's per-key change log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryOrder {
    /// Oldest change first
    #[default]
    OldestFirst,

    /// Newest change first; reconstruction reverses it so callers always
    /// see creation before later updates
    NewestFirst,
}

/// A key and its raw stored value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: Vec<u8>,
}

/// A stored value together with the transaction that wrote it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned {
    pub value: Vec<u8>,
    pub tx_id: String,
}

/// One committed change to a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Backend-assigned transaction id
    pub tx_id: String,

    /// Value written by the change (empty for deletions)
    pub value: Vec<u8>,

    /// Commit time
    pub timestamp: Timestamp,

    /// Whether the change removed the key
    pub is_delete: bool,
}

/// Commit time as seconds + nanoseconds since the Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: i32,
}

impl Timestamp {
    pub fn new(seconds: i64, nanos: i32) -> Self {
        Self { seconds, nanos }
    }

    /// Current wall-clock time
    pub fn now() -> Self {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self {
            seconds: elapsed.as_secs() as i64,
            nanos: elapsed.subsec_nanos() as i32,
        }
    }
}

/// Render a commit sequence number as an opaque transaction id
pub fn tx_id_for(sequence: u64) -> String {
    format!("{:016x}", sequence)
}

// =============================================================================
// Scan Tracking
// =============================================================================

/// Counts scans that have been opened and not yet released
#[derive(Debug, Clone, Default)]
pub(crate) struct ScanTracker {
    open: Arc<AtomicUsize>,
}

impl ScanTracker {
    pub(crate) fn acquire(&self) -> ScanGuard {
        self.open.fetch_add(1, Ordering::SeqCst);
        ScanGuard {
            open: Arc::clone(&self.open),
        }
    }

    pub(crate) fn open_count(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

/// Releases its scan on drop
#[derive(Debug)]
pub(crate) struct ScanGuard {
    open: Arc<AtomicUsize>,
}

impl Drop for ScanGuard {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Iterator over a point-in-time snapshot, holding its scan open
pub(crate) struct SnapshotIter<T> {
    items: std::vec::IntoIter<T>,
    _guard: ScanGuard,
}

impl<T> SnapshotIter<T> {
    pub(crate) fn new(items: Vec<T>, guard: ScanGuard) -> Self {
        Self {
            items: items.into_iter(),
            _guard: guard,
        }
    }
}

impl<T> Iterator for SnapshotIter<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.items.next().map(Ok)
    }
}
