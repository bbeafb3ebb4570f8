//! Ledger state
//!
//! Current values plus the per-key change log, rebuilt from committed
//! mutations.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use crate::error::{LedgerError, Result};
use crate::wal::Mutation;

use super::{tx_id_for, ChangeEvent, KeyValue, Timestamp, Versioned};

/// In-memory view of the ledger
///
/// `entries` is ordered so range scans come out in key order. `history`
/// only ever grows.
#[derive(Debug, Default)]
pub struct LedgerState {
    entries: BTreeMap<String, Versioned>,
    history: HashMap<String, Vec<ChangeEvent>>,
    last_sequence: u64,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a key
    pub fn get(&self, key: &str) -> Option<&Versioned> {
        self.entries.get(key)
    }

    /// Whether a key currently holds a value
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sequence number of the last applied mutation (0 if none)
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Verify that `key` is still at the expected version
    pub fn check_version(&self, key: &str, expected: Option<&str>) -> Result<()> {
        let current = self.entries.get(key).map(|v| v.tx_id.as_str());
        if current == expected {
            Ok(())
        } else {
            Err(LedgerError::WriteConflict(key.to_string()))
        }
    }

    /// Apply a committed mutation, returning its transaction id
    ///
    /// Deleting an absent key is recorded like any other change; callers
    /// that want no-op deletes check `contains` first.
    pub fn apply(&mut self, sequence: u64, timestamp: Timestamp, mutation: Mutation) -> String {
        let tx_id = tx_id_for(sequence);
        self.last_sequence = self.last_sequence.max(sequence);

        let (key, event) = match mutation {
            Mutation::Put { key, value } => {
                self.entries.insert(
                    key.clone(),
                    Versioned {
                        value: value.clone(),
                        tx_id: tx_id.clone(),
                    },
                );
                let event = ChangeEvent {
                    tx_id: tx_id.clone(),
                    value,
                    timestamp,
                    is_delete: false,
                };
                (key, event)
            }
            Mutation::Delete { key } => {
                self.entries.remove(&key);
                let event = ChangeEvent {
                    tx_id: tx_id.clone(),
                    value: Vec::new(),
                    timestamp,
                    is_delete: true,
                };
                (key, event)
            }
        };

        self.history.entry(key).or_default().push(event);
        tx_id
    }

    /// Snapshot of all live entries in `[start, end)`
    pub fn range(&self, start: &str, end: &str) -> Vec<KeyValue> {
        if !start.is_empty() && !end.is_empty() && start >= end {
            return Vec::new();
        }

        let lower = if start.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Included(start)
        };
        let upper = if end.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(end)
        };

        self.entries
            .range::<str, _>((lower, upper))
            .map(|(key, versioned)| KeyValue {
                key: key.clone(),
                value: versioned.value.clone(),
            })
            .collect()
    }

    /// Snapshot of a key's change log, oldest first
    pub fn history(&self, key: &str) -> Vec<ChangeEvent> {
        self.history.get(key).cloned().unwrap_or_default()
    }
}
