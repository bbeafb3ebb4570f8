//! Durable ledger
//!
//! Every mutation is appended to the write-ahead log before it becomes
//! visible. The log is never truncated: it is the ledger's change history,
//! and replaying it on open rebuilds both current state and per-key history.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::config::{Config, WalSyncStrategy};
use crate::error::Result;
use crate::wal::{Mutation, WalRecovery, WalWriter};

use super::{HistoryIterator, Ledger, LedgerState, MemoryLedger, StateIterator, Timestamp, Versioned};

/// Ledger persisted to an append-only log
///
/// ## Concurrency:
/// - Writes are serialized by the `wal` mutex; version checks run under it
/// - Reads go straight to the in-memory state and never touch the log
pub struct DurableLedger {
    /// Path of the change log
    wal_path: PathBuf,

    /// Append handle, also the write serialization point
    wal: Mutex<WalWriter>,

    /// Replayed state
    inner: MemoryLedger,
}

impl DurableLedger {
    const WAL_FILENAME: &'static str = "ledger.wal";

    /// Open or create a ledger under `config.data_dir`
    ///
    /// On startup:
    /// 1. Create the data directory
    /// 2. Recover the change log (dropping corrupt frames and partial tails)
    /// 3. Replay every recovered mutation in log order
    pub fn open(config: &Config) -> Result<Self> {
        Self::open_with(&config.data_dir, config.wal_sync_strategy)
    }

    /// Open with an explicit directory and sync strategy
    pub fn open_with(data_dir: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        fs::create_dir_all(data_dir)?;
        let wal_path = data_dir.join(Self::WAL_FILENAME);

        let mut state = LedgerState::new();
        if wal_path.exists() {
            let (entries, recovery) = WalRecovery::recover(&wal_path)?;

            if recovery.entries_corrupted > 0 || recovery.was_truncated {
                tracing::warn!(
                    corrupted = recovery.entries_corrupted,
                    truncated = recovery.was_truncated,
                    "change log recovered with damage"
                );
            }
            tracing::info!(
                entries = recovery.entries_recovered,
                last_lsn = recovery.last_lsn,
                "replaying change log"
            );

            for entry in entries {
                state.apply(entry.lsn, entry.timestamp, entry.mutation);
            }
        }

        let wal = WalWriter::open(&wal_path, sync_strategy)?;

        Ok(Self {
            wal_path,
            wal: Mutex::new(wal),
            inner: MemoryLedger::from_state(state),
        })
    }

    /// Path of the change log file
    pub fn wal_path(&self) -> &Path {
        &self.wal_path
    }

    /// Number of range scans / history reads currently open
    pub fn open_iterators(&self) -> usize {
        self.inner.open_iterators()
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Force the change log to disk
    pub fn sync(&self) -> Result<()> {
        self.wal.lock().sync()
    }

    fn commit(&self, mutation: Mutation, expected: Option<Option<&str>>) -> Result<String> {
        let mut wal = self.wal.lock();
        if let Some(expected) = expected {
            self.inner.check_version(mutation.key(), expected)?;
        }

        let timestamp = Timestamp::now();
        let lsn = wal.append(&mutation, timestamp)?;
        Ok(self.inner.apply_committed(lsn, timestamp, mutation))
    }
}

impl Ledger for DurableLedger {
    fn get_versioned(&self, key: &str) -> Result<Option<Versioned>> {
        self.inner.get_versioned(key)
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
        let mut wal = self.wal.lock();
        if !self.inner.contains(key) {
            return Ok(());
        }

        let mutation = Mutation::Delete {
            key: key.to_string(),
        };
        let timestamp = Timestamp::now();
        let lsn = wal.append(&mutation, timestamp)?;
        self.inner.apply_committed(lsn, timestamp, mutation);
        Ok(())
    }

    fn state_by_range(&self, start: &str, end: &str) -> Result<StateIterator<'_>> {
        self.inner.state_by_range(start, end)
    }

    fn history_for_key(&self, key: &str) -> Result<HistoryIterator<'_>> {
        self.inner.history_for_key(key)
    }
}

impl Drop for DurableLedger {
    fn drop(&mut self) {
        if let Err(e) = self.wal.get_mut().sync() {
            tracing::error!("failed to sync change log on close: {}", e);
        }
    }
}
