//! WAL Writer
//!
//! Handles appending entries to the WAL file.
//!
//! An append either lands completely or leaves the log exactly as it was:
//! on any write or sync failure the file is cut back to its length before
//! the append. If even that fails the writer is poisoned and refuses all
//! further appends.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use crate::config::WalSyncStrategy;
use crate::error::{LedgerError, Result};
use crate::ledger::Timestamp;

use super::{Mutation, WalEntry, WalRecovery};

/// Storage the writer appends frames to
pub trait LogFile: Write + Send {
    /// Force written data to stable storage
    fn sync(&mut self) -> io::Result<()>;

    /// Cut the log back to `len` bytes
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl LogFile for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Writes entries to the WAL file
pub struct WalWriter<F: LogFile = File> {
    file: F,
    /// Length of the log up to the last successful append
    len: u64,
    next_lsn: u64,
    sync_strategy: WalSyncStrategy,
    unsynced: usize,
    poisoned: bool,
}

impl WalWriter<File> {
    /// Open or create a WAL file
    ///
    /// An existing file is repaired first (partial tail removed) and
    /// numbering resumes after its last LSN.
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let last_lsn = if path.exists() {
            WalRecovery::repair(path)?.last_lsn
        } else {
            0
        };
        let next_lsn = last_lsn.checked_add(1).ok_or_else(|| {
            LedgerError::WalCorruption(format!("LSN space exhausted (last lsn {})", last_lsn))
        })?;

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let len = file.metadata()?.len();

        Ok(Self::from_parts(file, len, next_lsn, sync_strategy))
    }
}

impl<F: LogFile> WalWriter<F> {
    /// Wrap a log that already holds `len` valid bytes
    pub fn from_parts(file: F, len: u64, next_lsn: u64, sync_strategy: WalSyncStrategy) -> Self {
        Self {
            file,
            len,
            next_lsn,
            sync_strategy,
            unsynced: 0,
            poisoned: false,
        }
    }

    /// Append a mutation, returning the LSN it was logged under
    pub fn append(&mut self, mutation: &Mutation, timestamp: Timestamp) -> Result<u64> {
        if self.poisoned {
            return Err(LedgerError::WalCorruption(
                "change log unusable after a failed rollback".to_string(),
            ));
        }

        let lsn = self.next_lsn;
        let next_lsn = lsn.checked_add(1).ok_or_else(|| {
            LedgerError::WalCorruption(format!("LSN space exhausted (last lsn {})", lsn))
        })?;
        let frame = WalEntry::new(lsn, timestamp, mutation.clone()).serialize()?;

        if let Err(e) = self.write_frame(&frame) {
            self.rollback();
            return Err(e);
        }

        self.len += frame.len() as u64;
        self.next_lsn = next_lsn;
        Ok(lsn)
    }

    fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.file.write_all(frame)?;
        self.file.flush()?;

        let due = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.unsynced + 1 >= count.max(1),
        };
        if due {
            self.file.sync()?;
            self.unsynced = 0;
        } else {
            self.unsynced += 1;
        }
        Ok(())
    }

    /// Drop whatever part of a failed append reached the log
    fn rollback(&mut self) {
        let restored = self
            .file
            .truncate(self.len)
            .and_then(|_| self.file.sync());
        if let Err(e) = restored {
            tracing::error!(len = self.len, "failed to roll back WAL append: {}", e);
            self.poisoned = true;
        }
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync()?;
        self.unsynced = 0;
        Ok(())
    }

    /// The LSN the next append will receive
    pub fn current_lsn(&self) -> u64 {
        self.next_lsn
    }

    /// Whether a failed rollback has disabled this writer
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }
}
