//! Tests for the WAL writer and reader
//!
//! These tests verify:
//! - LSN sequencing, including across reopen
//! - Frame layout (LSN | CRC | LEN | payload)
//! - Entries read back in append order
//! - The strict reader rejecting damaged frames
//! - Failed appends leaving the log untouched

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use studentledger::config::WalSyncStrategy;
use studentledger::error::LedgerError;
use studentledger::ledger::Timestamp;
use studentledger::wal::{LogFile, Mutation, WalEntry, WalReader, WalWriter, HEADER_SIZE};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn wal_path(dir: &TempDir) -> PathBuf {
    dir.path().join("test.wal")
}

fn put(key: &str, value: &[u8]) -> Mutation {
    Mutation::Put {
        key: key.to_string(),
        value: value.to_vec(),
    }
}

fn read_all(path: &PathBuf) -> Vec<WalEntry> {
    WalReader::open(path)
        .unwrap()
        .entries()
        .map(|e| e.unwrap())
        .collect()
}

/// In-memory log whose writes, syncs and truncations can be made to fail
#[derive(Clone, Default)]
struct FlakyLog {
    state: Arc<Mutex<FlakyState>>,
}

#[derive(Default)]
struct FlakyState {
    data: Vec<u8>,
    tear_next_write: bool,
    fail_next_sync: bool,
    fail_truncate: bool,
}

impl FlakyLog {
    fn bytes(&self) -> Vec<u8> {
        self.state.lock().data.clone()
    }

    fn len(&self) -> usize {
        self.state.lock().data.len()
    }
}

impl Write for FlakyLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        if state.tear_next_write {
            state.tear_next_write = false;
            let half = buf.len() / 2;
            state.data.extend_from_slice(&buf[..half]);
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        state.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogFile for FlakyLog {
    fn sync(&mut self) -> io::Result<()> {
        let mut state = self.state.lock();
        if state.fail_next_sync {
            state.fail_next_sync = false;
            return Err(io::Error::new(io::ErrorKind::Other, "fsync failed"));
        }
        Ok(())
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        let mut state = self.state.lock();
        if state.fail_truncate {
            return Err(io::Error::new(io::ErrorKind::Other, "truncate failed"));
        }
        state.data.truncate(len as usize);
        Ok(())
    }
}

/// Decode every frame a FlakyLog holds
fn lsns_in(log: &FlakyLog, dir: &TempDir) -> Vec<u64> {
    let path = dir.path().join("flaky.wal");
    fs::write(&path, log.bytes()).unwrap();
    read_all(&path).into_iter().map(|e| e.lsn).collect()
}

// =============================================================================
// Writer Tests
// =============================================================================

#[test]
fn test_lsn_starts_at_one() {
    let temp = TempDir::new().unwrap();
    let mut writer = WalWriter::open(&wal_path(&temp), WalSyncStrategy::EveryWrite).unwrap();

    assert_eq!(writer.current_lsn(), 1);
    assert_eq!(writer.append(&put("a", b"1"), Timestamp::new(1, 0)).unwrap(), 1);
    assert_eq!(writer.current_lsn(), 2);
    assert_eq!(writer.append(&put("b", b"2"), Timestamp::new(2, 0)).unwrap(), 2);
}

#[test]
fn test_lsn_resumes_after_reopen() {
    let temp = TempDir::new().unwrap();
    let path = wal_path(&temp);

    {
        let mut writer = WalWriter::open(&path, WalSyncStrategy::EveryWrite).unwrap();
        for i in 0..5 {
            writer.append(&put(&format!("k{}", i), b"v"), Timestamp::new(i, 0)).unwrap();
        }
    }

    let mut writer = WalWriter::open(&path, WalSyncStrategy::EveryWrite).unwrap();
    assert_eq!(writer.current_lsn(), 6);
    assert_eq!(writer.append(&put("k5", b"v"), Timestamp::new(5, 0)).unwrap(), 6);
}

#[test]
fn test_frame_header_layout() {
    let entry = WalEntry::new(42, Timestamp::new(100, 5), put("key", b"value"));
    let frame = entry.serialize().unwrap();

    let lsn = u64::from_le_bytes(frame[0..8].try_into().unwrap());
    let crc = u32::from_le_bytes(frame[8..12].try_into().unwrap());
    let len = u32::from_le_bytes(frame[12..16].try_into().unwrap());

    assert_eq!(lsn, 42);
    assert_eq!(len as usize, frame.len() - HEADER_SIZE);
    assert_eq!(crc, crc32fast::hash(&frame[HEADER_SIZE..]));
    assert_eq!(WalEntry::deserialize(&frame[HEADER_SIZE..]).unwrap(), entry);
}

#[test]
fn test_batched_sync_writes_everything() {
    let temp = TempDir::new().unwrap();
    let path = wal_path(&temp);

    {
        let mut writer =
            WalWriter::open(&path, WalSyncStrategy::EveryNEntries { count: 3 }).unwrap();
        for i in 0..7 {
            writer.append(&put(&format!("k{}", i), b"v"), Timestamp::new(i, 0)).unwrap();
        }
        writer.sync().unwrap();
    }

    assert_eq!(read_all(&path).len(), 7);
}

// =============================================================================
// Reader Tests
// =============================================================================

#[test]
fn test_read_back_in_order() {
    let temp = TempDir::new().unwrap();
    let path = wal_path(&temp);

    {
        let mut writer = WalWriter::open(&path, WalSyncStrategy::EveryWrite).unwrap();
        writer.append(&put("a", b"1"), Timestamp::new(10, 1)).unwrap();
        writer
            .append(&Mutation::Delete { key: "a".to_string() }, Timestamp::new(11, 2))
            .unwrap();
        writer.append(&put("b", b"2"), Timestamp::new(12, 3)).unwrap();
    }

    let entries = read_all(&path);
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0], WalEntry::new(1, Timestamp::new(10, 1), put("a", b"1")));
    assert_eq!(
        entries[1].mutation,
        Mutation::Delete { key: "a".to_string() }
    );
    assert_eq!(entries[1].mutation.key(), "a");
    assert_eq!(entries[2].lsn, 3);
    assert_eq!(entries[2].timestamp, Timestamp::new(12, 3));
}

#[test]
fn test_reader_tracks_position() {
    let temp = TempDir::new().unwrap();
    let path = wal_path(&temp);

    {
        let mut writer = WalWriter::open(&path, WalSyncStrategy::EveryWrite).unwrap();
        writer.append(&put("a", b"1"), Timestamp::new(1, 0)).unwrap();
        writer.append(&put("b", b"2"), Timestamp::new(2, 0)).unwrap();
    }

    let file_len = fs::metadata(&path).unwrap().len();
    let mut reader = WalReader::open(&path).unwrap();
    assert_eq!(reader.position(), 0);

    reader.next_entry().unwrap().unwrap();
    reader.next_entry().unwrap().unwrap();
    assert!(reader.next_entry().unwrap().is_none());
    assert_eq!(reader.position(), file_len);
}

#[test]
fn test_reader_rejects_checksum_mismatch() {
    let temp = TempDir::new().unwrap();
    let path = wal_path(&temp);

    {
        let mut writer = WalWriter::open(&path, WalSyncStrategy::EveryWrite).unwrap();
        writer.append(&put("a", b"1"), Timestamp::new(1, 0)).unwrap();
    }

    // Flip the last payload byte
    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    fs::write(&path, &bytes).unwrap();

    let mut reader = WalReader::open(&path).unwrap();
    assert!(matches!(
        reader.next_entry(),
        Err(LedgerError::WalCorruption(_))
    ));
}

#[test]
fn test_iterator_stops_after_partial_frame() {
    let temp = TempDir::new().unwrap();
    let path = wal_path(&temp);

    {
        let mut writer = WalWriter::open(&path, WalSyncStrategy::EveryWrite).unwrap();
        writer.append(&put("a", b"1"), Timestamp::new(1, 0)).unwrap();
    }
    {
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&[2, 0, 0]).unwrap();
    }

    let results: Vec<_> = WalReader::open(&path).unwrap().entries().collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_failed_sync_rolls_back_append() {
    let temp = TempDir::new().unwrap();
    let log = FlakyLog::default();
    let mut writer = WalWriter::from_parts(log.clone(), 0, 1, WalSyncStrategy::EveryWrite);

    assert_eq!(writer.append(&put("a", b"1"), Timestamp::new(1, 0)).unwrap(), 1);
    let committed = log.len();

    log.state.lock().fail_next_sync = true;
    assert!(writer.append(&put("b", b"2"), Timestamp::new(2, 0)).is_err());
    assert_eq!(log.len(), committed);
    assert_eq!(writer.current_lsn(), 2);
    assert!(!writer.is_poisoned());

    assert_eq!(writer.append(&put("c", b"3"), Timestamp::new(3, 0)).unwrap(), 2);
    assert_eq!(lsns_in(&log, &temp), vec![1, 2]);
}

#[test]
fn test_torn_write_rolls_back_append() {
    let temp = TempDir::new().unwrap();
    let log = FlakyLog::default();
    let mut writer = WalWriter::from_parts(log.clone(), 0, 1, WalSyncStrategy::EveryWrite);

    writer.append(&put("a", b"1"), Timestamp::new(1, 0)).unwrap();
    let committed = log.len();

    log.state.lock().tear_next_write = true;
    assert!(matches!(
        writer.append(&put("b", b"2"), Timestamp::new(2, 0)),
        Err(LedgerError::Io(_))
    ));
    assert_eq!(log.len(), committed);

    writer.append(&put("b", b"2"), Timestamp::new(2, 0)).unwrap();
    assert_eq!(lsns_in(&log, &temp), vec![1, 2]);
}

#[test]
fn test_failed_rollback_poisons_writer() {
    let log = FlakyLog::default();
    let mut writer = WalWriter::from_parts(log.clone(), 0, 1, WalSyncStrategy::EveryWrite);

    {
        let mut state = log.state.lock();
        state.fail_next_sync = true;
        state.fail_truncate = true;
    }
    assert!(writer.append(&put("a", b"1"), Timestamp::new(1, 0)).is_err());
    assert!(writer.is_poisoned());

    log.state.lock().fail_truncate = false;
    assert!(matches!(
        writer.append(&put("b", b"2"), Timestamp::new(2, 0)),
        Err(LedgerError::WalCorruption(_))
    ));
}

#[test]
fn test_exhausted_lsn_space_is_an_error() {
    let log = FlakyLog::default();
    let mut writer =
        WalWriter::from_parts(log.clone(), 0, u64::MAX, WalSyncStrategy::EveryWrite);

    assert!(matches!(
        writer.append(&put("a", b"1"), Timestamp::new(1, 0)),
        Err(LedgerError::WalCorruption(_))
    ));
    assert_eq!(log.len(), 0);
}

#[test]
fn test_open_rejects_log_ending_at_max_lsn() {
    let temp = TempDir::new().unwrap();
    let path = wal_path(&temp);

    let frame = WalEntry::new(u64::MAX, Timestamp::new(1, 0), put("a", b"1"))
        .serialize()
        .unwrap();
    fs::write(&path, frame).unwrap();

    assert!(matches!(
        WalWriter::open(&path, WalSyncStrategy::EveryWrite),
        Err(LedgerError::WalCorruption(_))
    ));
}
