//! Tests for WAL recovery
//!
//! These tests verify:
//! - Clean and empty logs recover unchanged
//! - Partial tails are cut off
//! - Corrupt frames are skipped and counted
//! - verify() never touches the file

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use studentledger::config::WalSyncStrategy;
use studentledger::ledger::Timestamp;
use studentledger::wal::{Mutation, RecoveryResult, WalRecovery, WalWriter, HEADER_SIZE};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

/// Write `count` entries and return the byte length of each frame
fn write_entries(path: &Path, count: u64) -> Vec<u64> {
    let mut writer = WalWriter::open(path, WalSyncStrategy::EveryWrite).unwrap();
    let mut sizes = Vec::new();
    let mut previous = fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    for i in 0..count {
        writer
            .append(
                &Mutation::Put {
                    key: format!("key{}", i),
                    value: format!("value{}", i).into_bytes(),
                },
                Timestamp::new(i as i64, 0),
            )
            .unwrap();
        let now = fs::metadata(path).unwrap().len();
        sizes.push(now - previous);
        previous = now;
    }
    sizes
}

fn setup() -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("recovery.wal");
    (temp, path)
}

// =============================================================================
// Clean Log Tests
// =============================================================================

#[test]
fn test_recover_empty_file() {
    let (_temp, path) = setup();
    fs::write(&path, b"").unwrap();

    let (entries, result) = WalRecovery::recover(&path).unwrap();
    assert!(entries.is_empty());
    assert_eq!(result, RecoveryResult::default());
}

#[test]
fn test_recover_clean_log() {
    let (_temp, path) = setup();
    write_entries(&path, 5);

    let (entries, result) = WalRecovery::recover(&path).unwrap();
    assert_eq!(entries.len(), 5);
    assert_eq!(
        entries.iter().map(|e| e.lsn).collect::<Vec<_>>(),
        vec![1, 2, 3, 4, 5]
    );
    assert_eq!(result.entries_recovered, 5);
    assert_eq!(result.entries_corrupted, 0);
    assert_eq!(result.last_lsn, 5);
    assert!(!result.was_truncated);
}

// =============================================================================
// Damage Tests
// =============================================================================

#[test]
fn test_partial_tail_truncated() {
    let (_temp, path) = setup();
    write_entries(&path, 3);
    let clean_len = fs::metadata(&path).unwrap().len();

    {
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        // Full header promising a payload that never arrives
        file.write_all(&4u64.to_le_bytes()).unwrap();
        file.write_all(&0u32.to_le_bytes()).unwrap();
        file.write_all(&100u32.to_le_bytes()).unwrap();
        file.write_all(b"short").unwrap();
    }

    let (entries, result) = WalRecovery::recover(&path).unwrap();
    assert_eq!(entries.len(), 3);
    assert!(result.was_truncated);
    assert_eq!(result.last_lsn, 3);
    assert_eq!(fs::metadata(&path).unwrap().len(), clean_len);

    // A second pass finds nothing left to fix
    let (_, again) = WalRecovery::recover(&path).unwrap();
    assert!(!again.was_truncated);
}

#[test]
fn test_corrupt_frame_skipped() {
    let (_temp, path) = setup();
    let sizes = write_entries(&path, 3);

    // Damage the payload of the second frame
    let mut bytes = fs::read(&path).unwrap();
    let offset = sizes[0] as usize + HEADER_SIZE + 2;
    bytes[offset] ^= 0xFF;
    fs::write(&path, &bytes).unwrap();

    let (entries, result) = WalRecovery::recover(&path).unwrap();
    assert_eq!(
        entries.iter().map(|e| e.lsn).collect::<Vec<_>>(),
        vec![1, 3]
    );
    assert_eq!(result.entries_recovered, 2);
    assert_eq!(result.entries_corrupted, 1);
    assert_eq!(result.last_lsn, 3);
    assert!(!result.was_truncated);
}

#[test]
fn test_numbering_continues_past_corrupt_last_frame() {
    let (_temp, path) = setup();
    write_entries(&path, 2);

    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    fs::write(&path, &bytes).unwrap();

    let writer = WalWriter::open(&path, WalSyncStrategy::EveryWrite).unwrap();
    assert_eq!(writer.current_lsn(), 3);
}

#[test]
fn test_verify_does_not_modify() {
    let (_temp, path) = setup();
    write_entries(&path, 2);
    {
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&[1, 2, 3, 4, 5]).unwrap();
    }
    let before = fs::read(&path).unwrap();

    let result = WalRecovery::verify(&path).unwrap();
    assert_eq!(result.entries_recovered, 2);
    assert!(result.was_truncated);
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_corrupt_frame_header_lsn_is_not_trusted() {
    let (_temp, path) = setup();
    write_entries(&path, 1);

    {
        // Complete frame claiming the largest LSN, with a checksum that fails
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&u64::MAX.to_le_bytes()).unwrap();
        file.write_all(&0xDEAD_BEEFu32.to_le_bytes()).unwrap();
        file.write_all(&4u32.to_le_bytes()).unwrap();
        file.write_all(&[1, 2, 3, 4]).unwrap();
    }

    let (entries, result) = WalRecovery::recover(&path).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(result.entries_corrupted, 1);
    assert_eq!(result.last_lsn, 2);
    assert!(!result.was_truncated);

    let writer = WalWriter::open(&path, WalSyncStrategy::EveryWrite).unwrap();
    assert_eq!(writer.current_lsn(), 3);
}
