//! Tests for MemoryLedger
//!
//! These tests verify:
//! - get/put/delete semantics
//! - Transaction id assignment
//! - Range scan bounds and ordering
//! - Per-key change log, tombstones included
//! - Versioned (optimistic) writes
//! - Scan release on drop

use std::sync::Arc;
use std::thread;

use studentledger::error::ErrorKind;
use studentledger::ledger::{tx_id_for, Ledger, MemoryLedger};

// =============================================================================
// Helper Functions
// =============================================================================

fn keys_in(ledger: &MemoryLedger, start: &str, end: &str) -> Vec<String> {
    ledger
        .state_by_range(start, end)
        .unwrap()
        .map(|item| item.unwrap().key)
        .collect()
}

fn populated() -> MemoryLedger {
    let ledger = MemoryLedger::new();
    for key in ["b", "a", "d", "c", "e"] {
        ledger.put_state(key, key.as_bytes()).unwrap();
    }
    ledger
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_ledger_is_empty() {
    let ledger = MemoryLedger::new();
    assert!(ledger.is_empty());
    assert_eq!(ledger.len(), 0);
    assert_eq!(ledger.last_sequence(), 0);
    assert_eq!(ledger.get_state("x").unwrap(), None);
}

#[test]
fn test_put_and_get() {
    let ledger = MemoryLedger::new();
    ledger.put_state("k", b"v").unwrap();

    assert_eq!(ledger.get_state("k").unwrap(), Some(b"v".to_vec()));
    assert_eq!(ledger.len(), 1);
}

#[test]
fn test_put_overwrites() {
    let ledger = MemoryLedger::new();
    ledger.put_state("k", b"v1").unwrap();
    ledger.put_state("k", b"v2").unwrap();

    assert_eq!(ledger.get_state("k").unwrap(), Some(b"v2".to_vec()));
    assert_eq!(ledger.len(), 1);
}

#[test]
fn test_delete_removes_key() {
    let ledger = MemoryLedger::new();
    ledger.put_state("k", b"v").unwrap();
    ledger.delete_state("k").unwrap();

    assert_eq!(ledger.get_state("k").unwrap(), None);
    assert!(ledger.is_empty());
}

#[test]
fn test_delete_absent_key_is_noop() {
    let ledger = MemoryLedger::new();
    ledger.delete_state("ghost").unwrap();

    assert_eq!(ledger.last_sequence(), 0);
    assert_eq!(ledger.history_for_key("ghost").unwrap().count(), 0);
}

// =============================================================================
// Transaction Id Tests
// =============================================================================

#[test]
fn test_tx_ids_follow_commit_order() {
    let ledger = MemoryLedger::new();
    let t1 = ledger.put_state("a", b"1").unwrap();
    let t2 = ledger.put_state("b", b"2").unwrap();

    assert_eq!(t1, tx_id_for(1));
    assert_eq!(t2, tx_id_for(2));
    assert!(t1 < t2);
    assert_eq!(ledger.get_versioned("b").unwrap().unwrap().tx_id, t2);
}

#[test]
fn test_tx_id_format() {
    assert_eq!(tx_id_for(1), "0000000000000001");
    assert_eq!(tx_id_for(255), "00000000000000ff");
}

// =============================================================================
// Range Scan Tests
// =============================================================================

#[test]
fn test_full_scan_is_sorted() {
    let ledger = populated();
    assert_eq!(keys_in(&ledger, "", ""), vec!["a", "b", "c", "d", "e"]);
}

#[test]
fn test_scan_bounds_are_half_open() {
    let ledger = populated();

    assert_eq!(keys_in(&ledger, "b", "d"), vec!["b", "c"]);
    assert_eq!(keys_in(&ledger, "c", ""), vec!["c", "d", "e"]);
    assert_eq!(keys_in(&ledger, "", "c"), vec!["a", "b"]);
}

#[test]
fn test_inverted_bounds_yield_nothing() {
    let ledger = populated();
    assert!(keys_in(&ledger, "d", "b").is_empty());
    assert!(keys_in(&ledger, "c", "c").is_empty());
}

#[test]
fn test_scan_skips_deleted_keys() {
    let ledger = populated();
    ledger.delete_state("c").unwrap();

    assert_eq!(keys_in(&ledger, "", ""), vec!["a", "b", "d", "e"]);
}

#[test]
fn test_scan_is_a_snapshot() {
    let ledger = populated();
    let iter = ledger.state_by_range("", "").unwrap();

    ledger.put_state("f", b"f").unwrap();

    assert_eq!(iter.count(), 5);
}

#[test]
fn test_scans_released_on_drop() {
    let ledger = populated();

    let scan = ledger.state_by_range("", "").unwrap();
    let history = ledger.history_for_key("a").unwrap();
    assert_eq!(ledger.open_iterators(), 2);

    drop(scan);
    assert_eq!(ledger.open_iterators(), 1);
    drop(history);
    assert_eq!(ledger.open_iterators(), 0);
}

// =============================================================================
// History Tests
// =============================================================================

#[test]
fn test_history_records_every_change() {
    let ledger = MemoryLedger::new();
    ledger.put_state("k", b"v1").unwrap();
    ledger.put_state("other", b"x").unwrap();
    ledger.put_state("k", b"v2").unwrap();
    ledger.delete_state("k").unwrap();

    let events: Vec<_> = ledger
        .history_for_key("k")
        .unwrap()
        .map(|e| e.unwrap())
        .collect();

    assert_eq!(events.len(), 3);
    assert_eq!(events[0].value, b"v1");
    assert!(!events[0].is_delete);
    assert_eq!(events[1].value, b"v2");
    assert!(events[2].is_delete);
    assert!(events[2].value.is_empty());
    assert_eq!(events[2].tx_id, tx_id_for(4));
}

// =============================================================================
// Versioned Write Tests
// =============================================================================

#[test]
fn test_put_if_absent() {
    let ledger = MemoryLedger::new();
    ledger.put_state_if("k", b"v", None).unwrap();

    let err = ledger.put_state_if("k", b"w", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(ledger.get_state("k").unwrap(), Some(b"v".to_vec()));
}

#[test]
fn test_put_if_version_matches() {
    let ledger = MemoryLedger::new();
    let t1 = ledger.put_state("k", b"v1").unwrap();
    let t2 = ledger.put_state_if("k", b"v2", Some(&t1)).unwrap();

    // The old version no longer matches
    let err = ledger.put_state_if("k", b"v3", Some(&t1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    ledger.put_state_if("k", b"v3", Some(&t2)).unwrap();
    assert_eq!(ledger.get_state("k").unwrap(), Some(b"v3".to_vec()));
}

#[test]
fn test_put_if_version_on_deleted_key() {
    let ledger = MemoryLedger::new();
    let t1 = ledger.put_state("k", b"v1").unwrap();
    ledger.delete_state("k").unwrap();

    assert!(ledger.put_state_if("k", b"v2", Some(&t1)).is_err());
    ledger.put_state_if("k", b"v2", None).unwrap();
}

// =============================================================================
// Concurrent Access Tests
// =============================================================================

#[test]
fn test_concurrent_creates_single_winner() {
    let ledger = Arc::new(MemoryLedger::new());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || ledger.put_state_if("k", format!("{}", i).as_bytes(), None).is_ok())
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|won| *won)
        .count();

    assert_eq!(winners, 1);
    assert_eq!(ledger.history_for_key("k").unwrap().count(), 1);
}

#[test]
fn test_concurrent_writers_on_distinct_keys() {
    let ledger = Arc::new(MemoryLedger::new());

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                for i in 0..50 {
                    ledger.put_state(&format!("t{}-{}", t, i), b"v").unwrap();
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(ledger.len(), 200);
    assert_eq!(ledger.last_sequence(), 200);
}
