//! History reconstruction
//!
//! Rebuilds the chronological list of versions of one record from the
//! ledger's change log. Deletions become tombstones (`Value: null`).

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::config::{Config, CorruptHistoryPolicy};
use crate::error::{LedgerError, Result};
use crate::ledger::{ChangeEvent, HistoryOrder, Ledger, Timestamp};

use super::record::Student;

/// One reconstructed version of a record
///
/// Serializes as `{"TxId", "Value", "Timestamp", "IsDelete"}` with the
/// timestamp and the delete flag rendered as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    #[serde(rename = "TxId")]
    pub tx_id: String,

    #[serde(rename = "Value")]
    pub value: Option<Student>,

    #[serde(rename = "Timestamp", serialize_with = "serialize_timestamp")]
    pub timestamp: Timestamp,

    #[serde(rename = "IsDelete", serialize_with = "serialize_flag")]
    pub is_deleted: bool,
}

fn serialize_timestamp<S: Serializer>(ts: &Timestamp, s: S) -> std::result::Result<S::Ok, S::Error> {
    let rendered = format_timestamp(*ts).map_err(serde::ser::Error::custom)?;
    s.serialize_str(&rendered)
}

fn serialize_flag<S: Serializer>(flag: &bool, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(if *flag { "true" } else { "false" })
}

/// Render a commit time as `2006-01-02 15:04:05.999999999 +0000 UTC`
///
/// Trailing zeros of the fraction are dropped, and the fraction is omitted
/// entirely on a whole second.
pub fn format_timestamp(ts: Timestamp) -> Result<String> {
    let invalid = || {
        LedgerError::Backend(format!(
            "invalid timestamp: {}s {}ns",
            ts.seconds, ts.nanos
        ))
    };

    let nanos = u32::try_from(ts.nanos)
        .ok()
        .filter(|n| *n < 1_000_000_000)
        .ok_or_else(invalid)?;
    let time = DateTime::<Utc>::from_timestamp(ts.seconds, nanos).ok_or_else(invalid)?;

    let mut rendered = time.format("%Y-%m-%d %H:%M:%S").to_string();
    if nanos > 0 {
        let fraction = format!("{:09}", nanos);
        rendered.push('.');
        rendered.push_str(fraction.trim_end_matches('0'));
    }
    rendered.push_str(" +0000 UTC");
    Ok(rendered)
}

/// Rebuilds record history from change events
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryReconstructor {
    policy: CorruptHistoryPolicy,
}

impl HistoryReconstructor {
    pub fn new(policy: CorruptHistoryPolicy) -> Self {
        Self { policy }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.corrupt_history)
    }

    /// Full version history of the record stored under `id`
    ///
    /// Fails with `NotFound` if the key was never written.
    pub fn history_of(&self, ledger: &dyn Ledger, id: &str) -> Result<Vec<HistoryEntry>> {
        if id.is_empty() {
            return Err(LedgerError::empty_argument(0));
        }
        let events = ledger.history_for_key(id)?;
        self.reconstruct_ordered(id, ledger.history_order(), events)
    }

    /// Turn an oldest-first change log into history entries
    pub fn reconstruct<I>(&self, key: &str, events: I) -> Result<Vec<HistoryEntry>>
    where
        I: IntoIterator<Item = Result<ChangeEvent>>,
    {
        self.reconstruct_ordered(key, HistoryOrder::OldestFirst, events)
    }

    /// Turn a change log yielded in `order` into history entries, oldest first
    pub fn reconstruct_ordered<I>(
        &self,
        key: &str,
        order: HistoryOrder,
        events: I,
    ) -> Result<Vec<HistoryEntry>>
    where
        I: IntoIterator<Item = Result<ChangeEvent>>,
    {
        let mut entries = Vec::new();
        let mut seen = 0usize;

        for event in events {
            let event = event?;
            seen += 1;

            // Reject unrenderable timestamps up front so serialization
            // of the result cannot fail later
            format_timestamp(event.timestamp)?;

            let value = if event.is_delete {
                None
            } else {
                match Student::from_json(key, &event.value) {
                    Ok(student) => Some(student),
                    Err(e) if self.policy == CorruptHistoryPolicy::Skip => {
                        tracing::warn!(key, tx_id = %event.tx_id, "skipping corrupt history entry: {:?}", e);
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            };

            entries.push(HistoryEntry {
                tx_id: event.tx_id,
                value,
                timestamp: event.timestamp,
                is_deleted: event.is_delete,
            });
        }

        if seen == 0 {
            return Err(LedgerError::NotFound(key.to_string()));
        }

        if order == HistoryOrder::NewestFirst {
            entries.reverse();
        }
        Ok(entries)
    }

    /// Encode entries as the JSON array returned to callers
    pub fn render(entries: &[HistoryEntry]) -> Result<Vec<u8>> {
        serde_json::to_vec(entries).map_err(|e| LedgerError::Serialization(e.to_string()))
    }
}
