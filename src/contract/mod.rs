//! Contract Module
//!
//! Student record lifecycle and history reconstruction on top of a
//! [`Ledger`](crate::ledger::Ledger).
//!
//! ## Components
//! - [`record`]: the student record, its input validation and JSON form
//! - [`store`]: create / update / read / delete with existence checks
//! - [`query`]: full-keyspace scan assembled into a JSON array
//! - [`history`]: version history rebuilt from a key's change log

pub mod record;
pub mod store;
pub mod query;
pub mod history;

pub use record::{Student, StudentInput, DOC_TYPE};
pub use store::StudentStore;
pub use query::{construct_query_response, read_all, write_query_response, QueryResultItem};
pub use history::{format_timestamp, HistoryEntry, HistoryReconstructor};
