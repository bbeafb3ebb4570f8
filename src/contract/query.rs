//! Range query assembly
//!
//! Turns a range scan into the JSON array
//! `[{"Key":"<key>", "Record":<raw value>},...]`.
//!
//! Values are spliced in verbatim; they are already JSON. Keys are written
//! without escaping, which existing consumers of this format rely on.

use std::io::Write;

use crate::error::Result;
use crate::ledger::{KeyValue, Ledger};

/// One row of a range query result
pub type QueryResultItem = KeyValue;

/// Scan the whole keyspace and assemble the response
pub fn read_all(ledger: &dyn Ledger) -> Result<Vec<u8>> {
    let iter = ledger.state_by_range("", "")?;
    construct_query_response(iter)
}

/// Assemble a complete response in memory
///
/// On a mid-scan error nothing is returned; partial output is discarded.
pub fn construct_query_response<I>(items: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = Result<QueryResultItem>>,
{
    let mut buffer = Vec::new();
    write_query_response(items, &mut buffer)?;
    Ok(buffer)
}

/// Stream a response into `out`, one item as soon as it is read
///
/// Returns the number of items written.
pub fn write_query_response<I, W>(items: I, out: &mut W) -> Result<usize>
where
    I: IntoIterator<Item = Result<QueryResultItem>>,
    W: Write,
{
    out.write_all(b"[")?;

    let mut written = 0;
    for item in items {
        let item = item?;
        if written > 0 {
            out.write_all(b",")?;
        }
        out.write_all(b"{\"Key\":\"")?;
        out.write_all(item.key.as_bytes())?;
        out.write_all(b"\", \"Record\":")?;
        out.write_all(&item.value)?;
        out.write_all(b"}")?;
        written += 1;
    }

    out.write_all(b"]")?;
    Ok(written)
}
