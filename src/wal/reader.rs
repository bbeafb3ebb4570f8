//! WAL Reader
//!
//! Sequential, strict reading of WAL frames.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::{LedgerError, Result};

use super::entry::compute_crc;
use super::{WalEntry, HEADER_SIZE, MAX_ENTRY_SIZE};

/// Outcome of reading one frame
pub(super) enum Frame {
    /// A valid entry and the frame's total length
    Entry(WalEntry, u64),

    /// A complete frame whose checksum or payload is bad
    Corrupt { lsn: u64, len: u64 },

    /// The file ends inside a frame
    Partial,

    /// Clean end of file
    End,
}

/// Read up to `buf.len()` bytes, stopping early only at EOF
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

/// Read and validate the next frame
pub(super) fn read_frame<R: Read>(reader: &mut R) -> Result<Frame> {
    let mut header = [0u8; HEADER_SIZE];
    match read_full(reader, &mut header)? {
        0 => return Ok(Frame::End),
        n if n < HEADER_SIZE => return Ok(Frame::Partial),
        _ => {}
    }

    let lsn = u64::from_le_bytes(header[0..8].try_into().unwrap_or_default());
    let crc = u32::from_le_bytes(header[8..12].try_into().unwrap_or_default());
    let len = u32::from_le_bytes(header[12..16].try_into().unwrap_or_default());

    // A garbled length cannot be skipped over safely
    if len > MAX_ENTRY_SIZE {
        return Ok(Frame::Partial);
    }

    let mut payload = vec![0u8; len as usize];
    if read_full(reader, &mut payload)? < payload.len() {
        return Ok(Frame::Partial);
    }

    let frame_len = (HEADER_SIZE + payload.len()) as u64;
    if compute_crc(&payload) != crc {
        return Ok(Frame::Corrupt { lsn, len: frame_len });
    }

    match WalEntry::deserialize(&payload) {
        Ok(entry) if entry.lsn == lsn => Ok(Frame::Entry(entry, frame_len)),
        _ => Ok(Frame::Corrupt { lsn, len: frame_len }),
    }
}

/// Reads entries from the WAL file
///
/// Unlike recovery, the reader treats any damage as an error.
pub struct WalReader {
    reader: BufReader<File>,
    position: u64,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
        })
    }

    /// Read the next entry from the WAL
    ///
    /// Returns `Ok(None)` at a clean end of file.
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        match read_frame(&mut self.reader)? {
            Frame::Entry(entry, len) => {
                self.position += len;
                Ok(Some(entry))
            }
            Frame::End => Ok(None),
            Frame::Corrupt { lsn, .. } => Err(LedgerError::WalCorruption(format!(
                "checksum mismatch for lsn {} at offset {}",
                lsn, self.position
            ))),
            Frame::Partial => Err(LedgerError::WalCorruption(format!(
                "partial frame at offset {}",
                self.position
            ))),
        }
    }

    /// Byte offset of the next frame
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Iterate over all entries, stopping after the first error
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }
}

/// Iterator over WAL entries
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
