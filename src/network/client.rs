//! TCP Client
//!
//! Blocking client used by the CLI and tests.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};

use crate::error::{LedgerError, Result};
use crate::protocol::{read_response, write_invocation, Invocation, Response};

/// A connection to a StudentLedger server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    /// Connect to a server
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .map_err(|e| LedgerError::Network(format!("connect failed: {}", e)))?;
        stream.set_nodelay(true)?;

        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
        })
    }

    /// Invoke a function and wait for its response
    pub fn invoke(&mut self, function: &str, args: Vec<String>) -> Result<Response> {
        write_invocation(&mut self.writer, &Invocation::new(function, args))?;
        read_response(&mut self.reader)
    }
}
