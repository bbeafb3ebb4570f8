//! Configuration for StudentLedger
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for a StudentLedger instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Ledger Configuration
    // -------------------------------------------------------------------------
    /// Root directory for the durable ledger
    /// Internal structure:
    ///   {data_dir}/
    ///     └── ledger.wal       (append-only change log)
    pub data_dir: PathBuf,

    /// Sync strategy: how often to fsync the change log
    pub wal_sync_strategy: WalSyncStrategy,

    // -------------------------------------------------------------------------
    // History Configuration
    // -------------------------------------------------------------------------
    /// What to do with a change event whose payload is not a valid record
    pub corrupt_history: CorruptHistoryPolicy,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max accepted connections waiting for a worker
    pub max_connections: usize,

    /// Number of worker threads serving connections
    pub worker_threads: usize,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

/// Handling of undecodable record payloads during history reconstruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorruptHistoryPolicy {
    /// Fail the whole history query on the first corrupt payload
    #[default]
    Abort,

    /// Log and leave the corrupt version out of the result
    Skip,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./studentledger_data"),
            wal_sync_strategy: WalSyncStrategy::EveryWrite,
            corrupt_history: CorruptHistoryPolicy::Abort,
            listen_addr: "127.0.0.1:7051".to_string(),
            max_connections: 1024,
            worker_threads: 8,
            read_timeout_ms: 30_000,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for the durable ledger)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set the corrupt-history policy
    pub fn corrupt_history(mut self, policy: CorruptHistoryPolicy) -> Self {
        self.config.corrupt_history = policy;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of pending connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the number of connection workers
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.config.worker_threads = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
