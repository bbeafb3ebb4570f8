//! Engine Module
//!
//! Routes operations to the student contract over an injected ledger.
//!
//! ## Responsibilities
//! - Open the configured ledger (or accept one from the caller)
//! - Dispatch each operation exhaustively to its handler
//! - Render results and failures as protocol responses

use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::contract::{read_all, HistoryReconstructor, StudentStore};
use crate::error::Result;
use crate::ledger::{DurableLedger, Ledger};
use crate::protocol::{Invocation, Operation, Response};

/// The request handler
///
/// ## Concurrency Model
///
/// The engine holds no locks of its own. Each operation runs to completion
/// on the calling thread; per-key atomicity and write conflict detection are
/// the ledger's job. Share one engine between threads with `Arc`.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Backend holding all records and their history
    ledger: Arc<dyn Ledger>,

    /// History settings taken from the config
    history: HistoryReconstructor,
}

impl Engine {
    /// Open an engine over a durable ledger in `config.data_dir`
    pub fn open(config: Config) -> Result<Self> {
        let ledger = DurableLedger::open(&config)?;
        Ok(Self::with_ledger(config, Arc::new(ledger)))
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(config)
    }

    /// Build an engine over any ledger
    pub fn with_ledger(config: Config, ledger: Arc<dyn Ledger>) -> Self {
        let history = HistoryReconstructor::from_config(&config);
        Self {
            config,
            ledger,
            history,
        }
    }

    /// Execute an operation
    ///
    /// Returns the response body, if the operation has one
    pub fn execute(&self, operation: Operation) -> Result<Option<Vec<u8>>> {
        let kind = operation.kind();
        tracing::debug!("- start {}", kind);

        let store = StudentStore::new(self.ledger.as_ref());
        let body = match operation {
            Operation::CreateStudent(input) => {
                store.create(&input)?;
                None
            }
            Operation::UpdateStudent(input) => {
                store.update(&input)?;
                None
            }
            Operation::ReadStudent { id } => Some(store.read(&id)?),
            Operation::ReadAllStudents => {
                let body = read_all(self.ledger.as_ref())?;
                tracing::trace!("- readAllStudents queryResult: {}", String::from_utf8_lossy(&body));
                Some(body)
            }
            Operation::DeleteStudent { id } => {
                store.delete(&id)?;
                None
            }
            Operation::GetHistoryForStudent { id } => {
                let entries = self.history.history_of(self.ledger.as_ref(), &id)?;
                let body = HistoryReconstructor::render(&entries)?;
                tracing::trace!("- getHistoryForStudent returning: {}", String::from_utf8_lossy(&body));
                Some(body)
            }
        };

        tracing::debug!("- end {}", kind);
        Ok(body)
    }

    /// Handle a raw invocation end to end
    pub fn invoke(&self, invocation: Invocation) -> Response {
        tracing::info!("invoke is running {}", invocation.function);

        let operation = match invocation.into_operation() {
            Ok(operation) => operation,
            Err(e) => {
                tracing::warn!("rejected invocation: {}", e);
                return Response::from_error(None, &e);
            }
        };

        let kind = operation.kind();
        match self.execute(operation) {
            Ok(body) => Response::ok(body),
            Err(e) => {
                tracing::debug!("{} failed: {}", kind, e);
                Response::from_error(Some(kind), &e)
            }
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the underlying ledger
    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }
}
