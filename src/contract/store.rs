//! Student store
//!
//! Single-key record lifecycle: every operation is at most one read
//! followed by one write or delete against the ledger.
//!
//! Read-then-write operations pass the version they read back to the
//! ledger (`put_state_if`), so a concurrent writer on the same key turns
//! into a conflict instead of a lost update.

use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;

use super::record::{Student, StudentInput};

/// Record operations over a borrowed ledger
pub struct StudentStore<'a> {
    ledger: &'a dyn Ledger,
}

impl<'a> StudentStore<'a> {
    pub fn new(ledger: &'a dyn Ledger) -> Self {
        Self { ledger }
    }

    /// Create a new record under `input.id`
    ///
    /// Fails with `AlreadyExists` if anything is stored under the key.
    pub fn create(&self, input: &StudentInput) -> Result<()> {
        input.validate()?;
        let key = input.id.as_str();

        if self.ledger.get_state(key)?.is_some() {
            tracing::debug!(key, "student already exists");
            return Err(LedgerError::AlreadyExists(key.to_string()));
        }

        let bytes = input.to_record().to_json()?;
        match self.ledger.put_state_if(key, &bytes, None) {
            Ok(tx_id) => {
                tracing::debug!(key, %tx_id, "student created");
                Ok(())
            }
            // Someone created it between our read and write
            Err(LedgerError::WriteConflict(_)) => Err(LedgerError::AlreadyExists(key.to_string())),
            Err(e) => Err(e),
        }
    }

    /// Replace every field of an existing record except `id`
    pub fn update(&self, input: &StudentInput) -> Result<()> {
        input.validate()?;
        let key = input.id.as_str();

        let current = self
            .ledger
            .get_versioned(key)?
            .ok_or_else(|| LedgerError::UpdateTargetMissing(key.to_string()))?;

        let mut student = Student::from_json(key, &current.value)?;
        student.apply(input);

        let tx_id = self
            .ledger
            .put_state_if(key, &student.to_json()?, Some(&current.tx_id))?;
        tracing::debug!(key, %tx_id, "student updated");
        Ok(())
    }

    /// Stored bytes of a record, exactly as the ledger holds them
    pub fn read(&self, id: &str) -> Result<Vec<u8>> {
        require_id(id)?;
        self.ledger
            .get_state(id)?
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))
    }

    /// Delete a record
    ///
    /// The stored value must decode as a record; a corrupt value blocks
    /// the delete.
    pub fn delete(&self, id: &str) -> Result<()> {
        require_id(id)?;

        let bytes = self
            .ledger
            .get_state(id)?
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        Student::from_json(id, &bytes)?;

        self.ledger.delete_state(id)?;
        tracing::debug!(key = id, "student deleted");
        Ok(())
    }
}

fn require_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(LedgerError::empty_argument(0));
    }
    Ok(())
}
