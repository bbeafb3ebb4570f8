//! Student record
//!
//! Records are stored as compact JSON objects with the keys
//! `docType, id, firstName, lastName, email, mobile, address, city`.

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// Discriminator written into every student record
pub const DOC_TYPE: &str = "student";

/// A stored student record
///
/// Missing keys decode as empty strings; only syntactically broken
/// payloads are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Student {
    pub doc_type: String,
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile: String,
    pub address: String,
    pub city: String,
}

impl Student {
    /// Encode as canonical JSON bytes
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    /// Decode bytes stored under `key`
    pub fn from_json(key: &str, bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| LedgerError::CorruptState {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    /// Overwrite every field except `id` and `docType`
    pub fn apply(&mut self, input: &StudentInput) {
        self.first_name = input.first_name.to_lowercase();
        self.last_name = input.last_name.to_lowercase();
        self.email = input.email.to_lowercase();
        self.mobile = input.mobile.to_lowercase();
        self.address = input.address.to_lowercase();
        self.city = input.city.to_lowercase();
    }
}

/// The seven caller-supplied fields of a create or update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentInput {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile: String,
    pub address: String,
    pub city: String,
}

impl StudentInput {
    /// Number of positional arguments a create/update takes
    pub const ARITY: usize = 7;

    pub fn new(
        id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        mobile: impl Into<String>,
        address: impl Into<String>,
        city: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            mobile: mobile.into(),
            address: address.into(),
            city: city.into(),
        }
    }

    /// Build from positional arguments, checking the count only
    pub fn from_args(args: Vec<String>) -> Result<Self> {
        let fields: [String; Self::ARITY] = args
            .try_into()
            .map_err(|_| LedgerError::arity(Self::ARITY))?;
        let [id, first_name, last_name, email, mobile, address, city] = fields;
        Ok(Self {
            id,
            first_name,
            last_name,
            email,
            mobile,
            address,
            city,
        })
    }

    /// Fields in positional order
    pub fn fields(&self) -> [&str; Self::ARITY] {
        [
            self.id.as_str(),
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.email.as_str(),
            self.mobile.as_str(),
            self.address.as_str(),
            self.city.as_str(),
        ]
    }

    /// Reject any empty field, naming the first offender
    pub fn validate(&self) -> Result<()> {
        match self.fields().iter().position(|f| f.is_empty()) {
            Some(position) => Err(LedgerError::empty_argument(position)),
            None => Ok(()),
        }
    }

    /// A fresh record with free-text fields lower-cased; `id` keeps its case
    pub fn to_record(&self) -> Student {
        let mut student = Student {
            doc_type: DOC_TYPE.to_string(),
            id: self.id.clone(),
            ..Student::default()
        };
        student.apply(self);
        student
    }
}
