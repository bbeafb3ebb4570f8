//! Operation definitions
//!
//! The closed set of operations a client can invoke, and the parsing of a
//! raw `(function, args)` invocation into one of them.

use std::fmt;
use std::str::FromStr;

use crate::contract::StudentInput;
use crate::error::{LedgerError, Result};

/// Operation types, one per exposed function name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    CreateStudent,
    UpdateStudent,
    ReadStudent,
    ReadAllStudents,
    DeleteStudent,
    GetHistoryForStudent,
}

impl OperationKind {
    /// Every operation, in declaration order
    pub const ALL: [OperationKind; 6] = [
        OperationKind::CreateStudent,
        OperationKind::UpdateStudent,
        OperationKind::ReadStudent,
        OperationKind::ReadAllStudents,
        OperationKind::DeleteStudent,
        OperationKind::GetHistoryForStudent,
    ];

    /// The function name clients invoke this operation by
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::CreateStudent => "createStudent",
            OperationKind::UpdateStudent => "updateStudent",
            OperationKind::ReadStudent => "readStudent",
            OperationKind::ReadAllStudents => "readAllStudents",
            OperationKind::DeleteStudent => "deleteStudent",
            OperationKind::GetHistoryForStudent => "getHistoryForStudent",
        }
    }

    /// Number of positional arguments expected
    pub fn arity(&self) -> usize {
        match self {
            OperationKind::CreateStudent | OperationKind::UpdateStudent => StudentInput::ARITY,
            OperationKind::ReadStudent
            | OperationKind::DeleteStudent
            | OperationKind::GetHistoryForStudent => 1,
            OperationKind::ReadAllStudents => 0,
        }
    }

    /// Whether failures are reported as a `{"Error":"..."}` object
    pub fn reports_json_errors(&self) -> bool {
        matches!(
            self,
            OperationKind::ReadStudent
                | OperationKind::DeleteStudent
                | OperationKind::GetHistoryForStudent
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OperationKind {
    type Err = LedgerError;

    fn from_str(name: &str) -> Result<Self> {
        OperationKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| LedgerError::UnknownFunction(name.to_string()))
    }
}

/// A parsed operation with typed arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Create a new student record
    CreateStudent(StudentInput),

    /// Replace the fields of an existing record
    UpdateStudent(StudentInput),

    /// Read one record
    ReadStudent { id: String },

    /// Read every record in the keyspace
    ReadAllStudents,

    /// Delete one record
    DeleteStudent { id: String },

    /// Version history of one record
    GetHistoryForStudent { id: String },
}

impl Operation {
    /// Parse a function name and positional arguments
    ///
    /// Only the argument count is checked here; field contents are
    /// validated by the store.
    pub fn parse(function: &str, args: Vec<String>) -> Result<Self> {
        let kind: OperationKind = function.parse()?;
        if args.len() != kind.arity() {
            return Err(LedgerError::arity(kind.arity()));
        }

        Ok(match kind {
            OperationKind::CreateStudent => {
                Operation::CreateStudent(StudentInput::from_args(args)?)
            }
            OperationKind::UpdateStudent => {
                Operation::UpdateStudent(StudentInput::from_args(args)?)
            }
            OperationKind::ReadStudent => Operation::ReadStudent { id: first(args) },
            OperationKind::ReadAllStudents => Operation::ReadAllStudents,
            OperationKind::DeleteStudent => Operation::DeleteStudent { id: first(args) },
            OperationKind::GetHistoryForStudent => {
                Operation::GetHistoryForStudent { id: first(args) }
            }
        })
    }

    /// Get the operation type
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::CreateStudent(_) => OperationKind::CreateStudent,
            Operation::UpdateStudent(_) => OperationKind::UpdateStudent,
            Operation::ReadStudent { .. } => OperationKind::ReadStudent,
            Operation::ReadAllStudents => OperationKind::ReadAllStudents,
            Operation::DeleteStudent { .. } => OperationKind::DeleteStudent,
            Operation::GetHistoryForStudent { .. } => OperationKind::GetHistoryForStudent,
        }
    }
}

fn first(args: Vec<String>) -> String {
    args.into_iter().next().unwrap_or_default()
}

/// A raw call as received from a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub function: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(function: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            function: function.into(),
            args,
        }
    }

    /// Parse into a typed operation
    pub fn into_operation(self) -> Result<Operation> {
        Operation::parse(&self.function, self.args)
    }
}
