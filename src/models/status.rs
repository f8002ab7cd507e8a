//! Harness status codes and operation names.

use serde::Serialize;
use std::fmt;

/// Outcome reported to the workload harness for a single operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[must_use]
pub enum Status {
    /// The operation completed.
    Ok,
    /// The operation failed; details were logged.
    Error,
    /// No node matched the requested key.
    NotFound,
    /// The request was rejected before reaching the database.
    BadRequest,
}

impl Status {
    /// Returns `true` for [`Status::Ok`].
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Returns the status as a string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Error => "ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::BadRequest => "BAD_REQUEST",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The five harness operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Single-record lookup.
    Read,
    /// Ordered range read.
    Scan,
    /// Full property overwrite.
    Update,
    /// Node creation.
    Insert,
    /// Node removal.
    Delete,
}

impl Operation {
    /// Returns the operation as a string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Scan => "scan",
            Self::Update => "update",
            Self::Insert => "insert",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
