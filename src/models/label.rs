//! Validated node labels.
//!
//! Cypher cannot bind a label as a query parameter, so table names are
//! spliced into query text. Only identifiers matching
//! `[A-Za-z_][A-Za-z0-9_]*` are accepted, which keeps the splice inert.

use crate::{Error, Result};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Maximum accepted label length.
pub const MAX_LABEL_LENGTH: usize = 64;

static LABEL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").ok());

/// A node label derived from a harness table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(String);

impl Label {
    /// Parses a table name into a label.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the name is empty, longer than
    /// [`MAX_LABEL_LENGTH`], or contains characters outside `[A-Za-z0-9_]`.
    pub fn parse(table: &str) -> Result<Self> {
        if table.is_empty() {
            return Err(Error::InvalidInput(
                "table name cannot be empty".to_string(),
            ));
        }

        if table.len() > MAX_LABEL_LENGTH {
            return Err(Error::InvalidInput(format!(
                "table name exceeds {MAX_LABEL_LENGTH} characters: '{table}'"
            )));
        }

        let matches = LABEL_PATTERN
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(table));
        if !matches {
            return Err(Error::InvalidInput(format!(
                "table name '{table}' is not a valid label; use letters, digits and underscores, \
                 starting with a letter or underscore"
            )));
        }

        Ok(Self(table.to_string()))
    }

    /// Returns the label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the label quoted for inclusion in Cypher text.
    #[must_use]
    pub fn quoted(&self) -> String {
        format!("`{}`", self.0)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for Label {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}
