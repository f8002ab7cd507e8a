//! `${VAR}` expansion for config values.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static ENV_REFERENCE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").ok());

/// Expands `${VAR}` references from the process environment.
///
/// Unset variables expand to an empty string.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    expand_with(value, |name| std::env::var(name).ok())
}

/// Expands `${VAR}` references using `lookup`.
pub(crate) fn expand_with<F>(value: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let Some(pattern) = ENV_REFERENCE.as_ref() else {
        return value.to_string();
    };

    pattern
        .replace_all(value, |caps: &Captures<'_>| {
            lookup(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}
