//! Configuration management.
//!
//! Connection settings come from four layers, later layers winning:
//!
//! 1. Built-in defaults
//! 2. A TOML file (`--config`, `GRAPHKV_CONFIG_PATH`, or the platform config dir)
//! 3. `GRAPHKV_*` environment variables
//! 4. Harness properties (`neo4j.url`, `neo4j.user`, `neo4j.passwd`, ...)
//!
//! ```toml
//! [neo4j]
//! url = "bolt://localhost:7687"
//! user = "neo4j"
//! password = "${NEO4J_PASSWORD}"
//! database = "neo4j"
//! max_connections = 16
//!
//! [logging]
//! format = "json"
//! filter = "graphkv=debug"
//! ```

mod env;

pub use env::expand_env_vars;

use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Harness property holding the connection URL.
pub const PROP_URL: &str = "neo4j.url";
/// Harness property holding the user name.
pub const PROP_USER: &str = "neo4j.user";
/// Harness property holding the password.
pub const PROP_PASSWORD: &str = "neo4j.passwd";
/// Harness property selecting the database.
pub const PROP_DATABASE: &str = "neo4j.database";
/// Harness property bounding the driver pool.
pub const PROP_MAX_CONNECTIONS: &str = "neo4j.maxconnections";
/// Harness property setting the driver fetch size.
pub const PROP_FETCH_SIZE: &str = "neo4j.fetchsize";

const DEFAULT_URL: &str = "bolt://localhost:7687";
const DEFAULT_USER: &str = "neo4j";
const DEFAULT_DATABASE: &str = "neo4j";

/// URL schemes understood by the Bolt driver.
const BOLT_SCHEMES: &[&str] = &[
    "bolt://",
    "bolt+s://",
    "bolt+ssc://",
    "neo4j://",
    "neo4j+s://",
    "neo4j+ssc://",
];

/// Main configuration for graphkv.
#[derive(Debug, Clone, Default)]
pub struct GraphkvConfig {
    /// Database connection settings.
    pub connection: ConnectionSettings,
    /// Logging settings from the config file.
    pub logging: LoggingSettings,
}

/// Settings used to open the shared connection.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    /// Bolt URL of the server.
    pub url: String,
    /// User name for basic authentication.
    pub user: String,
    /// Password for basic authentication.
    pub password: SecretString,
    /// Target database name.
    pub database: String,
    /// Upper bound for the driver connection pool.
    pub max_connections: Option<usize>,
    /// Rows fetched per round trip.
    pub fetch_size: Option<usize>,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            user: DEFAULT_USER.to_string(),
            password: SecretString::from(String::new()),
            database: DEFAULT_DATABASE.to_string(),
            max_connections: None,
            fetch_size: None,
        }
    }
}

impl ConnectionSettings {
    /// Creates settings for the given URL and credentials.
    #[must_use]
    pub fn new(url: impl Into<String>, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            user: user.into(),
            password: SecretString::from(password.into()),
            ..Self::default()
        }
    }

    /// Sets the target database.
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Sets the pool size bound.
    #[must_use]
    pub const fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = Some(max_connections);
        self
    }

    /// Returns `true` if a non-empty password is configured.
    #[must_use]
    pub fn has_password(&self) -> bool {
        !self.password.expose_secret().is_empty()
    }

    /// Validates the settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the URL does not use a Bolt scheme,
    /// the database name is empty, or a size bound is zero.
    pub fn validate(&self) -> Result<()> {
        if !BOLT_SCHEMES.iter().any(|scheme| self.url.starts_with(scheme)) {
            return Err(Error::InvalidInput(format!(
                "connection URL must use a Bolt scheme ({}): {}",
                BOLT_SCHEMES.join(", "),
                self.url
            )));
        }
        if self.database.trim().is_empty() {
            return Err(Error::InvalidInput(
                "database name cannot be empty".to_string(),
            ));
        }
        if self.max_connections == Some(0) {
            return Err(Error::InvalidInput(format!(
                "{PROP_MAX_CONNECTIONS} must be at least 1"
            )));
        }
        if self.fetch_size == Some(0) {
            return Err(Error::InvalidInput(format!(
                "{PROP_FETCH_SIZE} must be at least 1"
            )));
        }
        Ok(())
    }

    /// Applies harness properties on top of the current settings.
    ///
    /// Unknown properties are ignored so the harness can pass its full
    /// property set.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric property does not parse.
    pub fn apply_properties(&mut self, properties: &HashMap<String, String>) -> Result<()> {
        if let Some(url) = properties.get(PROP_URL) {
            self.url.clone_from(url);
        }
        if let Some(user) = properties.get(PROP_USER) {
            self.user.clone_from(user);
        }
        if let Some(password) = properties.get(PROP_PASSWORD) {
            self.password = SecretString::from(password.clone());
        }
        if let Some(database) = properties.get(PROP_DATABASE) {
            self.database.clone_from(database);
        }
        if let Some(value) = properties.get(PROP_MAX_CONNECTIONS) {
            self.max_connections = Some(parse_usize(PROP_MAX_CONNECTIONS, value)?);
        }
        if let Some(value) = properties.get(PROP_FETCH_SIZE) {
            self.fetch_size = Some(parse_usize(PROP_FETCH_SIZE, value)?);
        }
        Ok(())
    }

    /// Applies `GRAPHKV_NEO4J_*` overrides read through `lookup`.
    fn apply_env<F>(&mut self, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = non_empty(lookup("GRAPHKV_NEO4J_URL")) {
            self.url = url;
        }
        if let Some(user) = non_empty(lookup("GRAPHKV_NEO4J_USER")) {
            self.user = user;
        }
        if let Some(password) = lookup("GRAPHKV_NEO4J_PASSWORD") {
            self.password = SecretString::from(password);
        }
        if let Some(database) = non_empty(lookup("GRAPHKV_NEO4J_DATABASE")) {
            self.database = database;
        }
    }
}

/// Logging section of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingSettings {
    /// Output format: "pretty" or "json".
    pub format: Option<String>,
    /// `EnvFilter` directive, e.g. `graphkv=debug`.
    pub filter: Option<String>,
    /// Append logs to this file instead of stderr.
    pub file: Option<PathBuf>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Neo4j connection section.
    pub neo4j: Option<ConfigFileNeo4j>,
    /// Logging section.
    pub logging: Option<LoggingSettings>,
}

/// `[neo4j]` section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileNeo4j {
    /// Bolt URL.
    pub url: Option<String>,
    /// User name.
    pub user: Option<String>,
    /// Password, supports `${VAR}` expansion.
    pub password: Option<String>,
    /// Database name.
    pub database: Option<String>,
    /// Pool size bound.
    pub max_connections: Option<usize>,
    /// Fetch size.
    pub fetch_size: Option<usize>,
}

impl GraphkvConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for [`ConfigFile`].
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks `GRAPHKV_CONFIG_PATH`, then `graphkv/config.toml` in the
    /// platform config dir. Falls back to defaults when nothing is found.
    /// Environment overrides are applied in every case.
    #[must_use]
    pub fn load_default() -> Self {
        let from_file = default_config_path()
            .filter(|path| path.exists())
            .and_then(|path| match Self::load_from_file(&path) {
                Ok(config) => Some(config),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
                    None
                },
            });

        from_file.unwrap_or_default().with_env_overrides()
    }

    /// Converts a `ConfigFile` to `GraphkvConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(neo4j) = file.neo4j {
            let connection = &mut config.connection;
            if let Some(url) = neo4j.url {
                connection.url = expand_env_vars(&url);
            }
            if let Some(user) = neo4j.user {
                connection.user = expand_env_vars(&user);
            }
            if let Some(password) = neo4j.password {
                connection.password = SecretString::from(expand_env_vars(&password));
            }
            if let Some(database) = neo4j.database {
                connection.database = database;
            }
            connection.max_connections = neo4j.max_connections;
            connection.fetch_size = neo4j.fetch_size;
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }

        config
    }

    /// Applies environment variable overrides.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_env_lookup(|key| std::env::var(key).ok())
    }

    /// Applies overrides read through a custom lookup function.
    #[must_use]
    pub fn with_env_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        self.connection.apply_env(&lookup);
        if let Some(filter) = non_empty(lookup("GRAPHKV_LOG")) {
            self.logging.filter = Some(filter);
        }
        if let Some(format) = non_empty(lookup("GRAPHKV_LOG_FORMAT")) {
            self.logging.format = Some(format);
        }
        self
    }

    /// Applies harness properties, the highest-precedence layer.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric property does not parse.
    pub fn with_properties(mut self, properties: &HashMap<String, String>) -> Result<Self> {
        self.connection.apply_properties(properties)?;
        Ok(self)
    }
}

/// Returns the config path from `GRAPHKV_CONFIG_PATH` or the platform config dir.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    if let Some(path) = non_empty(std::env::var("GRAPHKV_CONFIG_PATH").ok()) {
        return Some(PathBuf::from(path));
    }

    directories::BaseDirs::new().map(|dirs| dirs.config_dir().join("graphkv").join("config.toml"))
}

fn parse_usize(property: &str, value: &str) -> Result<usize> {
    value.trim().parse::<usize>().map_err(|e| {
        Error::InvalidInput(format!("{property} must be a positive integer, got '{value}': {e}"))
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
