//! # graphkv
//!
//! A key-value workload binding for the Neo4j graph database.
//!
//! graphkv lets a generic CRUD benchmark harness drive a graph database:
//! every logical table becomes a node label and every record key becomes the
//! reserved `_key` property on a node.
//!
//! ## Features
//!
//! - Five harness operations: read, scan, update, insert, delete
//! - One shared Bolt connection pool per [`GraphContext`], reference-counted by clients
//! - Validated labels, bound parameters for every value
//! - In-memory backend with identical semantics for tests and offline runs
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use graphkv::{Db, FieldSet, GraphContext, GraphkvConfig, Status};
//!
//! let config = GraphkvConfig::load_default();
//! let context = Arc::new(GraphContext::neo4j(config.connection));
//!
//! let mut client = context.client();
//! client.init()?;
//!
//! let values = FieldSet::from([("name".to_string(), "alice".to_string())]);
//! assert_eq!(client.insert("usertable", "user1", &values), Status::Ok);
//!
//! client.cleanup()?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod client;
pub mod config;
pub mod context;
pub mod models;
pub mod observability;
pub mod storage;

pub use client::{Db, GraphClient};
pub use config::{ConnectionSettings, GraphkvConfig};
pub use context::GraphContext;
pub use models::{FieldSet, KEY_PROPERTY, Label, Operation, Status};
pub use storage::{GraphConnector, GraphStore};

/// Error type for graphkv operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Invalid label, malformed property, bad connection URL |
/// | `OperationFailed` | A query fails, a lock is poisoned, a result cannot be decoded |
/// | `Connection` | The driver cannot reach or authenticate against the server |
/// | `NotInitialized` | An operation runs on a client that was never initialized |
/// | `FeatureNotEnabled` | The Neo4j backend is used without the `neo4j` feature |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A table name is not a valid label identifier
    /// - A harness property cannot be parsed
    /// - The connection URL does not use a Bolt scheme
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// The database could not be reached.
    ///
    /// Raised when the driver fails to build its pool, the handshake fails,
    /// or the connectivity probe is rejected.
    #[error("cannot connect to {url}: {cause}")]
    Connection {
        /// Target URL.
        url: String,
        /// The underlying cause.
        cause: String,
    },

    /// The client has no connection handle.
    #[error("client is not initialized")]
    NotInitialized,

    /// Feature not enabled (requires feature flag).
    #[error("feature not enabled: {0} (compile with --features {0})")]
    FeatureNotEnabled(String),
}

/// Result type alias for graphkv operations.
pub type Result<T> = std::result::Result<T, Error>;
