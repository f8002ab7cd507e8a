//! Graph store trait for labelled key-value nodes.
//!
//! A store exposes exactly the query shapes the harness binding needs: point
//! lookup, ordered range scan, full overwrite, create and delete, all keyed
//! by `(label, _key)`.
//!
//! # Available Implementations
//!
//! | Backend | Use Case | Features |
//! |---------|----------|----------|
//! | `Neo4jStore` | Benchmarks | Bolt connection pool via `neo4rs` |
//! | `InMemoryGraphStore` | Testing | Fast, no persistence |
//!
//! # Semantics
//!
//! | Operation | Key not found | Duplicate keys |
//! |-----------|---------------|----------------|
//! | `read_node` | `Ok(None)` | First match wins |
//! | `scan_nodes` | n/a | All returned, `_key` ascending |
//! | `replace_node` | `Ok(0)` | Every match overwritten |
//! | `create_node` | n/a | Creates another node unless a constraint rejects it |
//! | `delete_nodes` | `Ok(0)` | Every match deleted |
//!
//! Returned property maps include `_key`.

use crate::Result;
use crate::config::ConnectionSettings;
use crate::models::{FieldSet, Label};
use std::sync::Arc;

/// Trait for graph store backends.
///
/// # Implementor Notes
///
/// - Methods use `&self` so one store can be shared via `Arc<dyn GraphStore>`
///   by every worker thread; the store must tolerate concurrent calls
/// - Labels are pre-validated; keys and values must be bound as parameters
pub trait GraphStore: Send + Sync {
    /// Checks that the server accepts queries.
    ///
    /// # Errors
    ///
    /// Returns an error if the probe query fails.
    fn verify_connectivity(&self) -> Result<()>;

    /// Returns the properties of one node with the given label and key.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn read_node(&self, label: &Label, key: &str) -> Result<Option<FieldSet>>;

    /// Returns up to `limit` nodes with `_key >= start_key`, ordered by `_key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn scan_nodes(&self, label: &Label, start_key: &str, limit: usize) -> Result<Vec<FieldSet>>;

    /// Replaces all properties of matching nodes with `values` plus `_key`.
    ///
    /// Returns the number of nodes matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn replace_node(&self, label: &Label, key: &str, values: &FieldSet) -> Result<u64>;

    /// Creates a node with `values` plus `_key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a constraint rejects the node.
    fn create_node(&self, label: &Label, key: &str, values: &FieldSet) -> Result<()>;

    /// Deletes every node with the given label and key.
    ///
    /// Returns the number of nodes deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn delete_nodes(&self, label: &Label, key: &str) -> Result<u64>;

    /// Releases the underlying connection resources.
    ///
    /// Calls after `close` fail.
    ///
    /// # Errors
    ///
    /// Returns an error if shutdown fails.
    fn close(&self) -> Result<()>;
}

/// Opens graph stores.
///
/// A [`crate::GraphContext`] calls `connect` once per connection lifetime.
pub trait GraphConnector: Send + Sync {
    /// Opens a store for the given settings.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Connection`] if the server cannot be reached.
    fn connect(&self, settings: &ConnectionSettings) -> Result<Arc<dyn GraphStore>>;
}
