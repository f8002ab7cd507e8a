//! Harness binding.
//!
//! [`Db`] is the contract a CRUD workload harness drives: one instance per
//! worker thread, `init` before the first operation, `cleanup` after the
//! last. [`GraphClient`] implements it on top of a shared [`GraphContext`].
//!
//! Operations never return errors to the harness. Failures are logged and
//! reported as a [`Status`].

use crate::context::GraphContext;
use crate::models::{FieldSet, Label, Operation, Status, project_fields};
use crate::observability::record_operation;
use crate::storage::GraphStore;
use crate::{Error, Result};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// A key-value binding driven by a workload harness.
pub trait Db: Send {
    /// Prepares the binding for use. Called once per worker.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be reached; the worker must
    /// not run operations afterwards.
    fn init(&mut self) -> Result<()>;

    /// Releases resources acquired by [`init`](Db::init).
    ///
    /// # Errors
    ///
    /// Returns an error if shutting down the connection fails.
    fn cleanup(&mut self) -> Result<()>;

    /// Reads one record into `result`.
    ///
    /// `fields == None` reads every field.
    fn read(
        &self,
        table: &str,
        key: &str,
        fields: Option<&HashSet<String>>,
        result: &mut FieldSet,
    ) -> Status;

    /// Reads up to `record_count` records in key order starting at `start_key`.
    fn scan(
        &self,
        table: &str,
        start_key: &str,
        record_count: usize,
        fields: Option<&HashSet<String>>,
        result: &mut Vec<FieldSet>,
    ) -> Status;

    /// Replaces the record's fields with `values`.
    fn update(&self, table: &str, key: &str, values: &FieldSet) -> Status;

    /// Inserts a new record.
    fn insert(&self, table: &str, key: &str, values: &FieldSet) -> Status;

    /// Deletes a record.
    fn delete(&self, table: &str, key: &str) -> Status;
}

/// Graph-backed harness binding.
///
/// Maps tables to labels and keys to the `_key` property. All clients built
/// from one [`GraphContext`] share its connection.
pub struct GraphClient {
    context: Arc<GraphContext>,
    store: Option<Arc<dyn GraphStore>>,
}

impl std::fmt::Debug for GraphClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphClient")
            .field("context", &self.context)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl GraphClient {
    /// Creates an uninitialized client.
    #[must_use]
    pub const fn new(context: Arc<GraphContext>) -> Self {
        Self {
            context,
            store: None,
        }
    }

    /// Returns `true` once [`init`](Db::init) has succeeded.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.store.is_some()
    }

    /// Runs one operation: validates the label, checks initialization,
    /// executes `body`, logs failures and records metrics.
    fn execute<F>(&self, operation: Operation, table: &str, key: &str, body: F) -> Status
    where
        F: FnOnce(&dyn GraphStore, &Label) -> Result<Status>,
    {
        let started = Instant::now();

        let status = match (Label::parse(table), self.store.as_deref()) {
            (Err(e), _) => {
                tracing::warn!(operation = %operation, table, error = %e, "Rejected table name");
                Status::BadRequest
            },
            (Ok(_), None) => {
                tracing::error!(operation = %operation, table, key, error = %Error::NotInitialized, "Operation failed");
                Status::Error
            },
            (Ok(label), Some(store)) => body(store, &label).unwrap_or_else(|e| {
                tracing::error!(operation = %operation, label = %label, key, error = %e, "Operation failed");
                Status::Error
            }),
        };

        record_operation(operation, status, started.elapsed());
        status
    }
}

impl Db for GraphClient {
    fn init(&mut self) -> Result<()> {
        if self.store.is_some() {
            return Ok(());
        }

        let store = self.context.acquire().inspect_err(|e| {
            tracing::error!(error = %e, "Could not initialize graph connection");
        })?;
        self.store = Some(store);
        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        if self.store.take().is_none() {
            return Ok(());
        }
        self.context.release()
    }

    fn read(
        &self,
        table: &str,
        key: &str,
        fields: Option<&HashSet<String>>,
        result: &mut FieldSet,
    ) -> Status {
        self.execute(Operation::Read, table, key, |store, label| {
            let Some(node) = store.read_node(label, key)? else {
                tracing::debug!(label = %label, key, "No node matched read");
                return Ok(Status::NotFound);
            };
            result.extend(project_fields(node, fields));
            Ok(Status::Ok)
        })
    }

    fn scan(
        &self,
        table: &str,
        start_key: &str,
        record_count: usize,
        fields: Option<&HashSet<String>>,
        result: &mut Vec<FieldSet>,
    ) -> Status {
        self.execute(Operation::Scan, table, start_key, |store, label| {
            if record_count == 0 {
                return Ok(Status::Ok);
            }
            let nodes = store.scan_nodes(label, start_key, record_count)?;
            result.extend(nodes.into_iter().map(|node| project_fields(node, fields)));
            Ok(Status::Ok)
        })
    }

    fn update(&self, table: &str, key: &str, values: &FieldSet) -> Status {
        self.execute(Operation::Update, table, key, |store, label| {
            let matched = store.replace_node(label, key, values)?;
            if matched == 0 {
                tracing::debug!(label = %label, key, "Update matched no node");
            }
            Ok(Status::Ok)
        })
    }

    fn insert(&self, table: &str, key: &str, values: &FieldSet) -> Status {
        self.execute(Operation::Insert, table, key, |store, label| {
            store.create_node(label, key, values)?;
            Ok(Status::Ok)
        })
    }

    fn delete(&self, table: &str, key: &str) -> Status {
        self.execute(Operation::Delete, table, key, |store, label| {
            let deleted = store.delete_nodes(label, key)?;
            tracing::trace!(label = %label, key, deleted, "Delete completed");
            Ok(Status::Ok)
        })
    }
}

impl Drop for GraphClient {
    fn drop(&mut self) {
        if let Err(e) = self.cleanup() {
            tracing::warn!(error = %e, "Failed to release graph connection on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionSettings;
    use crate::storage::InMemoryConnector;

    fn context() -> Arc<GraphContext> {
        Arc::new(GraphContext::new(
            ConnectionSettings::default(),
            InMemoryConnector::new(),
        ))
    }

    fn values(pairs: &[(&str, &str)]) -> FieldSet {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_uninitialized_client_reports_error() {
        let client = context().client();
        assert!(!client.is_initialized());

        let mut result = FieldSet::new();
        assert_eq!(client.read("usertable", "user1", None, &mut result), Status::Error);
        assert_eq!(client.insert("usertable", "user1", &FieldSet::new()), Status::Error);
    }

    #[test]
    fn test_invalid_table_is_bad_request() {
        let mut client = context().client();
        client.init().expect("init");

        assert_eq!(
            client.insert("user table", "user1", &FieldSet::new()),
            Status::BadRequest
        );
        assert_eq!(client.delete("t`) DETACH DELETE n", "k"), Status::BadRequest);
    }

    #[test]
    fn test_read_appends_into_result() {
        let mut client = context().client();
        client.init().expect("init");
        assert_eq!(
            client.insert("usertable", "user1", &values(&[("name", "alice")])),
            Status::Ok
        );

        let mut result = values(&[("stale", "x")]);
        let status = client.read("usertable", "user1", None, &mut result);
        assert_eq!(status, Status::Ok);
        assert_eq!(result, values(&[("stale", "x"), ("name", "alice")]));
    }

    #[test]
    fn test_scan_zero_count() {
        let mut client = context().client();
        client.init().expect("init");
        assert_eq!(client.insert("usertable", "user1", &FieldSet::new()), Status::Ok);

        let mut rows = Vec::new();
        assert_eq!(client.scan("usertable", "", 0, None, &mut rows), Status::Ok);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_init_is_reentrant() {
        let ctx = context();
        let mut client = ctx.client();
        client.init().expect("init");
        client.init().expect("second init");
        assert_eq!(ctx.active_users(), 1);

        client.cleanup().expect("cleanup");
        client.cleanup().expect("second cleanup");
        assert_eq!(ctx.active_users(), 0);
    }

    #[test]
    fn test_drop_releases_connection() {
        let ctx = context();
        {
            let mut client = ctx.client();
            client.init().expect("init");
            assert!(ctx.is_connected());
        }
        assert_eq!(ctx.active_users(), 0);
        assert!(!ctx.is_connected());
    }

    #[test]
    fn test_failed_init_surfaces_error() {
        let ctx = Arc::new(GraphContext::new(
            ConnectionSettings::default(),
            InMemoryConnector::unreachable(),
        ));
        let mut client = ctx.client();

        assert!(matches!(client.init(), Err(Error::Connection { .. })));
        assert!(!client.is_initialized());
        assert_eq!(ctx.active_users(), 0);
    }
}
