//! Shared connection context.
//!
//! A [`GraphContext`] owns the one store handle used by every client in the
//! process. The handle is opened by the first successful
//! [`acquire`](GraphContext::acquire) and closed by the
//! [`release`](GraphContext::release) that brings the user count back to
//! zero. Both run under one mutex, so racing clients open and close the
//! handle exactly once.

use crate::client::GraphClient;
use crate::config::ConnectionSettings;
use crate::observability::record_active_clients;
use crate::storage::{GraphConnector, GraphStore, Neo4jConnector};
use crate::{Error, Result};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct SharedConnection {
    users: usize,
    store: Option<Arc<dyn GraphStore>>,
}

/// Process-wide owner of the shared store handle.
pub struct GraphContext {
    settings: ConnectionSettings,
    connector: Box<dyn GraphConnector>,
    state: Mutex<SharedConnection>,
}

impl std::fmt::Debug for GraphContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphContext")
            .field("url", &self.settings.url)
            .field("active_users", &self.active_users())
            .finish_non_exhaustive()
    }
}

impl GraphContext {
    /// Creates a context that opens stores through `connector`.
    #[must_use]
    pub fn new(settings: ConnectionSettings, connector: impl GraphConnector + 'static) -> Self {
        Self {
            settings,
            connector: Box::new(connector),
            state: Mutex::new(SharedConnection::default()),
        }
    }

    /// Creates a context backed by Neo4j.
    #[must_use]
    pub fn neo4j(settings: ConnectionSettings) -> Self {
        Self::new(settings, Neo4jConnector)
    }

    /// Creates an uninitialized client bound to this context.
    #[must_use]
    pub fn client(self: &Arc<Self>) -> GraphClient {
        GraphClient::new(Arc::clone(self))
    }

    /// Returns the connection settings.
    #[must_use]
    pub const fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    fn lock(&self, operation: &str) -> Result<MutexGuard<'_, SharedConnection>> {
        self.state.lock().map_err(|_| Error::OperationFailed {
            operation: operation.to_string(),
            cause: "Lock poisoned".to_string(),
        })
    }

    /// Registers one user and returns the shared store, connecting on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the store cannot be opened or fails
    /// its connectivity check. The user count is unchanged on failure.
    pub fn acquire(&self) -> Result<Arc<dyn GraphStore>> {
        let mut state = self.lock("context_acquire")?;

        if let Some(store) = state.store.as_ref().map(Arc::clone) {
            state.users += 1;
            record_active_clients(state.users);
            return Ok(store);
        }

        let store = self.connector.connect(&self.settings)?;
        if let Err(e) = store.verify_connectivity() {
            if let Err(close_err) = store.close() {
                tracing::warn!(error = %close_err, "Failed to close store after connectivity failure");
            }
            return Err(e);
        }

        tracing::info!(url = %self.settings.url, database = %self.settings.database, "Graph connection created");
        state.store = Some(Arc::clone(&store));
        state.users = 1;
        record_active_clients(state.users);
        Ok(store)
    }

    /// Unregisters one user, closing the store when none remain.
    ///
    /// Releasing with no registered users is a logged no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if closing the store fails.
    pub fn release(&self) -> Result<()> {
        let mut state = self.lock("context_release")?;

        if state.users == 0 {
            tracing::warn!("Graph context released more times than acquired");
            return Ok(());
        }

        state.users -= 1;
        record_active_clients(state.users);
        if state.users > 0 {
            return Ok(());
        }

        if let Some(store) = state.store.take() {
            store.close()?;
            tracing::info!(url = %self.settings.url, "Graph connection closed");
        }
        Ok(())
    }

    /// Returns the number of clients currently holding the store.
    #[must_use]
    pub fn active_users(&self) -> usize {
        self.state.lock().map_or(0, |state| state.users)
    }

    /// Returns `true` while a store is open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state.lock().is_ok_and(|state| state.store.is_some())
    }
}
