//! In-memory graph store for testing.
//!
//! Mirrors the Cypher semantics of the Neo4j backend: first-match reads,
//! ordered scans, full-overwrite updates, duplicate-tolerant inserts and
//! delete-all-matches. Data lives in the connector, so reconnecting through
//! the same connector sees earlier writes.

use crate::config::ConnectionSettings;
use crate::models::{FieldSet, KEY_PROPERTY, Label, node_properties};
use crate::storage::traits::{GraphConnector, GraphStore};
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

type Nodes = HashMap<Label, Vec<FieldSet>>;

/// Counts of stores opened and closed by an [`InMemoryConnector`].
#[derive(Debug, Default)]
pub struct ConnectionStats {
    opened: AtomicUsize,
    closed: AtomicUsize,
}

impl ConnectionStats {
    /// Returns how many stores were opened.
    #[must_use]
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Returns how many stores were closed.
    #[must_use]
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

/// In-memory graph store.
///
/// Uses `RwLock` for thread-safe access with reader-writer semantics.
#[derive(Debug)]
pub struct InMemoryGraphStore {
    nodes: Arc<RwLock<Nodes>>,
    unique_keys: bool,
    closed: AtomicBool,
    stats: Arc<ConnectionStats>,
}

impl Default for InMemoryGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGraphStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: Arc::default(),
            unique_keys: false,
            closed: AtomicBool::new(false),
            stats: Arc::default(),
        }
    }

    /// Returns the number of nodes stored under `label`.
    #[must_use]
    pub fn node_count(&self, label: &Label) -> usize {
        self.nodes
            .read()
            .map(|nodes| nodes.get(label).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    fn ensure_open(&self, operation: &str) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::OperationFailed {
                operation: operation.to_string(),
                cause: "connection closed".to_string(),
            });
        }
        Ok(())
    }

    fn read_lock(
        &self,
        operation: &str,
    ) -> Result<std::sync::RwLockReadGuard<'_, Nodes>> {
        self.ensure_open(operation)?;
        self.nodes.read().map_err(|_| Error::OperationFailed {
            operation: operation.to_string(),
            cause: "Lock poisoned".to_string(),
        })
    }

    fn write_lock(
        &self,
        operation: &str,
    ) -> Result<std::sync::RwLockWriteGuard<'_, Nodes>> {
        self.ensure_open(operation)?;
        self.nodes.write().map_err(|_| Error::OperationFailed {
            operation: operation.to_string(),
            cause: "Lock poisoned".to_string(),
        })
    }
}

fn has_key(node: &FieldSet, key: &str) -> bool {
    node.get(KEY_PROPERTY).is_some_and(|k| k == key)
}

impl GraphStore for InMemoryGraphStore {
    fn verify_connectivity(&self) -> Result<()> {
        self.ensure_open("memory_verify_connectivity")
    }

    fn read_node(&self, label: &Label, key: &str) -> Result<Option<FieldSet>> {
        let nodes = self.read_lock("memory_read")?;
        Ok(nodes
            .get(label)
            .and_then(|list| list.iter().find(|node| has_key(node, key)))
            .cloned())
    }

    fn scan_nodes(&self, label: &Label, start_key: &str, limit: usize) -> Result<Vec<FieldSet>> {
        let nodes = self.read_lock("memory_scan")?;
        let Some(list) = nodes.get(label) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<&FieldSet> = list
            .iter()
            .filter(|node| {
                node.get(KEY_PROPERTY)
                    .is_some_and(|k| k.as_str() >= start_key)
            })
            .collect();
        matched.sort_by(|a, b| a.get(KEY_PROPERTY).cmp(&b.get(KEY_PROPERTY)));

        Ok(matched.into_iter().take(limit).cloned().collect())
    }

    fn replace_node(&self, label: &Label, key: &str, values: &FieldSet) -> Result<u64> {
        let mut nodes = self.write_lock("memory_replace")?;
        let Some(list) = nodes.get_mut(label) else {
            return Ok(0);
        };

        let mut matched = 0;
        for node in list.iter_mut().filter(|node| has_key(node, key)) {
            *node = node_properties(key, values);
            matched += 1;
        }
        Ok(matched)
    }

    fn create_node(&self, label: &Label, key: &str, values: &FieldSet) -> Result<()> {
        let mut nodes = self.write_lock("memory_create")?;
        let list = nodes.entry(label.clone()).or_default();

        if self.unique_keys && list.iter().any(|node| has_key(node, key)) {
            return Err(Error::OperationFailed {
                operation: "memory_create".to_string(),
                cause: format!(
                    "node with label '{label}' and property '{KEY_PROPERTY}' = '{key}' already exists"
                ),
            });
        }

        list.push(node_properties(key, values));
        Ok(())
    }

    fn delete_nodes(&self, label: &Label, key: &str) -> Result<u64> {
        let mut nodes = self.write_lock("memory_delete")?;
        let Some(list) = nodes.get_mut(label) else {
            return Ok(0);
        };

        let before = list.len();
        list.retain(|node| !has_key(node, key));
        Ok((before - list.len()) as u64)
    }

    fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.stats.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Connector producing [`InMemoryGraphStore`]s over shared data.
#[derive(Debug, Default)]
pub struct InMemoryConnector {
    nodes: Arc<RwLock<Nodes>>,
    unique_keys: bool,
    unreachable: bool,
    stats: Arc<ConnectionStats>,
}

impl InMemoryConnector {
    /// Creates a connector with an empty dataset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects inserts of an existing key, like a uniqueness constraint on `_key`.
    #[must_use]
    pub const fn with_unique_keys(mut self) -> Self {
        self.unique_keys = true;
        self
    }

    /// Creates a connector whose every connection attempt fails.
    #[must_use]
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    /// Returns the shared open/close counters.
    #[must_use]
    pub fn stats(&self) -> Arc<ConnectionStats> {
        Arc::clone(&self.stats)
    }
}

impl GraphConnector for InMemoryConnector {
    fn connect(&self, settings: &ConnectionSettings) -> Result<Arc<dyn GraphStore>> {
        if self.unreachable {
            return Err(Error::Connection {
                url: settings.url.clone(),
                cause: "connection refused".to_string(),
            });
        }

        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(InMemoryGraphStore {
            nodes: Arc::clone(&self.nodes),
            unique_keys: self.unique_keys,
            closed: AtomicBool::new(false),
            stats: Arc::clone(&self.stats),
        }))
    }
}
