//! Neo4j graph store.
//!
//! Wraps a pooled `neo4rs` [`Graph`](neo4rs::Graph) behind the blocking
//! [`GraphStore`] API. The store owns its own multi-threaded tokio runtime;
//! harness workers are plain threads that block on it. Calling the store from
//! inside another tokio runtime is not supported.

#[cfg(feature = "neo4j")]
mod implementation {
    use crate::config::ConnectionSettings;
    use crate::models::{FieldSet, Label};
    use crate::storage::cypher::{self, CypherQuery, DELETED_COLUMN, MATCHED_COLUMN, NODE_COLUMN, Param};
    use crate::storage::traits::{GraphConnector, GraphStore};
    use crate::{Error, Result};
    use neo4rs::{BoltMap, BoltString, BoltType, ConfigBuilder, Graph, Node, Query, Row};
    use secrecy::ExposeSecret;
    use std::future::Future;
    use std::sync::{Arc, RwLock};
    use std::time::Duration;
    use tokio::runtime::{Builder, Runtime};

    /// How long `close` waits for in-flight driver tasks.
    const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

    /// Helper to map query errors.
    fn query_error(op: &str, e: impl std::fmt::Display) -> Error {
        Error::OperationFailed {
            operation: op.to_string(),
            cause: e.to_string(),
        }
    }

    fn connection_error(url: &str, e: impl std::fmt::Display) -> Error {
        Error::Connection {
            url: url.to_string(),
            cause: e.to_string(),
        }
    }

    /// Neo4j-backed graph store.
    pub struct Neo4jStore {
        /// Pooled driver handle.
        graph: Graph,
        /// Runtime driving the driver; `None` once closed.
        runtime: RwLock<Option<Runtime>>,
        /// Target URL, for diagnostics.
        url: String,
    }

    impl std::fmt::Debug for Neo4jStore {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Neo4jStore")
                .field("url", &self.url)
                .finish_non_exhaustive()
        }
    }

    impl Neo4jStore {
        /// Connects to the server described by `settings`.
        ///
        /// # Errors
        ///
        /// Returns [`Error::Connection`] if the settings are rejected by the
        /// driver or the pool cannot be created.
        pub fn connect(settings: &ConnectionSettings) -> Result<Self> {
            settings.validate()?;

            let runtime = Builder::new_multi_thread()
                .enable_all()
                .thread_name("graphkv-neo4j")
                .build()
                .map_err(|e| query_error("neo4j_create_runtime", e))?;

            let mut builder = ConfigBuilder::default()
                .uri(settings.url.as_str())
                .user(settings.user.as_str())
                .password(settings.password.expose_secret())
                .db(settings.database.as_str());
            if let Some(max_connections) = settings.max_connections {
                builder = builder.max_connections(max_connections);
            }
            if let Some(fetch_size) = settings.fetch_size {
                builder = builder.fetch_size(fetch_size);
            }
            let config = builder
                .build()
                .map_err(|e| connection_error(&settings.url, e))?;

            let graph = runtime
                .block_on(Graph::connect(config))
                .map_err(|e| connection_error(&settings.url, e))?;

            tracing::debug!(url = %settings.url, database = %settings.database, "Bolt pool created");

            Ok(Self {
                graph,
                runtime: RwLock::new(Some(runtime)),
                url: settings.url.clone(),
            })
        }

        /// Runs a future on the store's runtime.
        fn block_on<F, T>(&self, operation: &str, f: F) -> Result<T>
        where
            F: Future<Output = Result<T>>,
        {
            let guard = self
                .runtime
                .read()
                .map_err(|_| query_error(operation, "Lock poisoned"))?;
            let Some(runtime) = guard.as_ref() else {
                return Err(query_error(operation, "connection closed"));
            };
            runtime.block_on(f)
        }

        /// Executes a query and collects every row.
        async fn fetch_rows(&self, operation: &str, query: CypherQuery) -> Result<Vec<Row>> {
            let mut stream = self
                .graph
                .execute(to_neo4rs(query))
                .await
                .map_err(|e| query_error(operation, e))?;

            let mut rows = Vec::new();
            while let Some(row) = stream.next().await.map_err(|e| query_error(operation, e))? {
                rows.push(row);
            }
            Ok(rows)
        }

        /// Executes a query returning a single count column.
        async fn fetch_count(&self, operation: &str, query: CypherQuery, column: &str) -> Result<u64> {
            let rows = self.fetch_rows(operation, query).await?;
            let Some(row) = rows.first() else {
                return Ok(0);
            };
            let count: i64 = row.get(column).map_err(|e| query_error(operation, e))?;
            Ok(u64::try_from(count).unwrap_or(0))
        }
    }

    /// Converts a template into a driver query.
    fn to_neo4rs(template: CypherQuery) -> Query {
        template
            .params
            .into_iter()
            .fold(neo4rs::query(&template.text), |query, (name, value)| {
                query.param(name, to_bolt(value))
            })
    }

    fn to_bolt(param: Param) -> BoltType {
        match param {
            Param::Text(s) => BoltType::from(s),
            Param::Integer(i) => BoltType::from(i),
            Param::Map(map) => {
                let mut bolt = BoltMap::with_capacity(map.len());
                for (key, value) in map {
                    bolt.put(BoltString::from(key), BoltType::from(value));
                }
                BoltType::Map(bolt)
            },
        }
    }

    /// Reads every property of the `n` column as a string.
    fn row_to_fields(operation: &str, row: &Row) -> Result<FieldSet> {
        let node: Node = row.get(NODE_COLUMN).map_err(|e| query_error(operation, e))?;
        node.keys()
            .into_iter()
            .map(|key| {
                let value: String = node.get(key).map_err(|e| {
                    query_error(operation, format!("property '{key}' is not a string: {e}"))
                })?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    impl GraphStore for Neo4jStore {
        fn verify_connectivity(&self) -> Result<()> {
            self.block_on("neo4j_verify_connectivity", async {
                self.graph
                    .run(to_neo4rs(cypher::probe()))
                    .await
                    .map_err(|e| connection_error(&self.url, e))
            })
        }

        fn read_node(&self, label: &Label, key: &str) -> Result<Option<FieldSet>> {
            const OP: &str = "neo4j_read";
            self.block_on(OP, async {
                let rows = self.fetch_rows(OP, cypher::read(label, key)).await?;
                rows.first().map(|row| row_to_fields(OP, row)).transpose()
            })
        }

        fn scan_nodes(&self, label: &Label, start_key: &str, limit: usize) -> Result<Vec<FieldSet>> {
            const OP: &str = "neo4j_scan";
            self.block_on(OP, async {
                let rows = self
                    .fetch_rows(OP, cypher::scan(label, start_key, limit))
                    .await?;
                rows.iter().map(|row| row_to_fields(OP, row)).collect()
            })
        }

        fn replace_node(&self, label: &Label, key: &str, values: &FieldSet) -> Result<u64> {
            const OP: &str = "neo4j_update";
            self.block_on(
                OP,
                self.fetch_count(OP, cypher::update(label, key, values), MATCHED_COLUMN),
            )
        }

        fn create_node(&self, label: &Label, key: &str, values: &FieldSet) -> Result<()> {
            const OP: &str = "neo4j_insert";
            self.block_on(OP, async {
                self.graph
                    .run(to_neo4rs(cypher::insert(label, key, values)))
                    .await
                    .map_err(|e| query_error(OP, e))
            })
        }

        fn delete_nodes(&self, label: &Label, key: &str) -> Result<u64> {
            const OP: &str = "neo4j_delete";
            self.block_on(
                OP,
                self.fetch_count(OP, cypher::delete(label, key), DELETED_COLUMN),
            )
        }

        fn close(&self) -> Result<()> {
            let runtime = self
                .runtime
                .write()
                .map_err(|_| query_error("neo4j_close", "Lock poisoned"))?
                .take();
            if let Some(runtime) = runtime {
                runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);
            }
            Ok(())
        }
    }

    /// Connector that opens [`Neo4jStore`]s.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct Neo4jConnector;

    impl GraphConnector for Neo4jConnector {
        fn connect(&self, settings: &ConnectionSettings) -> Result<Arc<dyn GraphStore>> {
            Ok(Arc::new(Neo4jStore::connect(settings)?))
        }
    }

}

#[cfg(feature = "neo4j")]
pub use implementation::{Neo4jConnector, Neo4jStore};

#[cfg(not(feature = "neo4j"))]
mod stub {
    use crate::config::ConnectionSettings;
    use crate::storage::traits::{GraphConnector, GraphStore};
    use crate::{Error, Result};
    use std::sync::Arc;

    /// Stub Neo4j connector when the feature is not enabled.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct Neo4jConnector;

    impl GraphConnector for Neo4jConnector {
        fn connect(&self, _settings: &ConnectionSettings) -> Result<Arc<dyn GraphStore>> {
            Err(Error::FeatureNotEnabled("neo4j".to_string()))
        }
    }

}

#[cfg(not(feature = "neo4j"))]
pub use stub::Neo4jConnector;
