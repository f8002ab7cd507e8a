//! Storage layer abstraction.
//!
//! The [`GraphStore`] trait is the seam between the harness binding and the
//! database:
//! - **Neo4j**: [`Neo4jStore`] issues the templates in [`cypher`] over Bolt
//! - **Memory**: [`InMemoryGraphStore`] reproduces the same semantics in-process

pub mod cypher;
pub mod memory;
pub mod neo4j;
pub mod traits;

pub use memory::{ConnectionStats, InMemoryConnector, InMemoryGraphStore};
pub use neo4j::Neo4jConnector;
#[cfg(feature = "neo4j")]
pub use neo4j::Neo4jStore;
pub use traits::{GraphConnector, GraphStore};
