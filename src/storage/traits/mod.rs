//! Storage trait definitions.

pub mod graph;

pub use graph::{GraphConnector, GraphStore};
