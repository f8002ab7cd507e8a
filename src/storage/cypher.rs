//! Cypher templates for the five harness operations.
//!
//! Labels are interpolated (they cannot be parameters); keys, bounds and
//! property maps are always bound.

use crate::models::{FieldSet, KEY_PROPERTY, Label, node_properties};
use std::collections::BTreeMap;

/// Column holding the node in read and scan results.
pub const NODE_COLUMN: &str = "n";
/// Column holding the match count of an update.
pub const MATCHED_COLUMN: &str = "matched";
/// Column holding the delete count.
pub const DELETED_COLUMN: &str = "deleted";

/// A bound query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    /// String value.
    Text(String),
    /// Integer value.
    Integer(i64),
    /// String-valued property map.
    Map(BTreeMap<String, String>),
}

/// Query text plus its named parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CypherQuery {
    /// Cypher text.
    pub text: String,
    /// Named parameters, in binding order.
    pub params: Vec<(&'static str, Param)>,
}

impl CypherQuery {
    fn new(text: String) -> Self {
        Self {
            text,
            params: Vec::new(),
        }
    }

    fn param(mut self, name: &'static str, value: Param) -> Self {
        self.params.push((name, value));
        self
    }

    /// Looks up a parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Param> {
        self.params
            .iter()
            .find_map(|(n, value)| (*n == name).then_some(value))
    }
}

/// Point lookup of a single node.
#[must_use]
pub fn read(label: &Label, key: &str) -> CypherQuery {
    CypherQuery::new(format!(
        "MATCH ({NODE_COLUMN}:{} {{{KEY_PROPERTY}: $key}}) RETURN {NODE_COLUMN} LIMIT 1",
        label.quoted()
    ))
    .param("key", Param::Text(key.to_string()))
}

/// Ordered range scan from `start_key`.
#[must_use]
pub fn scan(label: &Label, start_key: &str, limit: usize) -> CypherQuery {
    CypherQuery::new(format!(
        "MATCH ({NODE_COLUMN}:{}) WHERE {NODE_COLUMN}.{KEY_PROPERTY} >= $start_key \
         RETURN {NODE_COLUMN} ORDER BY {NODE_COLUMN}.{KEY_PROPERTY} LIMIT $limit",
        label.quoted()
    ))
    .param("start_key", Param::Text(start_key.to_string()))
    .param("limit", Param::Integer(i64::try_from(limit).unwrap_or(i64::MAX)))
}

/// Full overwrite of a node's properties.
///
/// `SET n = $values` drops every property not in the map, so `_key` is
/// written back with the values.
#[must_use]
pub fn update(label: &Label, key: &str, values: &FieldSet) -> CypherQuery {
    CypherQuery::new(format!(
        "MATCH ({NODE_COLUMN}:{} {{{KEY_PROPERTY}: $key}}) SET {NODE_COLUMN} = $values \
         RETURN count({NODE_COLUMN}) AS {MATCHED_COLUMN}",
        label.quoted()
    ))
    .param("key", Param::Text(key.to_string()))
    .param("values", property_map(key, values))
}

/// Creation of a new node.
#[must_use]
pub fn insert(label: &Label, key: &str, values: &FieldSet) -> CypherQuery {
    CypherQuery::new(format!(
        "CREATE ({NODE_COLUMN}:{}) SET {NODE_COLUMN} = $values",
        label.quoted()
    ))
    .param("values", property_map(key, values))
}

/// Deletion of every node matching the key.
#[must_use]
pub fn delete(label: &Label, key: &str) -> CypherQuery {
    CypherQuery::new(format!(
        "MATCH ({NODE_COLUMN}:{} {{{KEY_PROPERTY}: $key}}) DETACH DELETE {NODE_COLUMN} \
         RETURN count(*) AS {DELETED_COLUMN}",
        label.quoted()
    ))
    .param("key", Param::Text(key.to_string()))
}

/// Connectivity probe.
#[must_use]
pub fn probe() -> CypherQuery {
    CypherQuery::new("RETURN 1".to_string())
}

fn property_map(key: &str, values: &FieldSet) -> Param {
    Param::Map(node_properties(key, values).into_iter().collect())
}
