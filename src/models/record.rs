//! Field sets and projection.

use std::collections::{HashMap, HashSet};

/// Reserved node property that stores the record key.
pub const KEY_PROPERTY: &str = "_key";

/// Unordered field name to value mapping for one record.
pub type FieldSet = HashMap<String, String>;

/// Builds the full property map written to a node: `values` plus `_key`.
///
/// A `_key` entry inside `values` is overridden by `key`.
#[must_use]
pub fn node_properties(key: &str, values: &FieldSet) -> FieldSet {
    let mut props = values.clone();
    props.insert(KEY_PROPERTY.to_string(), key.to_string());
    props
}

/// Projects stored node properties onto the requested fields.
///
/// With `fields == None` every stored property except `_key` is returned.
/// Requested fields the node does not store are omitted.
#[must_use]
pub fn project_fields(mut node: FieldSet, fields: Option<&HashSet<String>>) -> FieldSet {
    match fields {
        None => {
            node.remove(KEY_PROPERTY);
            node
        },
        Some(wanted) => wanted
            .iter()
            .filter_map(|field| node.remove_entry(field.as_str()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> FieldSet {
        FieldSet::from([
            (KEY_PROPERTY.to_string(), "user1".to_string()),
            ("name".to_string(), "alice".to_string()),
            ("city".to_string(), "paris".to_string()),
        ])
    }

    #[test]
    fn test_project_all_fields_drops_key() {
        let projected = project_fields(stored(), None);
        assert_eq!(projected.len(), 2);
        assert_eq!(projected.get("name").map(String::as_str), Some("alice"));
        assert!(!projected.contains_key(KEY_PROPERTY));
    }

    #[test]
    fn test_project_requested_fields_only() {
        let wanted = HashSet::from(["name".to_string()]);
        let projected = project_fields(stored(), Some(&wanted));
        assert_eq!(projected, FieldSet::from([("name".to_string(), "alice".to_string())]));
    }

    #[test]
    fn test_project_skips_missing_fields() {
        let wanted = HashSet::from(["name".to_string(), "email".to_string()]);
        let projected = project_fields(stored(), Some(&wanted));
        assert_eq!(projected.len(), 1);
        assert!(!projected.contains_key("email"));
    }

    #[test]
    fn test_project_key_when_explicitly_requested() {
        let wanted = HashSet::from([KEY_PROPERTY.to_string()]);
        let projected = project_fields(stored(), Some(&wanted));
        assert_eq!(projected.get(KEY_PROPERTY).map(String::as_str), Some("user1"));
    }

    #[test]
    fn test_node_properties_includes_key() {
        let values = FieldSet::from([
            ("name".to_string(), "bob".to_string()),
            (KEY_PROPERTY.to_string(), "spoofed".to_string()),
        ]);
        let props = node_properties("user7", &values);
        assert_eq!(props.get(KEY_PROPERTY).map(String::as_str), Some("user7"));
        assert_eq!(props.get("name").map(String::as_str), Some("bob"));
        assert_eq!(props.len(), 2);
    }
}
