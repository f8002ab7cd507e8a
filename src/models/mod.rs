//! Data models for graphkv.
//!
//! Records are addressed by a `(table, key)` pair: the table becomes a node
//! [`Label`] and the key is stored in the reserved [`KEY_PROPERTY`].

mod label;
mod record;
mod status;

pub use label::{Label, MAX_LABEL_LENGTH};
pub use record::{FieldSet, KEY_PROPERTY, node_properties, project_fields};
pub use status::{Operation, Status};
