//! Flow definitions: locating, parsing and normalizing the two documents
//! (`agents.yaml`, `tasks.yaml`) that make up a named flow.
//!
//! Documents may be written either as a mapping from key to definition or as
//! a list of definitions. Both shapes are normalized at the parse boundary
//! into an ordered `Vec<Record<T>>`, so the builder never branches on shape.

mod document;
mod loader;
mod spec;


pub use document::Record;
pub use loader::{FlowDocuments, list_flows, validate_flow_name};
pub use spec::{AgentSpec, TaskSpec};

#[cfg(test)]
pub(crate) use document::parse_records;
