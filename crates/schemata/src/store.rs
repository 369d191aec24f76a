//! Schema stores: where node types and edge types are persisted.
//!
//! The canvas talks to a store only through [`SchemaStore`]. Two stores are
//! provided: [`MemoryStore`] keeps the schema in memory and [`FileStore`]
//! rewrites a TOML schema file after every change. Both share the rules of
//! [`SchemaDocument`]: created names are normalized to SCREAMING_SNAKE_CASE,
//! edge types must connect existing node types, and deleting a node type
//! deletes the edge types touching it.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::{io, path::PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use schemata_core::{
    geometry::Point,
    identifier::Id,
    schema::{SchemaError, TypeEdge, TypeNode, to_screaming_snake_case},
};

/// Errors raised by schema stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("node type `{0}` not found")]
    NodeTypeNotFound(Id),

    #[error("edge type `{0}` not found")]
    EdgeTypeNotFound(Id),

    #[error("node type `{0}` already exists")]
    DuplicateNodeType(Id),

    #[error("edge type `{0}` already exists")]
    DuplicateEdgeType(Id),

    #[error("edge type `{edge}` references unknown node type `{node}`")]
    UnknownEndpoint { edge: Id, node: Id },

    #[error(transparent)]
    Invalid(#[from] SchemaError),

    #[error("cannot access schema file `{}`", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse schema file `{}`", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot encode schema")]
    Encode(#[from] toml::ser::Error),

    #[error("schema store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence of node types and edge types.
pub trait SchemaStore {
    fn list_node_types(&self) -> Result<Vec<TypeNode>, StoreError>;

    fn list_edge_types(&self) -> Result<Vec<TypeEdge>, StoreError>;

    /// Store a new node type, returning it as stored.
    fn create_node_type(&mut self, node: TypeNode) -> Result<TypeNode, StoreError>;

    /// Store a new edge type, returning it as stored. The stored name may
    /// differ from the requested one.
    fn create_edge_type(&mut self, edge: TypeEdge) -> Result<TypeEdge, StoreError>;

    fn update_position(&mut self, name: Id, position: Point) -> Result<(), StoreError>;

    /// Delete a node type together with the edge types touching it.
    fn delete_node_type(&mut self, name: Id) -> Result<(), StoreError>;

    fn delete_edge_type(&mut self, name: Id) -> Result<(), StoreError>;
}

impl<S: SchemaStore + ?Sized> SchemaStore for &mut S {
    fn list_node_types(&self) -> Result<Vec<TypeNode>, StoreError> {
        (**self).list_node_types()
    }

    fn list_edge_types(&self) -> Result<Vec<TypeEdge>, StoreError> {
        (**self).list_edge_types()
    }

    fn create_node_type(&mut self, node: TypeNode) -> Result<TypeNode, StoreError> {
        (**self).create_node_type(node)
    }

    fn create_edge_type(&mut self, edge: TypeEdge) -> Result<TypeEdge, StoreError> {
        (**self).create_edge_type(edge)
    }

    fn update_position(&mut self, name: Id, position: Point) -> Result<(), StoreError> {
        (**self).update_position(name, position)
    }

    fn delete_node_type(&mut self, name: Id) -> Result<(), StoreError> {
        (**self).delete_node_type(name)
    }

    fn delete_edge_type(&mut self, name: Id) -> Result<(), StoreError> {
        (**self).delete_edge_type(name)
    }
}

/// A complete schema: every node type and edge type.
///
/// In TOML, node types are `[[node_type]]` tables and edge types
/// `[[edge_type]]` tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(default, rename = "node_type")]
    pub node_types: Vec<TypeNode>,
    #[serde(default, rename = "edge_type")]
    pub edge_types: Vec<TypeEdge>,
}

impl SchemaDocument {
    /// Check every record, name uniqueness and edge endpoints.
    pub fn validate(&self) -> Result<(), StoreError> {
        for (idx, node) in self.node_types.iter().enumerate() {
            node.validate()?;
            if self.node_types[..idx].iter().any(|other| other.name == node.name) {
                return Err(StoreError::DuplicateNodeType(node.name));
            }
        }
        for (idx, edge) in self.edge_types.iter().enumerate() {
            edge.validate()?;
            if self.edge_types[..idx].iter().any(|other| other.name == edge.name) {
                return Err(StoreError::DuplicateEdgeType(edge.name));
            }
            self.check_endpoints(edge)?;
        }
        Ok(())
    }

    fn has_node_type(&self, name: Id) -> bool {
        self.node_types.iter().any(|node| node.name == name)
    }

    fn check_endpoints(&self, edge: &TypeEdge) -> Result<(), StoreError> {
        for node in [edge.from, edge.to] {
            if !self.has_node_type(node) {
                return Err(StoreError::UnknownEndpoint {
                    edge: edge.name,
                    node,
                });
            }
        }
        Ok(())
    }

    pub fn create_node_type(&mut self, mut node: TypeNode) -> Result<TypeNode, StoreError> {
        node.name = Id::new(&to_screaming_snake_case(&node.name.as_string()));
        node.validate()?;
        if self.has_node_type(node.name) {
            return Err(StoreError::DuplicateNodeType(node.name));
        }
        debug!(node:% = node.name; "Node type created");
        self.node_types.push(node.clone());
        Ok(node)
    }

    pub fn create_edge_type(&mut self, mut edge: TypeEdge) -> Result<TypeEdge, StoreError> {
        edge.name = Id::new(&to_screaming_snake_case(&edge.name.as_string()));
        edge.validate()?;
        if self.edge_types.iter().any(|other| other.name == edge.name) {
            return Err(StoreError::DuplicateEdgeType(edge.name));
        }
        self.check_endpoints(&edge)?;
        debug!(edge:% = edge.name, from:% = edge.from, to:% = edge.to; "Edge type created");
        self.edge_types.push(edge.clone());
        Ok(edge)
    }

    pub fn update_position(&mut self, name: Id, position: Point) -> Result<(), StoreError> {
        let node = self
            .node_types
            .iter_mut()
            .find(|node| node.name == name)
            .ok_or(StoreError::NodeTypeNotFound(name))?;
        node.x_pos = Some(position.x());
        node.y_pos = Some(position.y());
        Ok(())
    }

    pub fn delete_node_type(&mut self, name: Id) -> Result<(), StoreError> {
        if !self.has_node_type(name) {
            return Err(StoreError::NodeTypeNotFound(name));
        }
        self.node_types.retain(|node| node.name != name);
        let before = self.edge_types.len();
        self.edge_types
            .retain(|edge| edge.from != name && edge.to != name);
        debug!(
            node:% = name,
            removed_edges = before - self.edge_types.len();
            "Node type deleted"
        );
        Ok(())
    }

    pub fn delete_edge_type(&mut self, name: Id) -> Result<(), StoreError> {
        let before = self.edge_types.len();
        self.edge_types.retain(|edge| edge.name != name);
        if self.edge_types.len() == before {
            return Err(StoreError::EdgeTypeNotFound(name));
        }
        debug!(edge:% = name; "Edge type deleted");
        Ok(())
    }
}
