//! In-process schema store.

use schemata_core::{
    geometry::Point,
    identifier::Id,
    schema::{TypeEdge, TypeNode},
};

use super::{SchemaDocument, SchemaStore, StoreError};

/// A schema store that lives in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    document: SchemaDocument,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `document`, which must be valid.
    pub fn from_document(document: SchemaDocument) -> Result<Self, StoreError> {
        document.validate()?;
        Ok(Self { document })
    }

    pub fn document(&self) -> &SchemaDocument {
        &self.document
    }
}

impl SchemaStore for MemoryStore {
    fn list_node_types(&self) -> Result<Vec<TypeNode>, StoreError> {
        Ok(self.document.node_types.clone())
    }

    fn list_edge_types(&self) -> Result<Vec<TypeEdge>, StoreError> {
        Ok(self.document.edge_types.clone())
    }

    fn create_node_type(&mut self, node: TypeNode) -> Result<TypeNode, StoreError> {
        self.document.create_node_type(node)
    }

    fn create_edge_type(&mut self, edge: TypeEdge) -> Result<TypeEdge, StoreError> {
        self.document.create_edge_type(edge)
    }

    fn update_position(&mut self, name: Id, position: Point) -> Result<(), StoreError> {
        self.document.update_position(name, position)
    }

    fn delete_node_type(&mut self, name: Id) -> Result<(), StoreError> {
        self.document.delete_node_type(name)
    }

    fn delete_edge_type(&mut self, name: Id) -> Result<(), StoreError> {
        self.document.delete_edge_type(name)
    }
}
