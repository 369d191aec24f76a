//! Schema store backed by a TOML file.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};

use schemata_core::{
    geometry::Point,
    identifier::Id,
    schema::{TypeEdge, TypeNode},
};

use super::{SchemaDocument, SchemaStore, StoreError};

/// A schema store that rewrites its TOML file after every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    document: SchemaDocument,
}

impl FileStore {
    /// Open an existing schema file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the schema
    /// it contains is invalid.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let content = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        let document: SchemaDocument =
            toml::from_str(&content).map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?;
        document.validate()?;

        info!(
            path:? = path,
            node_types = document.node_types.len(),
            edge_types = document.edge_types.len();
            "Schema file loaded"
        );
        Ok(Self { path, document })
    }

    /// Create a new, empty schema file, replacing any existing one.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            document: SchemaDocument::default(),
        };
        store.save()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &SchemaDocument {
        &self.document
    }

    fn save(&self) -> Result<(), StoreError> {
        self.write(&self.document)
    }

    fn write(&self, document: &SchemaDocument) -> Result<(), StoreError> {
        let content = toml::to_string_pretty(document)?;
        fs::write(&self.path, content).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!(path:? = self.path; "Schema file saved");
        Ok(())
    }

    /// Apply `change` to a copy of the document, write it, and keep it only
    /// once the file is written.
    fn modify<T>(
        &mut self,
        change: impl FnOnce(&mut SchemaDocument) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut document = self.document.clone();
        let value = change(&mut document)?;
        self.write(&document)?;
        self.document = document;
        Ok(value)
    }
}

impl SchemaStore for FileStore {
    fn list_node_types(&self) -> Result<Vec<TypeNode>, StoreError> {
        Ok(self.document.node_types.clone())
    }

    fn list_edge_types(&self) -> Result<Vec<TypeEdge>, StoreError> {
        Ok(self.document.edge_types.clone())
    }

    fn create_node_type(&mut self, node: TypeNode) -> Result<TypeNode, StoreError> {
        self.modify(|document| document.create_node_type(node))
    }

    fn create_edge_type(&mut self, edge: TypeEdge) -> Result<TypeEdge, StoreError> {
        self.modify(|document| document.create_edge_type(edge))
    }

    fn update_position(&mut self, name: Id, position: Point) -> Result<(), StoreError> {
        self.modify(|document| document.update_position(name, position))
    }

    fn delete_node_type(&mut self, name: Id) -> Result<(), StoreError> {
        self.modify(|document| document.delete_node_type(name))
    }

    fn delete_edge_type(&mut self, name: Id) -> Result<(), StoreError> {
        self.modify(|document| document.delete_edge_type(name))
    }
}
