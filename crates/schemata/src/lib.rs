//! Schemata - interactive diagrams of knowledge-graph schemas.
//!
//! Node types are drawn as circles and edge types as connections between
//! them. Nodes without a stored position are placed by a force simulation,
//! self-referencing edge types are drawn as arcs, and new edge types are
//! created by drawing connections in connect mode. Every change is forwarded
//! to a [`store::SchemaStore`].

pub mod canvas;
pub mod config;
pub mod edge;
pub mod export;
pub mod layout;
pub mod store;

mod error;

pub use schemata_core::{color, geometry, identifier, schema};

pub use error::SchemataError;

use std::path::Path;

use log::{debug, info};

use canvas::Canvas;
use config::AppConfig;
use export::{Exporter, svg::SvgBuilder};
use identifier::IdGenerator;
use store::SchemaStore;

/// Builder for loading, laying out and rendering schema canvases.
///
/// # Examples
///
/// ```
/// use schemata::{CanvasBuilder, config::AppConfig, schema::TypeNode, store::MemoryStore};
/// use schemata::store::SchemaStore;
///
/// let mut store = MemoryStore::new();
/// store.create_node_type(TypeNode::new("person")).unwrap();
///
/// let builder = CanvasBuilder::new(AppConfig::default());
/// let canvas = builder.build(store).expect("Failed to load canvas");
/// assert!(canvas.state().node("PERSON".into()).is_some());
///
/// let svg = builder.render_svg(&canvas).expect("Failed to render");
/// assert!(svg.contains("PERSON"));
/// ```
#[derive(Debug, Default)]
pub struct CanvasBuilder {
    config: AppConfig,
}

impl CanvasBuilder {
    /// Create a new canvas builder with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Load the schema in `store` onto a new canvas and lay it out.
    ///
    /// # Errors
    ///
    /// Returns [`SchemataError::Store`] if the store cannot list its content.
    pub fn build<S: SchemaStore>(&self, store: S) -> Result<Canvas<S>, SchemataError> {
        info!("Building canvas");
        let mut canvas = Canvas::new(store, self.config.layout());
        canvas.reload()?;
        info!(
            nodes = canvas.state().type_nodes().count(),
            edges = canvas.state().edges().count();
            "Canvas laid out"
        );
        Ok(canvas)
    }

    /// Render a canvas to an SVG string.
    ///
    /// # Errors
    ///
    /// Returns [`SchemataError::Export`] if the configured style is invalid.
    pub fn render_svg<S, G>(&self, canvas: &Canvas<S, G>) -> Result<String, SchemataError>
    where
        S: SchemaStore,
        G: IdGenerator,
    {
        let svg = self.svg_builder().build()?;
        let rendered = svg.render_canvas(canvas.state()).to_string();
        debug!(bytes = rendered.len(); "SVG rendered");
        Ok(rendered)
    }

    /// Render a canvas into the SVG file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemataError::Export`] if the style is invalid or the file
    /// cannot be written.
    pub fn write_svg<S, G>(
        &self,
        canvas: &Canvas<S, G>,
        path: impl AsRef<Path>,
    ) -> Result<(), SchemataError>
    where
        S: SchemaStore,
        G: IdGenerator,
    {
        let mut svg = self.svg_builder().with_file(path.as_ref()).build()?;
        svg.export_canvas(canvas.state())?;
        info!(path:? = path.as_ref(); "SVG exported");
        Ok(())
    }

    fn svg_builder(&self) -> SvgBuilder<'_> {
        SvgBuilder::new()
            .with_style(self.config.style())
            .with_node_radius(self.config.layout().node_radius())
    }
}
