//! SVG rendering of a laid-out canvas.
//!
//! Edges are drawn first, then node circles, then edge labels, each in its
//! own `data-layer` group. Node names are centered in their circles.

use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

use log::{debug, error, info};
use svg::{Document, node::Text as SvgText, node::element as svg_element};

use schemata_core::{
    color::Color,
    geometry::{Bounds, Point},
};

use super::{Error, Exporter};
use crate::{
    canvas::{CanvasEdge, CanvasNode, CanvasState, EdgeKind},
    config::{LayoutConfig, StyleConfig},
    edge::{EdgePath, SelfLoopGeometry},
};

const MARGIN: f32 = 50.0;
const ANCHOR_RADIUS: f32 = 4.0;
const FONT_FAMILY: &str = "sans-serif";
const FONT_SIZE: f32 = 14.0;
const NAME_COLOR: &str = "white";
const STROKE_WIDTH: f32 = 2.0;

/// Builder for [`Svg`].
#[derive(Debug, Default)]
pub struct SvgBuilder<'a> {
    file_name: Option<PathBuf>,
    style: Option<&'a StyleConfig>,
    node_radius: Option<f32>,
    self_loops: SelfLoopGeometry,
}

impl<'a> SvgBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the file written by [`Exporter::export_canvas`].
    pub fn with_file(mut self, file_name: impl Into<PathBuf>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_style(mut self, style: &'a StyleConfig) -> Self {
        self.style = Some(style);
        self
    }

    /// Radius of node circles; defaults to the layout node radius.
    pub fn with_node_radius(mut self, radius: f32) -> Self {
        self.node_radius = Some(radius);
        self
    }

    pub fn with_self_loops(mut self, self_loops: SelfLoopGeometry) -> Self {
        self.self_loops = self_loops;
        self
    }

    /// # Errors
    ///
    /// Returns [`Error::Render`] if a configured color does not parse or the
    /// node radius is not a positive number.
    pub fn build(self) -> Result<Svg, Error> {
        let default_style = StyleConfig::default();
        let style = self.style.unwrap_or(&default_style);

        let node_radius = self
            .node_radius
            .unwrap_or_else(|| LayoutConfig::default().node_radius());
        if !node_radius.is_finite() || node_radius <= 0.0 {
            return Err(Error::Render(format!(
                "Node radius must be positive, got {node_radius}"
            )));
        }

        Ok(Svg {
            file_name: self.file_name,
            background: style.background_color().map_err(Error::Render)?,
            node_color: style.default_node_color().map_err(Error::Render)?,
            edge_color: style.edge_color().map_err(Error::Render)?,
            node_radius,
            self_loops: self.self_loops,
        })
    }
}

/// SVG renderer and file exporter.
#[derive(Debug)]
pub struct Svg {
    file_name: Option<PathBuf>,
    background: Option<Color>,
    node_color: Color,
    edge_color: Color,
    node_radius: f32,
    self_loops: SelfLoopGeometry,
}

impl Svg {
    /// Render every node and edge of `state` into a document sized to fit.
    pub fn render_canvas(&self, state: &CanvasState) -> Document {
        let paths: Vec<(&CanvasEdge, EdgePath)> = state
            .edges()
            .filter_map(|edge| {
                state
                    .edge_path(edge.id(), &self.self_loops)
                    .map(|path| (edge, path))
            })
            .collect();

        let bounds = self.calculate_canvas_bounds(state, &paths).expand(MARGIN);
        debug!(
            width = bounds.width(),
            height = bounds.height();
            "SVG canvas bounds calculated"
        );

        let mut doc = Document::new()
            .set(
                "viewBox",
                format!(
                    "{} {} {} {}",
                    bounds.min_x(),
                    bounds.min_y(),
                    bounds.width(),
                    bounds.height()
                ),
            )
            .set("width", bounds.width())
            .set("height", bounds.height());

        if let Some(background) = self.background {
            doc = doc.add(
                svg_element::Rectangle::new()
                    .set("x", bounds.min_x())
                    .set("y", bounds.min_y())
                    .set("width", bounds.width())
                    .set("height", bounds.height())
                    .set("fill", background.to_string())
                    .set("fill-opacity", background.alpha()),
            );
        }

        let mut edges = svg_element::Group::new().set("data-layer", "edges");
        let mut labels = svg_element::Group::new().set("data-layer", "labels");
        for (edge, path) in &paths {
            edges = edges.add(self.render_edge(edge, path));
            if edge.kind() != EdgeKind::Provisional {
                labels = labels.add(self.render_edge_label(edge, path.label()));
            }
        }

        let mut nodes = svg_element::Group::new().set("data-layer", "nodes");
        for node in state.nodes() {
            nodes = nodes.add(self.render_node(node));
        }

        doc.add(edges).add(nodes).add(labels)
    }

    fn calculate_canvas_bounds(
        &self,
        state: &CanvasState,
        paths: &[(&CanvasEdge, EdgePath)],
    ) -> Bounds {
        let loop_bounds = paths.iter().filter_map(|(_, path)| match path {
            EdgePath::SelfLoop(self_loop) => {
                let arc = self_loop.arc();
                Some(
                    Bounds::around(arc.center(), arc.radius())
                        .merge(&Bounds::around(self_loop.label(), FONT_SIZE)),
                )
            }
            EdgePath::Straight(_) => None,
        });

        state
            .bounds(self.node_radius)
            .into_iter()
            .chain(loop_bounds)
            .reduce(|acc, bounds| acc.merge(&bounds))
            .unwrap_or_else(|| Bounds::around(Point::default(), 0.0))
    }

    fn render_node(&self, node: &CanvasNode) -> svg_element::Group {
        let position = node.position();
        let group = svg_element::Group::new().set("data-node", node.id().to_string());

        let Some(color) = node.color() else {
            return group.add(
                svg_element::Circle::new()
                    .set("cx", position.x())
                    .set("cy", position.y())
                    .set("r", ANCHOR_RADIUS)
                    .set("fill", self.edge_color.to_string()),
            );
        };

        let fill = if node.is_highlighted() || node.declared_color().is_some() {
            color
        } else {
            self.node_color
        };

        group
            .add(
                svg_element::Circle::new()
                    .set("cx", position.x())
                    .set("cy", position.y())
                    .set("r", self.node_radius)
                    .set("fill", fill.to_string())
                    .set("fill-opacity", fill.alpha()),
            )
            .add(Self::render_text(&node.id().to_string(), position).set("fill", NAME_COLOR))
    }

    fn render_edge(&self, edge: &CanvasEdge, path: &EdgePath) -> svg_element::Path {
        let rendered = svg_element::Path::new()
            .set("d", path.to_svg_path())
            .set("fill", "none")
            .set("stroke", self.edge_color.to_string())
            .set("stroke-opacity", self.edge_color.alpha())
            .set("stroke-width", STROKE_WIDTH)
            .set("data-edge", edge.id().to_string());

        match edge.kind() {
            EdgeKind::Provisional => rendered.set("stroke-dasharray", "5 5"),
            EdgeKind::Relationship | EdgeKind::SelfConnecting => rendered,
        }
    }

    fn render_edge_label(&self, edge: &CanvasEdge, position: Point) -> svg_element::Text {
        Self::render_text(&edge.id().to_string(), position)
            .set("fill", self.edge_color.to_string())
            .set("paint-order", "stroke")
            .set("stroke", "white")
            .set("stroke-width", 3)
    }

    fn render_text(content: &str, position: Point) -> svg_element::Text {
        svg_element::Text::new("")
            .set("x", position.x())
            .set("y", position.y())
            .set("text-anchor", "middle")
            .set("dominant-baseline", "central")
            .set("font-family", FONT_FAMILY)
            .set("font-size", FONT_SIZE)
            .add(SvgText::new(content))
    }

    /// Writes an SVG document to `path`.
    pub fn write_document(&self, doc: &Document, path: &Path) -> Result<(), Error> {
        info!(path:? = path; "Creating SVG file");
        let mut file = match File::create(path) {
            Ok(file) => file,
            Err(err) => {
                error!(path:? = path, err:err; "Failed to create SVG file");
                return Err(Error::Io(err));
            }
        };

        if let Err(err) = write!(file, "{doc}") {
            error!(path:? = path, err:err; "Failed to write SVG content");
            return Err(Error::Io(err));
        }
        Ok(())
    }
}

impl Exporter for Svg {
    fn export_canvas(&mut self, state: &CanvasState) -> Result<(), Error> {
        let Some(path) = &self.file_name else {
            return Err(Error::Render("No output file configured".to_string()));
        };
        let doc = self.render_canvas(state);
        debug!("SVG document rendered");
        self.write_document(&doc, path)
    }
}
