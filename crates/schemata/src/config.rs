//! Configuration types for Schemata canvases.
//!
//! This module provides configuration structures that control how schema
//! diagrams are laid out and styled. All types implement
//! [`serde::Deserialize`] for loading from external sources.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining layout and style settings.
//! - [`LayoutConfig`] - Parameters of the force layout simulation.
//! - [`StyleConfig`] - Visual styling options used by the SVG exporter.
//!
//! # Example
//!
//! ```
//! # use schemata::config::AppConfig;
//! let config: AppConfig = toml::from_str(
//!     r#"
//!     [layout]
//!     iterations = 300
//!
//!     [style]
//!     background_color = "white"
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.layout().iterations(), 300);
//! assert!(config.style().background_color().unwrap().is_some());
//! ```

use serde::Deserialize;

use schemata_core::color::{Color, DEFAULT_NODE_COLOR};

/// Top-level application configuration combining layout and style settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Layout configuration section.
    #[serde(default)]
    layout: LayoutConfig,

    /// Style configuration section.
    #[serde(default)]
    style: StyleConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the specified layout and style configurations.
    pub fn new(layout: LayoutConfig, style: StyleConfig) -> Self {
        Self { layout, style }
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Returns the style configuration.
    pub fn style(&self) -> &StyleConfig {
        &self.style
    }
}

/// Force layout parameters.
///
/// Every field is optional in the TOML source and falls back to the values
/// the canvas has always used.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Number of simulation steps.
    iterations: usize,
    /// Numerator of the `repulsion / distance²` force between close nodes.
    repulsion: f32,
    /// Strength of the pull towards the layout center.
    attraction: f32,
    /// Velocity damping applied every step, in `(0, 1]`.
    friction: f32,
    /// Side of the square window unpinned nodes start in.
    spread: f32,
    /// Rendered radius of a node type.
    node_radius: f32,
    /// Extra distance reserved for edge labels between nodes.
    label_space: f32,
    /// Seed for the random initial placement; random when absent.
    seed: Option<u64>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            iterations: 150,
            repulsion: 30_000.0,
            attraction: 0.003,
            friction: 0.85,
            spread: 600.0,
            node_radius: 60.0,
            label_space: 250.0,
            seed: None,
        }
    }
}

impl LayoutConfig {
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn repulsion(&self) -> f32 {
        self.repulsion
    }

    pub fn attraction(&self) -> f32 {
        self.attraction
    }

    pub fn friction(&self) -> f32 {
        self.friction
    }

    pub fn spread(&self) -> f32 {
        self.spread
    }

    pub fn node_radius(&self) -> f32 {
        self.node_radius
    }

    pub fn label_space(&self) -> f32 {
        self.label_space
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Returns a copy with the given seed (builder style).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Returns a copy with the given iteration count (builder style).
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }
}

/// Visual styling configuration for exported diagrams.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Background [`Color`] for diagrams, as a color string.
    background_color: Option<String>,

    /// Color of node types that do not declare one.
    default_node_color: String,

    /// Stroke color of edges.
    edge_color: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            background_color: None,
            default_node_color: DEFAULT_NODE_COLOR.to_string(),
            edge_color: "black".to_string(),
        }
    }
}

impl StyleConfig {
    /// Returns the parsed background [`Color`], or `None` if no color is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed.
    pub fn background_color(&self) -> Result<Option<Color>, String> {
        self.background_color
            .as_ref()
            .map(|color| Color::new(color))
            .transpose()
            .map_err(|err| format!("Invalid background color in config: {err}"))
    }

    /// Returns the parsed default node color.
    pub fn default_node_color(&self) -> Result<Color, String> {
        Color::new(&self.default_node_color)
            .map_err(|err| format!("Invalid default node color in config: {err}"))
    }

    /// Returns the parsed edge stroke color.
    pub fn edge_color(&self) -> Result<Color, String> {
        Color::new(&self.edge_color).map_err(|err| format!("Invalid edge color in config: {err}"))
    }
}
