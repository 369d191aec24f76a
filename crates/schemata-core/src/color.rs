//! Color handling for schema node types
//!
//! This module provides the [`Color`] type which wraps the `DynamicColor` type
//! from the color crate. Node types store their color as a CSS color string;
//! [`Color`] is the parsed, validated form used by the canvas and the exporter.

use std::{
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use color::DynamicColor;

/// Color given to node types that do not specify one.
pub const DEFAULT_NODE_COLOR: &str = "#2563EB";

/// Color used to highlight a node type hovered in connect mode.
pub const HIGHLIGHT_COLOR: &str = "red";

/// Wrapper around the `DynamicColor` type from the color crate
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Color {
    color: DynamicColor,
}

impl Eq for Color {}

impl Hash for Color {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl Color {
    /// Create a new `Color` from a string
    /// This will parse CSS color strings such as "#ff0000", "rgb(255, 0, 0)", "red", etc.
    ///
    /// # Examples
    ///
    /// ```
    /// use schemata_core::color::Color;
    ///
    /// let red = Color::new("#ff0000").unwrap();
    /// let blue = Color::new("blue").unwrap();
    /// assert!(Color::new("not-a-color").is_err());
    /// ```
    pub fn new(color_str: &str) -> Result<Self, String> {
        match DynamicColor::from_str(color_str) {
            Ok(color) => Ok(Self { color }),
            Err(err) => Err(format!("invalid color `{color_str}`: {err}")),
        }
    }

    /// Returns `true` if `color_str` parses as a CSS color.
    pub fn is_valid(color_str: &str) -> bool {
        DynamicColor::from_str(color_str).is_ok()
    }

    /// The color used to highlight connect-mode hover targets.
    pub fn highlight() -> Self {
        Self::new(HIGHLIGHT_COLOR).expect("'red' is a valid CSS color")
    }

    /// Creates a new color with the specified alpha (transparency) value.
    pub fn with_alpha(self, alpha: f32) -> Self {
        Color {
            color: self.color.with_alpha(alpha),
        }
    }

    /// Returns the alpha (transparency) component of this color.
    pub fn alpha(&self) -> f32 {
        self.color.components[3]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::new(DEFAULT_NODE_COLOR).expect("default node color is a valid CSS color")
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.color)
    }
}
