//! Screen to canvas coordinate conversion.

use schemata_core::geometry::Point;

/// Converts pointer positions reported by the host into canvas coordinates.
pub trait CoordinateTransform {
    fn screen_to_canvas(&self, screen: Point) -> Point;
}

/// A panned and zoomed view onto the canvas.
///
/// A canvas point `c` is shown on screen at `c * zoom + pan`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pan: Point,
    zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan: Point::default(),
            zoom: 1.0,
        }
    }
}

impl Viewport {
    /// Create a viewport. Non-positive or non-finite zoom levels fall back to 1.
    pub fn new(pan: Point, zoom: f32) -> Self {
        let zoom = if zoom.is_finite() && zoom > 0.0 {
            zoom
        } else {
            1.0
        };
        Self { pan, zoom }
    }

    pub fn pan(&self) -> Point {
        self.pan
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn canvas_to_screen(&self, canvas: Point) -> Point {
        canvas.scale(self.zoom).add_point(self.pan)
    }
}

impl CoordinateTransform for Viewport {
    fn screen_to_canvas(&self, screen: Point) -> Point {
        screen.sub_point(self.pan).scale(1.0 / self.zoom)
    }
}
