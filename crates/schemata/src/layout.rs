//! Placement of node types on the canvas.
//!
//! Node types whose position is stored keep it. Every other node type is placed
//! by the force [`Engine`], which spreads them around the pinned ones so that
//! circles and edge labels do not overlap.

mod force;

pub use force::Engine;

use schemata_core::{geometry::Point, identifier::Id};

/// A node handed to the layout engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutNode {
    id: Id,
    pinned: Option<Point>,
}

impl LayoutNode {
    /// A node that keeps `position`.
    pub fn pinned(id: Id, position: Point) -> Self {
        Self {
            id,
            pinned: Some(position),
        }
    }

    /// A node the engine is free to place.
    pub fn free(id: Id) -> Self {
        Self { id, pinned: None }
    }

    /// A node pinned only when a position is known.
    pub fn new(id: Id, pinned: Option<Point>) -> Self {
        Self { id, pinned }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn pinned_position(&self) -> Option<Point> {
        self.pinned
    }
}

/// A node with its final position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedNode {
    id: Id,
    position: Point,
    pinned: bool,
}

impl PlacedNode {
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn position(&self) -> Point {
        self.position
    }

    /// Returns `true` if the position was given rather than computed.
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }
}
