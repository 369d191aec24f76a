//! Connection handles around a node type.
//!
//! Every edge touching a node needs a handle to attach to. Handles are never
//! stored: they are derived from the edge set each time they are needed, so
//! they cannot drift out of sync with the edges.

use std::f32::consts::TAU;

use schemata_core::{geometry::Point, identifier::Id};

/// Distance from the node center of handles used by edges to other nodes.
pub const CENTER_HANDLE_RADIUS: f32 = 2.0;

/// Distance from the node center of self-loop handles, just inside the rim.
pub const LOOP_HANDLE_RADIUS: f32 = 55.0;

/// Whether an edge leaves or enters the node through a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Source,
    Target,
}

impl HandleKind {
    fn infix(self) -> &'static str {
        match self {
            HandleKind::Source => "source",
            HandleKind::Target => "target",
        }
    }
}

/// Side of the node a handle is closest to, in screen orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Right,
    Bottom,
    Left,
    Top,
}

impl Side {
    /// Side for a handle at `turns` around the center.
    ///
    /// `turns` is a fraction of a full turn in `[0, 1)`, increasing clockwise
    /// on screen from the positive x axis.
    pub fn from_turns(turns: f32) -> Self {
        if turns <= 0.125 || turns > 0.875 {
            Side::Right
        } else if turns <= 0.375 {
            Side::Bottom
        } else if turns <= 0.625 {
            Side::Left
        } else {
            Side::Top
        }
    }
}

/// Returns the handle identifier `<node>-<source|target>-<edge>`.
pub fn handle_id(node: Id, kind: HandleKind, edge: Id) -> Id {
    node.join(kind.infix(), edge)
}

/// A handle placed on a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    id: Id,
    edge: Id,
    kind: HandleKind,
    turns: f32,
    side: Side,
    offset: Point,
}

impl Handle {
    pub fn id(&self) -> Id {
        self.id
    }

    /// Name of the edge using this handle.
    pub fn edge(&self) -> Id {
        self.edge
    }

    pub fn kind(&self) -> HandleKind {
        self.kind
    }

    /// Position around the node as a fraction of a full turn.
    pub fn turns(&self) -> f32 {
        self.turns
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Offset of the handle from the node center.
    pub fn offset(&self) -> Point {
        self.offset
    }
}

/// Edge names touching one node, partitioned by direction.
///
/// `sources` are edges leaving the node for another node, `targets` edges
/// arriving from another node and `loops` edges that start and end on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeHandles {
    pub sources: Vec<Id>,
    pub targets: Vec<Id>,
    pub loops: Vec<Id>,
}

impl NodeHandles {
    /// Number of handles; a loop needs two.
    pub fn count(&self) -> usize {
        self.sources.len() + self.targets.len() + self.loops.len() * 2
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Place the handles of `node` evenly around its center.
    ///
    /// Sources come first, then targets, then each loop's outgoing and
    /// incoming handle side by side.
    pub fn place(&self, node: Id) -> Vec<Handle> {
        let count = self.count();
        let gap = if count == 0 { 0.0 } else { 1.0 / count as f32 };

        let sources = self
            .sources
            .iter()
            .map(|edge| (*edge, HandleKind::Source, CENTER_HANDLE_RADIUS));
        let targets = self
            .targets
            .iter()
            .map(|edge| (*edge, HandleKind::Target, CENTER_HANDLE_RADIUS));
        let loops = self.loops.iter().flat_map(|edge| {
            [
                (*edge, HandleKind::Source, LOOP_HANDLE_RADIUS),
                (*edge, HandleKind::Target, LOOP_HANDLE_RADIUS),
            ]
        });

        sources
            .chain(targets)
            .chain(loops)
            .enumerate()
            .map(|(idx, (edge, kind, radius))| {
                let turns = gap * idx as f32;
                Handle {
                    id: handle_id(node, kind, edge),
                    edge,
                    kind,
                    turns,
                    side: Side::from_turns(turns),
                    offset: Point::from_polar(Point::default(), radius, turns * TAU),
                }
            })
            .collect()
    }
}
