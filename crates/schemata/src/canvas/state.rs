//! Canvas state: the node and edge collections shown in the diagram.
//!
//! [`CanvasState`] is mutated only through its transition methods. Transitions
//! that need to reach the schema store return [`StoreCommand`]s instead of
//! calling the store, so the state can be driven and tested on its own.

use indexmap::IndexMap;
use log::{debug, warn};
use rand::Rng;

use schemata_core::{
    color::Color,
    geometry::{Bounds, Point},
    identifier::Id,
    schema::{PropertyDef, TypeEdge, TypeNode},
};

use super::{
    connection::ConnectorDraft,
    handles::{Handle, HandleKind, NodeHandles, handle_id},
};
use crate::{
    edge::{EdgePath, SelfLoopGeometry, StraightEdge},
    layout::{Engine, LayoutNode},
};

/// Data carried by a node type on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeNodeData {
    color: Color,
    declared_color: Option<String>,
    properties: Vec<PropertyDef>,
    pinned: bool,
    highlighted: bool,
}

/// What a canvas node represents.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A schema node type.
    Type(TypeNodeData),
    /// The floating anchor following the pointer while a connection is drawn.
    Connector,
}

/// A node on the canvas, positioned by its center.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasNode {
    id: Id,
    position: Point,
    kind: NodeKind,
}

impl CanvasNode {
    fn from_type_node(record: &TypeNode, position: Point, pinned: bool) -> Self {
        Self {
            id: record.name,
            position,
            kind: NodeKind::Type(TypeNodeData {
                color: record.display_color(),
                declared_color: record.color.clone(),
                properties: record.schema.clone(),
                pinned,
                highlighted: false,
            }),
        }
    }

    pub(super) fn connector(id: Id, position: Point) -> Self {
        Self {
            id,
            position,
            kind: NodeKind::Connector,
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub(super) fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_type(&self) -> bool {
        matches!(self.kind, NodeKind::Type(_))
    }

    pub fn is_connector(&self) -> bool {
        matches!(self.kind, NodeKind::Connector)
    }

    /// Color to draw the node with; `None` for connector anchors.
    pub fn color(&self) -> Option<Color> {
        match &self.kind {
            NodeKind::Type(data) if data.highlighted => Some(Color::highlight()),
            NodeKind::Type(data) => Some(data.color),
            NodeKind::Connector => None,
        }
    }

    /// The color string declared by the schema record, if any.
    pub fn declared_color(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Type(data) => data.declared_color.as_deref(),
            NodeKind::Connector => None,
        }
    }

    /// Returns `true` if the position is stored in the schema store rather
    /// than computed by the layout engine.
    pub fn is_pinned(&self) -> bool {
        matches!(&self.kind, NodeKind::Type(data) if data.pinned)
    }

    pub fn is_highlighted(&self) -> bool {
        matches!(&self.kind, NodeKind::Type(data) if data.highlighted)
    }

    /// Highlighted nodes are connection targets and cannot be dragged.
    pub fn is_draggable(&self) -> bool {
        matches!(&self.kind, NodeKind::Type(data) if !data.highlighted)
    }

    pub fn properties(&self) -> &[PropertyDef] {
        match &self.kind {
            NodeKind::Type(data) => &data.properties,
            NodeKind::Connector => &[],
        }
    }

    /// The schema record for a node type, with its position when pinned.
    pub fn to_type_node(&self) -> Option<TypeNode> {
        let NodeKind::Type(data) = &self.kind else {
            return None;
        };
        let mut record = TypeNode::new(self.id);
        record.color = data.declared_color.clone();
        record.schema = data.properties.clone();
        if data.pinned {
            record = record.with_position(self.position);
        }
        Some(record)
    }

    fn type_data_mut(&mut self) -> Option<&mut TypeNodeData> {
        match &mut self.kind {
            NodeKind::Type(data) => Some(data),
            NodeKind::Connector => None,
        }
    }
}

/// What a canvas edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// An edge type between two different node types.
    Relationship,
    /// An edge type starting and ending on the same node type.
    SelfConnecting,
    /// The stub from the source node to the connector anchor of a draft.
    Provisional,
}

/// An edge on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasEdge {
    id: Id,
    source: Id,
    target: Id,
    kind: EdgeKind,
    properties: Vec<PropertyDef>,
}

impl CanvasEdge {
    pub(super) fn relationship(id: Id, source: Id, target: Id) -> Self {
        let kind = if source == target {
            EdgeKind::SelfConnecting
        } else {
            EdgeKind::Relationship
        };
        Self {
            id,
            source,
            target,
            kind,
            properties: Vec::new(),
        }
    }

    pub(super) fn provisional(id: Id, source: Id, anchor: Id) -> Self {
        Self {
            id,
            source,
            target: anchor,
            kind: EdgeKind::Provisional,
            properties: Vec::new(),
        }
    }

    fn from_type_edge(record: &TypeEdge) -> Self {
        let mut edge = Self::relationship(record.name, record.from, record.to);
        edge.properties = record.schema.clone();
        edge
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn source(&self) -> Id {
        self.source
    }

    pub fn target(&self) -> Id {
        self.target
    }

    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    pub fn properties(&self) -> &[PropertyDef] {
        &self.properties
    }

    pub fn is_self_loop(&self) -> bool {
        self.kind == EdgeKind::SelfConnecting
    }

    pub fn source_handle(&self) -> Id {
        handle_id(self.source, HandleKind::Source, self.id)
    }

    /// The incoming handle; provisional stubs end on an anchor without one.
    pub fn target_handle(&self) -> Option<Id> {
        match self.kind {
            EdgeKind::Provisional => None,
            EdgeKind::Relationship | EdgeKind::SelfConnecting => {
                Some(handle_id(self.target, HandleKind::Target, self.id))
            }
        }
    }
}

/// A persistence request produced by a canvas transition.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCommand {
    CreateNodeType(TypeNode),
    CreateEdgeType(TypeEdge),
    UpdatePosition { name: Id, position: Point },
    DeleteNodeType(Id),
    DeleteEdgeType(Id),
}

/// Nodes, edges and the connection being drawn, if any.
#[derive(Debug, Clone, Default)]
pub struct CanvasState {
    pub(super) nodes: IndexMap<Id, CanvasNode>,
    pub(super) edges: IndexMap<Id, CanvasEdge>,
    pub(super) draft: Option<ConnectorDraft>,
    pub(super) connect_mode: bool,
}

impl CanvasState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the canvas content with the given schema and lay it out.
    ///
    /// Duplicate node types and edge types with an unknown endpoint are
    /// skipped. Any connection being drawn is dropped.
    pub fn load<R: Rng + ?Sized>(
        &mut self,
        node_types: &[TypeNode],
        edge_types: &[TypeEdge],
        engine: &Engine,
        rng: &mut R,
    ) {
        let mut records: IndexMap<Id, &TypeNode> = IndexMap::new();
        for record in node_types {
            if records.insert(record.name, record).is_some() {
                warn!(node:% = record.name; "Duplicate node type, keeping the last one");
            }
        }

        let layout_nodes: Vec<LayoutNode> = records
            .values()
            .map(|record| LayoutNode::new(record.name, record.pinned_position()))
            .collect();
        let placed = engine.calculate(&layout_nodes, rng);

        self.nodes = records
            .values()
            .zip(placed)
            .map(|(record, placed)| {
                let node = CanvasNode::from_type_node(record, placed.position(), placed.is_pinned());
                (node.id, node)
            })
            .collect();

        self.edges = IndexMap::new();
        for record in edge_types {
            if !self.is_type_node(record.from) || !self.is_type_node(record.to) {
                warn!(
                    edge:% = record.name,
                    from:% = record.from,
                    to:% = record.to;
                    "Skipping edge type with an unknown endpoint"
                );
                continue;
            }
            self.edges
                .insert(record.name, CanvasEdge::from_type_edge(record));
        }

        if let Some(draft) = self.draft.take() {
            debug!(connection:% = draft.connection_name(); "Dropping connection draft on reload");
        }

        debug!(
            node_count = self.nodes.len(),
            edge_count = self.edges.len();
            "Canvas loaded"
        );
    }

    pub fn nodes(&self) -> impl Iterator<Item = &CanvasNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &CanvasEdge> {
        self.edges.values()
    }

    pub fn type_nodes(&self) -> impl Iterator<Item = &CanvasNode> {
        self.nodes.values().filter(|node| node.is_type())
    }

    pub fn node(&self, id: Id) -> Option<&CanvasNode> {
        self.nodes.get(&id)
    }

    pub fn edge(&self, id: Id) -> Option<&CanvasEdge> {
        self.edges.get(&id)
    }

    /// The connection currently being drawn.
    pub fn draft(&self) -> Option<&ConnectorDraft> {
        self.draft.as_ref()
    }

    pub fn is_connect_mode(&self) -> bool {
        self.connect_mode
    }

    pub(super) fn is_type_node(&self, id: Id) -> bool {
        self.nodes.get(&id).is_some_and(CanvasNode::is_type)
    }

    /// Edge names touching `node`, derived from the current edge set.
    ///
    /// A provisional stub counts as an outgoing edge of its source.
    pub fn handles(&self, node: Id) -> NodeHandles {
        let mut handles = NodeHandles::default();
        for edge in self.edges.values() {
            if edge.source == node && edge.target == node {
                handles.loops.push(edge.id);
            } else if edge.source == node {
                handles.sources.push(edge.id);
            } else if edge.target == node {
                handles.targets.push(edge.id);
            }
        }
        handles
    }

    /// Handles of `node` placed around it.
    pub fn placed_handles(&self, node: Id) -> Vec<Handle> {
        if !self.is_type_node(node) {
            return Vec::new();
        }
        self.handles(node).place(node)
    }

    /// Canvas position of a handle of `node`.
    fn handle_position(&self, node: &CanvasNode, kind: HandleKind, edge: Id) -> Point {
        self.placed_handles(node.id)
            .iter()
            .find(|handle| handle.kind() == kind && handle.edge() == edge)
            .map(|handle| node.position.add_point(handle.offset()))
            .unwrap_or(node.position)
    }

    /// Geometry of an edge between its handles.
    pub fn edge_path(&self, id: Id, self_loops: &SelfLoopGeometry) -> Option<EdgePath> {
        let edge = self.edges.get(&id)?;
        let source = self.nodes.get(&edge.source)?;
        let target = self.nodes.get(&edge.target)?;

        let start = self.handle_position(source, HandleKind::Source, edge.id);
        let end = match edge.kind {
            EdgeKind::Provisional => target.position,
            EdgeKind::Relationship | EdgeKind::SelfConnecting => {
                self.handle_position(target, HandleKind::Target, edge.id)
            }
        };

        Some(match edge.kind {
            EdgeKind::SelfConnecting => EdgePath::SelfLoop(self_loops.calculate(start, end)),
            EdgeKind::Relationship | EdgeKind::Provisional => {
                EdgePath::Straight(StraightEdge::new(start, end))
            }
        })
    }

    /// Bounds of every node, each drawn with `node_radius`.
    pub fn bounds(&self, node_radius: f32) -> Option<Bounds> {
        self.nodes
            .values()
            .map(|node| Bounds::around(node.position, node_radius))
            .reduce(|acc, bounds| acc.merge(&bounds))
    }

    /// Switch connect mode. Leaving it cancels the connection being drawn and
    /// clears hover highlights.
    pub fn set_connect_mode(&mut self, enabled: bool) {
        if self.connect_mode == enabled {
            return;
        }
        self.connect_mode = enabled;
        if !enabled {
            self.cancel_draft();
            for node in self.nodes.values_mut() {
                if let Some(data) = node.type_data_mut() {
                    data.highlighted = false;
                }
            }
        }
        debug!(enabled; "Connect mode changed");
    }

    /// The pointer entered a node. In connect mode, node types are highlighted
    /// and become the provisional target of the connection being drawn.
    pub fn hover_enter(&mut self, id: Id) {
        if !self.connect_mode {
            return;
        }
        let Some(data) = self.nodes.get_mut(&id).and_then(CanvasNode::type_data_mut) else {
            return;
        };
        data.highlighted = true;
        if let Some(draft) = &mut self.draft {
            draft.set_target(id);
        }
    }

    /// The pointer left a node.
    pub fn hover_leave(&mut self, id: Id) {
        if !self.connect_mode {
            return;
        }
        if let Some(data) = self.nodes.get_mut(&id).and_then(CanvasNode::type_data_mut) {
            data.highlighted = false;
        }
        if let Some(draft) = &mut self.draft {
            if draft.target_node_id() == Some(id) {
                draft.clear_target();
            }
        }
    }

    /// Move a node while it is dragged. Returns `false` if the node cannot be
    /// dragged.
    pub fn drag_node(&mut self, id: Id, position: Point) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) if node.is_draggable() => {
                node.position = position;
                true
            }
            _ => false,
        }
    }

    /// Drop a dragged node at `position`.
    ///
    /// The dropped node and every node type placed only by the layout engine
    /// are pinned at their current positions, and a position update is
    /// returned for each of them, the dropped node first.
    pub fn end_drag(&mut self, id: Id, position: Point) -> Vec<StoreCommand> {
        if !self.drag_node(id, position) {
            return Vec::new();
        }

        let mut commands = Vec::new();
        if let Some(data) = self.nodes.get_mut(&id).and_then(CanvasNode::type_data_mut) {
            data.pinned = true;
            commands.push(StoreCommand::UpdatePosition { name: id, position });
        }
        commands.extend(self.pin_layout_positions());
        commands
    }

    /// Pin every node type placed only by the layout engine, returning the
    /// position updates that persist them.
    pub fn pin_layout_positions(&mut self) -> Vec<StoreCommand> {
        self.nodes
            .values_mut()
            .filter_map(|node| {
                let position = node.position;
                let id = node.id;
                let data = node.type_data_mut()?;
                if data.pinned {
                    return None;
                }
                data.pinned = true;
                Some(StoreCommand::UpdatePosition { name: id, position })
            })
            .collect()
    }

    /// Add a new node type, placed by the layout engine around the existing
    /// nodes, which stay where they are.
    pub fn add_node_type<R: Rng + ?Sized>(
        &mut self,
        record: TypeNode,
        engine: &Engine,
        rng: &mut R,
    ) -> Option<StoreCommand> {
        if self.nodes.contains_key(&record.name) {
            warn!(node:% = record.name; "Node type already on the canvas");
            return None;
        }

        let mut layout_nodes: Vec<LayoutNode> = self
            .type_nodes()
            .map(|node| LayoutNode::pinned(node.id, node.position))
            .collect();
        layout_nodes.push(LayoutNode::new(record.name, record.pinned_position()));

        let placed = engine.calculate(&layout_nodes, rng);
        let new = placed.last()?;
        let node = CanvasNode::from_type_node(&record, new.position(), new.is_pinned());
        debug!(node:% = node.id, position:? = node.position; "Node type added");
        self.nodes.insert(node.id, node);

        Some(StoreCommand::CreateNodeType(record))
    }

    /// Remove a node type and every edge touching it.
    ///
    /// A connection being drawn from the node is cancelled. Returns `None` if
    /// `id` is not a node type on the canvas.
    pub fn remove_node(&mut self, id: Id) -> Option<StoreCommand> {
        if !self.is_type_node(id) {
            return None;
        }

        if self
            .draft
            .as_ref()
            .is_some_and(|draft| draft.source_node_id() == id)
        {
            self.cancel_draft();
        }
        if let Some(draft) = &mut self.draft {
            if draft.target_node_id() == Some(id) {
                draft.clear_target();
            }
        }

        self.nodes.shift_remove(&id);
        let before = self.edges.len();
        self.edges
            .retain(|_, edge| edge.source != id && edge.target != id);
        debug!(node:% = id, removed_edges = before - self.edges.len(); "Node type removed");

        Some(StoreCommand::DeleteNodeType(id))
    }

    /// Remove an edge type. Provisional stubs are not edge types and are left
    /// alone.
    pub fn remove_edge(&mut self, id: Id) -> Option<StoreCommand> {
        match self.edges.get(&id) {
            Some(edge) if edge.kind != EdgeKind::Provisional => {
                self.edges.shift_remove(&id);
                debug!(edge:% = id; "Edge type removed");
                Some(StoreCommand::DeleteEdgeType(id))
            }
            _ => None,
        }
    }

    /// Rename an edge, keeping its place in the edge order.
    ///
    /// Used when the store normalizes the name of a created edge type.
    pub fn rename_edge(&mut self, old: Id, new: Id) -> bool {
        if old == new || self.edges.contains_key(&new) {
            return false;
        }
        let Some(index) = self.edges.get_index_of(&old) else {
            return false;
        };
        let Some(mut edge) = self.edges.shift_remove(&old) else {
            return false;
        };
        edge.id = new;
        self.edges.shift_insert(index, new, edge);
        true
    }

    /// Rename a node type, updating the edges that touch it.
    pub fn rename_node(&mut self, old: Id, new: Id) -> bool {
        if old == new || self.nodes.contains_key(&new) {
            return false;
        }
        let Some(index) = self.nodes.get_index_of(&old) else {
            return false;
        };
        let Some(mut node) = self.nodes.shift_remove(&old) else {
            return false;
        };
        node.id = new;
        self.nodes.shift_insert(index, new, node);

        for edge in self.edges.values_mut() {
            if edge.source == old {
                edge.source = new;
            }
            if edge.target == old {
                edge.target = new;
            }
        }
        if let Some(draft) = &mut self.draft {
            draft.rename_node(old, new);
        }
        true
    }

    /// Returns `true` if every edge ends on existing nodes, non-provisional
    /// edges connect node types, and connector anchors and provisional stubs
    /// exist only for the active draft.
    pub fn is_consistent(&self) -> bool {
        let edges_valid = self.edges.values().all(|edge| match edge.kind {
            EdgeKind::Provisional => {
                self.is_type_node(edge.source)
                    && self.nodes.get(&edge.target).is_some_and(CanvasNode::is_connector)
            }
            EdgeKind::Relationship | EdgeKind::SelfConnecting => {
                self.is_type_node(edge.source) && self.is_type_node(edge.target)
            }
        });

        let anchors = self.nodes.values().filter(|node| node.is_connector()).count();
        let stubs = self
            .edges
            .values()
            .filter(|edge| edge.kind == EdgeKind::Provisional)
            .count();
        let expected = usize::from(self.draft.is_some());

        edges_valid && anchors == expected && stubs == expected
    }
}
