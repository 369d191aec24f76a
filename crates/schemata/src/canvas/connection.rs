//! Drawing new edge types on the canvas.
//!
//! In connect mode, a click on a node type starts a connection: a floating
//! anchor node appears under the pointer, tied to the clicked node by a
//! provisional stub edge, and follows the pointer from then on. A second
//! click on a node type finishes it, replacing anchor and stub by a real edge
//! type under a fresh name. At most one connection is drawn at a time.

use log::debug;
use thiserror::Error;

use schemata_core::{
    geometry::Point,
    identifier::{Id, IdGenerator},
    schema::TypeEdge,
};

use super::{
    handles::{HandleKind, handle_id},
    state::{CanvasEdge, CanvasNode, CanvasState, StoreCommand},
};

/// Attempts at drawing a connection name that is not used yet.
const MAX_NAME_ATTEMPTS: usize = 16;

/// Prefix of the floating anchor node's name.
const ANCHOR_PREFIX: &str = "connector";

/// Transitions of the connection state machine that were rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("connect mode is off")]
    NotInConnectMode,

    #[error("unknown node `{0}`")]
    UnknownNode(Id),

    #[error("`{0}` is not a node type")]
    NotATypeNode(Id),

    #[error("connection `{name}` is already being drawn")]
    DraftInProgress { name: Id },

    #[error("no connection is being drawn")]
    NoDraft,

    #[error("could not find an unused connection name")]
    NamesExhausted,
}

/// The connection currently being drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorDraft {
    source_node_id: Id,
    source_handle_id: Id,
    connection_name: Id,
    target_node_id: Option<Id>,
    target_handle_id: Option<Id>,
}

impl ConnectorDraft {
    fn new(source: Id, connection_name: Id) -> Self {
        Self {
            source_node_id: source,
            source_handle_id: handle_id(source, HandleKind::Source, connection_name),
            connection_name,
            target_node_id: None,
            target_handle_id: None,
        }
    }

    pub fn source_node_id(&self) -> Id {
        self.source_node_id
    }

    pub fn source_handle_id(&self) -> Id {
        self.source_handle_id
    }

    /// Provisional name, also the name of the stub edge.
    pub fn connection_name(&self) -> Id {
        self.connection_name
    }

    /// The node type under the pointer, if any.
    pub fn target_node_id(&self) -> Option<Id> {
        self.target_node_id
    }

    pub fn target_handle_id(&self) -> Option<Id> {
        self.target_handle_id
    }

    /// Name of the floating anchor node.
    pub fn anchor_id(&self) -> Id {
        self.connection_name.prefixed(ANCHOR_PREFIX)
    }

    pub(super) fn set_target(&mut self, node: Id) {
        self.target_node_id = Some(node);
        self.target_handle_id = Some(handle_id(node, HandleKind::Target, self.connection_name));
    }

    pub(super) fn clear_target(&mut self) {
        self.target_node_id = None;
        self.target_handle_id = None;
    }

    pub(super) fn rename_node(&mut self, old: Id, new: Id) {
        if self.source_node_id == old {
            self.source_node_id = new;
            self.source_handle_id = handle_id(new, HandleKind::Source, self.connection_name);
        }
        if self.target_node_id == Some(old) {
            self.set_target(new);
        }
    }
}

impl CanvasState {
    fn require_type_node(&self, id: Id) -> Result<(), ConnectError> {
        match self.nodes.get(&id) {
            None => Err(ConnectError::UnknownNode(id)),
            Some(node) if !node.is_type() => Err(ConnectError::NotATypeNode(id)),
            Some(_) => Ok(()),
        }
    }

    /// Draw a connection name that clashes with no edge or node, nor with
    /// the anchor it would create.
    fn fresh_name<G: IdGenerator + ?Sized>(
        &self,
        ids: &mut G,
        avoid: Option<Id>,
    ) -> Result<Id, ConnectError> {
        for _ in 0..MAX_NAME_ATTEMPTS {
            let name = Id::new(&ids.next_id());
            let taken = Some(name) == avoid
                || self.edges.contains_key(&name)
                || self.nodes.contains_key(&name)
                || self.nodes.contains_key(&name.prefixed(ANCHOR_PREFIX));
            if !taken {
                return Ok(name);
            }
            debug!(name:% = name; "Generated connection name already in use");
        }
        Err(ConnectError::NamesExhausted)
    }

    /// Start drawing a connection from node type `source`, with the anchor
    /// placed at `position` in canvas coordinates.
    ///
    /// The source gains an outgoing handle for the provisional stub right away.
    pub fn start_connection<G: IdGenerator + ?Sized>(
        &mut self,
        source: Id,
        position: Point,
        ids: &mut G,
    ) -> Result<&ConnectorDraft, ConnectError> {
        if !self.connect_mode {
            return Err(ConnectError::NotInConnectMode);
        }
        if let Some(draft) = &self.draft {
            return Err(ConnectError::DraftInProgress {
                name: draft.connection_name,
            });
        }
        self.require_type_node(source)?;

        let name = self.fresh_name(ids, None)?;
        let draft = ConnectorDraft::new(source, name);
        let anchor = draft.anchor_id();

        self.nodes
            .insert(anchor, CanvasNode::connector(anchor, position));
        self.edges
            .insert(name, CanvasEdge::provisional(name, source, anchor));

        debug!(
            source:% = source,
            connection:% = name,
            position:? = position;
            "Connection started"
        );
        Ok(self.draft.insert(draft))
    }

    /// Move the anchor of the connection being drawn to `position`.
    ///
    /// Returns `false` if no connection is being drawn.
    pub fn track_pointer(&mut self, position: Point) -> bool {
        let Some(draft) = &self.draft else {
            return false;
        };
        match self.nodes.get_mut(&draft.anchor_id()) {
            Some(anchor) => {
                anchor.set_position(position);
                true
            }
            None => false,
        }
    }

    /// Finish the connection being drawn at node type `target`.
    ///
    /// Anchor and stub are removed and a permanent edge type, named afresh,
    /// connects the source to `target`; finishing at the source itself makes
    /// a self-loop. Returns the command persisting the new edge type.
    pub fn finish_connection<G: IdGenerator + ?Sized>(
        &mut self,
        target: Id,
        ids: &mut G,
    ) -> Result<StoreCommand, ConnectError> {
        let Some(draft) = &self.draft else {
            return Err(ConnectError::NoDraft);
        };
        let provisional = draft.connection_name;
        let source = draft.source_node_id;
        self.require_type_node(target)?;

        let name = self.fresh_name(ids, Some(provisional))?;
        self.remove_draft_elements();
        self.draft = None;

        self.edges
            .insert(name, CanvasEdge::relationship(name, source, target));

        debug!(
            source:% = source,
            target:% = target,
            provisional:% = provisional,
            connection:% = name;
            "Connection finished"
        );
        Ok(StoreCommand::CreateEdgeType(TypeEdge::new(name, source, target)))
    }

    /// Abandon the connection being drawn.
    pub fn cancel_connection(&mut self) -> Result<(), ConnectError> {
        if self.cancel_draft() {
            Ok(())
        } else {
            Err(ConnectError::NoDraft)
        }
    }

    /// Drop the draft with its anchor and stub; returns `false` if there was
    /// none.
    pub(super) fn cancel_draft(&mut self) -> bool {
        if self.draft.is_none() {
            return false;
        }
        self.remove_draft_elements();
        if let Some(draft) = self.draft.take() {
            debug!(connection:% = draft.connection_name; "Connection cancelled");
        }
        true
    }

    fn remove_draft_elements(&mut self) {
        let Some(draft) = &self.draft else {
            return;
        };
        let anchor = draft.anchor_id();
        let stub = draft.connection_name;
        self.nodes.shift_remove(&anchor);
        self.edges.shift_remove(&stub);
    }

    /// A click on node `id` at canvas `position`.
    ///
    /// Outside connect mode and on connector anchors the click does nothing.
    /// Otherwise it starts a connection, or finishes the one being drawn and
    /// returns the command persisting it.
    pub fn click_node<G: IdGenerator + ?Sized>(
        &mut self,
        id: Id,
        position: Point,
        ids: &mut G,
    ) -> Result<Option<StoreCommand>, ConnectError> {
        let Some(node) = self.nodes.get(&id) else {
            return Err(ConnectError::UnknownNode(id));
        };
        if !self.connect_mode || !node.is_type() {
            return Ok(None);
        }

        if self.draft.is_some() {
            self.finish_connection(id, ids).map(Some)
        } else {
            self.start_connection(id, position, ids).map(|_| None)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use rand::{SeedableRng, rngs::StdRng};

    use schemata_core::{identifier::ShortUid, schema::TypeNode};

    use super::*;
    use crate::{canvas::state::EdgeKind, layout::Engine};

    /// Hands out a fixed sequence of names.
    struct Scripted(VecDeque<&'static str>);

    impl Scripted {
        fn new(names: &[&'static str]) -> Self {
            Self(names.iter().copied().collect())
        }
    }

    impl IdGenerator for Scripted {
        fn next_id(&mut self) -> String {
            self.0.pop_front().unwrap_or("EXHAUSTED").to_string()
        }
    }

    fn connect_state() -> CanvasState {
        let mut state = CanvasState::new();
        state.load(
            &[
                TypeNode::new("PERSON").with_position(Point::new(0.0, 0.0)),
                TypeNode::new("COMPANY").with_position(Point::new(400.0, 0.0)),
            ],
            &[],
            &Engine::new(),
            &mut StdRng::seed_from_u64(0),
        );
        state.set_connect_mode(true);
        state
    }

    fn person() -> Id {
        Id::new("PERSON")
    }

    fn company() -> Id {
        Id::new("COMPANY")
    }

    #[test]
    fn test_start_creates_anchor_and_stub() {
        let mut state = connect_state();
        let mut ids = Scripted::new(&["prov0001"]);

        let draft = state
            .start_connection(person(), Point::new(10.0, 10.0), &mut ids)
            .unwrap()
            .clone();

        assert_eq!(draft.connection_name(), "prov0001");
        assert_eq!(draft.source_handle_id(), "PERSON-source-prov0001");
        assert_eq!(draft.anchor_id(), "connector-prov0001");
        assert_eq!(draft.target_node_id(), None);

        let anchor = state.node(draft.anchor_id()).unwrap();
        assert!(anchor.is_connector());
        assert_eq!(anchor.position(), Point::new(10.0, 10.0));

        let stub = state.edge(Id::new("prov0001")).unwrap();
        assert_eq!(stub.kind(), EdgeKind::Provisional);
        assert_eq!(stub.target_handle(), None);
        assert_eq!(state.handles(person()).sources, [Id::new("prov0001")]);
        assert!(state.is_consistent());
    }

    #[test]
    fn test_track_moves_anchor() {
        let mut state = connect_state();
        assert!(!state.track_pointer(Point::new(1.0, 1.0)));

        let mut ids = ShortUid::seeded(3);
        state
            .start_connection(person(), Point::new(0.0, 0.0), &mut ids)
            .unwrap();
        for step in 1..=3 {
            assert!(state.track_pointer(Point::new(step as f32 * 10.0, 5.0)));
        }

        let anchor = state.draft().unwrap().anchor_id();
        assert_eq!(state.node(anchor).unwrap().position(), Point::new(30.0, 5.0));
    }

    #[test]
    fn test_connect_two_nodes() {
        let mut state = connect_state();
        let mut ids = ShortUid::seeded(5);
        let sources_before = state.handles(person()).sources.len();
        let targets_before = state.handles(company()).targets.len();

        state
            .start_connection(person(), Point::new(0.0, 0.0), &mut ids)
            .unwrap();
        let provisional = state.draft().unwrap().connection_name();
        for step in 0..3 {
            state.track_pointer(Point::new(100.0 + step as f32, 20.0));
        }
        let command = state.finish_connection(company(), &mut ids).unwrap();

        let StoreCommand::CreateEdgeType(edge) = command else {
            panic!("expected an edge type to create");
        };
        assert_ne!(edge.name, provisional);
        assert_eq!(edge.from, person());
        assert_eq!(edge.to, company());
        assert!(edge.schema.is_empty());

        assert!(state.draft().is_none());
        assert!(state.nodes().all(CanvasNode::is_type));
        assert_eq!(state.edges().count(), 1);
        assert_eq!(state.edge(edge.name).unwrap().kind(), EdgeKind::Relationship);
        assert!(state.edge(provisional).is_none());

        let sources = state.handles(person()).sources;
        assert_eq!(sources.len(), sources_before + 1);
        assert_eq!(sources.last(), Some(&edge.name));
        assert_eq!(state.handles(company()).targets.len(), targets_before + 1);
        assert!(state.is_consistent());
    }

    #[test]
    fn test_connect_node_to_itself() {
        let mut state = connect_state();
        let mut ids = ShortUid::seeded(9);

        state
            .start_connection(person(), Point::new(0.0, 0.0), &mut ids)
            .unwrap();
        let command = state.finish_connection(person(), &mut ids).unwrap();

        let StoreCommand::CreateEdgeType(edge) = command else {
            panic!("expected an edge type to create");
        };
        assert!(edge.is_self_loop());

        let handles = state.handles(person());
        assert_eq!(handles.loops, [edge.name]);
        assert!(handles.sources.is_empty());
        assert!(handles.targets.is_empty());
        assert_eq!(state.edge(edge.name).unwrap().kind(), EdgeKind::SelfConnecting);
        assert!(state.nodes().all(CanvasNode::is_type));
        assert!(state.is_consistent());
    }

    #[test]
    fn test_start_while_drawing_is_rejected() {
        let mut state = connect_state();
        let mut ids = Scripted::new(&["first001", "second02"]);

        state
            .start_connection(person(), Point::new(0.0, 0.0), &mut ids)
            .unwrap();
        let err = state
            .start_connection(company(), Point::new(0.0, 0.0), &mut ids)
            .unwrap_err();

        assert_eq!(
            err,
            ConnectError::DraftInProgress {
                name: Id::new("first001")
            }
        );
        assert_eq!(state.draft().unwrap().source_node_id(), person());
        assert!(state.is_consistent());
    }

    #[test]
    fn test_start_requires_connect_mode_and_type_node() {
        let mut state = connect_state();
        let mut ids = ShortUid::seeded(1);
        state.set_connect_mode(false);
        assert_eq!(
            state.start_connection(person(), Point::default(), &mut ids),
            Err(ConnectError::NotInConnectMode)
        );

        state.set_connect_mode(true);
        assert_eq!(
            state.start_connection(Id::new("GHOST"), Point::default(), &mut ids),
            Err(ConnectError::UnknownNode(Id::new("GHOST")))
        );

        state
            .start_connection(person(), Point::default(), &mut ids)
            .unwrap();
        let anchor = state.draft().unwrap().anchor_id();
        assert_eq!(
            state.finish_connection(anchor, &mut ids),
            Err(ConnectError::NotATypeNode(anchor))
        );
        // The rejected finish leaves the draft in place.
        assert!(state.draft().is_some());
    }

    #[test]
    fn test_finish_without_draft() {
        let mut state = connect_state();
        let mut ids = ShortUid::seeded(1);
        assert_eq!(
            state.finish_connection(company(), &mut ids),
            Err(ConnectError::NoDraft)
        );
    }

    #[test]
    fn test_permanent_name_differs_from_provisional() {
        let mut state = connect_state();
        // The generator repeats the provisional name once.
        let mut ids = Scripted::new(&["same0001", "same0001", "other001"]);

        state
            .start_connection(person(), Point::default(), &mut ids)
            .unwrap();
        let command = state.finish_connection(company(), &mut ids).unwrap();
        assert_eq!(
            command,
            StoreCommand::CreateEdgeType(TypeEdge::new("other001", "PERSON", "COMPANY"))
        );
    }

    #[test]
    fn test_names_exhausted() {
        let mut state = connect_state();
        let mut ids = Scripted::new(&["PERSON"; MAX_NAME_ATTEMPTS]);
        assert_eq!(
            state.start_connection(company(), Point::default(), &mut ids),
            Err(ConnectError::NamesExhausted)
        );
        assert!(state.draft().is_none());
    }

    #[test]
    fn test_cancel_and_leaving_connect_mode() {
        let mut state = connect_state();
        let mut ids = ShortUid::seeded(2);

        assert_eq!(state.cancel_connection(), Err(ConnectError::NoDraft));

        state
            .start_connection(person(), Point::default(), &mut ids)
            .unwrap();
        state.cancel_connection().unwrap();
        assert!(state.draft().is_none());
        assert!(state.handles(person()).is_empty());
        assert!(state.is_consistent());

        state
            .start_connection(person(), Point::default(), &mut ids)
            .unwrap();
        state.set_connect_mode(false);
        assert!(state.draft().is_none());
        assert_eq!(state.nodes().count(), 2);
        assert_eq!(state.edges().count(), 0);
    }

    #[test]
    fn test_click_dispatch() {
        let mut state = connect_state();
        let mut ids = ShortUid::seeded(4);

        assert_eq!(
            state.click_node(person(), Point::new(5.0, 5.0), &mut ids),
            Ok(None)
        );
        assert!(state.draft().is_some());

        // Clicking the anchor itself is ignored.
        let anchor = state.draft().unwrap().anchor_id();
        assert_eq!(state.click_node(anchor, Point::default(), &mut ids), Ok(None));
        assert!(state.draft().is_some());

        let command = state
            .click_node(company(), Point::new(400.0, 0.0), &mut ids)
            .unwrap();
        assert!(matches!(command, Some(StoreCommand::CreateEdgeType(_))));
        assert!(state.draft().is_none());
    }

    #[test]
    fn test_click_outside_connect_mode_does_nothing() {
        let mut state = connect_state();
        state.set_connect_mode(false);
        let mut ids = ShortUid::seeded(4);

        assert_eq!(state.click_node(person(), Point::default(), &mut ids), Ok(None));
        assert!(state.draft().is_none());
        assert_eq!(
            state.click_node(Id::new("GHOST"), Point::default(), &mut ids),
            Err(ConnectError::UnknownNode(Id::new("GHOST")))
        );
    }

    #[test]
    fn test_hover_sets_draft_target() {
        let mut state = connect_state();
        let mut ids = Scripted::new(&["hover001"]);
        state
            .start_connection(person(), Point::default(), &mut ids)
            .unwrap();

        state.hover_enter(company());
        let draft = state.draft().unwrap();
        assert_eq!(draft.target_node_id(), Some(company()));
        assert_eq!(
            draft.target_handle_id(),
            Some(Id::new("COMPANY-target-hover001"))
        );

        state.hover_leave(company());
        assert_eq!(state.draft().unwrap().target_node_id(), None);
        assert_eq!(state.draft().unwrap().target_handle_id(), None);
    }

    #[test]
    fn test_removing_source_cancels_draft() {
        let mut state = connect_state();
        let mut ids = ShortUid::seeded(8);
        state
            .start_connection(person(), Point::default(), &mut ids)
            .unwrap();

        state.remove_node(person());
        assert!(state.draft().is_none());
        assert!(state.nodes().all(CanvasNode::is_type));
        assert!(state.is_consistent());
    }
}
