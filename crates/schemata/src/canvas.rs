//! The interactive schema canvas.
//!
//! [`Canvas`] is the composition root: it owns the [`CanvasState`], runs the
//! layout engine when the schema is loaded, turns pointer gestures into state
//! transitions and forwards the resulting [`StoreCommand`]s to a
//! [`SchemaStore`]. Local state is updated first; a failing store call is
//! reported as a [`Notification`] and never rolled back.

mod connection;
mod handles;
mod state;
mod viewport;

pub use connection::{ConnectError, ConnectorDraft};
pub use handles::{
    CENTER_HANDLE_RADIUS, Handle, HandleKind, LOOP_HANDLE_RADIUS, NodeHandles, Side, handle_id,
};
pub use state::{
    CanvasEdge, CanvasNode, CanvasState, EdgeKind, NodeKind, StoreCommand, TypeNodeData,
};
pub use viewport::{CoordinateTransform, Viewport};

use log::{debug, info, warn};
use rand::{SeedableRng, rngs::StdRng};

use schemata_core::{
    color::DEFAULT_NODE_COLOR,
    geometry::Point,
    identifier::{Id, IdGenerator, ShortUid},
    schema::{TypeNode, to_screaming_snake_case},
};

use crate::{
    config::LayoutConfig,
    layout::Engine,
    store::{SchemaStore, StoreError},
};

/// Length of generated node type names.
const NODE_NAME_LENGTH: usize = 6;

/// Attempts at generating an unused node type name.
const MAX_NODE_NAME_ATTEMPTS: usize = 16;

/// A store request that failed after the canvas was already updated.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    command: StoreCommand,
    message: String,
}

impl Notification {
    pub fn command(&self) -> &StoreCommand {
        &self.command
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A schema canvas synchronized with a store.
pub struct Canvas<S, G = ShortUid<StdRng>> {
    state: CanvasState,
    store: S,
    ids: G,
    engine: Engine,
    rng: StdRng,
    notifications: Vec<Notification>,
}

impl<S: SchemaStore> Canvas<S> {
    /// Create an empty canvas on top of `store`.
    ///
    /// With a seed in `config`, layout and generated names are reproducible.
    pub fn new(store: S, config: &LayoutConfig) -> Self {
        let ids = match config.seed() {
            Some(seed) => ShortUid::seeded(seed.wrapping_add(1)),
            None => ShortUid::from_os_rng(),
        };
        Self::with_id_generator(store, ids, config)
    }
}

impl<S: SchemaStore, G: IdGenerator> Canvas<S, G> {
    /// Create an empty canvas drawing new names from `ids`.
    pub fn with_id_generator(store: S, ids: G, config: &LayoutConfig) -> Self {
        let rng = match config.seed() {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            state: CanvasState::new(),
            store,
            ids,
            engine: Engine::from_config(config),
            rng,
            notifications: Vec::new(),
        }
    }

    /// Load the schema from the store and lay it out.
    pub fn reload(&mut self) -> Result<(), StoreError> {
        let node_types = self.store.list_node_types()?;
        let edge_types = self.store.list_edge_types()?;
        self.state
            .load(&node_types, &edge_types, &self.engine, &mut self.rng);
        info!(
            node_types = node_types.len(),
            edge_types = edge_types.len();
            "Canvas reloaded from store"
        );
        Ok(())
    }

    pub fn state(&self) -> &CanvasState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Failed store requests, oldest first.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn set_connect_mode(&mut self, enabled: bool) {
        self.state.set_connect_mode(enabled);
    }

    /// A click on node `id` at `screen`.
    pub fn node_click<T: CoordinateTransform + ?Sized>(
        &mut self,
        id: Id,
        screen: Point,
        transform: &T,
    ) -> Result<(), ConnectError> {
        let position = transform.screen_to_canvas(screen);
        let command = self.state.click_node(id, position, &mut self.ids)?;
        self.apply(command);
        Ok(())
    }

    /// The pointer moved to `screen`; the anchor of a connection being drawn
    /// follows it.
    pub fn pointer_move<T: CoordinateTransform + ?Sized>(
        &mut self,
        screen: Point,
        transform: &T,
    ) -> bool {
        self.state
            .track_pointer(transform.screen_to_canvas(screen))
    }

    pub fn cancel_connection(&mut self) -> Result<(), ConnectError> {
        self.state.cancel_connection()
    }

    pub fn hover_enter(&mut self, id: Id) {
        self.state.hover_enter(id);
    }

    pub fn hover_leave(&mut self, id: Id) {
        self.state.hover_leave(id);
    }

    /// Move node `id` while it is dragged.
    pub fn drag(&mut self, id: Id, position: Point) -> bool {
        self.state.drag_node(id, position)
    }

    /// Drop node `id` at `position`, persisting its position and those of all
    /// nodes placed by the layout engine.
    pub fn end_drag(&mut self, id: Id, position: Point) {
        let commands = self.state.end_drag(id, position);
        self.apply(commands);
    }

    /// Persist the positions of all nodes placed by the layout engine.
    /// Returns how many positions were sent to the store.
    pub fn persist_layout_positions(&mut self) -> usize {
        let commands = self.state.pin_layout_positions();
        let count = commands.len();
        self.apply(commands);
        count
    }

    pub fn delete_node_type(&mut self, id: Id) -> bool {
        let command = self.state.remove_node(id);
        let removed = command.is_some();
        self.apply(command);
        removed
    }

    pub fn delete_edge_type(&mut self, id: Id) -> bool {
        let command = self.state.remove_edge(id);
        let removed = command.is_some();
        self.apply(command);
        removed
    }

    /// Create a node type with a generated name and the default color,
    /// placed next to the existing nodes.
    pub fn create_node_type(&mut self) -> Option<Id> {
        let name = (0..MAX_NODE_NAME_ATTEMPTS)
            .map(|_| {
                let generated: String = self.ids.next_id().chars().take(NODE_NAME_LENGTH).collect();
                Id::new(&to_screaming_snake_case(&generated))
            })
            .find(|name| self.state.node(*name).is_none() && *name != "");
        let Some(name) = name else {
            warn!("Could not generate an unused node type name");
            return None;
        };

        let record = TypeNode::new(name).with_color(DEFAULT_NODE_COLOR);
        let command = self
            .state
            .add_node_type(record, &self.engine, &mut self.rng);
        self.apply(command);
        Some(name)
    }

    /// Send commands to the store, recording failures as notifications.
    fn apply(&mut self, commands: impl IntoIterator<Item = StoreCommand>) {
        for command in commands {
            debug!(command:? = command; "Applying store command");
            let result = match &command {
                StoreCommand::CreateNodeType(node) => {
                    self.store.create_node_type(node.clone()).map(|stored| {
                        if stored.name != node.name {
                            self.state.rename_node(node.name, stored.name);
                        }
                    })
                }
                StoreCommand::CreateEdgeType(edge) => {
                    self.store.create_edge_type(edge.clone()).map(|stored| {
                        if stored.name != edge.name {
                            debug!(
                                requested:% = edge.name,
                                stored:% = stored.name;
                                "Store renamed edge type"
                            );
                            self.state.rename_edge(edge.name, stored.name);
                        }
                    })
                }
                StoreCommand::UpdatePosition { name, position } => {
                    self.store.update_position(*name, *position)
                }
                StoreCommand::DeleteNodeType(name) => self.store.delete_node_type(*name),
                StoreCommand::DeleteEdgeType(name) => self.store.delete_edge_type(*name),
            };

            if let Err(err) = result {
                warn!(command:? = command, error:% = err; "Schema store request failed");
                self.notifications.push(Notification {
                    message: err.to_string(),
                    command,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use schemata_core::schema::{TypeEdge, TypeNode};

    use super::*;
    use crate::store::MemoryStore;

    /// Lists a fixed schema and refuses every change.
    struct ReadOnlyStore(MemoryStore);

    impl SchemaStore for ReadOnlyStore {
        fn list_node_types(&self) -> Result<Vec<TypeNode>, StoreError> {
            self.0.list_node_types()
        }

        fn list_edge_types(&self) -> Result<Vec<TypeEdge>, StoreError> {
            self.0.list_edge_types()
        }

        fn create_node_type(&mut self, _node: TypeNode) -> Result<TypeNode, StoreError> {
            Err(StoreError::Unavailable("read-only".to_string()))
        }

        fn create_edge_type(&mut self, _edge: TypeEdge) -> Result<TypeEdge, StoreError> {
            Err(StoreError::Unavailable("read-only".to_string()))
        }

        fn update_position(&mut self, _name: Id, _position: Point) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("read-only".to_string()))
        }

        fn delete_node_type(&mut self, _name: Id) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("read-only".to_string()))
        }

        fn delete_edge_type(&mut self, _name: Id) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("read-only".to_string()))
        }
    }

    fn seeded_config() -> LayoutConfig {
        LayoutConfig::default().with_seed(17)
    }

    fn memory_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store
            .create_node_type(TypeNode::new("PERSON").with_position(Point::new(0.0, 0.0)))
            .unwrap();
        store.create_node_type(TypeNode::new("COMPANY")).unwrap();
        store
            .create_edge_type(TypeEdge::new("WORKS_AT", "PERSON", "COMPANY"))
            .unwrap();
        store
    }

    fn canvas<S: SchemaStore>(store: S) -> Canvas<S> {
        let mut canvas = Canvas::new(store, &seeded_config());
        canvas.reload().unwrap();
        canvas
    }

    #[test]
    fn test_reload_lays_out_store_content() {
        let canvas = canvas(memory_store());
        let state = canvas.state();

        assert_eq!(state.type_nodes().count(), 2);
        assert_eq!(
            state.node(Id::new("PERSON")).unwrap().position(),
            Point::new(0.0, 0.0)
        );
        assert!(!state.node(Id::new("COMPANY")).unwrap().is_pinned());
        assert_eq!(state.edges().count(), 1);
    }

    #[test]
    fn test_finished_connection_is_persisted_under_store_name() {
        let mut canvas = canvas(memory_store());
        let viewport = Viewport::default();
        canvas.set_connect_mode(true);

        canvas
            .node_click(Id::new("COMPANY"), Point::new(5.0, 5.0), &viewport)
            .unwrap();
        canvas.pointer_move(Point::new(10.0, 10.0), &viewport);
        canvas
            .node_click(Id::new("PERSON"), Point::new(0.0, 0.0), &viewport)
            .unwrap();

        let stored = canvas.store().list_edge_types().unwrap();
        assert_eq!(stored.len(), 2);
        let created = &stored[1];
        assert_eq!(created.from, Id::new("COMPANY"));
        assert_eq!(created.to, Id::new("PERSON"));

        // The store upper-cases names; the canvas follows.
        let local = canvas.state().edge(created.name).unwrap();
        assert_eq!(local.kind(), EdgeKind::Relationship);
        assert_eq!(canvas.state().edges().count(), 2);
        assert!(canvas.notifications().is_empty());
        assert!(canvas.state().is_consistent());
    }

    #[test]
    fn test_anchor_follows_pointer_through_viewport() {
        let mut canvas = canvas(memory_store());
        let viewport = Viewport::new(Point::new(100.0, 100.0), 2.0);
        canvas.set_connect_mode(true);

        canvas
            .node_click(Id::new("PERSON"), Point::new(100.0, 100.0), &viewport)
            .unwrap();
        let anchor = canvas.state().draft().unwrap().anchor_id();
        assert_eq!(
            canvas.state().node(anchor).unwrap().position(),
            Point::new(0.0, 0.0)
        );

        assert!(canvas.pointer_move(Point::new(300.0, 140.0), &viewport));
        assert_eq!(
            canvas.state().node(anchor).unwrap().position(),
            Point::new(100.0, 20.0)
        );
    }

    #[test]
    fn test_store_failure_keeps_local_state() {
        let mut canvas = canvas(ReadOnlyStore(memory_store()));
        let viewport = Viewport::default();
        canvas.set_connect_mode(true);

        canvas
            .node_click(Id::new("PERSON"), Point::default(), &viewport)
            .unwrap();
        canvas
            .node_click(Id::new("PERSON"), Point::default(), &viewport)
            .unwrap();

        let loops = canvas.state().handles(Id::new("PERSON")).loops;
        assert_eq!(loops.len(), 1);
        assert!(canvas.state().is_consistent());

        let notifications = canvas.take_notifications();
        assert_eq!(notifications.len(), 1);
        assert!(matches!(
            notifications[0].command(),
            StoreCommand::CreateEdgeType(edge) if edge.name == loops[0]
        ));
        assert!(notifications[0].message().contains("read-only"));
        assert!(canvas.notifications().is_empty());

        assert!(canvas.delete_node_type(Id::new("COMPANY")));
        assert!(canvas.state().node(Id::new("COMPANY")).is_none());
        assert_eq!(canvas.notifications().len(), 1);
    }

    #[test]
    fn test_end_drag_persists_positions() {
        let mut canvas = canvas(memory_store());
        canvas.end_drag(Id::new("PERSON"), Point::new(-50.0, 25.0));

        let stored = canvas.store().list_node_types().unwrap();
        assert_eq!(stored[0].pinned_position(), Some(Point::new(-50.0, 25.0)));
        let company = canvas.state().node(Id::new("COMPANY")).unwrap();
        assert_eq!(stored[1].pinned_position(), Some(company.position()));
        assert_eq!(canvas.persist_layout_positions(), 0);
    }

    #[test]
    fn test_delete_cascades_in_store() {
        let mut canvas = canvas(memory_store());
        assert!(canvas.delete_node_type(Id::new("COMPANY")));
        assert!(!canvas.delete_node_type(Id::new("COMPANY")));

        assert_eq!(canvas.store().list_node_types().unwrap().len(), 1);
        assert!(canvas.store().list_edge_types().unwrap().is_empty());
        assert_eq!(canvas.state().edges().count(), 0);
    }

    #[test]
    fn test_delete_edge_type() {
        let mut canvas = canvas(memory_store());
        assert!(canvas.delete_edge_type(Id::new("WORKS_AT")));
        assert!(canvas.store().list_edge_types().unwrap().is_empty());
        assert!(!canvas.delete_edge_type(Id::new("WORKS_AT")));
    }

    #[test]
    fn test_create_node_type() {
        let mut canvas = canvas(memory_store());
        let name = canvas.create_node_type().unwrap();

        assert_eq!(name.as_string().len(), NODE_NAME_LENGTH);
        let node = canvas.state().node(name).unwrap();
        assert!(!node.is_pinned());
        assert!(node.position().is_finite());

        let stored = canvas.store().list_node_types().unwrap();
        let record = stored.iter().find(|node| node.name == name).unwrap();
        assert_eq!(record.color.as_deref(), Some(DEFAULT_NODE_COLOR));
        assert_eq!(record.pinned_position(), None);
    }
}
