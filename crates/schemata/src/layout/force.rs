//! Force-directed placement of unpinned node types
//!
//! Unpinned nodes start at random positions in a square window around the
//! center of the pinned nodes, then repel every node closer than the minimum
//! separation while a weak pull keeps them near the center. Pinned nodes take
//! part as fixed repulsors and never move.

use log::{debug, trace, warn};
use rand::Rng;

use schemata_core::geometry::{Bounds, Point};

use super::{LayoutNode, PlacedNode};
use crate::config::LayoutConfig;

/// Distance substituted for coincident particles.
const MIN_DISTANCE_FLOOR: f32 = 0.1;

/// A node taking part in the simulation.
#[derive(Debug, Clone, Copy)]
struct Particle {
    position: Point,
    velocity: Point,
    fixed: bool,
}

/// Force layout engine for schema canvases
pub struct Engine {
    iterations: usize,
    repulsion: f32,
    attraction: f32,
    friction: f32,
    spread: f32,
    node_radius: f32,
    label_space: f32,
}

impl Default for Engine {
    fn default() -> Self {
        Self::from_config(&LayoutConfig::default())
    }
}

impl Engine {
    /// Create a new force layout engine with the default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine from the layout section of the configuration
    pub fn from_config(config: &LayoutConfig) -> Self {
        Self {
            iterations: config.iterations(),
            repulsion: config.repulsion(),
            attraction: config.attraction(),
            friction: config.friction(),
            spread: config.spread(),
            node_radius: config.node_radius(),
            label_space: config.label_space(),
        }
    }

    /// Set the number of iterations for the force simulation
    pub fn set_iterations(&mut self, iterations: usize) -> &mut Self {
        self.iterations = iterations;
        self
    }

    /// Set the repulsion constant between close nodes
    pub fn set_repulsion(&mut self, repulsion: f32) -> &mut Self {
        self.repulsion = repulsion;
        self
    }

    /// Set the strength of the pull towards the center
    pub fn set_attraction(&mut self, attraction: f32) -> &mut Self {
        self.attraction = attraction;
        self
    }

    /// Set the velocity damping factor
    pub fn set_friction(&mut self, friction: f32) -> &mut Self {
        self.friction = friction;
        self
    }

    /// Set the side of the initial placement window
    pub fn set_spread(&mut self, spread: f32) -> &mut Self {
        self.spread = spread;
        self
    }

    /// Distance below which two nodes push each other apart.
    ///
    /// One node diameter plus the space reserved for an edge label.
    pub fn min_distance(&self) -> f32 {
        self.node_radius * 2.0 + self.label_space
    }

    /// Place every node.
    ///
    /// The result has one entry per input node, in input order. Pinned nodes
    /// keep their position exactly. Pinned positions that are not finite are
    /// treated as unpinned.
    pub fn calculate<R: Rng + ?Sized>(
        &self,
        nodes: &[LayoutNode],
        rng: &mut R,
    ) -> Vec<PlacedNode> {
        let pinned: Vec<Option<Point>> = nodes
            .iter()
            .map(|node| match node.pinned {
                Some(position) if position.is_finite() => Some(position),
                Some(position) => {
                    warn!(
                        node:% = node.id,
                        x = position.x(),
                        y = position.y();
                        "Ignoring non-finite pinned position"
                    );
                    None
                }
                None => None,
            })
            .collect();

        let free_count = pinned.iter().filter(|position| position.is_none()).count();
        if free_count == 0 {
            debug!(node_count = nodes.len(); "All nodes pinned, skipping force simulation");
            return nodes
                .iter()
                .zip(&pinned)
                .filter_map(|(node, position)| {
                    position.map(|position| PlacedNode {
                        id: node.id,
                        position,
                        pinned: true,
                    })
                })
                .collect();
        }

        let center = Bounds::enclosing(pinned.iter().flatten().copied())
            .map(Bounds::center)
            .unwrap_or_default();

        let mut particles = self.initialize_particles(&pinned, center, rng);
        self.run_simulation(&mut particles, center);

        debug!(
            node_count = nodes.len(),
            free_count,
            center_x = center.x(),
            center_y = center.y();
            "Force layout finished"
        );

        nodes
            .iter()
            .zip(particles)
            .map(|(node, particle)| PlacedNode {
                id: node.id,
                position: particle.position,
                pinned: particle.fixed,
            })
            .collect()
    }

    /// Pinned particles sit at their position, free ones uniformly in the
    /// spread window around `center`.
    fn initialize_particles<R: Rng + ?Sized>(
        &self,
        pinned: &[Option<Point>],
        center: Point,
        rng: &mut R,
    ) -> Vec<Particle> {
        pinned
            .iter()
            .map(|position| match position {
                Some(position) => Particle {
                    position: *position,
                    velocity: Point::default(),
                    fixed: true,
                },
                None => {
                    let jitter = Point::new(
                        (rng.random::<f32>() - 0.5) * self.spread,
                        (rng.random::<f32>() - 0.5) * self.spread,
                    );
                    Particle {
                        position: center.add_point(jitter),
                        velocity: Point::default(),
                        fixed: false,
                    }
                }
            })
            .collect()
    }

    /// Run the simulation in place.
    ///
    /// Particles are updated one after the other within a step, so later
    /// particles already see the moved positions of earlier ones.
    fn run_simulation(&self, particles: &mut [Particle], center: Point) {
        let min_distance = self.min_distance();

        for iteration in 0..self.iterations {
            for i in 0..particles.len() {
                let current = particles[i];
                if current.fixed {
                    continue;
                }
                let mut force = Point::default();

                for (j, other) in particles.iter().enumerate() {
                    if i == j {
                        continue;
                    }
                    let delta = current.position.sub_point(other.position);
                    let mut distance = delta.hypot();
                    if distance == 0.0 {
                        distance = MIN_DISTANCE_FLOOR;
                    }
                    if distance < min_distance {
                        let magnitude = self.repulsion / (distance * distance);
                        force = force.add_point(delta.scale(magnitude / distance));
                    }
                }

                let pull = center.sub_point(current.position).scale(self.attraction);
                force = force.add_point(pull);

                let particle = &mut particles[i];
                particle.velocity = particle.velocity.add_point(force).scale(self.friction);
                particle.position = particle.position.add_point(particle.velocity);
            }

            trace!(iteration; "Force simulation step");
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use schemata_core::identifier::Id;

    use super::*;

    fn free_nodes(names: &[&str]) -> Vec<LayoutNode> {
        names
            .iter()
            .map(|name| LayoutNode::free(Id::new(name)))
            .collect()
    }

    #[test]
    fn test_empty_input() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(Engine::new().calculate(&[], &mut rng).is_empty());
    }

    #[test]
    fn test_min_distance() {
        assert_eq!(Engine::new().min_distance(), 370.0);
    }

    #[test]
    fn test_all_pinned_is_identity() {
        let nodes = vec![
            LayoutNode::pinned(Id::new("PERSON"), Point::new(10.0, 20.0)),
            LayoutNode::pinned(Id::new("COMPANY"), Point::new(15.0, 20.0)),
        ];
        let mut rng = StdRng::seed_from_u64(3);
        let placed = Engine::new().calculate(&nodes, &mut rng);

        assert_eq!(placed.len(), 2);
        assert_eq!(placed[0].position(), Point::new(10.0, 20.0));
        assert_eq!(placed[1].position(), Point::new(15.0, 20.0));
        assert!(placed.iter().all(PlacedNode::is_pinned));
    }

    #[test]
    fn test_singleton_converges_near_origin() {
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let placed = Engine::new().calculate(&free_nodes(&["LONELY"]), &mut rng);

            assert_eq!(placed.len(), 1);
            assert!(!placed[0].is_pinned());
            assert!(
                placed[0].position().hypot() < 60.0,
                "seed {seed} ended at {:?}",
                placed[0].position()
            );
        }
    }

    #[test]
    fn test_five_free_nodes_do_not_overlap() {
        let engine = Engine::new();
        let threshold = engine.min_distance() * 0.5;

        for seed in [1, 7, 42] {
            let mut rng = StdRng::seed_from_u64(seed);
            let placed = engine.calculate(&free_nodes(&["A", "B", "C", "D", "E"]), &mut rng);

            for (i, a) in placed.iter().enumerate() {
                for b in &placed[i + 1..] {
                    let distance = a.position().distance(b.position());
                    assert!(
                        distance > threshold,
                        "seed {seed}: {} and {} are {distance} apart",
                        a.id(),
                        b.id()
                    );
                }
            }
        }
    }

    #[test]
    fn test_free_node_keeps_clear_of_pinned_nodes() {
        let nodes = vec![
            LayoutNode::pinned(Id::new("LEFT"), Point::new(0.0, 0.0)),
            LayoutNode::pinned(Id::new("RIGHT"), Point::new(400.0, 0.0)),
            LayoutNode::free(Id::new("NEW")),
        ];
        let engine = Engine::new();
        let mut rng = StdRng::seed_from_u64(11);
        let placed = engine.calculate(&nodes, &mut rng);

        assert_eq!(placed[0].position(), Point::new(0.0, 0.0));
        assert_eq!(placed[1].position(), Point::new(400.0, 0.0));
        let new = placed[2].position();
        assert!(new.distance(placed[0].position()) > 120.0);
        assert!(new.distance(placed[1].position()) > 120.0);
    }

    #[test]
    fn test_non_finite_pinned_position_is_placed() {
        let nodes = vec![
            LayoutNode::pinned(Id::new("BROKEN"), Point::new(f32::NAN, 5.0)),
            LayoutNode::pinned(Id::new("FINE"), Point::new(0.0, 0.0)),
        ];
        let mut rng = StdRng::seed_from_u64(5);
        let placed = Engine::new().calculate(&nodes, &mut rng);

        assert!(!placed[0].is_pinned());
        assert!(placed[0].position().is_finite());
        assert!(placed[1].is_pinned());
        assert_eq!(placed[1].position(), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_same_seed_same_layout() {
        let nodes = free_nodes(&["A", "B", "C"]);
        let engine = Engine::new();
        let first = engine.calculate(&nodes, &mut StdRng::seed_from_u64(99));
        let second = engine.calculate(&nodes, &mut StdRng::seed_from_u64(99));
        assert_eq!(first, second);
    }

    #[test]
    fn test_setters() {
        let mut engine = Engine::new();
        engine.set_iterations(0).set_spread(0.0);

        let mut rng = StdRng::seed_from_u64(0);
        let placed = engine.calculate(&free_nodes(&["A"]), &mut rng);
        // No spread and no steps leaves the node exactly at the center.
        assert_eq!(placed[0].position(), Point::new(0.0, 0.0));
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;
    use rand::{SeedableRng, rngs::StdRng};

    use schemata_core::identifier::Id;

    use super::*;

    fn node_strategy() -> impl Strategy<Value = Option<Point>> {
        prop::option::of(
            (-2000.0f32..2000.0, -2000.0f32..2000.0).prop_map(|(x, y)| Point::new(x, y)),
        )
    }

    /// Pinned nodes come back untouched and every output position is finite.
    fn check_pinned_invariance(
        positions: Vec<Option<Point>>,
        seed: u64,
    ) -> Result<(), TestCaseError> {
        let nodes: Vec<LayoutNode> = positions
            .iter()
            .enumerate()
            .map(|(idx, position)| LayoutNode::new(Id::new(&format!("N{idx}")), *position))
            .collect();

        let mut engine = Engine::new();
        engine.set_iterations(30);
        let placed = engine.calculate(&nodes, &mut StdRng::seed_from_u64(seed));

        prop_assert_eq!(placed.len(), nodes.len());
        for (node, placed) in nodes.iter().zip(&placed) {
            prop_assert_eq!(node.id(), placed.id());
            prop_assert!(placed.position().is_finite());
            if let Some(position) = node.pinned_position() {
                prop_assert!(placed.is_pinned());
                prop_assert_eq!(placed.position(), position);
            }
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn pinned_invariance(
            positions in prop::collection::vec(node_strategy(), 0..12),
            seed in any::<u64>(),
        ) {
            check_pinned_invariance(positions, seed)?;
        }
    }
}
