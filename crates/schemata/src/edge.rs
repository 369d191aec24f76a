//! Edge path geometry.
//!
//! Edges between two different node types are straight lines labelled at their
//! midpoint. Self-loops leave and re-enter the same node; they are drawn as the
//! large arc of a circle through both handles, labelled at the arc's visual
//! midpoint. Both render to SVG path data.

use std::f32::consts::{PI, TAU};

use log::warn;

use schemata_core::geometry::Point;

/// Tolerance used when deciding the sweep direction, so that exactly opposite
/// handles always sweep positively.
const SWEEP_EPSILON: f32 = 1e-4;

/// Minimum handle spread, in units of `f32` spacing at the handles' magnitude.
const SEPARATION_ULPS: f32 = 8.0;

/// Direction in which an arc is traversed from source to target.
///
/// Positive follows increasing screen angles, which is clockwise on screen and
/// the SVG sweep flag `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sweep {
    Negative,
    Positive,
}

impl Sweep {
    /// The SVG `sweep-flag` for this direction.
    pub fn flag(self) -> u8 {
        match self {
            Sweep::Negative => 0,
            Sweep::Positive => 1,
        }
    }
}

/// A circular arc from `source` to `target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcPath {
    source: Point,
    target: Point,
    center: Point,
    radius: f32,
    sweep: Sweep,
    span: f32,
}

impl ArcPath {
    pub fn source(&self) -> Point {
        self.source
    }

    pub fn target(&self) -> Point {
        self.target
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn sweep(&self) -> Sweep {
        self.sweep
    }

    /// Angle covered by the arc in its sweep direction, in radians.
    pub fn span(&self) -> f32 {
        self.span
    }

    /// SVG path data; the large-arc flag is always set.
    pub fn to_svg_path(&self) -> String {
        format!(
            "M {} {} A {} {} 0 1 {} {} {}",
            self.source.x(),
            self.source.y(),
            self.radius,
            self.radius,
            self.sweep.flag(),
            self.target.x(),
            self.target.y()
        )
    }
}

/// A self-loop: its arc and where to put its label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelfLoop {
    arc: ArcPath,
    label: Point,
}

impl SelfLoop {
    pub fn arc(&self) -> &ArcPath {
        &self.arc
    }

    /// The point halfway along the arc.
    pub fn label(&self) -> Point {
        self.label
    }
}

/// Calculator for self-loop arcs.
#[derive(Debug, Clone, Copy)]
pub struct SelfLoopGeometry {
    radius_factor: f32,
    min_separation: f32,
}

impl Default for SelfLoopGeometry {
    fn default() -> Self {
        Self {
            radius_factor: 1.5,
            min_separation: 2.0,
        }
    }
}

impl SelfLoopGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ratio between the arc radius and the furthest handle distance.
    pub fn set_radius_factor(&mut self, factor: f32) -> &mut Self {
        self.radius_factor = factor;
        self
    }

    /// Set the handle separation substituted for coincident handles.
    pub fn set_min_separation(&mut self, separation: f32) -> &mut Self {
        self.min_separation = separation;
        self
    }

    /// Arc between two handles of the same node, centred on their midpoint.
    pub fn calculate(&self, source: Point, target: Point) -> SelfLoop {
        let (source, target) = self.separate(source, target);
        self.arc_around(source, target, source.midpoint(target))
    }

    /// Arc between two handles whose radius is measured from `center`,
    /// typically the center of the node the handles sit on.
    pub fn calculate_around(&self, source: Point, target: Point, center: Point) -> SelfLoop {
        let (source, target) = self.separate(source, target);
        self.arc_around(source, target, center)
    }

    /// Push coincident handles apart symmetrically around their midpoint.
    ///
    /// The spread grows with the magnitude of the coordinates so that it
    /// survives `f32` rounding far from the origin.
    fn separate(&self, source: Point, target: Point) -> (Point, Point) {
        let magnitude = [source.x(), source.y(), target.x(), target.y()]
            .into_iter()
            .map(f32::abs)
            .fold(0.0, f32::max);
        let min_separation = self
            .min_separation
            .max(1e-3)
            .max(magnitude * f32::EPSILON * SEPARATION_ULPS);
        let chord = target.sub_point(source);
        let length = chord.hypot();
        if length >= min_separation {
            return (source, target);
        }

        warn!(
            source:? = source,
            target:? = target,
            separation = length;
            "Self-loop handles nearly coincide, spreading them apart"
        );
        let direction = if length > f32::EPSILON {
            chord.scale(1.0 / length)
        } else {
            Point::new(1.0, 0.0)
        };
        let mid = source.midpoint(target);
        let half = direction.scale(min_separation / 2.0);
        (mid.sub_point(half), mid.add_point(half))
    }

    fn arc_around(&self, source: Point, target: Point, center: Point) -> SelfLoop {
        let source_angle = source.angle_from(center);
        let target_angle = target.angle_from(center);
        let sweep = if (target_angle - source_angle).rem_euclid(TAU) > PI + SWEEP_EPSILON {
            Sweep::Negative
        } else {
            Sweep::Positive
        };

        let chord = target.sub_point(source);
        let distance = chord.hypot();
        let half_chord = distance / 2.0;
        let radius = (source.distance(center).max(target.distance(center)) * self.radius_factor)
            .max(half_chord + 1e-3);

        // Offset of both candidate centers from the chord midpoint, along the
        // chord normal.
        let offset = (radius * radius - half_chord * half_chord).max(0.0).sqrt();
        let normal = if distance > f32::EPSILON && distance.is_finite() {
            Point::new(-chord.y() / distance, chord.x() / distance)
        } else {
            Point::new(0.0, -1.0)
        };
        let mid = source.midpoint(target);
        let candidates = [
            mid.add_point(normal.scale(offset)),
            mid.sub_point(normal.scale(offset)),
        ];

        let span_on = |circle: Point| {
            let alpha = source.angle_from(circle);
            let beta = target.angle_from(circle);
            match sweep {
                Sweep::Positive => (beta - alpha).rem_euclid(TAU),
                Sweep::Negative => (alpha - beta).rem_euclid(TAU),
            }
        };

        let first_span = span_on(candidates[0]);
        let (arc_center, span) = if first_span > PI {
            (candidates[0], first_span)
        } else {
            (candidates[1], span_on(candidates[1]))
        };

        let start = source.angle_from(arc_center);
        let mid_angle = match sweep {
            Sweep::Positive => start + span / 2.0,
            Sweep::Negative => start - span / 2.0,
        };

        SelfLoop {
            arc: ArcPath {
                source,
                target,
                center: arc_center,
                radius,
                sweep,
                span,
            },
            label: Point::from_polar(arc_center, radius, mid_angle),
        }
    }
}

/// A straight edge between two different node types.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StraightEdge {
    source: Point,
    target: Point,
}

impl StraightEdge {
    pub fn new(source: Point, target: Point) -> Self {
        Self { source, target }
    }

    pub fn source(&self) -> Point {
        self.source
    }

    pub fn target(&self) -> Point {
        self.target
    }

    pub fn label(&self) -> Point {
        self.source.midpoint(self.target)
    }

    pub fn to_svg_path(&self) -> String {
        format!(
            "M {} {} L {} {}",
            self.source.x(),
            self.source.y(),
            self.target.x(),
            self.target.y()
        )
    }
}

/// Geometry of any edge on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgePath {
    Straight(StraightEdge),
    SelfLoop(SelfLoop),
}

impl EdgePath {
    /// Where the edge label goes.
    pub fn label(&self) -> Point {
        match self {
            EdgePath::Straight(edge) => edge.label(),
            EdgePath::SelfLoop(self_loop) => self_loop.label(),
        }
    }

    pub fn to_svg_path(&self) -> String {
        match self {
            EdgePath::Straight(edge) => edge.to_svg_path(),
            EdgePath::SelfLoop(self_loop) => self_loop.arc().to_svg_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_sweep_flag() {
        assert_eq!(Sweep::Negative.flag(), 0);
        assert_eq!(Sweep::Positive.flag(), 1);
    }

    #[test]
    fn test_horizontal_loop() {
        let self_loop =
            SelfLoopGeometry::new().calculate(Point::new(-10.0, 0.0), Point::new(10.0, 0.0));
        let arc = self_loop.arc();

        assert_eq!(arc.sweep(), Sweep::Positive);
        assert_approx_eq!(f32, arc.radius(), 15.0, epsilon = 1e-4);
        // Large arc over the top of the chord (negative y on screen).
        assert_approx_eq!(f32, arc.center().x(), 0.0, epsilon = 1e-4);
        assert_approx_eq!(f32, arc.center().y(), -(125.0f32).sqrt(), epsilon = 1e-3);
        assert!(arc.span() > PI);

        let label = self_loop.label();
        assert_approx_eq!(f32, label.x(), 0.0, epsilon = 1e-3);
        assert_approx_eq!(f32, label.y(), -(125.0f32).sqrt() - 15.0, epsilon = 1e-3);
    }

    #[test]
    fn test_coincident_handles_far_from_origin() {
        let point = Point::new(3e7, -3e7);
        let self_loop = SelfLoopGeometry::new().calculate(point, point);

        assert!(self_loop.arc().center().is_finite());
        assert!(self_loop.arc().radius() > 1.0);
        assert!(self_loop.label().is_finite());
        assert!(self_loop.arc().source().distance(self_loop.arc().target()) > 0.0);
    }

    #[test]
    fn test_symmetric_handles_put_label_on_axis() {
        let geometry = SelfLoopGeometry::new();
        let cases = [(0.0, 5.0, 0.0), (120.0, 40.0, -30.0), (-75.5, 55.0, 200.0)];
        for (axis, half_width, y) in cases {
            let source = Point::new(axis - half_width, y);
            let target = Point::new(axis + half_width, y);
            let self_loop = geometry.calculate(source, target);
            assert_approx_eq!(f32, self_loop.label().x(), axis, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_identical_handles_stay_finite() {
        let point = Point::new(42.0, -7.0);
        let self_loop = SelfLoopGeometry::new().calculate(point, point);
        let arc = self_loop.arc();

        assert!(arc.center().is_finite());
        assert!(arc.radius().is_finite() && arc.radius() > 0.0);
        assert!(self_loop.label().is_finite());
        assert_approx_eq!(f32, arc.source().distance(arc.target()), 2.0, epsilon = 1e-4);
        assert_eq!(arc.source().midpoint(arc.target()), point);
    }

    #[test]
    fn test_negative_sweep_around_node_center() {
        // Source above the center, target to its left: going from the source
        // to the target with increasing angles would take three quarter turns.
        let self_loop = SelfLoopGeometry::new().calculate_around(
            Point::new(0.0, -10.0),
            Point::new(-10.0, 0.0),
            Point::new(0.0, 0.0),
        );
        let arc = self_loop.arc();

        assert_eq!(arc.sweep(), Sweep::Negative);
        assert_approx_eq!(f32, arc.radius(), 15.0, epsilon = 1e-4);
        assert!(arc.span() > PI);
        assert_approx_eq!(
            f32,
            self_loop.label().distance(arc.source()),
            self_loop.label().distance(arc.target()),
            epsilon = 1e-3
        );
    }

    #[test]
    fn test_arc_svg_path() {
        let self_loop =
            SelfLoopGeometry::new().calculate(Point::new(-10.0, 0.0), Point::new(10.0, 0.0));
        assert_eq!(self_loop.arc().to_svg_path(), "M -10 0 A 15 15 0 1 1 10 0");
    }

    #[test]
    fn test_straight_edge() {
        let edge = StraightEdge::new(Point::new(0.0, 0.0), Point::new(100.0, 50.0));
        assert_eq!(edge.label(), Point::new(50.0, 25.0));
        assert_eq!(edge.to_svg_path(), "M 0 0 L 100 50");

        let path = EdgePath::Straight(edge);
        assert_eq!(path.label(), Point::new(50.0, 25.0));
        assert_eq!(path.to_svg_path(), "M 0 0 L 100 50");
    }

    #[test]
    fn test_radius_factor_setter() {
        let mut geometry = SelfLoopGeometry::new();
        geometry.set_radius_factor(2.0);
        let self_loop = geometry.calculate(Point::new(0.0, 0.0), Point::new(0.0, 20.0));
        assert_approx_eq!(f32, self_loop.arc().radius(), 20.0, epsilon = 1e-4);
    }

    #[test]
    fn test_radius_is_clamped_to_half_chord() {
        let mut geometry = SelfLoopGeometry::new();
        geometry.set_radius_factor(0.1);
        let self_loop = geometry.calculate(Point::new(0.0, 0.0), Point::new(30.0, 0.0));
        let arc = self_loop.arc();

        assert!(arc.radius() > 15.0);
        assert!(arc.center().is_finite());
        assert!(self_loop.label().is_finite());
    }
}
