use super::mask::POINT_TOLERANCE;
use super::PostProcessor;
use crate::problem::geometry::Geometry;

use num_complex::Complex64;
use std::f64::consts::PI;

/// An open polyline drawn over the problem, used as a path for line integrals and field plots
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Contour {
    points: Vec<Complex64>,
}

/// How the last contour point connects to a newly snapped drawing node
enum Connection {
    Free,
    Line,
    Arc { arc_id: usize, reverse: bool },
}

impl Contour {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[Complex64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Append a point, unless it is equal to the current last point
    pub fn add_point(&mut self, p: Complex64) {
        if self.points.last() != Some(&p) {
            self.points.push(p);
        }
    }

    /// Append the drawing node closest to `(x, y)`
    ///
    /// If the previous point is also a drawing node, and the two are joined by a segment or an arc of the drawing,
    /// the contour follows it. Arcs are traced with one point per discretization step.
    pub fn add_point_from_node(&mut self, geometry: &Geometry, x: f64, y: f64) {
        let n0 = match geometry.closest_node(x, y) {
            Some(n0) => n0,
            None => return,
        };
        let z = geometry.nodes[n0].cc();

        let last = match self.points.last() {
            Some(&last) => last,
            None => {
                self.points.push(z);
                return;
            }
        };
        if (last - z).norm() < POINT_TOLERANCE {
            return;
        }

        match self.connection(geometry, n0, last, x, y) {
            Connection::Free => self.points.push(z),
            Connection::Line => {
                if !self.doubles_back(z) {
                    self.points.push(z);
                }
            }
            Connection::Arc { arc_id, reverse } => {
                let arc = &geometry.arcs[arc_id];
                let (center, _) = geometry.circle(arc);
                let num_segments = arc.num_segments();

                let step = arc.arc_length * PI / (180.0 * num_segments as f64);
                let rotation = if reverse {
                    Complex64::new(0.0, step).exp()
                } else {
                    Complex64::new(0.0, -step).exp()
                };

                let mut p = last;
                for _ in 0..num_segments {
                    p = (p - center) * rotation + center;
                    if self.doubles_back(p) {
                        return;
                    }
                    self.points.push(p);
                }
            }
        }
    }

    // find the drawing entity joining the node under the last point to node `n0`; the closest one to the click wins
    fn connection(&self, geometry: &Geometry, n0: usize, last: Complex64, x: f64, y: f64) -> Connection {
        let n1 = match geometry.closest_node(last.re, last.im) {
            Some(n1) => n1,
            None => return Connection::Free,
        };
        if (geometry.nodes[n1].cc() - last).norm() >= POINT_TOLERANCE {
            return Connection::Free;
        }

        let mut best = Connection::Free;
        let mut d_min = 1.0e8;

        for (seg_id, seg) in geometry.segments.iter().enumerate() {
            if (seg.n0 == n1 && seg.n1 == n0) || (seg.n0 == n0 && seg.n1 == n1) {
                let d = geometry.shortest_distance_from_segment(x, y, seg_id).abs();
                if d < d_min {
                    best = Connection::Line;
                    d_min = d;
                }
            }
        }

        let click = Complex64::new(x, y);
        for (arc_id, arc) in geometry.arcs.iter().enumerate() {
            let reverse = if arc.n0 == n1 && arc.n1 == n0 {
                true
            } else if arc.n0 == n0 && arc.n1 == n1 {
                false
            } else {
                continue;
            };

            let d = geometry.shortest_distance_from_arc(click, arc);
            if d < d_min {
                best = Connection::Arc { arc_id, reverse };
                d_min = d;
            }
        }

        best
    }

    // whether `p` would retrace the previous segment
    fn doubles_back(&self, p: Complex64) -> bool {
        let size = self.points.len();
        size > 1 && (self.points[size - 2] - p).norm() < POINT_TOLERANCE
    }

    /// Replace the last segment with a circular arc subtending `angle` degrees
    ///
    /// The arc is sampled every `angle_step` degrees (1 if `angle_step` is 0). Angles outside of `[-180, 180]`,
    /// a zero angle, and contours with fewer than two points are left unchanged.
    pub fn bend(&mut self, angle: f64, angle_step: f64) {
        if angle == 0.0 || !(-180.0..=180.0).contains(&angle) || self.points.len() < 2 {
            return;
        }
        let angle_step = if angle_step == 0.0 { 1.0 } else { angle_step };

        let n = (angle / angle_step).abs().ceil() as usize;
        let tta = angle.to_radians();
        let dtta = tta / n as f64;

        let a1 = match self.points.pop() {
            Some(a1) => a1,
            None => return,
        };
        let a0 = self.points[self.points.len() - 1];

        let d = (a1 - a0).norm();
        let r = d / (2.0 * (tta / 2.0).abs().sin());

        let c = if tta > 0.0 {
            a0 + (r / d) * (a1 - a0) * Complex64::new(0.0, (PI - tta) / 2.0).exp()
        } else {
            a0 + (r / d) * (a1 - a0) * Complex64::new(0.0, -(PI + tta) / 2.0).exp()
        };

        self.points.extend(
            (1..=n).map(|k| c + (a0 - c) * Complex64::new(0.0, k as f64 * dtta).exp()),
        );
    }
}

impl PostProcessor {
    /// Append a point to the contour, unless it repeats the last point
    pub fn add_contour_point(&mut self, p: Complex64) {
        self.contour.add_point(p);
    }

    /// Append the drawing node closest to `(x, y)`, following drawing segments and arcs
    pub fn add_contour_point_from_node(&mut self, x: f64, y: f64) {
        self.contour
            .add_point_from_node(&self.problem.geometry, x, y);
    }

    /// Bend the last segment of the contour into an arc of `angle` degrees
    pub fn bend_contour(&mut self, angle: f64, angle_step: f64) {
        self.contour.bend(angle, angle_step);
    }

    pub fn clear_contour(&mut self) {
        self.contour.clear();
    }

    pub fn contour(&self) -> &[Complex64] {
        self.contour.points()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::geometry::{ArcSegment, GeomNode, Segment};

    /// Nodes at (0, 0), (1, 0) and (0, 1), a segment from the first to the second and a quarter circle arc from
    /// the second to the third
    fn drawing() -> Geometry {
        let mut geometry = Geometry::default();
        geometry.add_node(GeomNode::new(0.0, 0.0));
        geometry.add_node(GeomNode::new(1.0, 0.0));
        geometry.add_node(GeomNode::new(0.0, 1.0));
        geometry.add_segment(Segment::new(0, 1));
        geometry.add_arc(ArcSegment::new(1, 2, 90.0, 10.0));
        geometry
    }

    #[test]
    fn repeated_points() {
        let mut contour = Contour::new();
        contour.add_point(Complex64::new(1.0, 2.0));
        contour.add_point(Complex64::new(1.0, 2.0));
        assert_eq!(contour.len(), 1);

        contour.add_point(Complex64::new(3.0, 2.0));
        assert_eq!(contour.len(), 2);

        contour.clear();
        assert!(contour.is_empty());
    }

    #[test]
    fn bend_no_ops() {
        let mut contour = Contour::new();
        contour.add_point(Complex64::new(0.0, 0.0));
        contour.bend(90.0, 1.0);
        assert_eq!(contour.len(), 1);

        contour.add_point(Complex64::new(1.0, 0.0));
        let before = contour.clone();

        contour.bend(0.0, 5.0);
        assert_eq!(contour, before);
        contour.bend(180.5, 5.0);
        assert_eq!(contour, before);
        contour.bend(-270.0, 5.0);
        assert_eq!(contour, before);
    }

    #[test]
    fn bend_half_circle() {
        let mut contour = Contour::new();
        contour.add_point(Complex64::new(0.0, 0.0));
        contour.add_point(Complex64::new(2.0, 0.0));

        contour.bend(180.0, 180.0);
        assert_eq!(contour.len(), 2);

        // R = d / (2 sin(|angle| / 2)) with the center halfway along the chord
        let r = 2.0 / (2.0 * (PI / 2.0).sin());
        let c = Complex64::new(1.0, 0.0);
        let end = contour.points()[1];
        assert!(((end - c).norm() - r).abs() < 1e-12);
        assert!((end - Complex64::new(2.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn bend_quarter_circle() {
        for angle in [90.0, -90.0] {
            let mut contour = Contour::new();
            contour.add_point(Complex64::new(0.0, 0.0));
            contour.add_point(Complex64::new(1.0, 0.0));
            contour.bend(angle, 10.0);

            assert_eq!(contour.len(), 10);
            let end = contour.points()[9];
            assert!((end - Complex64::new(1.0, 0.0)).norm() < 1e-12);

            let r = 1.0 / (2.0 * (PI / 4.0).sin());
            let c = Complex64::new(0.5, 0.5 * angle.signum());
            for p in contour.points() {
                assert!(((p - c).norm() - r).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn snap_along_segment() {
        let geometry = drawing();
        let mut contour = Contour::new();

        contour.add_point_from_node(&geometry, 0.02, -0.01);
        assert_eq!(contour.points(), &[Complex64::new(0.0, 0.0)]);

        // same node again
        contour.add_point_from_node(&geometry, 0.01, 0.01);
        assert_eq!(contour.len(), 1);

        contour.add_point_from_node(&geometry, 0.9, 0.05);
        assert_eq!(
            contour.points(),
            &[Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)]
        );

        // going back along the same segment is ignored
        contour.add_point_from_node(&geometry, 0.1, 0.0);
        assert_eq!(contour.len(), 2);
    }

    #[test]
    fn snap_along_arc() {
        let geometry = drawing();

        // counter-clockwise, in the direction of the arc
        let mut contour = Contour::new();
        contour.add_point_from_node(&geometry, 1.0, 0.1);
        contour.add_point_from_node(&geometry, 0.05, 0.95);
        assert_eq!(contour.len(), 10);
        for p in contour.points() {
            assert!((p.norm() - 1.0).abs() < 1e-12);
        }
        assert!((contour.points()[9] - Complex64::new(0.0, 1.0)).norm() < 1e-12);
        assert!(contour.points()[1].im > 0.0);

        // clockwise, against the arc
        let mut contour = Contour::new();
        contour.add_point_from_node(&geometry, 0.05, 0.95);
        contour.add_point_from_node(&geometry, 1.0, 0.1);
        assert_eq!(contour.len(), 10);
        assert!((contour.points()[9] - Complex64::new(1.0, 0.0)).norm() < 1e-12);
        assert!(contour.points()[1].re > 0.0);
    }

    #[test]
    fn snap_free_points() {
        let geometry = drawing();
        let mut contour = Contour::new();

        // the last point is not a drawing node
        contour.add_point(Complex64::new(0.5, 0.5));
        contour.add_point_from_node(&geometry, 0.1, 0.9);
        assert_eq!(
            contour.points(),
            &[Complex64::new(0.5, 0.5), Complex64::new(0.0, 1.0)]
        );

        // nodes with no segment between them
        contour.add_point_from_node(&geometry, 0.0, 0.1);
        assert_eq!(contour.points()[2], Complex64::new(0.0, 0.0));

        assert!(Contour::new().points().is_empty());
        let mut empty = Contour::new();
        empty.add_point_from_node(&Geometry::default(), 0.0, 0.0);
        assert!(empty.is_empty());
    }
}
