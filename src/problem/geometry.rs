use num_complex::Complex64;
use std::f64::consts::PI;

/// A point of the problem drawing
#[derive(Clone, Debug)]
pub struct GeomNode {
    pub x: f64,
    pub y: f64,
    /// Index of an applied point property (point charge, point current, ...)
    pub point_property: Option<usize>,
    pub in_conductor: Option<usize>,
    pub is_selected: bool,
}

impl GeomNode {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            point_property: None,
            in_conductor: None,
            is_selected: false,
        }
    }

    pub fn with_point_property(mut self, property: usize) -> Self {
        self.point_property = Some(property);
        self
    }

    pub fn with_conductor(mut self, conductor: usize) -> Self {
        self.in_conductor = Some(conductor);
        self
    }

    pub fn cc(&self) -> Complex64 {
        Complex64::new(self.x, self.y)
    }
}

/// A straight drawing segment between two nodes
#[derive(Clone, Debug)]
pub struct Segment {
    pub n0: usize,
    pub n1: usize,
    pub in_conductor: Option<usize>,
    pub is_selected: bool,
}

impl Segment {
    pub fn new(n0: usize, n1: usize) -> Self {
        Self {
            n0,
            n1,
            in_conductor: None,
            is_selected: false,
        }
    }
}

/// A circular drawing arc running counter-clockwise from `n0` to `n1`
#[derive(Clone, Debug)]
pub struct ArcSegment {
    pub n0: usize,
    pub n1: usize,
    /// Subtended angle in degrees
    pub arc_length: f64,
    /// Maximum angle (degrees) spanned by one discretization step
    pub max_side_length: f64,
    pub in_conductor: Option<usize>,
    pub is_selected: bool,
}

impl ArcSegment {
    pub fn new(n0: usize, n1: usize, arc_length: f64, max_side_length: f64) -> Self {
        Self {
            n0,
            n1,
            arc_length,
            max_side_length,
            in_conductor: None,
            is_selected: false,
        }
    }

    /// Number of straight pieces the arc is discretized into
    pub fn num_segments(&self) -> usize {
        if self.max_side_length <= 0.0 {
            1
        } else {
            ((self.arc_length / self.max_side_length).ceil() as usize).max(1)
        }
    }
}

/// The drawing that the Mesh was generated from
#[derive(Clone, Debug, Default)]
pub struct Geometry {
    pub nodes: Vec<GeomNode>,
    pub segments: Vec<Segment>,
    pub arcs: Vec<ArcSegment>,
}

impl Geometry {
    pub fn add_node(&mut self, node: GeomNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn add_segment(&mut self, segment: Segment) -> usize {
        self.segments.push(segment);
        self.segments.len() - 1
    }

    pub fn add_arc(&mut self, arc: ArcSegment) -> usize {
        self.arcs.push(arc);
        self.arcs.len() - 1
    }

    pub fn unselect_all(&mut self) {
        self.nodes.iter_mut().for_each(|n| n.is_selected = false);
        self.segments.iter_mut().for_each(|s| s.is_selected = false);
        self.arcs.iter_mut().for_each(|a| a.is_selected = false);
    }

    /// Index of the drawing node closest to `(x, y)`; the lowest index wins ties
    pub fn closest_node(&self, x: f64, y: f64) -> Option<usize> {
        let mut closest = None;
        let mut d_min = f64::MAX;

        for (node_id, node) in self.nodes.iter().enumerate() {
            let d = (node.x - x).powi(2) + (node.y - y).powi(2);
            if d < d_min {
                d_min = d;
                closest = Some(node_id);
            }
        }

        closest
    }

    /// Distance from `(x, y)` to the nearest point on a segment
    pub fn shortest_distance_from_segment(&self, x: f64, y: f64, segment_id: usize) -> f64 {
        let seg = &self.segments[segment_id];
        let p0 = self.nodes[seg.n0].cc();
        let p1 = self.nodes[seg.n1].cc();
        let p = Complex64::new(x, y);

        let span = p1 - p0;
        let length_sqr = span.norm_sqr();
        if length_sqr == 0.0 {
            return (p - p0).norm();
        }

        let t = (((p - p0) * span.conj()).re / length_sqr).clamp(0.0, 1.0);
        (p - (p0 + span * t)).norm()
    }

    /// Center and radius of the circle an arc lies on
    pub fn circle(&self, arc: &ArcSegment) -> (Complex64, f64) {
        let a0 = self.nodes[arc.n0].cc();
        let a1 = self.nodes[arc.n1].cc();
        let d = (a1 - a0).norm();
        let tta = arc.arc_length * PI / 180.0;

        let r = d / (2.0 * (tta / 2.0).sin());
        let t = (a1 - a0) / d;
        let h = (r * r - d * d / 4.0).max(0.0).sqrt();

        (a0 + Complex64::new(d / 2.0, h) * t, r)
    }

    /// Distance from `p` to the nearest point on an arc
    pub fn shortest_distance_from_arc(&self, p: Complex64, arc: &ArcSegment) -> f64 {
        let (c, r) = self.circle(arc);
        let a0 = self.nodes[arc.n0].cc();
        let a1 = self.nodes[arc.n1].cc();

        let d = (p - c).norm();
        if d == 0.0 {
            return r;
        }

        let t = (p - c) / d;
        let radial = (p - c - t * r).norm();

        let mut z = (t / (a0 - c)).arg().to_degrees();
        if z < 0.0 {
            z += 360.0;
        }
        if z > 0.0 && z < arc.arc_length {
            return radial;
        }

        (p - a0).norm().min((p - a1).norm())
    }

    pub fn validate(&self) -> Result<(), String> {
        let num_nodes = self.nodes.len();
        for (id, seg) in self.segments.iter().enumerate() {
            if seg.n0 >= num_nodes || seg.n1 >= num_nodes {
                return Err(format!("Segment {} refers to a non-existent node", id));
            }
        }
        for (id, arc) in self.arcs.iter().enumerate() {
            if arc.n0 >= num_nodes || arc.n1 >= num_nodes {
                return Err(format!("Arc {} refers to a non-existent node", id));
            }
            if arc.arc_length <= 0.0 || arc.arc_length > 360.0 {
                return Err(format!(
                    "Arc {} has an invalid arc length ({} degrees)",
                    id, arc.arc_length
                ));
            }
        }
        Ok(())
    }
}
