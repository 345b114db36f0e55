use super::node::MeshNode;
use num_complex::Complex64;

/// Edge `j` of an element runs from `p[PLUS1MOD3[j]]` to `p[MINUS1MOD3[j]]` (it is opposite vertex `j`)
pub const PLUS1MOD3: [usize; 3] = [1, 2, 0];
pub const MINUS1MOD3: [usize; 3] = [2, 0, 1];

/// A triangular element of the solved Mesh
///
/// Elements are responsible for:
/// * Keeping the indices of their three (counter-clockwise) nodes
/// * Referencing the block label and material of the region they belong to
/// * Carrying the raw flux density computed by the solver, and its smoothed nodal values once they are known
#[derive(Clone, Debug)]
pub struct MeshElement {
    pub p: [usize; 3],
    /// Block label index
    pub lbl: usize,
    /// Material index
    pub blk: usize,
    /// Raw (element-constant) flux density from the solution
    pub d: Complex64,
    pub(crate) n: [u8; 3],
    pub(crate) ctr: Complex64,
    pub(crate) rsqr: f64,
    pub(crate) d_nodal: Option<[Complex64; 3]>,
}

impl MeshElement {
    pub fn new(p: [usize; 3], lbl: usize, blk: usize) -> Self {
        Self {
            p,
            lbl,
            blk,
            d: Complex64::from(0.0),
            n: [0; 3],
            ctr: Complex64::from(0.0),
            rsqr: 0.0,
            d_nodal: None,
        }
    }

    pub fn with_flux(mut self, d: Complex64) -> Self {
        self.d = d;
        self
    }

    /// Boundary markers of the three edges (1 = edge on the outside of the Mesh)
    pub fn neighbor_markers(&self) -> [u8; 3] {
        self.n
    }

    pub fn is_boundary_edge(&self, edge: usize) -> bool {
        self.n[edge] == 1
    }

    /// Cached centroid
    pub fn centroid(&self) -> Complex64 {
        self.ctr
    }

    /// Squared radius of a circle about the centroid enclosing the element
    pub fn bounding_radius_sqr(&self) -> f64 {
        self.rsqr
    }

    /// Smoothed flux at the three vertices, if it has been computed
    pub fn nodal_flux(&self) -> Option<[Complex64; 3]> {
        self.d_nodal
    }

    /// Position of vertex `j` within the element, if `node` is one of its vertices
    pub fn local_index(&self, node: usize) -> Option<usize> {
        self.p.iter().position(|&p| p == node)
    }

    pub fn has_node(&self, node: usize) -> bool {
        self.p.contains(&node)
    }

    pub(crate) fn update_bounds(&mut self, nodes: &[MeshNode]) {
        let ctr = self
            .p
            .iter()
            .fold(Complex64::from(0.0), |acc, &p| acc + nodes[p].cc() / 3.0);

        self.rsqr = self
            .p
            .iter()
            .map(|&p| (nodes[p].cc() - ctr).norm_sqr())
            .fold(0.0, f64::max);
        self.ctr = ctr;
    }

    /// First-order shape function parameters `(b, c)` (`b` is Allaire's `p`, `c` is Allaire's `q`)
    pub fn shape_params(&self, nodes: &[MeshNode]) -> ([f64; 3], [f64; 3]) {
        let [n0, n1, n2] = self.p.map(|p| &nodes[p]);
        (
            [n1.y - n2.y, n2.y - n0.y, n0.y - n1.y],
            [n2.x - n1.x, n0.x - n2.x, n1.x - n0.x],
        )
    }

    /// Signed area (positive for counter-clockwise elements)
    pub fn area(&self, nodes: &[MeshNode]) -> f64 {
        let (b, c) = self.shape_params(nodes);
        (b[0] * c[1] - b[1] * c[0]) / 2.0
    }

    /// Whether `(x, y)` lies inside or on the boundary of the element
    ///
    /// Every edge is evaluated starting from its lower numbered node, so that the two elements sharing an edge
    /// compute the same cross product (with opposite sign) and no point falls through the gap between them.
    pub fn contains(&self, nodes: &[MeshNode], x: f64, y: f64) -> bool {
        for j in 0..3 {
            let k = (j + 1) % 3;
            let p_j = self.p[j];
            let p_k = self.p[k];

            if p_k > p_j {
                let (a, b) = (&nodes[p_j], &nodes[p_k]);
                let z = (b.x - a.x) * (y - a.y) - (b.y - a.y) * (x - a.x);
                if z < 0.0 {
                    return false;
                }
            } else {
                let (a, b) = (&nodes[p_k], &nodes[p_j]);
                let z = (b.x - a.x) * (y - a.y) - (b.y - a.y) * (x - a.x);
                if z > 0.0 {
                    return false;
                }
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> (Vec<MeshNode>, MeshElement) {
        let nodes = vec![
            MeshNode::new(0.0, 0.0),
            MeshNode::new(1.0, 0.0),
            MeshNode::new(0.0, 1.0),
        ];
        let mut elem = MeshElement::new([0, 1, 2], 0, 0);
        elem.update_bounds(&nodes);
        (nodes, elem)
    }

    #[test]
    fn area_and_centroid() {
        let (nodes, elem) = unit_triangle();

        assert!((elem.area(&nodes) - 0.5).abs() < 1e-15);
        assert!((elem.centroid() - Complex64::new(1.0 / 3.0, 1.0 / 3.0)).norm() < 1e-15);
        assert!((elem.bounding_radius_sqr() - 5.0 / 9.0).abs() < 1e-15);

        let flipped = MeshElement::new([0, 2, 1], 0, 0);
        assert!((flipped.area(&nodes) + 0.5).abs() < 1e-15);
    }

    #[test]
    fn containment() {
        let (nodes, elem) = unit_triangle();

        assert!(elem.contains(&nodes, 0.25, 0.25));
        assert!(elem.contains(&nodes, 0.5, 0.0));
        assert!(elem.contains(&nodes, 0.0, 0.0));
        assert!(!elem.contains(&nodes, 0.6, 0.6));
        assert!(!elem.contains(&nodes, -0.1, 0.5));
        assert!(!elem.contains(&nodes, 0.5, -1e-9));
    }

    #[test]
    fn containment_independent_of_starting_vertex() {
        let (nodes, _) = unit_triangle();
        for p in [[0, 1, 2], [1, 2, 0], [2, 0, 1]] {
            let elem = MeshElement::new(p, 0, 0);
            assert!(elem.contains(&nodes, 0.2, 0.3));
            assert!(!elem.contains(&nodes, 0.9, 0.9));
        }
    }

    #[test]
    fn local_indices() {
        let elem = MeshElement::new([4, 9, 2], 0, 0);
        assert_eq!(elem.local_index(9), Some(1));
        assert_eq!(elem.local_index(3), None);
        assert!(elem.has_node(2));
    }
}
