/// Elements incident to each node, in counter-clockwise order
pub mod adjacency;
/// A triangular Finite Element
pub mod element;
/// Point location over the Mesh's elements
pub mod locator;
/// A vertex of the Mesh and its solution value
pub mod node;

use adjacency::NodeAdjacency;
use element::{MeshElement, MINUS1MOD3, PLUS1MOD3};
use locator::ElementLocator;
use node::MeshNode;

use crate::error::{PostProcError, Result};

use num_complex::Complex64;
use rayon::prelude::*;

/// A solved triangular Mesh
///
/// The node and element lists are fixed when the Mesh is built: every algorithm refers to nodes and elements by
/// their index. Only selection flags and mask values change afterwards.
#[derive(Clone, Debug)]
pub struct Mesh {
    nodes: Vec<MeshNode>,
    elements: Vec<MeshElement>,
    adjacency: NodeAdjacency,
    locator: ElementLocator,
}

impl Mesh {
    /// Construct an empty Mesh
    pub fn blank() -> Self {
        Self {
            nodes: Vec::new(),
            elements: Vec::new(),
            adjacency: NodeAdjacency::default(),
            locator: ElementLocator::new(),
        }
    }

    /// Build a Mesh from solved nodes and elements
    ///
    /// * element node indices must refer to existing nodes, and be distinct within each element
    /// * element centroids, bounding radii, node adjacency and boundary edge markers are computed here
    pub fn new(nodes: Vec<MeshNode>, mut elements: Vec<MeshElement>) -> Result<Self> {
        for (elem_id, elem) in elements.iter().enumerate() {
            if let Some(bad) = elem.p.iter().find(|&&p| p >= nodes.len()) {
                return Err(PostProcError::InvalidMesh(format!(
                    "Element {} refers to Node {}, but the Mesh only has {} Nodes",
                    elem_id,
                    bad,
                    nodes.len()
                )));
            }
            if elem.p[0] == elem.p[1] || elem.p[1] == elem.p[2] || elem.p[0] == elem.p[2] {
                return Err(PostProcError::InvalidMesh(format!(
                    "Element {} has repeated Nodes: {:?}",
                    elem_id, elem.p
                )));
            }
        }

        elements
            .par_iter_mut()
            .for_each(|elem| elem.update_bounds(&nodes));

        let num_clockwise = elements.iter().filter(|e| e.area(&nodes) <= 0.0).count();
        if num_clockwise > 0 {
            log::warn!(
                "{} of {} Elements are not counter-clockwise; point location may miss them",
                num_clockwise,
                elements.len()
            );
        }

        let adjacency = NodeAdjacency::build(&nodes, &elements);

        let mut mesh = Self {
            nodes,
            elements,
            adjacency,
            locator: ElementLocator::new(),
        };
        mesh.find_boundary_edges();

        log::debug!(
            "built Mesh with {} Nodes and {} Elements",
            mesh.nodes.len(),
            mesh.elements.len()
        );

        Ok(mesh)
    }

    // ----------------------------------------------------------------------------------------------------
    // General Data Retrieval
    // ----------------------------------------------------------------------------------------------------

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    pub fn nodes(&self) -> &[MeshNode] {
        &self.nodes
    }

    pub fn elements(&self) -> &[MeshElement] {
        &self.elements
    }

    pub fn node(&self, node_id: usize) -> &MeshNode {
        &self.nodes[node_id]
    }

    pub fn element(&self, elem_id: usize) -> &MeshElement {
        &self.elements[elem_id]
    }

    pub fn adjacency(&self) -> &NodeAdjacency {
        &self.adjacency
    }

    /// Elements sharing a node, in counter-clockwise order
    pub fn incident_elements(&self, node_id: usize) -> &[usize] {
        self.adjacency.incident(node_id)
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [MeshNode] {
        &mut self.nodes
    }

    pub(crate) fn elements_mut(&mut self) -> &mut [MeshElement] {
        &mut self.elements
    }

    /// Get the three [MeshNode]s composing an element
    pub fn element_nodes(&self, elem_id: usize) -> [&MeshNode; 3] {
        self.elements[elem_id].p.map(|p| &self.nodes[p])
    }

    /// Signed area of an element
    pub fn elm_area(&self, elem_id: usize) -> f64 {
        self.elements[elem_id].area(&self.nodes)
    }

    /// Centroid of an element (computed from its nodes)
    pub fn ctr(&self, elem_id: usize) -> Complex64 {
        self.elements[elem_id]
            .p
            .iter()
            .fold(Complex64::from(0.0), |acc, &p| acc + self.nodes[p].cc() / 3.0)
    }

    /// Largest difference in node index along any element edge, plus one
    pub fn bandwidth(&self) -> usize {
        self.elements
            .iter()
            .flat_map(|elem| (0..3).map(move |j| elem.p[j].abs_diff(elem.p[(j + 1) % 3])))
            .max()
            .unwrap_or(0)
            + 1
    }

    // ----------------------------------------------------------------------------------------------------
    // Point Location
    // ----------------------------------------------------------------------------------------------------

    /// Index of the element containing `(x, y)`, or `None` if the point is outside the Mesh
    pub fn locate(&self, x: f64, y: f64) -> Option<usize> {
        self.locator.locate(&self.nodes, &self.elements, x, y)
    }

    /// Whether `(x, y)` lies inside (or on the boundary of) an element
    pub fn in_triangle_test(&self, x: f64, y: f64, elem_id: usize) -> bool {
        elem_id < self.elements.len() && self.elements[elem_id].contains(&self.nodes, x, y)
    }

    pub fn locator(&self) -> &ElementLocator {
        &self.locator
    }

    // ----------------------------------------------------------------------------------------------------
    // Boundary Detection
    // ----------------------------------------------------------------------------------------------------

    /// Mark every element edge which is not shared with another element as a boundary edge
    pub fn find_boundary_edges(&mut self) {
        self.elements.iter_mut().for_each(|elem| elem.n = [0; 3]);

        let markers: Vec<[u8; 3]> = (0..self.elements.len())
            .map(|elem_id| {
                let elem = &self.elements[elem_id];
                let mut n = [0; 3];
                for (j, marker) in n.iter_mut().enumerate() {
                    let org = elem.p[PLUS1MOD3[j]];
                    let dest = elem.p[MINUS1MOD3[j]];

                    let shared = self
                        .adjacency
                        .incident(org)
                        .iter()
                        .filter(|&&ei| ei != elem_id)
                        .any(|&ei| self.elements[ei].has_node(dest));

                    if !shared {
                        *marker = 1;
                    }
                }
                n
            })
            .collect();

        for (elem, n) in self.elements.iter_mut().zip(markers) {
            elem.n = n;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A `cols` x `rows` grid of unit squares, each split into two counter-clockwise triangles
    ///
    /// Node `i + j * (cols + 1)` sits at `(i, j)`. Square `(i, j)` produces elements `2s` (lower right) and
    /// `2s + 1` (upper left) with `s = i + j * cols`.
    pub(crate) fn grid_nodes_elements(cols: usize, rows: usize) -> (Vec<MeshNode>, Vec<MeshElement>) {
        let mut nodes = Vec::new();
        for j in 0..=rows {
            for i in 0..=cols {
                nodes.push(MeshNode::new(i as f64, j as f64));
            }
        }

        let id = |i: usize, j: usize| i + j * (cols + 1);
        let mut elements = Vec::new();
        for j in 0..rows {
            for i in 0..cols {
                elements.push(MeshElement::new([id(i, j), id(i + 1, j), id(i + 1, j + 1)], 0, 0));
                elements.push(MeshElement::new([id(i, j), id(i + 1, j + 1), id(i, j + 1)], 0, 0));
            }
        }

        (nodes, elements)
    }

    pub(crate) fn grid_mesh(cols: usize, rows: usize) -> Mesh {
        let (nodes, elements) = grid_nodes_elements(cols, rows);
        Mesh::new(nodes, elements).unwrap()
    }

    #[test]
    fn mesh_construction() {
        let mesh = grid_mesh(3, 2);

        assert_eq!(mesh.num_nodes(), 12);
        assert_eq!(mesh.num_elements(), 12);
        assert!(mesh.elements().iter().all(|e| e.area(mesh.nodes()) > 0.0));
        assert!((mesh.elm_area(5) - 0.5).abs() < 1e-15);
        assert!((mesh.ctr(0) - mesh.element(0).centroid()).norm() < 1e-15);
        assert_eq!(mesh.bandwidth(), 6);

        for node_id in 0..mesh.num_nodes() {
            assert_eq!(mesh.adjacency().len(node_id), mesh.incident_elements(node_id).len());
        }
    }

    #[test]
    fn bad_node_index() {
        let nodes = vec![MeshNode::new(0.0, 0.0), MeshNode::new(1.0, 0.0)];
        let elements = vec![MeshElement::new([0, 1, 2], 0, 0)];

        assert!(matches!(
            Mesh::new(nodes, elements),
            Err(PostProcError::InvalidMesh(_))
        ));
    }

    #[test]
    fn repeated_node_index() {
        let nodes = vec![MeshNode::new(0.0, 0.0), MeshNode::new(1.0, 0.0)];
        let elements = vec![MeshElement::new([0, 1, 1], 0, 0)];

        assert!(Mesh::new(nodes, elements).is_err());
    }

    #[test]
    fn boundary_markers() {
        let mut mesh = grid_mesh(2, 2);

        // count element-edge incidences of every undirected edge
        let mut edge_counts = std::collections::BTreeMap::new();
        for elem in mesh.elements() {
            for j in 0..3 {
                let a = elem.p[PLUS1MOD3[j]];
                let b = elem.p[MINUS1MOD3[j]];
                *edge_counts.entry([a.min(b), a.max(b)]).or_insert(0) += 1;
            }
        }

        let check = |mesh: &Mesh| {
            for elem in mesh.elements() {
                for j in 0..3 {
                    let a = elem.p[PLUS1MOD3[j]];
                    let b = elem.p[MINUS1MOD3[j]];
                    let count = edge_counts[&[a.min(b), a.max(b)]];
                    assert_eq!(elem.is_boundary_edge(j), count == 1);
                }
            }
        };

        check(&mesh);
        let first: Vec<[u8; 3]> = mesh.elements().iter().map(|e| e.neighbor_markers()).collect();

        mesh.find_boundary_edges();
        check(&mesh);
        let second: Vec<[u8; 3]> = mesh.elements().iter().map(|e| e.neighbor_markers()).collect();
        assert_eq!(first, second);

        // a 2x2 grid has 8 boundary edges
        let num_boundary: usize = second
            .iter()
            .map(|n| n.iter().filter(|&&m| m == 1).count())
            .sum();
        assert_eq!(num_boundary, 8);
    }

    #[test]
    fn locate_interior_points() {
        let mesh = grid_mesh(4, 3);

        for (elem_id, elem) in mesh.elements().iter().enumerate() {
            let c = elem.centroid();
            assert_eq!(mesh.locate(c.re, c.im), Some(elem_id));
        }

        // reverse order to exercise the downward search
        for (elem_id, elem) in mesh.elements().iter().enumerate().rev() {
            let c = elem.centroid();
            assert_eq!(mesh.locate(c.re, c.im), Some(elem_id));
            assert_eq!(mesh.locator().cursor(), elem_id);
        }
    }

    #[test]
    fn locate_from_any_cursor() {
        let mesh = grid_mesh(3, 3);
        for start in 0..mesh.num_elements() + 3 {
            mesh.locator().set_cursor(start);
            assert_eq!(mesh.locate(2.75, 1.5), Some(10));
            assert_eq!(mesh.locator().cursor(), 10);
        }
    }

    #[test]
    fn locate_outside() {
        let mesh = grid_mesh(3, 3);

        assert_eq!(mesh.locate(-1.0, 0.5), None);
        assert_eq!(mesh.locate(1e6, -1e6), None);
        assert_eq!(Mesh::blank().locate(0.0, 0.0), None);
        assert!(!mesh.in_triangle_test(0.5, 0.5, 1000));
    }
}
