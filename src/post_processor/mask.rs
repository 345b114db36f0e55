use super::PostProcessor;
use crate::error::{PostProcError, Result};
use crate::linalg::{pcg::PcgProblem, LinearProblem};
use crate::mesh::element::{MeshElement, MINUS1MOD3, PLUS1MOD3};
use crate::mesh::node::MeshNode;
use crate::problem::material::Material;
use crate::problem::ProblemKind;

use rayon::prelude::*;

/// Nodes with `x` below this value lie on the symmetry axis of an axisymmetric problem
pub const AXIS_TOLERANCE: f64 = 1e-6;

/// Distance below which a Mesh node coincides with a drawing node
pub const POINT_TOLERANCE: f64 = 1e-8;

// solver input marker for a node whose value is left to the solve
const UNCONSTRAINED: f64 = -1.0;

/// Element stiffness matrix and right-hand side after prescribed values have been condensed out
struct ElementSystem {
    n: [usize; 3],
    me: [[f64; 3]; 3],
    be: [f64; 3],
}

impl PostProcessor {
    /// Compute the region mask of the current selection with the default [PcgProblem] solver
    ///
    /// A smooth auxiliary field is solved for over the Mesh (fixed at 1 on selected regions and at 0 on the outer
    /// boundary and on non-air regions) and thresholded at one half. Every node gets a `msk` of 0 or 1.
    ///
    /// * returns immediately if a valid mask already exists
    /// * returns `Err(InvalidSelection)` if the selection touches a non-air region (a warning is also sent)
    /// * returns `Err(SolverDivergence)` if the solve fails; the mask stays invalid
    pub fn make_mask(&mut self) -> Result<()> {
        self.make_mask_with::<PcgProblem>()
    }

    /// Compute the region mask, solving the auxiliary field with any [LinearProblem] implementation
    pub fn make_mask_with<P: LinearProblem>(&mut self) -> Result<()> {
        if self.has_mask {
            return Ok(());
        }

        let air_labels = self.air_labels();
        let v = self.prescribed_values(&air_labels);

        if let Some(elem_id) = self.find_invalid_element(&air_labels, &v) {
            log::debug!("region mask rejected at Element {}", elem_id);
            let err = PostProcError::InvalidSelection;
            self.warn(&err.to_string());
            return Err(err);
        }

        let nodes = self.mesh.nodes();
        let labels = &self.problem.labels;
        let systems: Vec<ElementSystem> = self
            .mesh
            .elements()
            .par_iter()
            .map(|elem| element_system(elem, nodes, labels[elem.lbl].max_area, &v))
            .collect();

        let num_nodes = self.mesh.num_nodes();
        let mut lp = P::create(num_nodes, self.mesh.bandwidth());
        lp.set_limits(
            self.config.solver_precision,
            self.config.solver_max_iterations,
        );
        for (i, v_i) in v.iter().enumerate() {
            lp.set_initial(i, v_i.max(0.0));
        }

        for sys in systems.iter() {
            for j in 0..3 {
                for k in j..3 {
                    if sys.me[j][k] != 0.0 {
                        let current = lp.get(sys.n[j], sys.n[k]);
                        lp.put(current + sys.me[j][k], sys.n[j], sys.n[k]);
                    }
                }
                lp.add_rhs(sys.n[j], sys.be[j]);
            }
        }

        let solution = lp.solve().map_err(|err| {
            log::warn!("region mask solve failed: {}", err);
            err
        })?;

        let mut num_selected = 0;
        for (node, value) in self.mesh.nodes_mut().iter_mut().zip(solution) {
            node.msk = if value > 0.5 {
                num_selected += 1;
                1.0
            } else {
                0.0
            };
        }
        self.has_mask = true;

        log::info!(
            "region mask computed: {} of {} Nodes selected",
            num_selected,
            num_nodes
        );

        Ok(())
    }

    /// Whether an on-axis node may be fixed at zero in an axisymmetric problem
    ///
    /// A node at the end of an axis interval (or at a break in one) has at most one other axis node among its
    /// neighbors. Nodes off the axis, and all nodes of planar problems, may always be fixed.
    pub fn is_kosher(&self, node_id: usize) -> bool {
        if !self.problem.is_axisymmetric() || self.mesh.node(node_id).x > AXIS_TOLERANCE {
            return true;
        }

        let mut score = 0;
        for &elem_id in self.mesh.incident_elements(node_id) {
            for &n in self.mesh.element(elem_id).p.iter() {
                if n != node_id && self.mesh.node(n).x < AXIS_TOLERANCE {
                    score += 1;
                    if score > 1 {
                        return false;
                    }
                }
            }
        }

        true
    }

    /// Whether a selected region of an axisymmetric problem touches the symmetry axis
    pub fn is_selection_on_axis(&self) -> bool {
        if !self.problem.is_axisymmetric() {
            return false;
        }

        self.mesh.elements().iter().any(|elem| {
            self.problem.labels[elem.lbl].is_selected
                && elem.p.iter().any(|&p| self.mesh.node(p).x < AXIS_TOLERANCE)
        })
    }

    // air flag of every block label
    fn air_labels(&self) -> Vec<bool> {
        let air_materials: Vec<bool> = self.problem.materials.iter().map(|m| m.is_air()).collect();

        self.problem
            .labels
            .iter()
            .map(|label| air_materials[label.block_type])
            .collect()
    }

    /// Values the auxiliary field is fixed at (negative entries are left to the solve)
    pub(crate) fn prescribed_values(&self, air_labels: &[bool]) -> Vec<f64> {
        let nodes = self.mesh.nodes();
        let elements = self.mesh.elements();

        let mut v: Vec<f64> = nodes
            .iter()
            .map(|n| if n.is_free() { UNCONSTRAINED } else { 0.0 })
            .collect();

        let on_axis = self.is_selection_on_axis();
        for elem in elements {
            for j in (0..3).filter(|&j| elem.is_boundary_edge(j)) {
                for k in [elem.p[PLUS1MOD3[j]], elem.p[MINUS1MOD3[j]]] {
                    if !on_axis || self.is_kosher(k) {
                        v[k] = 0.0;
                    }
                }
            }
        }

        for elem in elements {
            if self.problem.labels[elem.lbl].is_selected {
                elem.p.iter().for_each(|&p| v[p] = 1.0);
            } else if !air_labels[elem.lbl] {
                elem.p.iter().for_each(|&p| v[p] = 0.0);
            }
        }

        // point sources outside of the selection
        for point in self
            .problem
            .geometry
            .nodes
            .iter()
            .filter(|gn| gn.point_property.is_some())
        {
            if let Some(node_id) = nodes
                .iter()
                .position(|n| (n.cc() - point.cc()).norm() < POINT_TOLERANCE)
            {
                if v[node_id] < 0.0 {
                    v[node_id] = 0.0;
                }
            }
        }

        // selected conductors
        if self.problem.kind == ProblemKind::Electrostatics {
            for (node_id, node) in nodes.iter().enumerate() {
                if node.is_selected {
                    v[node_id] = 1.0;
                }
            }
        }

        v
    }

    // first non-selected, non-air element which is not entirely fixed at zero
    fn find_invalid_element(&self, air_labels: &[bool], v: &[f64]) -> Option<usize> {
        self.mesh.elements().iter().position(|elem| {
            !self.problem.labels[elem.lbl].is_selected
                && !air_labels[elem.lbl]
                && elem.p.iter().filter(|&&p| v[p] == 0.0).count() < 3
        })
    }
}

/// Weighted Laplacian of one element with prescribed nodal values moved to the right-hand side
fn element_system(elem: &MeshElement, nodes: &[MeshNode], max_area: f64, v: &[f64]) -> ElementSystem {
    let n = elem.p;
    let (b, c) = elem.shape_params(nodes);
    let area = (b[0] * c[1] - b[1] * c[0]) / 2.0;

    // each element is weighted by its region's mesh size hint
    let weight = if max_area <= 0.0 {
        area.sqrt()
    } else {
        max_area.sqrt()
    };

    let mut me = [[0.0; 3]; 3];
    let mut be = [0.0; 3];
    for j in 0..3 {
        for k in 0..3 {
            me[j][k] = weight * (b[j] * b[k] + c[j] * c[k]) / area;
        }
    }

    for j in 0..3 {
        let v_j = v[n[j]];
        if v_j >= 0.0 {
            for k in (0..3).filter(|&k| k != j) {
                be[k] -= me[k][j] * v_j;
                me[k][j] = 0.0;
                me[j][k] = 0.0;
            }
            be[j] = v_j * me[j][j];
        }
    }

    ElementSystem { n, me, be }
}
