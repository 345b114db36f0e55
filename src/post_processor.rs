/// User contours drawn over the problem geometry
pub mod contour;
/// Smoothed flux reconstruction
pub mod fields;
/// Region masks for force and energy integrals
pub mod mask;

use contour::Contour;

use crate::config::PostProcessorConfig;
use crate::error::{PostProcError, Result};
use crate::mesh::{element::MeshElement, node::MeshNode, Mesh};
use crate::problem::material::Material;
use crate::problem::Problem;

#[cfg(feature = "json_export")]
use json::{object, JsonValue};
#[cfg(feature = "json_export")]
use std::fs::File;
#[cfg(feature = "json_export")]
use std::io::BufWriter;

/// Receives warnings about recoverable problems (e.g. an invalid mask selection)
pub type MessageCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Analysis of a solved problem: point queries, region selection and masks, contours, and smoothed fields
///
/// Owns the [Problem] description and the solved [Mesh]. All operations are synchronous; mutations (selection
/// changes, mask computation, contour edits) must not be interleaved with reads from other threads.
pub struct PostProcessor {
    problem: Problem,
    mesh: Mesh,
    contour: Contour,
    config: PostProcessorConfig,
    has_mask: bool,
    multiply_defined_labels: bool,
    warn: MessageCallback,
}

impl PostProcessor {
    /// Pair a problem description with its solved Mesh
    ///
    /// * returns an `Err` if an element refers to a label or material the problem does not define
    pub fn new(problem: Problem, mesh: Mesh, config: PostProcessorConfig) -> Result<Self> {
        problem.validate().map_err(PostProcError::InvalidMesh)?;

        for (elem_id, elem) in mesh.elements().iter().enumerate() {
            if elem.lbl >= problem.labels.len() {
                return Err(PostProcError::InvalidMesh(format!(
                    "Element {} refers to label {}, but only {} labels exist",
                    elem_id,
                    elem.lbl,
                    problem.labels.len()
                )));
            }
            if elem.blk >= problem.materials.len() {
                return Err(PostProcError::InvalidMesh(format!(
                    "Element {} refers to material {}, but only {} materials exist",
                    elem_id,
                    elem.blk,
                    problem.materials.len()
                )));
            }
        }

        let mut pp = Self {
            problem,
            mesh,
            contour: Contour::new(),
            config,
            has_mask: false,
            multiply_defined_labels: false,
            warn: Box::new(|msg| log::warn!("{}", msg)),
        };
        pp.multiply_defined_labels = pp.find_multiply_defined_labels();

        Ok(pp)
    }

    // a label that lands in an element meshed for another label shares its region with that label
    fn find_multiply_defined_labels(&self) -> bool {
        let mut found = false;
        for (label_id, label) in self.problem.labels.iter().enumerate() {
            if let Some(elem_id) = self.mesh.locate(label.x, label.y) {
                let owner = self.mesh.element(elem_id).lbl;
                if owner != label_id {
                    log::warn!(
                        "Block label {} at ({}, {}) lies in the region of label {}",
                        label_id,
                        label.x,
                        label.y,
                        owner
                    );
                    found = true;
                }
            }
        }
        found
    }

    // ----------------------------------------------------------------------------------------------------
    // General Data Retrieval
    // ----------------------------------------------------------------------------------------------------

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn config(&self) -> &PostProcessorConfig {
        &self.config
    }

    pub fn num_nodes(&self) -> usize {
        self.mesh.num_nodes()
    }

    pub fn num_elements(&self) -> usize {
        self.mesh.num_elements()
    }

    pub fn mesh_nodes(&self) -> &[MeshNode] {
        self.mesh.nodes()
    }

    pub fn mesh_elements(&self) -> &[MeshElement] {
        self.mesh.elements()
    }

    /// Whether a valid region mask has been computed for the current selection
    pub fn has_mask(&self) -> bool {
        self.has_mask
    }

    /// Whether some region of the Mesh was defined by more than one block label
    pub fn has_multiply_defined_labels(&self) -> bool {
        self.multiply_defined_labels
    }

    /// Index of the element containing `(x, y)`
    pub fn locate(&self, x: f64, y: f64) -> Option<usize> {
        self.mesh.locate(x, y)
    }

    /// Whether two elements are made of the same material
    pub fn is_same_material(&self, e1: &MeshElement, e2: &MeshElement) -> bool {
        self.problem.materials[e1.blk].is_same_material_as(&self.problem.materials[e2.blk])
    }

    // ----------------------------------------------------------------------------------------------------
    // Settings
    // ----------------------------------------------------------------------------------------------------

    /// Toggle smoothing of flux values within elements
    pub fn set_smoothing(&mut self, smoothing: bool) {
        self.config.smoothing = smoothing;
    }

    /// Replace the warning channel (warnings are forwarded to `log::warn!` by default)
    pub fn set_message_callback<F>(&mut self, callback: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.warn = Box::new(callback);
    }

    pub(crate) fn warn(&self, message: &str) {
        (self.warn)(message)
    }

    // ----------------------------------------------------------------------------------------------------
    // Selection
    // ----------------------------------------------------------------------------------------------------

    /// Toggle the selection of the block label whose region contains `(x, y)`
    ///
    /// * returns the index of the toggled label
    /// * returns an `Err` if the point is outside of the Mesh
    pub fn select_block_label(&mut self, x: f64, y: f64) -> Result<usize> {
        let elem_id = self
            .mesh
            .locate(x, y)
            .ok_or(PostProcError::GeometryNotFound { x, y })?;

        let label_id = self.mesh.element(elem_id).lbl;
        self.problem.labels[label_id].toggle_select();
        self.has_mask = false;

        Ok(label_id)
    }

    /// Toggle the selection of every drawing entity and Mesh node belonging to a conductor
    pub fn select_conductor(&mut self, conductor: usize) {
        let geometry = &mut self.problem.geometry;
        geometry
            .nodes
            .iter_mut()
            .filter(|n| n.in_conductor == Some(conductor))
            .for_each(|n| n.is_selected = !n.is_selected);
        geometry
            .segments
            .iter_mut()
            .filter(|s| s.in_conductor == Some(conductor))
            .for_each(|s| s.is_selected = !s.is_selected);
        geometry
            .arcs
            .iter_mut()
            .filter(|a| a.in_conductor == Some(conductor))
            .for_each(|a| a.is_selected = !a.is_selected);

        self.mesh
            .nodes_mut()
            .iter_mut()
            .filter(|n| n.in_conductor == Some(conductor))
            .for_each(|n| n.toggle_select());

        self.has_mask = false;
    }

    /// Deselect everything
    pub fn clear_selection(&mut self) {
        self.problem.unselect_all();
        self.mesh
            .nodes_mut()
            .iter_mut()
            .for_each(|n| n.is_selected = false);
        self.has_mask = false;
    }

    /// Deselect every block label
    pub fn clear_block_selection(&mut self) {
        self.has_mask = false;
        self.problem
            .labels
            .iter_mut()
            .for_each(|l| l.is_selected = false);
    }

    /// Toggle the selection of every block label in a group (group 0 toggles all labels)
    pub fn toggle_selection_for_group(&mut self, group: usize) {
        self.problem
            .labels
            .iter_mut()
            .filter(|l| group == 0 || l.in_group == group)
            .for_each(|l| l.toggle_select());
        self.has_mask = false;
    }

    /// Indices of the selected block labels
    pub fn selected_labels(&self) -> Vec<usize> {
        self.problem
            .labels
            .iter()
            .enumerate()
            .filter(|(_, l)| l.is_selected)
            .map(|(id, _)| id)
            .collect()
    }

    // ----------------------------------------------------------------------------------------------------
    // Export
    // ----------------------------------------------------------------------------------------------------

    /// Print node masks and smoothed element fluxes to a JSON file specified by path.
    #[cfg(feature = "json_export")]
    pub fn export_to_json(&self, path: impl AsRef<str>) -> std::io::Result<()> {
        let f = File::create(path.as_ref())?;
        let mut w = BufWriter::new(&f);

        self.to_json().write_pretty(&mut w, 4)?;

        Ok(())
    }

    /// Produce a Json Object describing the nodes' masks and the elements' (raw and smoothed) flux
    #[cfg(feature = "json_export")]
    pub fn to_json(&self) -> JsonValue {
        let nodes: Vec<JsonValue> = self
            .mesh
            .nodes()
            .iter()
            .map(|n| {
                object! {
                    "x": n.x,
                    "y": n.y,
                    "value": n.value,
                    "msk": n.msk(),
                }
            })
            .collect();

        let elements: Vec<JsonValue> = self
            .mesh
            .elements()
            .iter()
            .map(|e| {
                let nodal: Vec<JsonValue> = e
                    .nodal_flux()
                    .map(|d| d.iter().map(|di| JsonValue::from(vec![di.re, di.im])).collect())
                    .unwrap_or_default();
                object! {
                    "nodes": e.p.to_vec(),
                    "label": e.lbl,
                    "d": vec![e.d.re, e.d.im],
                    "d_nodal": nodal,
                }
            })
            .collect();

        object! {
            "kind": self.problem.kind.to_string(),
            "has_mask": self.has_mask,
            "Nodes": nodes,
            "Elements": elements,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::mesh::tests::grid_nodes_elements;
    use crate::problem::label::BlockLabel;
    use crate::problem::material::{BlockProperty, MaterialProps};
    use crate::problem::ProblemKind;

    /// A 4x2 electrostatic grid split into two air regions: label 0 (x < 2) and label 1 (x > 2)
    pub(crate) fn two_region_grid() -> PostProcessor {
        let mut problem = Problem::new(ProblemKind::Electrostatics);
        problem.add_material(BlockProperty::new("Air", MaterialProps::electrostatic(1.0, 1.0)));
        problem.add_label(BlockLabel::new(0.5, 0.5, 0).with_group(1));
        problem.add_label(BlockLabel::new(3.5, 0.5, 0).with_group(2));

        let (nodes, mut elements) = grid_nodes_elements(4, 2);
        for elem in elements.iter_mut() {
            let c = elem.p.iter().map(|&p| nodes[p].x).sum::<f64>() / 3.0;
            elem.lbl = if c < 2.0 { 0 } else { 1 };
        }

        let mesh = Mesh::new(nodes, elements).unwrap();
        PostProcessor::new(problem, mesh, PostProcessorConfig::default()).unwrap()
    }

    #[test]
    fn block_label_selection() {
        let mut pp = two_region_grid();
        assert!(!pp.has_multiply_defined_labels());

        assert_eq!(pp.select_block_label(3.2, 1.7), Ok(1));
        assert_eq!(pp.selected_labels(), vec![1]);

        assert_eq!(pp.select_block_label(3.2, 1.7), Ok(1));
        assert!(pp.selected_labels().is_empty());

        assert_eq!(
            pp.select_block_label(-4.0, 0.0),
            Err(PostProcError::GeometryNotFound { x: -4.0, y: 0.0 })
        );
    }

    #[test]
    fn group_selection() {
        let mut pp = two_region_grid();

        pp.toggle_selection_for_group(2);
        assert_eq!(pp.selected_labels(), vec![1]);

        pp.toggle_selection_for_group(0);
        assert_eq!(pp.selected_labels(), vec![0]);

        pp.clear_block_selection();
        assert!(pp.selected_labels().is_empty());
    }

    #[test]
    fn conductor_selection() {
        let mut problem = Problem::new(ProblemKind::Electrostatics);
        problem.add_material(BlockProperty::new("Air", MaterialProps::electrostatic(1.0, 1.0)));
        problem.add_label(BlockLabel::new(0.5, 0.5, 0));

        let (mut nodes, elements) = grid_nodes_elements(2, 2);
        nodes[0] = nodes[0].clone().with_conductor(3);
        nodes[1] = nodes[1].clone().with_conductor(3);

        let mesh = Mesh::new(nodes, elements).unwrap();
        let mut pp = PostProcessor::new(problem, mesh, PostProcessorConfig::default()).unwrap();

        pp.select_conductor(3);
        let selected: Vec<usize> = pp
            .mesh_nodes()
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_selected)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(selected, vec![0, 1]);

        pp.clear_selection();
        assert!(pp.mesh_nodes().iter().all(|n| !n.is_selected));
    }

    #[test]
    fn multiply_defined_labels() {
        let mut problem = Problem::new(ProblemKind::Electrostatics);
        problem.add_material(BlockProperty::new("Air", MaterialProps::electrostatic(1.0, 1.0)));
        problem.add_label(BlockLabel::new(0.5, 0.5, 0));
        problem.add_label(BlockLabel::new(1.5, 1.5, 0));

        let (nodes, elements) = grid_nodes_elements(2, 2);
        let mesh = Mesh::new(nodes, elements).unwrap();
        let pp = PostProcessor::new(problem, mesh, PostProcessorConfig::default()).unwrap();

        assert!(pp.has_multiply_defined_labels());
    }

    #[test]
    fn undefined_label_or_material() {
        let mut problem = Problem::new(ProblemKind::Electrostatics);
        problem.add_material(BlockProperty::new("Air", MaterialProps::electrostatic(1.0, 1.0)));
        problem.add_label(BlockLabel::new(0.5, 0.5, 0));

        let (nodes, mut elements) = grid_nodes_elements(1, 1);
        elements[1].blk = 2;
        let mesh = Mesh::new(nodes, elements).unwrap();

        assert!(matches!(
            PostProcessor::new(problem, mesh, PostProcessorConfig::default()),
            Err(PostProcError::InvalidMesh(_))
        ));
    }

    #[cfg(feature = "json_export")]
    #[test]
    fn json_export() {
        let pp = two_region_grid();
        let exported = pp.to_json();

        assert_eq!(exported["Nodes"].len(), pp.num_nodes());
        assert_eq!(exported["Elements"].len(), pp.num_elements());
        assert_eq!(exported["has_mask"].as_bool(), Some(false));
    }
}
