/// A drawing of the problem: nodes, segments and arcs
pub mod geometry;
/// Block labels marking regions of the Mesh
pub mod label;
/// Material properties and the air/same-material capability
pub mod material;

use geometry::Geometry;
use label::BlockLabel;
use material::BlockProperty;

use num_complex::Complex64;
use std::fmt;

/// The physics described by a solved problem
///
/// Selected once when the `Problem` is built; determines which scalar field the Mesh nodes carry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProblemKind {
    Magnetics,
    Electrostatics,
    HeatFlow,
}

impl ProblemKind {
    /// Whether nodes carry a scalar potential (voltage or temperature) that can be smoothed
    pub fn has_scalar_potential(&self) -> bool {
        matches!(self, Self::Electrostatics | Self::HeatFlow)
    }
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Magnetics => write!(f, "Magnetics"),
            Self::Electrostatics => write!(f, "Electrostatics"),
            Self::HeatFlow => write!(f, "Heat Flow"),
        }
    }
}

/// Planar or axisymmetric formulation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Symmetry {
    Planar,
    /// x is the radial coordinate, y runs along the axis of revolution
    Axisymmetric,
}

/// Units of the drawing coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LengthUnit {
    Inches,
    Millimeters,
    Centimeters,
    Meters,
    Mils,
    Micrometers,
}

impl LengthUnit {
    /// Length of one drawing unit in meters
    pub fn to_meters(&self) -> f64 {
        match self {
            Self::Inches => 0.0254,
            Self::Millimeters => 0.001,
            Self::Centimeters => 0.01,
            Self::Meters => 1.0,
            Self::Mils => 2.54e-05,
            Self::Micrometers => 1.0e-06,
        }
    }
}

impl Default for LengthUnit {
    fn default() -> Self {
        Self::Meters
    }
}

/// Position and radii of the virtual exterior used to model unbounded axisymmetric domains
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExteriorRegion {
    /// Axial (y) position of the exterior's center
    pub zo: f64,
    /// Outer radius
    pub ro: f64,
    /// Inner radius
    pub ri: f64,
}

impl ExteriorRegion {
    pub fn center(&self) -> Complex64 {
        Complex64::new(0.0, self.zo)
    }
}

impl Default for ExteriorRegion {
    fn default() -> Self {
        Self {
            zo: 0.0,
            ro: 1.0,
            ri: 1.0,
        }
    }
}

/// Description of a solved problem as needed by the post-processor
///
/// Populated by whatever reads the solution files; the post-processor only borrows from it
/// (aside from selection flags on labels and drawing entities).
#[derive(Clone, Debug)]
pub struct Problem {
    pub kind: ProblemKind,
    pub symmetry: Symmetry,
    pub length_units: LengthUnit,
    pub exterior: ExteriorRegion,
    pub materials: Vec<BlockProperty>,
    pub labels: Vec<BlockLabel>,
    pub geometry: Geometry,
}

impl Problem {
    /// An empty planar problem of the given kind
    pub fn new(kind: ProblemKind) -> Self {
        Self {
            kind,
            symmetry: Symmetry::Planar,
            length_units: LengthUnit::default(),
            exterior: ExteriorRegion::default(),
            materials: Vec::new(),
            labels: Vec::new(),
            geometry: Geometry::default(),
        }
    }

    pub fn with_symmetry(mut self, symmetry: Symmetry) -> Self {
        self.symmetry = symmetry;
        self
    }

    pub fn with_length_units(mut self, units: LengthUnit) -> Self {
        self.length_units = units;
        self
    }

    pub fn with_exterior(mut self, exterior: ExteriorRegion) -> Self {
        self.exterior = exterior;
        self
    }

    pub fn is_axisymmetric(&self) -> bool {
        self.symmetry == Symmetry::Axisymmetric
    }

    /// Add a material, returning its index
    pub fn add_material(&mut self, material: BlockProperty) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    /// Add a block label, returning its index
    pub fn add_label(&mut self, label: BlockLabel) -> usize {
        self.labels.push(label);
        self.labels.len() - 1
    }

    /// Deselect every label and drawing entity
    pub fn unselect_all(&mut self) {
        self.labels.iter_mut().for_each(|l| l.is_selected = false);
        self.geometry.unselect_all();
    }

    /// Check that every material matches the problem kind and every label refers to an existing material
    pub fn validate(&self) -> Result<(), String> {
        for (material_id, material) in self.materials.iter().enumerate() {
            if material.props.kind() != self.kind {
                return Err(format!(
                    "Material {} ({}) describes a {} problem, expected {}",
                    material_id,
                    material.name,
                    material.props.kind(),
                    self.kind
                ));
            }
        }
        for (label_id, label) in self.labels.iter().enumerate() {
            if label.block_type >= self.materials.len() {
                return Err(format!(
                    "Label {} refers to material {}, but only {} materials exist",
                    label_id,
                    label.block_type,
                    self.materials.len()
                ));
            }
        }
        self.geometry.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use material::MaterialProps;

    #[test]
    fn unit_conversions() {
        assert!((LengthUnit::Inches.to_meters() - 0.0254).abs() < 1e-15);
        assert!((LengthUnit::Mils.to_meters() * 1000.0 - LengthUnit::Inches.to_meters()).abs() < 1e-15);
        assert_eq!(LengthUnit::default().to_meters(), 1.0);
    }

    #[test]
    fn label_material_validation() {
        let mut problem = Problem::new(ProblemKind::Electrostatics);
        problem.add_label(BlockLabel::new(0.0, 0.0, 0));
        assert!(problem.validate().is_err());

        problem.add_material(BlockProperty::new("Air", MaterialProps::electrostatic(1.0, 1.0)));
        assert!(problem.validate().is_ok());

        problem.add_material(BlockProperty::new("Iron", MaterialProps::magnetic(1000.0, 1000.0)));
        assert!(problem.validate().is_err());
    }

    #[test]
    fn potential_kinds() {
        assert!(ProblemKind::Electrostatics.has_scalar_potential());
        assert!(ProblemKind::HeatFlow.has_scalar_potential());
        assert!(!ProblemKind::Magnetics.has_scalar_potential());
    }
}
