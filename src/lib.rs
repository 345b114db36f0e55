//! Post-processing of solved 2D electrostatic and heat flow finite element problems.
//! Point location, region masks, user contours and smoothed flux densities over a triangular Mesh.

/// Run-time options
pub mod config;
/// Error type shared by every operation
pub mod error;
/// Sparse symmetric linear systems and their solvers
pub mod linalg;
/// The solved triangular Mesh: nodes, elements, adjacency and point location
pub mod mesh;
/// Queries, selections, masks, contours and field reconstruction over a solved problem
pub mod post_processor;
/// Description of the solved problem: kind, materials, block labels and drawing geometry
pub mod problem;

pub use config::PostProcessorConfig;
pub use error::{PostProcError, Result};
pub use linalg::{pcg::PcgProblem, LinearProblem};
pub use mesh::{element::MeshElement, node::MeshNode, Mesh};
pub use post_processor::{contour::Contour, PostProcessor};
pub use problem::{
    geometry::Geometry, label::BlockLabel, material::BlockProperty, material::Material,
    material::MaterialProps, ExteriorRegion, LengthUnit, Problem, ProblemKind, Symmetry,
};
