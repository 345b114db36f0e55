use crate::problem::ProblemKind;
use thiserror::Error;

/// Errors produced by the post-processing engine
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PostProcError {
    /// No element of the mesh contains the requested point
    #[error("No Element contains the point ({x}, {y})")]
    GeometryNotFound { x: f64, y: f64 },
    /// The selected region abuts a region which is not free space
    #[error("The selected region is invalid. A valid selection cannot abut a region which is not free space.")]
    InvalidSelection,
    /// The sparse solve for the region mask did not converge
    #[error("Mask solve failed to converge after {iterations} iterations (relative residual: {residual:.3e})")]
    SolverDivergence { iterations: usize, residual: f64 },
    /// Smoothing or reconstruction was requested for a problem without a scalar potential
    #[error("{0} problems do not carry a scalar potential; Cannot reconstruct nodal flux!")]
    UnsupportedProblemKind(ProblemKind),
    /// Node or Element data is inconsistent
    #[error("Invalid Mesh: {0}")]
    InvalidMesh(String),
    /// Configuration could not be parsed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, PostProcError>;
