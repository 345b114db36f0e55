/// Jacobi Preconditioned Conjugate Gradient solver
pub mod pcg;
/// Sparsely Packed Symmetric Matrix
pub mod sparse_matrix;

use crate::error::Result;

/// A symmetric sparse linear system `A x = b`, assembled entry by entry and then solved
///
/// This is the only capability the region mask needs from a solver; [pcg::PcgProblem] is the default.
pub trait LinearProblem {
    /// Create an empty system of `dimension` unknowns; `bandwidth` bounds the matrix band and may be used as a storage hint
    fn create(dimension: usize, bandwidth: usize) -> Self
    where
        Self: Sized;

    /// Number of unknowns
    fn dimension(&self) -> usize;

    /// Coefficient at `(row, col)`
    fn get(&self, row: usize, col: usize) -> f64;

    /// Overwrite the coefficient at `(row, col)` (and `(col, row)`)
    fn put(&mut self, value: f64, row: usize, col: usize);

    /// Add to the right-hand side entry `i`
    fn add_rhs(&mut self, i: usize, value: f64);

    /// Starting value of unknown `i`
    fn set_initial(&mut self, i: usize, value: f64);

    /// Convergence criteria for iterative solvers
    fn set_limits(&mut self, _precision: f64, _max_iterations: usize) {}

    /// Solve the system, returning one value per unknown
    fn solve(&mut self) -> Result<Vec<f64>>;
}
