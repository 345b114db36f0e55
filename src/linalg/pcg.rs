use super::sparse_matrix::SparseMatrix;
use super::LinearProblem;
use crate::error::{PostProcError, Result};

/// Default relative residual at which the solve is considered converged
pub const DEFAULT_PRECISION: f64 = 1e-8;

/// Default iteration cap
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

/// Symmetric positive definite system solved with Jacobi preconditioned Conjugate Gradients
#[derive(Clone, Debug)]
pub struct PcgProblem {
    matrix: SparseMatrix,
    b: Vec<f64>,
    v: Vec<f64>,
    precision: f64,
    max_iterations: usize,
}

impl PcgProblem {
    pub fn matrix(&self) -> &SparseMatrix {
        &self.matrix
    }

    pub fn rhs(&self) -> &[f64] {
        &self.b
    }
}

impl LinearProblem for PcgProblem {
    fn create(dimension: usize, _bandwidth: usize) -> Self {
        Self {
            matrix: SparseMatrix::new(dimension),
            b: vec![0.0; dimension],
            v: vec![0.0; dimension],
            precision: DEFAULT_PRECISION,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    fn dimension(&self) -> usize {
        self.matrix.dimension
    }

    fn get(&self, row: usize, col: usize) -> f64 {
        self.matrix.get([row, col])
    }

    fn put(&mut self, value: f64, row: usize, col: usize) {
        self.matrix.set([row, col], value);
    }

    fn add_rhs(&mut self, i: usize, value: f64) {
        self.b[i] += value;
    }

    fn set_initial(&mut self, i: usize, value: f64) {
        self.v[i] = value;
    }

    fn set_limits(&mut self, precision: f64, max_iterations: usize) {
        self.precision = precision;
        self.max_iterations = max_iterations;
    }

    fn solve(&mut self) -> Result<Vec<f64>> {
        let n = self.matrix.dimension;

        let b_norm = norm(&self.b);
        if b_norm == 0.0 {
            return Ok(vec![0.0; n]);
        }

        // M^{-1} = 1 / diag(A)
        let inv_diag: Vec<f64> = self
            .matrix
            .diagonal()
            .iter()
            .map(|&d| if d.abs() > 1e-300 { 1.0 / d } else { 1.0 })
            .collect();

        let mut x = self.v.clone();
        let mut ap = vec![0.0; n];
        self.matrix.mul_vec(&x, &mut ap);
        let mut r: Vec<f64> = self.b.iter().zip(&ap).map(|(bi, api)| bi - api).collect();
        let mut z: Vec<f64> = r.iter().zip(&inv_diag).map(|(ri, mi)| ri * mi).collect();
        let mut p = z.clone();
        let mut rz = dot(&r, &z);

        let mut residual = norm(&r) / b_norm;
        for iteration in 0..self.max_iterations {
            if residual < self.precision {
                log::debug!(
                    "PCG converged after {} iterations (residual: {:.3e})",
                    iteration,
                    residual
                );
                return Ok(x);
            }

            self.matrix.mul_vec(&p, &mut ap);
            let pap = dot(&p, &ap);
            if pap <= 0.0 {
                // A is not positive definite along p
                return Err(PostProcError::SolverDivergence {
                    iterations: iteration,
                    residual,
                });
            }
            let alpha = rz / pap;

            for i in 0..n {
                x[i] += alpha * p[i];
                r[i] -= alpha * ap[i];
                z[i] = r[i] * inv_diag[i];
            }

            let rz_new = dot(&r, &z);
            let beta = rz_new / rz;
            rz = rz_new;

            for i in 0..n {
                p[i] = z[i] + beta * p[i];
            }

            residual = norm(&r) / b_norm;
        }

        if residual < self.precision {
            Ok(x)
        } else {
            Err(PostProcError::SolverDivergence {
                iterations: self.max_iterations,
                residual,
            })
        }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(ai, bi)| ai * bi).sum()
}

fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}
