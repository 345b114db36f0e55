use std::collections::BTreeMap;

use nalgebra::DMatrix;

/// Wrapper around a BTreeMap to store square-symmetric matrices in a sparse data structure
///
/// Only the upper triangle is stored: row/col order does not matter for any accessor.
#[derive(Clone, Debug)]
pub struct SparseMatrix {
    /// Size of the square matrix
    pub dimension: usize,
    /// Matrix Entries
    entries: BTreeMap<[u32; 2], f64>,
}

impl SparseMatrix {
    pub fn new(dimension: usize) -> Self {
        assert!(
            dimension <= (u32::MAX as usize),
            "Matrix Dimension cannot exceed the size of a u32!"
        );

        Self {
            dimension,
            entries: BTreeMap::new(),
        }
    }

    pub fn num_entries(&self) -> usize {
        let num_diag = self.entries.keys().filter(|[i, j]| i == j).count();
        2 * self.entries.len() - num_diag
    }

    fn coordinates(&self, row_idx: usize, col_idx: usize) -> [u32; 2] {
        assert!(
            row_idx < self.dimension,
            "row_idx exceeded matrix dimension; cannot access value!"
        );
        assert!(
            col_idx < self.dimension,
            "col_idx exceeded matrix dimension; cannot access value!"
        );

        // dimension fits in a u32, so the indices do too
        if row_idx <= col_idx {
            [row_idx as u32, col_idx as u32]
        } else {
            [col_idx as u32, row_idx as u32]
        }
    }

    /// Add a value into the matrix (accumulating with any existing entry)
    pub fn insert(&mut self, [row_idx, col_idx]: [usize; 2], value: f64) {
        let coordinates = self.coordinates(row_idx, col_idx);
        self.entries
            .entry(coordinates)
            .and_modify(|current_value| *current_value += value)
            .or_insert(value);
    }

    /// Overwrite an entry
    pub fn set(&mut self, [row_idx, col_idx]: [usize; 2], value: f64) {
        let coordinates = self.coordinates(row_idx, col_idx);
        self.entries.insert(coordinates, value);
    }

    /// Value of an entry (zero if it was never set)
    pub fn get(&self, [row_idx, col_idx]: [usize; 2]) -> f64 {
        let coordinates = self.coordinates(row_idx, col_idx);
        self.entries.get(&coordinates).copied().unwrap_or(0.0)
    }

    /// Iterate over the upper triangle of the matrix.
    pub fn iter_upper_tri(&self) -> impl Iterator<Item = ([usize; 2], f64)> + '_ {
        self.entries
            .iter()
            .map(|(coords, value)| ([coords[0] as usize, coords[1] as usize], *value))
    }

    /// Diagonal entries
    pub fn diagonal(&self) -> Vec<f64> {
        let mut diag = vec![0.0; self.dimension];
        for ([r, c], v) in self.iter_upper_tri() {
            if r == c {
                diag[r] = v;
            }
        }
        diag
    }

    /// Compute `y = A x`
    pub fn mul_vec(&self, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.dimension, "Vector length must match matrix dimension!");
        assert_eq!(y.len(), self.dimension, "Vector length must match matrix dimension!");

        y.iter_mut().for_each(|yi| *yi = 0.0);
        for ([r, c], v) in self.iter_upper_tri() {
            y[r] += v * x[c];
            if r != c {
                y[c] += v * x[r];
            }
        }
    }
}

impl From<SparseMatrix> for DMatrix<f64> {
    fn from(sm: SparseMatrix) -> Self {
        let mut dense = DMatrix::zeros(sm.dimension, sm.dimension);

        for ([r, c], v) in sm.iter_upper_tri() {
            dense[(r, c)] = v;
            dense[(c, r)] = v;
        }

        dense
    }
}
