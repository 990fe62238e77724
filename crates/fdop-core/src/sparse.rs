//! Sparse (CSR) and banded matrix materialization.
//!
//! Both types are built from a dense matrix or a leaf's own entries and
//! always allocate a fresh result; they never alias operator storage.

use crate::error::{check_len, OperatorError};
use crate::scalar::Scalar;
use ndarray::Array2;

/// Compressed sparse row matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseMatrix<T> {
    rows: usize,
    cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<T>,
}

impl<T: Scalar> SparseMatrix<T> {
    /// Keep every non-zero entry of a dense matrix.
    pub fn from_dense(a: &Array2<T>) -> Self {
        let (rows, cols) = a.dim();
        let mut row_ptr = Vec::with_capacity(rows + 1);
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(0);
        for row in a.rows() {
            for (j, v) in row.iter().enumerate() {
                if *v != T::zero() {
                    col_idx.push(j);
                    values.push(*v);
                }
            }
            row_ptr.push(values.len());
        }
        Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Stored entries of one row as `(col, value)` pairs.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        let (start, end) = match (self.row_ptr.get(i), self.row_ptr.get(i + 1)) {
            (Some(&s), Some(&e)) => (s, e),
            _ => (0, 0),
        };
        self.col_idx[start..end]
            .iter()
            .copied()
            .zip(self.values[start..end].iter().copied())
    }

    /// `y = A x`.
    pub fn matvec_into(&self, x: &[T], y: &mut [T]) -> Result<(), OperatorError> {
        check_len("apply", self.cols, x.len())?;
        check_len("apply", self.rows, y.len())?;
        for (i, yi) in y.iter_mut().enumerate() {
            *yi = self.row(i).fold(T::zero(), |acc, (j, v)| acc + v * x[j]);
        }
        Ok(())
    }

    /// Expand back into a dense matrix.
    pub fn to_dense(&self) -> Array2<T> {
        let mut a = Array2::zeros((self.rows, self.cols));
        for i in 0..self.rows {
            for (j, v) in self.row(i) {
                a[[i, j]] = v;
            }
        }
        a
    }
}

/// Banded matrix in LAPACK-style band storage.
///
/// Entry `A[i, j]` with `-lower <= j - i <= upper` lives at
/// `data[upper + i - j, j]`.
#[derive(Clone, Debug, PartialEq)]
pub struct BandedMatrix<T> {
    rows: usize,
    cols: usize,
    lower: usize,
    upper: usize,
    data: Array2<T>,
}

impl<T: Scalar> BandedMatrix<T> {
    /// Detect the bandwidths of a dense matrix and pack it.
    pub fn from_dense(a: &Array2<T>) -> Self {
        let (lower, upper) = detect_bandwidths(a);
        Self::from_dense_with_bands(a, lower, upper)
    }

    /// Pack a dense matrix using known bandwidths.
    ///
    /// Entries outside the band are dropped.
    pub fn from_dense_with_bands(a: &Array2<T>, lower: usize, upper: usize) -> Self {
        let (rows, cols) = a.dim();
        let mut data = Array2::zeros((lower + upper + 1, cols));
        for j in 0..cols {
            let i_start = j.saturating_sub(upper);
            let i_end = (j + lower + 1).min(rows);
            for i in i_start..i_end {
                data[[upper + i - j, j]] = a[[i, j]];
            }
        }
        Self {
            rows,
            cols,
            lower,
            upper,
            data,
        }
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// `(lower, upper)` bandwidths.
    pub fn bandwidths(&self) -> (usize, usize) {
        (self.lower, self.upper)
    }

    /// Element `A[i, j]`; zero outside the band.
    pub fn get(&self, i: usize, j: usize) -> T {
        if i >= self.rows || j >= self.cols || i > j + self.lower || j > i + self.upper {
            return T::zero();
        }
        self.data[[self.upper + i - j, j]]
    }

    /// `y = A x`.
    pub fn matvec_into(&self, x: &[T], y: &mut [T]) -> Result<(), OperatorError> {
        check_len("apply", self.cols, x.len())?;
        check_len("apply", self.rows, y.len())?;
        for (i, yi) in y.iter_mut().enumerate() {
            let j_start = i.saturating_sub(self.lower);
            let j_end = (i + self.upper + 1).min(self.cols);
            *yi = (j_start..j_end).fold(T::zero(), |acc, j| acc + self.get(i, j) * x[j]);
        }
        Ok(())
    }

    /// Expand back into a dense matrix.
    pub fn to_dense(&self) -> Array2<T> {
        Array2::from_shape_fn((self.rows, self.cols), |(i, j)| self.get(i, j))
    }
}

/// Smallest `(lower, upper)` such that every non-zero lies in the band.
pub fn detect_bandwidths<T: Scalar>(a: &Array2<T>) -> (usize, usize) {
    let mut lower = 0;
    let mut upper = 0;
    for ((i, j), v) in a.indexed_iter() {
        if *v == T::zero() {
            continue;
        }
        if i > j {
            lower = lower.max(i - j);
        } else {
            upper = upper.max(j - i);
        }
    }
    (lower, upper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn tridiagonal() -> Array2<f64> {
        array![
            [-2.0, 1.0, 0.0, 0.0],
            [1.0, -2.0, 1.0, 0.0],
            [0.0, 1.0, -2.0, 1.0],
            [0.0, 0.0, 1.0, -2.0]
        ]
    }

    #[test]
    fn csr_keeps_nonzeros() {
        let s = SparseMatrix::from_dense(&tridiagonal());
        assert_eq!(s.nnz(), 10);
        assert_eq!(s.to_dense(), tridiagonal());
        let row1: Vec<_> = s.row(1).collect();
        assert_eq!(row1, vec![(0, 1.0), (1, -2.0), (2, 1.0)]);
    }

    #[test]
    fn csr_matvec() {
        let s = SparseMatrix::from_dense(&tridiagonal());
        let mut y = [0.0; 4];
        s.matvec_into(&[1.0, 1.0, 1.0, 1.0], &mut y).unwrap();
        assert_eq!(y, [-1.0, 0.0, 0.0, -1.0]);
    }

    #[test]
    fn banded_detects_tridiagonal() {
        let b = BandedMatrix::from_dense(&tridiagonal());
        assert_eq!(b.bandwidths(), (1, 1));
        assert_eq!(b.to_dense(), tridiagonal());
        assert_eq!(b.get(0, 3), 0.0);
    }

    #[test]
    fn banded_rectangular_shift() {
        // 2x4 matrix with entries on the superdiagonals 0..=2.
        let a = array![[1.0, -2.0, 1.0, 0.0], [0.0, 1.0, -2.0, 1.0]];
        let b = BandedMatrix::from_dense(&a);
        assert_eq!(b.bandwidths(), (0, 2));
        assert_eq!(b.to_dense(), a);
        let mut y = [0.0; 2];
        b.matvec_into(&[0.0, 1.0, 4.0, 9.0], &mut y).unwrap();
        assert_eq!(y, [2.0, 2.0]);
    }

    #[test]
    fn matvec_rejects_wrong_length() {
        let s = SparseMatrix::from_dense(&tridiagonal());
        let mut y = [0.0; 4];
        assert!(s.matvec_into(&[1.0; 3], &mut y).is_err());
    }
}
