// THEORY:
// The `matrix` module is the primitive layer under the channel PCA engine.
// It is deliberately small: a dense, row-major `f64` matrix with exactly the
// operations the engine actually composes — construction with size
// validation, element access, multiplication, and transpose. The covariance
// matrices it holds are at most `width x width`, so the straightforward
// triple loop with a transposed right-hand side is fast enough and keeps the
// layer dependency-free.
//
// Key architectural principles:
// 1.  **Row-major storage**: matches the layout of a de-interleaved image
//     channel (row after row of pixel columns), so channel buffers become
//     matrices without copying games.
// 2.  **Validated construction**: `from_vec` rejects any data length that
//     disagrees with `rows * cols`, so every downstream operation can index
//     without bounds anxiety.
// 3.  **Pure values**: operations return new matrices; nothing mutates a
//     shared operand. The engine above stays purely functional.

use crate::error::{PcaError, Result};

/// A dense, row-major matrix of `f64` values.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Creates a matrix from a row-major data vector.
    /// Fails if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        let expected = rows * cols;
        if data.len() != expected {
            return Err(PcaError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Creates a matrix of zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Creates an `n x n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.data[i * n + i] = 1.0;
        }
        m
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Borrows the underlying row-major storage.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Returns the element at (row, col). Callers index within bounds;
    /// out-of-range access panics like slice indexing does.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    /// Matrix multiplication `self * other`.
    /// Fails if the inner dimensions disagree.
    pub fn matmul(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.rows {
            return Err(PcaError::DimensionMismatch {
                left: self.cols,
                right: other.rows,
            });
        }

        // Transposing the right-hand side first turns the inner loop into a
        // contiguous dot product, which the optimizer vectorizes.
        let other_t = other.transpose();
        let mut out = Matrix::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            let lhs_row = &self.data[i * self.cols..(i + 1) * self.cols];
            for j in 0..other.cols {
                let rhs_row = &other_t.data[j * other_t.cols..(j + 1) * other_t.cols];
                let mut sum = 0.0;
                for (a, b) in lhs_row.iter().zip(rhs_row.iter()) {
                    sum += a * b;
                }
                out.data[i * out.cols + j] = sum;
            }
        }
        Ok(out)
    }

    /// Returns the transpose of this matrix.
    pub fn transpose(&self) -> Matrix {
        let mut out = Matrix::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                out.data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }
        out
    }

    /// Copies columns `[0, k)` into a new `rows x k` matrix.
    pub fn left_columns(&self, k: usize) -> Matrix {
        let k = k.min(self.cols);
        let mut out = Matrix::zeros(self.rows, k);
        for i in 0..self.rows {
            for j in 0..k {
                out.data[i * k + j] = self.data[i * self.cols + j];
            }
        }
        out
    }
}
