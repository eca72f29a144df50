use rand::Rng;
use serde::Serialize;
use std::fmt;
use std::ops::Index;

use crate::error::{MatrixError, Shape};

/// Dense row-major matrix of `f64`.
///
/// Every algebraic operation allocates and returns a new matrix; `set` and
/// `fill_random` are the only methods that mutate in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Builds a matrix whose element `(i, j)` is `generator(i, j)`.
    pub fn filling<F>(mut generator: F, rows: usize, cols: usize) -> Matrix
    where
        F: FnMut(usize, usize) -> f64,
    {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(generator(i, j));
            }
        }
        Matrix { rows, cols, data }
    }

    /// Builds a matrix from a flat row-major sequence, converting each value
    /// to `f64`. The sequence must hold exactly `rows * cols` values.
    pub fn from_flat<I, T>(values: I, rows: usize, cols: usize) -> Result<Matrix, MatrixError>
    where
        I: IntoIterator<Item = T>,
        T: Into<f64>,
    {
        let data: Vec<f64> = values.into_iter().map(Into::into).collect();
        if data.len() != rows * cols {
            return Err(MatrixError::LengthMismatch {
                expected: rows * cols,
                actual: data.len(),
            });
        }
        Ok(Matrix { rows, cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> Shape {
        Shape {
            rows: self.rows,
            cols: self.cols,
        }
    }

    /// Elements in storage (row-major) order.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    fn offset(&self, i: usize, j: usize) -> usize {
        assert!(
            i < self.rows && j < self.cols,
            "index ({}, {}) out of range for {}x{} matrix",
            i,
            j,
            self.rows,
            self.cols
        );
        i * self.cols + j
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[self.offset(i, j)]
    }

    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        let k = self.offset(i, j);
        self.data[k] = value;
    }

    /// Overwrites every element with a uniform draw from `[min, max)`.
    pub fn fill_random<R: Rng + ?Sized>(&mut self, min: f64, max: f64, rng: &mut R) {
        for x in self.data.iter_mut() {
            *x = rng.gen::<f64>() * (max - min) + min;
        }
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&x| functor(x)).collect(),
        }
    }

    /// Elementwise combination of two equally-shaped matrices.
    fn zip_with<F>(&self, other: &Matrix, op: &'static str, f: F) -> Result<Matrix, MatrixError>
    where
        F: Fn(f64, f64) -> f64,
    {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(self.mismatch(op, other));
        }
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }

    fn mismatch(&self, op: &'static str, other: &Matrix) -> MatrixError {
        MatrixError::DimensionMismatch {
            op,
            left: self.shape(),
            right: other.shape(),
        }
    }

    /// Standard matrix product `self · rhs`; requires `self.cols == rhs.rows`.
    pub fn mul(&self, rhs: &Matrix) -> Result<Matrix, MatrixError> {
        if self.cols != rhs.rows {
            return Err(self.mismatch("mul", rhs));
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);
        for i in 0..self.rows {
            for j in 0..rhs.cols {
                let mut sum = 0.0;
                for k in 0..self.cols {
                    sum += self.data[i * self.cols + k] * rhs.data[k * rhs.cols + j];
                }
                res.data[i * rhs.cols + j] = sum;
            }
        }
        Ok(res)
    }

    pub fn mul_scalar(&self, k: f64) -> Matrix {
        self.map(|x| x * k)
    }

    pub fn add(&self, rhs: &Matrix) -> Result<Matrix, MatrixError> {
        self.zip_with(rhs, "add", |a, b| a + b)
    }

    pub fn add_scalar(&self, k: f64) -> Matrix {
        self.map(|x| x + k)
    }

    pub fn sub(&self, rhs: &Matrix) -> Result<Matrix, MatrixError> {
        self.zip_with(rhs, "sub", |a, b| a - b)
    }

    pub fn sub_scalar(&self, k: f64) -> Matrix {
        self.map(|x| x - k)
    }

    /// Elementwise (Hadamard) product of two same-shape matrices.
    pub fn hadamard(&self, rhs: &Matrix) -> Result<Matrix, MatrixError> {
        self.zip_with(rhs, "hadamard", |a, b| a * b)
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                res.data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }
        res
    }

    /// Row index of the largest element, scanning in row-major order and
    /// only moving on a strictly greater value.
    ///
    /// On a column vector this is the index of the maximum. On wider
    /// matrices it is the row holding the global maximum, not a per-column
    /// or flat index.
    pub fn argmax(&self) -> usize {
        let Some(&first) = self.data.first() else {
            return 0;
        };
        let mut max = first;
        let mut max_row = 0;
        for (k, &x) in self.data.iter().enumerate() {
            if x > max {
                max = x;
                max_row = k / self.cols;
            }
        }
        max_row
    }

    pub fn any_nan(&self) -> bool {
        self.data.iter().any(|x| x.is_nan())
    }

    /// Renders the elements as `[a,b,c,...]` in storage order.
    pub fn to_serialized_string(&self) -> String {
        let body: Vec<String> = self.data.iter().map(|x| x.to_string()).collect();
        format!("[{}]", body.join(","))
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.data[self.offset(i, j)]
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_serialized_string())
    }
}
