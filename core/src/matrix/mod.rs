//! Square integer matrices, the reference multiply, and the result verifier.
//!
//! A [`Matrix`] is an `N x N` grid stored as a flat, row-major `Vec<T>`. In a
//! Cannon run whole matrices only ever exist on the root rank: they are
//! generated there, cut into blocks for distribution, reassembled after the
//! gather, and checked against the sequential product.
//!
//! ```rust
//! use cannon::matrix::Matrix;
//!
//! let a = Matrix::<i64>::new(vec![1, 2, 3, 4], 2).unwrap();
//! let id = Matrix::<i64>::identity(2);
//!
//! assert_eq!(a.matmul(&id).unwrap(), a);
//! assert_eq!(a.get(1, 0), Some(&3));
//! ```

use crate::error::{Error, Result};
use num_traits::{FromPrimitive, Num, NumAssign, ToPrimitive};
use rand::Rng;
use rayon::prelude::*;
use serde::Serialize;
use std::fmt::{self, Debug, Display};

/// Trait bound for elements that can be stored in a Matrix.
///
/// # Requirements
/// - `Copy`: blocks are plain contiguous buffers.
/// - `Num + NumAssign`: the multiply-accumulate arithmetic.
/// - `Send + Sync + 'static`: blocks move between rank threads as owned messages.
pub trait MatrixElem:
    Num
    + NumAssign
    + Copy
    + Clone
    + Debug
    + Display
    + Send
    + Sync
    + FromPrimitive
    + ToPrimitive
    + PartialOrd
    + 'static
{
}

impl<T> MatrixElem for T where
    T: Num
        + NumAssign
        + Copy
        + Clone
        + Debug
        + Display
        + Send
        + Sync
        + FromPrimitive
        + ToPrimitive
        + PartialOrd
        + 'static
{
}

/// A square, row-major matrix.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Matrix<T: MatrixElem> {
    dim: usize,
    data: Vec<T>,
}

impl<T: MatrixElem> Matrix<T> {
    /// Creates a matrix from row-major data.
    ///
    /// # Errors
    ///
    /// Returns `Error::ShapeMismatch` if `data.len() != dim * dim`.
    pub fn new(data: Vec<T>, dim: usize) -> Result<Self> {
        if dim.checked_mul(dim) != Some(data.len()) {
            return Err(Error::ShapeMismatch {
                expected: vec![dim, dim],
                got: vec![data.len()],
            });
        }
        Ok(Self { dim, data })
    }

    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            data: vec![T::zero(); dim * dim],
        }
    }

    pub fn identity(dim: usize) -> Self {
        Self::from_fn(dim, |i, j| if i == j { T::one() } else { T::zero() })
    }

    /// Builds a matrix by evaluating `f(row, col)` for every element.
    pub fn from_fn(dim: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(dim * dim);
        for i in 0..dim {
            for j in 0..dim {
                data.push(f(i, j));
            }
        }
        Self { dim, data }
    }

    /// Fills a matrix with uniformly random digits `0..=9`.
    pub fn random<R: Rng>(dim: usize, rng: &mut R) -> Self {
        Self::from_fn(dim, |_, _| digit(rng.random_range(0..10u32)))
    }

    /// Deterministic fill: element `(i, j)` is `(i * dim + j + offset) mod 10`.
    pub fn sequence(dim: usize, offset: usize) -> Self {
        Self::from_fn(dim, |i, j| digit(((i * dim + j + offset) % 10) as u32))
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row >= self.dim || col >= self.dim {
            return None;
        }
        self.data.get(row * self.dim + col)
    }

    /// Sequential whole-matrix product, the reference result for a distributed run.
    pub fn matmul(&self, rhs: &Matrix<T>) -> Result<Matrix<T>> {
        if self.dim != rhs.dim {
            return Err(Error::ShapeMismatch {
                expected: vec![self.dim, self.dim],
                got: vec![rhs.dim, rhs.dim],
            });
        }
        let data = cannon_kernels::matmul(&self.data, &rhs.data, self.dim)?;
        Ok(Self {
            dim: self.dim,
            data,
        })
    }

    /// Block-major copy of this matrix for a `grid_side x grid_side` grid.
    ///
    /// See [`cannon_kernels::to_blocks`] for the exact ordering.
    pub fn to_blocks(&self, grid_side: usize) -> Result<Vec<T>> {
        Ok(cannon_kernels::to_blocks(&self.data, self.dim, grid_side)?)
    }

    /// Reassembles a matrix from a block-major buffer.
    pub fn from_blocks(blocked: &[T], dim: usize, grid_side: usize) -> Result<Self> {
        let data = cannon_kernels::from_blocks(blocked, dim, grid_side)?;
        Ok(Self { dim, data })
    }

    /// Number of elements that differ between `self` and `other`.
    ///
    /// Integer arithmetic is exact, so a correct distributed product has zero
    /// mismatches against the sequential one regardless of summation order.
    pub fn count_mismatches(&self, other: &Matrix<T>) -> Result<usize> {
        if self.dim != other.dim {
            return Err(Error::ShapeMismatch {
                expected: vec![self.dim, self.dim],
                got: vec![other.dim, other.dim],
            });
        }
        Ok(self
            .data
            .par_iter()
            .zip(other.data.par_iter())
            .filter(|(x, y)| x != y)
            .count())
    }
}

impl<T: MatrixElem> Display for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dim == 0 {
            return Ok(());
        }
        for row in self.data.chunks_exact(self.dim) {
            let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

// Digits always fit in any integer element type.
fn digit<T: MatrixElem>(v: u32) -> T {
    T::from_u32(v).unwrap_or_else(T::zero)
}
