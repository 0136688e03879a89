//! Compute kernels for the Cannon multiply.
//!
//! Everything in here works on flat, row-major slices and knows nothing about
//! processes or topologies, so it can be tested and benchmarked on its own.

use num_traits::{FromPrimitive, Num, NumAssign, ToPrimitive};
use std::fmt::Debug;
use thiserror::Error;

pub mod block_codec;
pub mod block_matmul;

pub use block_codec::{from_blocks, to_blocks};
pub use block_matmul::{matmul, matmul_accumulate};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },
    #[error("Matrix dimension {dim} is not divisible by grid side {grid_side}")]
    IndivisibleDimension { dim: usize, grid_side: usize },
}

pub type Result<T> = std::result::Result<T, KernelError>;

/// Trait bound for elements that can be processed by kernels.
/// This mirrors `MatrixElem` in the core crate to avoid circular dependencies.
pub trait KernelElem:
    Num + NumAssign + Copy + Clone + Debug + Send + Sync + FromPrimitive + ToPrimitive + PartialOrd
{
}

impl<T> KernelElem for T where
    T: Num
        + NumAssign
        + Copy
        + Clone
        + Debug
        + Send
        + Sync
        + FromPrimitive
        + ToPrimitive
        + PartialOrd
{
}

pub(crate) fn check_len(data_len: usize, dim: usize) -> Result<()> {
    if data_len != dim * dim {
        return Err(KernelError::ShapeMismatch {
            expected: vec![dim, dim],
            got: vec![data_len],
        });
    }
    Ok(())
}
