use super::backend::{Communicator, ROOT};
use crate::error::{Error, Result};
use crate::matrix::{Matrix, MatrixElem};
use tracing::debug;

/// Hands every rank its block of a matrix that only exists on [`ROOT`].
///
/// The root encodes the matrix block-major for a `grid_side x grid_side` grid
/// and scatters one `block_dim x block_dim` block per rank, in rank order.
/// Other ranks pass `None`.
pub fn scatter_matrix<C, T>(
    comm: &C,
    grid_side: usize,
    matrix: Option<&Matrix<T>>,
    block_dim: usize,
) -> Result<Vec<T>>
where
    C: Communicator,
    T: MatrixElem,
{
    let blocked = if comm.rank() == ROOT {
        let matrix = matrix.ok_or(Error::MissingRootData {
            root: ROOT,
            operation: "scatter_matrix",
        })?;
        Some(matrix.to_blocks(grid_side)?)
    } else {
        None
    };

    let block = comm.scatter(ROOT, blocked.as_deref(), block_dim * block_dim)?;
    debug!(rank = comm.rank(), len = block.len(), "received block");
    Ok(block)
}

/// Inverse of [`scatter_matrix`]: collects one block per rank and reassembles
/// the `dim x dim` matrix on [`ROOT`]. Returns `None` on every other rank.
pub fn gather_matrix<C, T>(
    comm: &C,
    grid_side: usize,
    dim: usize,
    block: Vec<T>,
) -> Result<Option<Matrix<T>>>
where
    C: Communicator,
    T: MatrixElem,
{
    match comm.gather(ROOT, block)? {
        Some(blocked) => Ok(Some(Matrix::from_blocks(&blocked, dim, grid_side)?)),
        None => Ok(None),
    }
}
