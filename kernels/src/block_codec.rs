use crate::{check_len, KernelElem, KernelError, Result};
use rayon::prelude::*;

/// Reorders a row-major `dim x dim` matrix into block-major order.
///
/// The matrix is cut into a `grid_side x grid_side` grid of `n x n` blocks
/// (`n = dim / grid_side`). Blocks are emitted in row-major order over the
/// grid cells, and each block is itself row-major. Block `p` of the output is
/// therefore the contiguous chunk `[p * n * n, (p + 1) * n * n)`, which is what
/// a scatter of equal-sized chunks hands to rank `p`.
pub fn to_blocks<T>(flat: &[T], dim: usize, grid_side: usize) -> Result<Vec<T>>
where
    T: KernelElem,
{
    let n = block_dim(dim, grid_side)?;
    check_len(flat.len(), dim)?;

    let mut out = vec![T::zero(); dim * dim];
    if dim == 0 {
        return Ok(out);
    }

    // One output chunk per grid cell, filled independently.
    out.as_mut_slice()
        .par_chunks_mut(n * n)
        .enumerate()
        .for_each(|(cell, block)| {
            let block_row = cell / grid_side;
            let block_col = cell % grid_side;
            for (i, block_line) in block.chunks_exact_mut(n).enumerate() {
                let start = (block_row * n + i) * dim + block_col * n;
                block_line.copy_from_slice(&flat[start..start + n]);
            }
        });

    Ok(out)
}

/// Inverse of [`to_blocks`]: reassembles a row-major matrix from block-major data.
pub fn from_blocks<T>(blocked: &[T], dim: usize, grid_side: usize) -> Result<Vec<T>>
where
    T: KernelElem,
{
    let n = block_dim(dim, grid_side)?;
    check_len(blocked.len(), dim)?;

    let mut out = vec![T::zero(); dim * dim];
    if dim == 0 {
        return Ok(out);
    }

    // Here we parallelize over the rows of the OUTPUT matrix instead.
    // Row `r` is stitched together from line `r % n` of every block in grid row `r / n`.
    out.as_mut_slice()
        .par_chunks_mut(dim)
        .enumerate()
        .for_each(|(r, out_row)| {
            let block_row = r / n;
            let i = r % n;
            for (block_col, out_seg) in out_row.chunks_exact_mut(n).enumerate() {
                let cell = block_row * grid_side + block_col;
                let start = cell * n * n + i * n;
                out_seg.copy_from_slice(&blocked[start..start + n]);
            }
        });

    Ok(out)
}

fn block_dim(dim: usize, grid_side: usize) -> Result<usize> {
    if grid_side == 0 || dim % grid_side != 0 {
        return Err(KernelError::IndivisibleDimension { dim, grid_side });
    }
    Ok(dim / grid_side)
}
