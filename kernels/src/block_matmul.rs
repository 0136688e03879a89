use crate::{check_len, KernelElem, Result};

/// Block multiply-accumulate: `c += a * b` for square `n x n` row-major blocks.
///
/// This is the hot loop of every Cannon round. The loop order is
/// `i` (row of `a`), `k` (shared index), `j` (column of `b`), so the inner loop
/// walks one row of `b` and one row of `c` sequentially and the value
/// `a[i][k]` stays in a register.
///
/// Integer overflow is not checked beyond what the element type does itself.
pub fn matmul_accumulate<T>(a: &[T], b: &[T], c: &mut [T], n: usize) -> Result<()>
where
    T: KernelElem,
{
    check_len(a.len(), n)?;
    check_len(b.len(), n)?;
    check_len(c.len(), n)?;
    if n == 0 {
        return Ok(());
    }

    for (a_row, c_row) in a.chunks_exact(n).zip(c.chunks_exact_mut(n)) {
        for (&a_ik, b_row) in a_row.iter().zip(b.chunks_exact(n)) {
            // Vectorizable loop
            for (c_ij, &b_kj) in c_row.iter_mut().zip(b_row.iter()) {
                *c_ij += a_ik * b_kj;
            }
        }
    }

    Ok(())
}

/// Sequential whole-matrix multiply, used as the reference result.
///
/// Same arithmetic and loop order as [`matmul_accumulate`], with no blocking
/// and a freshly zeroed output.
pub fn matmul<T>(a: &[T], b: &[T], n: usize) -> Result<Vec<T>>
where
    T: KernelElem,
{
    let mut c = vec![T::zero(); n * n];
    matmul_accumulate(a, b, &mut c, n)?;
    Ok(c)
}
