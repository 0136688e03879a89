//! Cannon's block-shift multiplication, one instance per rank.
//!
//! On a `q x q` periodic grid, rank `(row, col)` starts with blocks
//! `A[row][col]` and `B[row][col]`. After skewing, it holds
//! `A[row][(col + row) mod q]` and `B[(row + col) mod q][col]`, whose product
//! is one term of `C[row][col]`. Each of the `q` rounds then multiplies the
//! held pair into the accumulator and passes `A` one step left and `B` one
//! step up, which brings in the next term.

use super::backend::Communicator;
use super::topology::{Axis, ProcessContext};
use crate::error::{Error, Result};
use crate::matrix::MatrixElem;
use cannon_kernels::matmul_accumulate;
use tracing::debug;

const TAG_SKEW_A: u32 = 1;
const TAG_SKEW_B: u32 = 2;
const TAG_SHIFT_A: u32 = 3;
const TAG_SHIFT_B: u32 = 4;

/// Where the engine is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CannonState {
    /// Blocks are still in their scattered positions.
    Skewing,
    /// Operands are aligned for `round`.
    Iterating { round: usize },
    /// The accumulator holds the final block of `C`.
    Done,
}

/// Per-rank Cannon state: the two operand blocks it currently owns and its accumulator.
///
/// Operand blocks are owned values. A shift gives the current block away and
/// takes ownership of the one received in exchange.
pub struct CannonEngine<T: MatrixElem> {
    ctx: ProcessContext,
    block_dim: usize,
    a: Vec<T>,
    b: Vec<T>,
    c: Vec<T>,
    state: CannonState,
    rounds_completed: usize,
}

impl<T: MatrixElem> CannonEngine<T> {
    /// Creates an engine from the scattered blocks of `A` and `B`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ShapeMismatch` if either block is not `block_dim x block_dim`.
    pub fn new(ctx: ProcessContext, block_dim: usize, a: Vec<T>, b: Vec<T>) -> Result<Self> {
        let len = block_dim * block_dim;
        for block in [&a, &b] {
            if block.len() != len {
                return Err(Error::ShapeMismatch {
                    expected: vec![block_dim, block_dim],
                    got: vec![block.len()],
                });
            }
        }

        Ok(Self {
            ctx,
            block_dim,
            a,
            b,
            c: vec![T::zero(); len],
            state: CannonState::Skewing,
            rounds_completed: 0,
        })
    }

    pub fn state(&self) -> CannonState {
        self.state
    }

    pub fn context(&self) -> &ProcessContext {
        &self.ctx
    }

    pub fn block_dim(&self) -> usize {
        self.block_dim
    }

    pub fn a_block(&self) -> &[T] {
        &self.a
    }

    pub fn b_block(&self) -> &[T] {
        &self.b
    }

    pub fn accumulator(&self) -> &[T] {
        &self.c
    }

    pub fn rounds_completed(&self) -> usize {
        self.rounds_completed
    }

    /// Number of rounds a full run performs: the grid side.
    pub fn total_rounds(&self) -> usize {
        self.ctx.grid_side
    }

    /// Initial alignment: rotates `A` left by `row` and `B` up by `col`.
    ///
    /// A distance of zero is skipped. Every rank in a row shares the same `A`
    /// distance (and every rank in a column the same `B` distance), so the
    /// exchanges pair up.
    pub fn skew<C: Communicator>(&mut self, comm: &C) -> Result<()> {
        if self.state != CannonState::Skewing {
            return Err(Error::InvalidState(format!(
                "skew called in state {:?}",
                self.state
            )));
        }

        let ProcessContext { row, col, .. } = self.ctx;
        if row > 0 {
            let (source, dest) = self.ctx.shift(Axis::Col, -(row as isize))?;
            let block = std::mem::take(&mut self.a);
            self.a = self.exchange(comm, block, dest, source, TAG_SKEW_A)?;
        }
        if col > 0 {
            let (source, dest) = self.ctx.shift(Axis::Row, -(col as isize))?;
            let block = std::mem::take(&mut self.b);
            self.b = self.exchange(comm, block, dest, source, TAG_SKEW_B)?;
        }

        debug!(rank = self.ctx.rank, row, col, "skewed");
        self.state = CannonState::Iterating { round: 0 };
        Ok(())
    }

    /// One round: multiply-accumulate, then shift `A` left and `B` up by one.
    ///
    /// Both exchanges complete before this returns, so the next round always
    /// multiplies the shifted operands.
    pub fn step<C: Communicator>(&mut self, comm: &C) -> Result<()> {
        let round = match self.state {
            CannonState::Iterating { round } => round,
            other => {
                return Err(Error::InvalidState(format!(
                    "step called in state {other:?}"
                )))
            }
        };

        matmul_accumulate(&self.a, &self.b, &mut self.c, self.block_dim)?;
        self.rounds_completed += 1;

        let neighbors = self.ctx.neighbors;
        let block = std::mem::take(&mut self.a);
        self.a = self.exchange(comm, block, neighbors.left, neighbors.right, TAG_SHIFT_A)?;
        let block = std::mem::take(&mut self.b);
        self.b = self.exchange(comm, block, neighbors.up, neighbors.down, TAG_SHIFT_B)?;

        debug!(rank = self.ctx.rank, round, "round complete");
        self.state = if round + 1 >= self.total_rounds() {
            CannonState::Done
        } else {
            CannonState::Iterating { round: round + 1 }
        };
        Ok(())
    }

    /// Drives the engine from its current state to [`CannonState::Done`].
    pub fn run<C: Communicator>(&mut self, comm: &C) -> Result<()> {
        if self.state == CannonState::Skewing {
            self.skew(comm)?;
        }
        while let CannonState::Iterating { .. } = self.state {
            self.step(comm)?;
        }
        Ok(())
    }

    /// Takes the finished block of `C`.
    pub fn into_accumulator(self) -> Result<Vec<T>> {
        if self.state != CannonState::Done {
            return Err(Error::InvalidState(format!(
                "accumulator requested in state {:?}",
                self.state
            )));
        }
        Ok(self.c)
    }

    fn exchange<C: Communicator>(
        &self,
        comm: &C,
        block: Vec<T>,
        dest: usize,
        source: usize,
        tag: u32,
    ) -> Result<Vec<T>> {
        let received: Vec<T> = comm.send_recv(block, dest, tag, source, tag)?;
        if received.len() != self.block_dim * self.block_dim {
            return Err(Error::ShapeMismatch {
                expected: vec![self.block_dim, self.block_dim],
                got: vec![received.len()],
            });
        }
        Ok(received)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributed::thread_comm::ThreadComm;
    use crate::distributed::topology::ProcessGrid;

    fn single_rank_engine(a: Vec<i64>, b: Vec<i64>, block_dim: usize) -> CannonEngine<i64> {
        let ctx = ProcessGrid::new(1).unwrap().context(0).unwrap();
        CannonEngine::new(ctx, block_dim, a, b).unwrap()
    }

    #[test]
    fn test_new_rejects_wrong_block_size() {
        let ctx = ProcessGrid::new(1).unwrap().context(0).unwrap();
        let err = CannonEngine::new(ctx, 2, vec![1i64; 4], vec![1i64; 3]);
        assert!(matches!(err, Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_single_rank_lifecycle() {
        let world = ThreadComm::world(1);
        let comm = &world[0];
        let mut engine = single_rank_engine(vec![1, 2, 3, 4], vec![5, 6, 7, 8], 2);
        assert_eq!(engine.state(), CannonState::Skewing);

        engine.skew(comm).unwrap();
        assert_eq!(engine.state(), CannonState::Iterating { round: 0 });

        engine.step(comm).unwrap();
        assert_eq!(engine.state(), CannonState::Done);
        assert_eq!(engine.rounds_completed(), 1);
        assert_eq!(engine.into_accumulator().unwrap(), vec![19, 22, 43, 50]);
    }

    #[test]
    fn test_out_of_order_calls_are_rejected() {
        let world = ThreadComm::world(1);
        let comm = &world[0];
        let mut engine = single_rank_engine(vec![1], vec![1], 1);

        assert!(matches!(engine.step(comm), Err(Error::InvalidState(_))));
        engine.run(comm).unwrap();
        assert!(matches!(engine.skew(comm), Err(Error::InvalidState(_))));
        assert!(matches!(engine.step(comm), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_accumulator_unavailable_before_done() {
        let engine = single_rank_engine(vec![1], vec![1], 1);
        assert!(matches!(
            engine.into_accumulator(),
            Err(Error::InvalidState(_))
        ));
    }
}
