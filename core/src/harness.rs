//! End-to-end Cannon run with timing and verification.

use crate::config::{validate_dim, RunConfig};
use crate::distributed::{
    gather_matrix, launch, scatter_matrix, CannonEngine, Communicator, ProcessGrid, ROOT,
};
use crate::error::{Error, Result};
use crate::matrix::{Matrix, MatrixElem};
use serde::Serialize;
use tracing::info;

/// What the root knows after a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport<T: MatrixElem> {
    pub dim: usize,
    pub processes: usize,
    pub grid_side: usize,
    /// Wall time of the sequential reference multiply.
    pub sequential_secs: f64,
    /// Wall time of skew plus all rounds, maximum over ranks.
    pub parallel_secs: f64,
    /// Elements of the distributed result that differ from the reference.
    pub mismatches: usize,
    pub a: Matrix<T>,
    pub b: Matrix<T>,
    pub c: Matrix<T>,
}

impl<T: MatrixElem> RunReport<T> {
    pub fn is_correct(&self) -> bool {
        self.mismatches == 0
    }

    pub fn verdict(&self) -> String {
        if self.is_correct() {
            "result correct".to_string()
        } else {
            format!("{} mismatches found", self.mismatches)
        }
    }
}

struct RootInputs<T: MatrixElem> {
    a: Matrix<T>,
    b: Matrix<T>,
    expected: Matrix<T>,
    sequential_secs: f64,
}

/// The SPMD body of a Cannon run. Every rank calls this with its own communicator.
///
/// The root generates the inputs, computes the reference product, and gets
/// `Some(report)` back. Every other rank gets `None`.
///
/// # Errors
///
/// Configuration errors (non-square world, bad `N`) are raised identically on
/// every rank before any matrix is generated. Any transfer failure aborts the run.
pub fn run_cannon<C, T>(comm: &C, config: &RunConfig) -> Result<Option<RunReport<T>>>
where
    C: Communicator,
    T: MatrixElem,
{
    let grid = ProcessGrid::new(comm.size())?;
    let side = grid.side();
    let is_root = comm.rank() == ROOT;

    let dim: usize = comm.broadcast(ROOT, is_root.then_some(config.dim))?;
    validate_dim(dim, side)?;
    let block_dim = dim / side;
    let ctx = grid.context(comm.rank())?;

    let inputs = if is_root {
        info!(dim, processes = comm.size(), fill = ?config.fill, "generating matrices");
        let (a, b) = config.generate::<T>();
        let start = comm.wtime();
        let expected = a.matmul(&b)?;
        let sequential_secs = comm.wtime() - start;
        info!(sequential_secs, "sequential multiply done");
        Some(RootInputs {
            a,
            b,
            expected,
            sequential_secs,
        })
    } else {
        None
    };

    let a_block = scatter_matrix(comm, side, inputs.as_ref().map(|i| &i.a), block_dim)?;
    let b_block = scatter_matrix(comm, side, inputs.as_ref().map(|i| &i.b), block_dim)?;

    comm.barrier()?;
    let start = comm.wtime();
    let mut engine = CannonEngine::new(ctx, block_dim, a_block, b_block)?;
    engine.run(comm)?;
    comm.barrier()?;
    let elapsed = comm.wtime() - start;

    let parallel_secs = comm.reduce_max(ROOT, elapsed)?;
    let c = gather_matrix(comm, side, dim, engine.into_accumulator()?)?;

    let (Some(inputs), Some(c), Some(parallel_secs)) = (inputs, c, parallel_secs) else {
        return Ok(None);
    };
    let mismatches = inputs.expected.count_mismatches(&c)?;
    info!(parallel_secs, mismatches, "parallel multiply done");

    Ok(Some(RunReport {
        dim,
        processes: comm.size(),
        grid_side: side,
        sequential_secs: inputs.sequential_secs,
        parallel_secs,
        mismatches,
        a: inputs.a,
        b: inputs.b,
        c,
    }))
}

/// Runs [`run_cannon`] on a fresh thread world of `processes` ranks and returns the root's report.
///
/// The process count and dimension are checked before any thread starts.
pub fn run_threaded<T: MatrixElem>(processes: usize, config: &RunConfig) -> Result<RunReport<T>> {
    let grid = ProcessGrid::new(processes)?;
    config.validate(grid.side())?;

    let reports = launch(processes, |comm| run_cannon::<_, T>(&comm, config))?;
    reports
        .into_iter()
        .flatten()
        .next()
        .ok_or(Error::MissingRootData {
            root: ROOT,
            operation: "run report",
        })
}
