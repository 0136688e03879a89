//! Point-to-point throughput along the periodic dimension of a `2 x K/2` grid.
//!
//! Every rank sends a buffer of `f64` one step along the columns (wrapping
//! around) and receives its left neighbor's buffer. The slowest rank's time is
//! reduced to the root for each message length.

use crate::distributed::{Axis, CartTopology, Communicator, ROOT};
use crate::error::{Error, Result};
use serde::Serialize;

/// Message lengths, in elements, used when none are given.
pub const DEFAULT_SIZES: [usize; 4] = [1, 1_000, 100_000, 1_000_000];

const TAG_PING: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PingSample {
    pub elements: usize,
    pub kib: f64,
    /// Exchange time of the slowest rank.
    pub max_secs: f64,
}

/// The `2 x K/2` topology, periodic only along columns. Requires an even `K > 2`.
pub fn ping_topology(world_size: usize) -> Result<CartTopology> {
    if world_size % 2 != 0 || world_size <= 2 {
        return Err(Error::InvalidWorld {
            processes: world_size,
            reason: "the ping benchmark needs an even number of processes greater than 2"
                .to_string(),
        });
    }
    CartTopology::new([2, world_size / 2], [false, true], world_size)
}

/// One timed exchange of `count` elements. Returns the received buffer and the local time.
pub fn ping_once<C: Communicator>(
    comm: &C,
    topology: &CartTopology,
    count: usize,
) -> Result<(Vec<f64>, f64)> {
    let shift = topology.shift(comm.rank(), Axis::Col, 1)?;
    let (Some(source), Some(dest)) = (shift.source, shift.dest) else {
        return Err(Error::InvalidState(format!(
            "rank {} has no column neighbors",
            comm.rank()
        )));
    };

    let rank = comm.rank() as f64;
    let buffer: Vec<f64> = (0..count).map(|j| rank + 0.1 * j as f64).collect();

    comm.barrier()?;
    let start = comm.wtime();
    let received: Vec<f64> = comm.send_recv(buffer, dest, TAG_PING, source, TAG_PING)?;
    let elapsed = comm.wtime() - start;

    if received.len() != count {
        return Err(Error::ShapeMismatch {
            expected: vec![count],
            got: vec![received.len()],
        });
    }
    Ok((received, elapsed))
}

/// Runs one exchange per entry of `sizes`. The root gets the samples, other ranks `None`.
pub fn cart_ping<C: Communicator>(comm: &C, sizes: &[usize]) -> Result<Option<Vec<PingSample>>> {
    let topology = ping_topology(comm.size())?;

    let mut samples = Vec::with_capacity(sizes.len());
    for &count in sizes {
        let (_, elapsed) = ping_once(comm, &topology, count)?;
        if let Some(max_secs) = comm.reduce_max(ROOT, elapsed)? {
            samples.push(PingSample {
                elements: count,
                kib: (count * std::mem::size_of::<f64>()) as f64 / 1024.0,
                max_secs,
            });
        }
    }

    Ok((comm.rank() == ROOT).then_some(samples))
}
