use super::backend::Communicator;
use crate::error::{Error, Result};
use crossbeam::channel::{unbounded, Receiver, Sender};
use std::any::Any;
use std::thread;
use std::time::Instant;
use tracing::{trace, warn};

/// Largest world [`launch`] will start. A world of `P` ranks holds `P * P` channels.
pub const MAX_WORLD_SIZE: usize = 256;

/// A tagged message in flight between two ranks.
struct Envelope {
    tag: u32,
    payload: Box<dyn Any + Send>,
}

/// A thread-backed communicator.
///
/// Every rank runs on its own thread and owns one `crossbeam` channel to each
/// peer (itself included), so messages between any two ranks are FIFO. Sends
/// never block; receives block until the message arrives or the sending rank
/// has exited, in which case they fail with [`Error::Disconnected`].
pub struct ThreadComm {
    rank: usize,
    size: usize,
    senders: Vec<Sender<Envelope>>,     // senders[dest]
    receivers: Vec<Receiver<Envelope>>, // receivers[source]
    epoch: Instant,
}

impl ThreadComm {
    /// Creates a fully connected world of `size` communicators, indexed by rank.
    pub fn world(size: usize) -> Vec<ThreadComm> {
        let epoch = Instant::now();

        // Channel (src, dst) connects rank src to rank dst.
        // Rank src keeps the Sender, rank dst keeps the Receiver.
        let mut tx_grid: Vec<Vec<Sender<Envelope>>> = Vec::with_capacity(size);
        let mut rx_grid: Vec<Vec<Receiver<Envelope>>> =
            (0..size).map(|_| Vec::with_capacity(size)).collect();

        for _src in 0..size {
            let mut row = Vec::with_capacity(size);
            for dst_receivers in rx_grid.iter_mut() {
                let (tx, rx) = unbounded();
                row.push(tx);
                dst_receivers.push(rx);
            }
            tx_grid.push(row);
        }

        tx_grid
            .into_iter()
            .zip(rx_grid)
            .enumerate()
            .map(|(rank, (senders, receivers))| ThreadComm {
                rank,
                size,
                senders,
                receivers,
                epoch,
            })
            .collect()
    }
}

impl Communicator for ThreadComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn send<M: Send + 'static>(&self, msg: M, dest: usize, tag: u32) -> Result<()> {
        self.check_rank(dest)?;
        trace!(rank = self.rank, dest, tag, "send");
        self.senders[dest]
            .send(Envelope {
                tag,
                payload: Box::new(msg),
            })
            .map_err(|_| Error::Disconnected {
                rank: self.rank,
                peer: dest,
            })
    }

    fn recv<M: Send + 'static>(&self, source: usize, tag: u32) -> Result<M> {
        self.check_rank(source)?;
        let envelope = self.receivers[source]
            .recv()
            .map_err(|_| Error::Disconnected {
                rank: self.rank,
                peer: source,
            })?;
        trace!(rank = self.rank, source, tag = envelope.tag, "recv");

        if envelope.tag != tag {
            return Err(Error::TagMismatch {
                rank: self.rank,
                peer: source,
                expected: tag,
                got: envelope.tag,
            });
        }
        envelope
            .payload
            .downcast::<M>()
            .map(|msg| *msg)
            .map_err(|_| Error::PayloadType {
                rank: self.rank,
                peer: source,
                tag,
            })
    }

    fn wtime(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }
}

/// Runs `f` on every rank of a fresh `size`-rank thread world (SPMD).
///
/// Returns the per-rank results in rank order. If any rank fails, the whole
/// run fails: a rank that returns an error or panics drops its channels, so
/// peers waiting on it fail too instead of hanging. The reported error is the
/// root cause, i.e. the first failure by rank that is not merely a peer
/// disconnect.
pub fn launch<R, F>(size: usize, f: F) -> Result<Vec<R>>
where
    R: Send,
    F: Fn(ThreadComm) -> Result<R> + Sync,
{
    if size == 0 {
        return Err(Error::InvalidWorld {
            processes: size,
            reason: "at least one process is required".to_string(),
        });
    }
    if size > MAX_WORLD_SIZE {
        return Err(Error::InvalidWorld {
            processes: size,
            reason: format!("at most {MAX_WORLD_SIZE} processes are supported"),
        });
    }

    let comms = ThreadComm::world(size);
    let f = &f;
    let outcomes: Vec<Result<R>> = thread::scope(|s| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| s.spawn(move || f(comm)))
            .collect();

        handles
            .into_iter()
            .enumerate()
            .map(|(rank, handle)| {
                handle
                    .join()
                    .unwrap_or(Err(Error::RankPanicked { rank }))
            })
            .collect()
    });

    let mut values = Vec::with_capacity(size);
    let mut root_cause: Option<Error> = None;
    for (rank, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(value) => values.push(value),
            Err(err) => {
                warn!(rank, error = %err, "rank failed");
                let replace = match &root_cause {
                    None => true,
                    Some(prev) => prev.is_secondary() && !err.is_secondary(),
                };
                if replace {
                    root_cause = Some(err);
                }
            }
        }
    }

    match root_cause {
        Some(err) => Err(err),
        None => Ok(values),
    }
}
