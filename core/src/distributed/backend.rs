use crate::error::{Error, Result};

/// Rank that owns whole matrices and receives reductions and gathers.
pub const ROOT: usize = 0;

/// Tags at or above this value are used by the provided collectives.
/// Point-to-point callers should stay below it.
pub const COLLECTIVE_TAG_BASE: u32 = 1 << 30;

const TAG_BROADCAST: u32 = COLLECTIVE_TAG_BASE;
const TAG_SCATTER: u32 = COLLECTIVE_TAG_BASE + 1;
const TAG_GATHER: u32 = COLLECTIVE_TAG_BASE + 2;
const TAG_REDUCE: u32 = COLLECTIVE_TAG_BASE + 3;
const TAG_BARRIER_ENTER: u32 = COLLECTIVE_TAG_BASE + 4;
const TAG_BARRIER_RELEASE: u32 = COLLECTIVE_TAG_BASE + 5;

/// Abstraction for a message-passing runtime.
///
/// A backend supplies rank discovery, blocking point-to-point `send`/`recv`
/// and a wall clock. Everything collective (barrier, broadcast, scatter,
/// gather, max-reduction) is provided on top of those, so every backend gets
/// the same semantics:
/// - **Thread world**: [`ThreadComm`](super::thread_comm::ThreadComm), one thread per rank over channels.
///
/// Messages are owned values. Sending moves the value to the receiver; nothing
/// is ever shared between ranks.
pub trait Communicator {
    /// Returns the rank of the current process/thread.
    fn rank(&self) -> usize;

    /// Returns the total number of processes/threads.
    fn size(&self) -> usize;

    /// Sends `msg` to `dest` with the given tag.
    fn send<M: Send + 'static>(&self, msg: M, dest: usize, tag: u32) -> Result<()>;

    /// Blocks until the next message from `source` arrives.
    ///
    /// Messages from one source arrive in the order they were sent. A message
    /// with a different tag or payload type is a transfer failure.
    fn recv<M: Send + 'static>(&self, source: usize, tag: u32) -> Result<M>;

    /// Seconds elapsed on a monotonic clock shared by all ranks.
    fn wtime(&self) -> f64;

    fn check_rank(&self, rank: usize) -> Result<()> {
        if rank >= self.size() {
            return Err(Error::InvalidRank {
                rank,
                size: self.size(),
            });
        }
        Ok(())
    }

    /// Paired exchange: sends `msg` to `dest`, then receives the replacement from `source`.
    fn send_recv<M: Send + 'static>(
        &self,
        msg: M,
        dest: usize,
        send_tag: u32,
        source: usize,
        recv_tag: u32,
    ) -> Result<M> {
        self.send(msg, dest, send_tag)?;
        self.recv(source, recv_tag)
    }

    /// Blocks until every rank has entered the barrier.
    fn barrier(&self) -> Result<()> {
        if self.rank() == ROOT {
            for peer in 1..self.size() {
                self.recv::<()>(peer, TAG_BARRIER_ENTER)?;
            }
            for peer in 1..self.size() {
                self.send((), peer, TAG_BARRIER_RELEASE)?;
            }
        } else {
            self.send((), ROOT, TAG_BARRIER_ENTER)?;
            self.recv::<()>(ROOT, TAG_BARRIER_RELEASE)?;
        }
        Ok(())
    }

    /// One-to-all broadcast. Only `root` needs to pass `Some(value)`.
    fn broadcast<M: Clone + Send + 'static>(&self, root: usize, value: Option<M>) -> Result<M> {
        self.check_rank(root)?;
        if self.rank() != root {
            return self.recv(root, TAG_BROADCAST);
        }

        let value = value.ok_or(Error::MissingRootData {
            root,
            operation: "broadcast",
        })?;
        for peer in (0..self.size()).filter(|&p| p != root) {
            self.send(value.clone(), peer, TAG_BROADCAST)?;
        }
        Ok(value)
    }

    /// Splits `data` at `root` into `size` chunks of `chunk_len` and hands chunk `p` to rank `p`.
    fn scatter<T: Clone + Send + 'static>(
        &self,
        root: usize,
        data: Option<&[T]>,
        chunk_len: usize,
    ) -> Result<Vec<T>> {
        self.check_rank(root)?;
        if self.rank() != root {
            return self.recv_chunk(root, TAG_SCATTER, chunk_len);
        }

        let data = data.ok_or(Error::MissingRootData {
            root,
            operation: "scatter",
        })?;
        if data.len() != chunk_len * self.size() {
            return Err(Error::ShapeMismatch {
                expected: vec![self.size(), chunk_len],
                got: vec![data.len()],
            });
        }

        let mut own = Vec::new();
        for peer in 0..self.size() {
            let chunk = data[peer * chunk_len..(peer + 1) * chunk_len].to_vec();
            if peer == root {
                own = chunk;
            } else {
                self.send(chunk, peer, TAG_SCATTER)?;
            }
        }
        Ok(own)
    }

    /// Collects one equal-sized chunk from every rank at `root`, concatenated in rank order.
    ///
    /// Returns `Some` on the root and `None` elsewhere.
    fn gather<T: Send + 'static>(&self, root: usize, local: Vec<T>) -> Result<Option<Vec<T>>> {
        self.check_rank(root)?;
        if self.rank() != root {
            self.send(local, root, TAG_GATHER)?;
            return Ok(None);
        }

        let chunk_len = local.len();
        let mut local = Some(local);
        let mut out = Vec::with_capacity(chunk_len * self.size());
        for peer in 0..self.size() {
            let chunk = if peer == root {
                local.take().unwrap_or_default()
            } else {
                self.recv_chunk(peer, TAG_GATHER, chunk_len)?
            };
            out.extend(chunk);
        }
        Ok(Some(out))
    }

    /// Maximum of `value` over all ranks, delivered to `root`.
    fn reduce_max<V: PartialOrd + Send + 'static>(&self, root: usize, value: V) -> Result<Option<V>> {
        self.check_rank(root)?;
        if self.rank() != root {
            self.send(value, root, TAG_REDUCE)?;
            return Ok(None);
        }

        let mut max = value;
        for peer in (0..self.size()).filter(|&p| p != root) {
            let v: V = self.recv(peer, TAG_REDUCE)?;
            if v > max {
                max = v;
            }
        }
        Ok(Some(max))
    }

    fn recv_chunk<T: Send + 'static>(&self, source: usize, tag: u32, len: usize) -> Result<Vec<T>> {
        let chunk: Vec<T> = self.recv(source, tag)?;
        if chunk.len() != len {
            return Err(Error::ShapeMismatch {
                expected: vec![len],
                got: vec![chunk.len()],
            });
        }
        Ok(chunk)
    }
}
