use cannon_kernels::KernelError;
use thiserror::Error;

/// Error type for every fallible operation in the crate.
///
/// Variants fall into three groups: configuration errors (raised before any
/// data moves), transfer failures (fatal to the whole run), and misuse of the
/// engine API. A verification mismatch is a reported outcome, not an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The number of processes cannot form a square grid.
    #[error("Process count {processes} is not a perfect square (expected 1, 4, 9, 16, ...)")]
    NotPerfectSquare { processes: usize },
    /// The matrix dimension does not split evenly across the grid.
    #[error("Matrix dimension N={dim} must be divisible by the grid side sqrt(P)={grid_side}")]
    IndivisibleDimension { dim: usize, grid_side: usize },
    /// `N * N` does not fit in `usize`.
    #[error("Matrix dimension N={dim} is too large: N*N overflows")]
    DimensionTooLarge { dim: usize },
    /// The matrix dimension is zero.
    #[error("Matrix dimension must be positive")]
    EmptyMatrix,
    /// The world size does not fit the requested topology.
    #[error("Invalid world of {processes} processes: {reason}")]
    InvalidWorld { processes: usize, reason: String },
    /// The data length does not match the expected shape.
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },
    /// A peer hung up while a transfer with it was pending.
    #[error("Rank {rank}: transfer with rank {peer} failed, peer disconnected")]
    Disconnected { rank: usize, peer: usize },
    /// A message arrived with a different tag than the one being waited for.
    #[error("Rank {rank}: expected tag {expected} from rank {peer}, got {got}")]
    TagMismatch {
        rank: usize,
        peer: usize,
        expected: u32,
        got: u32,
    },
    /// A message arrived with a different payload type than the one being waited for.
    #[error("Rank {rank}: unexpected payload type from rank {peer} (tag {tag})")]
    PayloadType { rank: usize, peer: usize, tag: u32 },
    /// A rank outside `0..size` was addressed.
    #[error("Rank {rank} is out of range for a world of size {size}")]
    InvalidRank { rank: usize, size: usize },
    /// The root of a collective did not provide its data.
    #[error("Root rank {root} did not provide data for {operation}")]
    MissingRootData { root: usize, operation: &'static str },
    /// An engine operation was called in the wrong state.
    #[error("Invalid engine state: {0}")]
    InvalidState(String),
    /// A rank panicked instead of returning.
    #[error("Rank {rank} panicked")]
    RankPanicked { rank: usize },
    #[error(transparent)]
    Kernel(#[from] KernelError),
}

impl Error {
    /// True for the errors a rank sees only because some other rank went away first.
    pub fn is_secondary(&self) -> bool {
        matches!(self, Error::Disconnected { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
