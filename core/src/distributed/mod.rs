//! # Distributed Matrix Multiplication
//!
//! This is where one matrix product gets split across many workers.
//!
//! ## 🎓 The "Why" of Cannon's Algorithm
//!
//! Imagine a square table of `q x q` people, each holding one tile of matrix `A`
//! and one tile of matrix `B`. To compute their tile of `C`, each person needs a
//! whole row of `A` tiles and a whole column of `B` tiles, but nobody can hold
//! more than one of each at a time.
//!
//! The trick is to keep passing tiles around:
//! 1.  **Skew**: everyone in row `r` passes their `A` tile `r` seats to the left,
//!     and everyone in column `c` passes their `B` tile `c` seats up. Now every
//!     person holds a matching pair.
//! 2.  **Multiply and shift**: multiply the pair into your running total, pass
//!     `A` one seat left and `B` one seat up. Repeat `q` times.
//!
//! After `q` rounds every person has seen every term of their tile of `C`, and
//! at no point did anyone hold more than three tiles.
//!
//! ## 🧩 Pieces
//!
//! *   [`Communicator`](backend::Communicator): the message-passing interface
//!     (point-to-point exchange plus barrier, broadcast, scatter, gather and
//!     max-reduction).
//! *   [`ThreadComm`](thread_comm::ThreadComm): one thread per rank, talking
//!     over `crossbeam` channels. Started with [`launch`](thread_comm::launch).
//! *   [`ProcessGrid`](topology::ProcessGrid): the periodic `q x q` topology and
//!     each rank's coordinates and neighbors.
//! *   [`scatter_matrix`](distribution::scatter_matrix) /
//!     [`gather_matrix`](distribution::gather_matrix): moving blocks between the
//!     root and the grid.
//! *   [`CannonEngine`](cannon::CannonEngine): the per-rank skew and round loop.

pub mod backend;
pub mod cannon;
pub mod distribution;
pub mod thread_comm;
pub mod topology;

pub use backend::{Communicator, ROOT};
pub use cannon::{CannonEngine, CannonState};
pub use distribution::{gather_matrix, scatter_matrix};
pub use thread_comm::{launch, ThreadComm, MAX_WORLD_SIZE};
pub use topology::{Axis, CartTopology, Neighbors, ProcessContext, ProcessGrid, Shift};
