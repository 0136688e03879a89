//! # cannon
//!
//! `cannon` multiplies square integer matrices with Cannon's block-shift
//! algorithm on a `sqrt(P) x sqrt(P)` periodic process grid, and checks the
//! result against a sequential multiply.
//!
//! Processes are simulated as threads exchanging owned messages over channels,
//! so a full distributed run needs nothing but this crate.
//!
//! ## Modules
//!
//! - [`matrix`]: Square matrices, the reference multiply, and the verifier.
//! - [`distributed`]: The message-passing runtime, process topology, block distribution and the Cannon engine.
//! - [`harness`]: One timed, verified end-to-end run.
//! - [`ping`]: Point-to-point throughput on a Cartesian topology.
//!
//! ## Example
//!
//! ```rust
//! use cannon::config::{Fill, RunConfig};
//! use cannon::harness::run_threaded;
//!
//! let config = RunConfig::new(6).with_fill(Fill::Sequence);
//! let report = run_threaded::<i64>(9, &config).unwrap();
//!
//! assert_eq!(report.grid_side, 3);
//! assert!(report.is_correct());
//! ```

pub mod config;
pub mod distributed;
pub mod error;
pub mod harness;
pub mod matrix;
pub mod ping;

pub use config::{Fill, RunConfig};
pub use error::{Error, Result};
pub use harness::{run_cannon, run_threaded, RunReport};
pub use matrix::{Matrix, MatrixElem};
