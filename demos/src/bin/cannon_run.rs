//! Cannon's matrix multiplication on a simulated `sqrt(P) x sqrt(P)` process grid.
//!
//! ```text
//! cannon_run -p 9 -n 300
//! echo 8 | cannon_run -p 4 --fill sequence
//! ```

use anyhow::Result;
use cannon::config::{Fill, RunConfig, PRINT_LIMIT};
use cannon::distributed::ProcessGrid;
use cannon::harness::run_threaded;
use cannon_demos::{init_subscriber, prompt_dim};
use clap::{Parser, ValueEnum};
use std::io;
use tracing::info;

#[derive(Parser)]
#[command(about = "Multiply two NxN integer matrices with Cannon's algorithm")]
struct Options {
    /// Number of processes (a perfect square, at most 256)
    #[arg(short, long, default_value = "4")]
    procs: usize,

    /// Matrix size N; read from standard input if omitted
    #[arg(short = 'n', long)]
    dim: Option<usize>,

    /// How to fill A and B
    #[arg(long, value_enum, default_value = "random")]
    fill: FillArg,

    /// Seed for random matrices
    #[arg(long)]
    seed: Option<u64>,

    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum FillArg {
    Random,
    Sequence,
}

impl From<FillArg> for Fill {
    fn from(arg: FillArg) -> Self {
        match arg {
            FillArg::Random => Fill::Random,
            FillArg::Sequence => Fill::Sequence,
        }
    }
}

fn main() -> Result<()> {
    init_subscriber();
    let options = Options::parse();

    // The process count is checked before anything is read or generated.
    let grid = ProcessGrid::new(options.procs)?;
    let dim = match options.dim {
        Some(dim) => dim,
        None => prompt_dim(&mut io::stdin().lock())?,
    };

    let mut config = RunConfig::new(dim).with_fill(options.fill.into());
    if let Some(seed) = options.seed {
        config = config.with_seed(seed);
    }
    config.validate(grid.side())?;
    info!(processes = options.procs, dim, grid_side = grid.side(), "configuration accepted");

    if !options.json {
        let kind = match config.fill {
            Fill::Random => "random",
            Fill::Sequence => "sequential",
        };
        println!("Generating {kind} matrices A and B of size {dim}x{dim}...");
    }

    let report = run_threaded::<i64>(options.procs, &config)?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Sequential time: {:.6} s", report.sequential_secs);
    println!(
        "Parallel time (Cannon, {} processes): {:.6} s",
        report.processes, report.parallel_secs
    );
    println!(">> {}", report.verdict());

    if report.dim <= PRINT_LIMIT {
        println!("\nMatrix A:\n{}", report.a);
        println!("Matrix B:\n{}", report.b);
        println!("Result C:\n{}", report.c);
    }

    Ok(())
}
