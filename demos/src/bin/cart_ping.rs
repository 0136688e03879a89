//! Point-to-point exchange times along the periodic dimension of a `2 x K/2` grid.

use anyhow::{Context, Result};
use cannon::distributed::launch;
use cannon::ping::{cart_ping, ping_topology, DEFAULT_SIZES};
use cannon_demos::init_subscriber;
use clap::Parser;

#[derive(Parser)]
#[command(about = "Time one exchange per message size on a 2 x K/2 Cartesian topology")]
struct Options {
    /// Number of processes K (even, greater than 2, at most 256)
    #[arg(short, long, default_value = "4")]
    procs: usize,

    /// Message sizes in f64 elements
    #[arg(long, value_delimiter = ',')]
    sizes: Vec<usize>,
}

fn main() -> Result<()> {
    init_subscriber();
    let options = Options::parse();
    ping_topology(options.procs)?;

    let sizes = if options.sizes.is_empty() {
        DEFAULT_SIZES.to_vec()
    } else {
        options.sizes
    };

    let results = launch(options.procs, |comm| cart_ping(&comm, &sizes))?;
    let samples = results
        .into_iter()
        .flatten()
        .next()
        .context("root rank returned no samples")?;

    println!("   Size (f64)      |   Memory (KiB)  |   Time (s)  ");
    println!("-------------------|-----------------|----------------");
    for sample in samples {
        println!(
            " {:>9} elems   | {:>10.2} KiB  |  {:.6} ",
            sample.elements, sample.kib, sample.max_secs
        );
    }
    Ok(())
}
