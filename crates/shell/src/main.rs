//! CLI for building nearest-neighbor indexes over synthetic data and measuring their search quality.

mod commands;
pub mod data;
pub mod utils;

use std::path::PathBuf;

use clap::Parser;
use distances::Metric;
use rand::prelude::*;

use commands::Commands;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The path to the output JSON report. If not given, the report is printed to stdout.
    #[arg(short('o'), long)]
    out_path: Option<PathBuf>,

    /// The name of the distance metric: euclidean, manhattan, chebyshev, angular or minkowski:<p>.
    #[arg(short('m'), long, default_value = "euclidean")]
    metric: Metric,

    /// The number of vectors to generate.
    #[arg(short('n'), long, default_value_t = 10_000)]
    num_vectors: usize,

    /// The number of queries to generate.
    #[arg(short('q'), long, default_value_t = 100)]
    num_queries: usize,

    /// The dimensionality of each vector.
    #[arg(short('d'), long, default_value_t = 8)]
    dimensions: usize,

    /// How the vectors are distributed.
    #[arg(short('t'), long, default_value_t = data::Distribution::Uniform)]
    distribution: data::Distribution,

    /// The random seed to use for data generation and for the indexes.
    #[arg(short('s'), long)]
    seed: Option<u64>,

    /// The number of threads for parallel construction and search. Defaults to the number of logical cores.
    #[arg(short('j'), long)]
    num_threads: Option<usize>,

    /// The name of the log-file to use.
    #[arg(short('l'), long, default_value = "shell.log")]
    log_name: String,

    /// The subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<(), String> {
    let args = Args::parse();

    let (_guard, log_path) = utils::configure_logger(&args.log_name)?;
    ftlog::info!("Log file: {log_path:?}");

    if let Some(num_threads) = args.num_threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .map_err(|e| e.to_string())?;
    }
    ftlog::info!("Using {} threads.", rayon::current_num_threads());

    let mut rng = args.seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
    let data = args.distribution.generate(args.num_vectors, args.dimensions, &mut rng)?;
    let queries = args.distribution.generate(args.num_queries, args.dimensions, &mut rng)?;
    ftlog::info!(
        "Generated {} {} vectors and {} queries in {} dimensions.",
        data.len(),
        args.distribution,
        queries.len(),
        args.dimensions
    );

    let report = match args.command {
        Commands::Search {
            index,
            k,
            radius,
            serial,
        } => commands::search::run(data, &queries, args.metric, index, k, radius, args.seed, !serial)?,
        Commands::Insert { k, growth, check } => commands::insert::run(data, &queries, args.metric, k, growth, args.seed, check)?,
    };

    utils::write_report(&report, args.out_path.as_deref())
}
