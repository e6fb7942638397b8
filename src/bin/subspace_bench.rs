//! Benchmark block subspace iteration over a range of problem sizes.
//!
//! Every size is solved `--repeats` times on a generated pencil, or on the pencil file given with
//! `--input`. The report lists one row per timed solve followed by summary statistics; failed
//! runs are reported and do not stop the sweep.

use std::{fs, path::PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use subspace_eig::{
    backend::DefaultBackend,
    bench::{BenchmarkCase, Harness, PencilSource},
    timer::Stopwatch,
};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Generator {
    /// Fixed-fixed bar with consistent mass
    Bar,
    /// Random symmetric positive definite pair
    Random,
}

#[derive(Parser, Debug)]
#[command(
    name = "subspace-bench",
    about = "Times block subspace iteration across problem sizes."
)]
struct Args {
    /// Problem sizes, comma separated
    #[arg(long, value_delimiter = ',', default_values_t = vec![100usize, 200, 400])]
    sizes: Vec<usize>,
    /// Number of eigenpairs per solve
    #[arg(long, short = 'k', default_value_t = 4)]
    nev: usize,
    /// Number of trial vectors, defaults to min(2 nev, nev + 8)
    #[arg(long, short = 'p')]
    block_size: Option<usize>,
    /// Timed solves per size
    #[arg(long, default_value_t = 5)]
    repeats: usize,
    /// Generated pencil family
    #[arg(long, value_enum, default_value_t = Generator::Bar)]
    pencil: Generator,
    /// Pencil file to benchmark instead of generated pencils
    #[arg(long, value_name = "PATH")]
    input: Option<PathBuf>,
    #[arg(long, default_value_t = 1e-8)]
    tol: f64,
    #[arg(long, default_value_t = 100)]
    maxiter: usize,
    /// Seed of the starting block and of random pencils
    #[arg(long, default_value_t = 42)]
    seed: u32,
    /// Write the report to this file instead of standard output
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Emit the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logger: {}", e))?;

    let args = Args::parse();

    let cases: Vec<BenchmarkCase> = match &args.input {
        Some(path) => vec![BenchmarkCase {
            dim: 0,
            nev: args.nev,
            block_size: args.block_size,
            source: PencilSource::File(path.clone()),
        }],
        None => args
            .sizes
            .iter()
            .map(|&dim| BenchmarkCase {
                dim,
                nev: args.nev,
                block_size: args.block_size,
                source: match args.pencil {
                    Generator::Bar => PencilSource::Bar,
                    Generator::Random => PencilSource::Random {
                        seed: u64::from(args.seed),
                    },
                },
            })
            .collect(),
    };

    let harness = Harness::new(DefaultBackend::default(), Stopwatch::new())
        .precision(args.tol)
        .maxiter(args.maxiter)
        .seed(args.seed)
        .repeats(args.repeats);

    info!("running {} case(s), {} repeat(s) each", cases.len(), args.repeats);
    let report = harness.sweep(&cases);

    let text = if args.json {
        serde_json::to_string_pretty(&report).context("Failed to serialize report")?
    } else {
        report.to_string()
    };

    match &args.output {
        Some(path) => {
            fs::write(path, text)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("report written to {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}
