//! Solve a generalized eigenproblem read from a pencil file.
//!
//! The pencil is read from `--input` (or standard input for `-`) in the text format of
//! `subspace_eig::io`. The requested eigenpairs are printed one per line as
//! `index eigenvalue residual converged`.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::PathBuf,
};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use log::{info, warn};
use ndarray::Array1;
use subspace_eig::{
    backend::DefaultBackend, block_subspace, io::read_pencil, seeder::ParkMiller, single_vector,
    Eigenpairs, Order, SubspaceConfig,
};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Method {
    /// Block subspace iteration with Rayleigh-Ritz projection
    Block,
    /// Single vector iteration, one eigenpair
    Single,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum End {
    Smallest,
    Largest,
}

impl From<End> for Order {
    fn from(end: End) -> Self {
        match end {
            End::Smallest => Order::Smallest,
            End::Largest => Order::Largest,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "subspace",
    about = "Compute extreme eigenpairs of K x = lambda M x by subspace iteration."
)]
struct Args {
    /// Pencil file, `-` for standard input
    #[arg(long, short, value_name = "PATH", default_value = "-")]
    input: PathBuf,
    /// Number of eigenpairs to compute
    #[arg(long, short = 'k', default_value_t = 1)]
    nev: usize,
    /// Number of trial vectors, defaults to min(2 nev, nev + 8)
    #[arg(long, short = 'p')]
    block_size: Option<usize>,
    /// Relative convergence tolerance
    #[arg(long, default_value_t = 1e-8)]
    tol: f64,
    /// Iteration limit
    #[arg(long, default_value_t = 100)]
    maxiter: usize,
    /// Seed of the starting vectors
    #[arg(long, default_value_t = 42)]
    seed: u32,
    /// End of the spectrum to compute
    #[arg(long, value_enum, default_value_t = End::Smallest)]
    order: End,
    #[arg(long, value_enum, default_value_t = Method::Block)]
    method: Method,
}

fn open_input(path: &PathBuf) -> Result<Box<dyn BufRead>> {
    if path.as_os_str() == "-" {
        Ok(Box::new(BufReader::new(io::stdin())))
    } else {
        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        Ok(Box::new(BufReader::new(file)))
    }
}

fn print_pairs(pairs: &Eigenpairs<f64>) {
    println!("# iterations: {}", pairs.iterations);
    for (i, ((lambda, rnorm), converged)) in pairs
        .eigvals
        .iter()
        .zip(&pairs.rnorm)
        .zip(&pairs.converged)
        .enumerate()
    {
        println!("{} {:.12e} {:.3e} {}", i + 1, lambda, rnorm, converged);
    }
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logger: {}", e))?;

    let args = Args::parse();

    let pencil = read_pencil(open_input(&args.input)?)
        .with_context(|| format!("Failed to read pencil from {}", args.input.display()))?;
    let n = pencil.dim();
    info!("read pencil of dimension {}", n);

    let nev = match args.method {
        Method::Block => args.nev,
        Method::Single => 1,
    };
    let mut config = SubspaceConfig::new(n, nev)
        .precision(args.tol)
        .maxiter(args.maxiter)
        .seed(args.seed)
        .order(args.order.into());
    if let Some(block_size) = args.block_size {
        config = config.block_size(block_size);
    }
    config.validate()?;

    let backend = DefaultBackend::default();
    let res = match args.method {
        Method::Block => block_subspace(
            &backend,
            pencil.stiffness.view(),
            pencil.mass.view(),
            &config,
        ),
        Method::Single => {
            let mut rng = ParkMiller::new(config.seed)?;
            let mut draws = vec![0.0; n];
            rng.fill_normal(&mut draws);
            let x0 = Array1::from(draws);
            single_vector(
                &backend,
                pencil.stiffness.view(),
                pencil.mass.view(),
                x0.view(),
                &config,
            )
        }
    };

    match res {
        Ok(pairs) => print_pairs(&pairs),
        Err((err, Some(pairs))) => {
            warn!("{}; printing the latest approximations", err);
            print_pairs(&pairs);
        }
        Err((err, None)) => return Err(err.into()),
    }
    Ok(())
}
