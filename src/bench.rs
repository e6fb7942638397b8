//! Benchmark sweeps over block subspace iteration
//!
//! A [`Harness`] owns a backend and a timer and runs [`block_subspace`] over a list of
//! [`BenchmarkCase`]s. Each case is loaded or generated once and solved `repeats` times. A case
//! that cannot be loaded or solved is recorded as a `FAILED` row and the sweep moves on.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use log::{info, warn};
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;

use crate::{
    backend::LinalgBackend, block_subspace, io::read_pencil, timer::MonotonicTimer, EigError,
    InputError, Order, Pencil, SubspaceConfig,
};

/// Where the pencil of a benchmark case comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PencilSource {
    /// [`Pencil::bar`]
    Bar,
    /// [`Pencil::random`] from a seeded generator
    Random { seed: u64 },
    /// A pencil file in the text format of [`crate::io`]
    File(PathBuf),
}

/// One problem of a sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkCase {
    /// Pencil dimension, ignored for file sources
    pub dim: usize,
    pub nev: usize,
    /// Block size, or the [`SubspaceConfig`] default
    pub block_size: Option<usize>,
    pub source: PencilSource,
}

impl BenchmarkCase {
    fn load(&self) -> Result<Pencil, EigError> {
        match &self.source {
            PencilSource::Bar => Ok(Pencil::bar(self.dim)),
            PencilSource::Random { seed } => {
                Ok(Pencil::random(self.dim, StdRng::seed_from_u64(*seed)))
            }
            PencilSource::File(path) => {
                let file = File::open(path).map_err(InputError::from)?;
                read_pencil(BufReader::new(file))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Success,
    NotConverged,
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Success => "SUCCESS",
            RunStatus::NotConverged => "NOT_CONVERGED",
            RunStatus::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Outcome of a single timed solve
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkRow {
    /// 1-based run number within the sweep
    pub run: usize,
    /// Wall-clock seconds, absent for failed runs
    pub time: Option<f64>,
    pub status: RunStatus,
    pub dim: usize,
    pub nev: usize,
    pub block_size: usize,
    /// Completed iterations, absent for failed runs
    pub iterations: Option<usize>,
    /// Error message of failed and unconverged runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Host description printed at the top of a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemInfo {
    pub arch: String,
    pub os: String,
    pub backend: String,
    pub logical_cpus: usize,
}

impl SystemInfo {
    pub fn detect<B: LinalgBackend>(backend: &B) -> Self {
        SystemInfo {
            arch: std::env::consts::ARCH.to_owned(),
            os: std::env::consts::OS.to_owned(),
            backend: backend.name().to_owned(),
            logical_cpus: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

/// Statistics over the times of the successful runs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_runs: usize,
    pub successful_runs: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation, zero for a single run
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
    /// Successful solves per second
    pub throughput: f64,
}

impl Summary {
    /// Returns `None` if no run succeeded
    pub fn from_rows(rows: &[BenchmarkRow]) -> Option<Self> {
        let mut times: Vec<f64> = rows
            .iter()
            .filter(|row| row.status == RunStatus::Success)
            .filter_map(|row| row.time)
            .collect();
        if times.is_empty() {
            return None;
        }
        times.sort_by(|a, b| a.total_cmp(b));

        let n = times.len() as f64;
        let total: f64 = times.iter().sum();
        let mean = total / n;
        let std_dev = if times.len() > 1 {
            (times.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
        } else {
            0.0
        };

        Some(Summary {
            total_runs: rows.len(),
            successful_runs: times.len(),
            mean,
            median: quantile(&times, 0.5),
            std_dev,
            min: times[0],
            max: times[times.len() - 1],
            p90: quantile(&times, 0.9),
            p95: quantile(&times, 0.95),
            p99: quantile(&times, 0.99),
            throughput: if total > 0.0 { n / total } else { f64::INFINITY },
        })
    }

    pub fn success_rate(&self) -> f64 {
        100.0 * self.successful_runs as f64 / self.total_runs as f64
    }
}

/// Quantile of sorted data with linear interpolation between order statistics
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// The result of a sweep
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkReport {
    pub system: SystemInfo,
    pub rows: Vec<BenchmarkRow>,
}

impl BenchmarkReport {
    pub fn summary(&self) -> Option<Summary> {
        Summary::from_rows(&self.rows)
    }
}

impl fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== System Information ===")?;
        writeln!(f, "Architecture: {}", self.system.arch)?;
        writeln!(f, "OS: {}", self.system.os)?;
        writeln!(f, "Backend: {}", self.system.backend)?;
        writeln!(f, "Logical CPUs: {}", self.system.logical_cpus)?;
        writeln!(f)?;

        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Run#,Time,Status,Size,Nev,Block,Iterations")?;
        for row in &self.rows {
            let time = row
                .time
                .map_or_else(|| "N/A".to_owned(), |t| format!("{:.6}", t));
            let iterations = row
                .iterations
                .map_or_else(|| "N/A".to_owned(), |i| i.to_string());
            writeln!(
                f,
                "{},{},{},{},{},{},{}",
                row.run, time, row.status, row.dim, row.nev, row.block_size, iterations
            )?;
        }
        writeln!(f)?;

        writeln!(f, "=== Summary Statistics ===")?;
        match self.summary() {
            Some(s) => {
                writeln!(f, "Total runs: {}", s.total_runs)?;
                writeln!(f, "Successful runs: {}", s.successful_runs)?;
                writeln!(f, "Success rate: {:.1}%", s.success_rate())?;
                writeln!(f, "Mean: {:.6}s", s.mean)?;
                writeln!(f, "Median: {:.6}s", s.median)?;
                writeln!(f, "Std: {:.6}s", s.std_dev)?;
                writeln!(f, "Min: {:.6}s", s.min)?;
                writeln!(f, "Max: {:.6}s", s.max)?;
                writeln!(f, "P90: {:.6}s", s.p90)?;
                writeln!(f, "P95: {:.6}s", s.p95)?;
                writeln!(f, "P99: {:.6}s", s.p99)?;
                writeln!(f, "Throughput: {:.2} runs/second", s.throughput)
            }
            None => {
                writeln!(f, "Total runs: {}", self.rows.len())?;
                writeln!(f, "Successful runs: 0")
            }
        }
    }
}

/// Runs and times block subspace iteration over benchmark cases
#[derive(Debug)]
pub struct Harness<B, T> {
    backend: B,
    timer: T,
    tol: f64,
    maxiter: usize,
    seed: u32,
    order: Order,
    repeats: usize,
}

impl<B: LinalgBackend, T: MonotonicTimer> Harness<B, T> {
    /// Create a harness running every case once with the solver defaults
    pub fn new(backend: B, timer: T) -> Self {
        let defaults = SubspaceConfig::new(1, 1);
        Harness {
            backend,
            timer,
            tol: defaults.tol,
            maxiter: defaults.maxiter,
            seed: defaults.seed,
            order: defaults.order,
            repeats: 1,
        }
    }

    pub fn precision(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn maxiter(mut self, maxiter: usize) -> Self {
        self.maxiter = maxiter;
        self
    }

    pub fn seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    /// Number of timed solves per case
    pub fn repeats(mut self, repeats: usize) -> Self {
        self.repeats = repeats;
        self
    }

    /// Solver configuration for a case on a pencil of dimension `dim`
    pub fn config(&self, case: &BenchmarkCase, dim: usize) -> SubspaceConfig {
        let mut config = SubspaceConfig::new(dim, case.nev)
            .precision(self.tol)
            .maxiter(self.maxiter)
            .seed(self.seed)
            .order(self.order);
        if let Some(block_size) = case.block_size {
            config = config.block_size(block_size);
        }
        config
    }

    /// Run one case `repeats` times, numbering the rows from `first_run`
    pub fn run_case(&self, case: &BenchmarkCase, first_run: usize) -> Vec<BenchmarkRow> {
        let runs = first_run..first_run + self.repeats;

        let pencil = match case.load() {
            Ok(pencil) => pencil,
            Err(err) => {
                warn!("benchmark case {:?} could not be loaded: {}", case.source, err);
                let config = self.config(case, case.dim);
                return runs
                    .map(|run| failed_row(run, &config, &err))
                    .collect();
            }
        };
        let config = self.config(case, pencil.dim());

        runs.map(|run| {
            let (res, time) = self.timer.time(|| {
                block_subspace(
                    &self.backend,
                    pencil.stiffness.view(),
                    pencil.mass.view(),
                    &config,
                )
            });
            let row = match res {
                Ok(pairs) => BenchmarkRow {
                    run,
                    time: Some(time),
                    status: RunStatus::Success,
                    dim: config.dim,
                    nev: config.nev,
                    block_size: config.block_size,
                    iterations: Some(pairs.iterations),
                    error: None,
                },
                Err((err, Some(pairs))) => BenchmarkRow {
                    run,
                    time: Some(time),
                    status: RunStatus::NotConverged,
                    dim: config.dim,
                    nev: config.nev,
                    block_size: config.block_size,
                    iterations: Some(pairs.iterations),
                    error: Some(err.to_string()),
                },
                Err((err, None)) => failed_row(run, &config, &err),
            };
            match row.status {
                RunStatus::Failed => warn!("run {} failed: {}", run, err_message(&row)),
                status => info!(
                    "run {}: n = {}, {} after {:?} iterations in {:.6}s",
                    run, row.dim, status, row.iterations, time
                ),
            }
            row
        })
        .collect()
    }

    /// Run every case, continuing past failed ones
    pub fn sweep(&self, cases: &[BenchmarkCase]) -> BenchmarkReport {
        let mut rows = Vec::with_capacity(cases.len() * self.repeats);
        for case in cases {
            let next = rows.len() + 1;
            rows.extend(self.run_case(case, next));
        }
        BenchmarkReport {
            system: SystemInfo::detect(&self.backend),
            rows,
        }
    }
}

fn failed_row(run: usize, config: &SubspaceConfig, err: &EigError) -> BenchmarkRow {
    BenchmarkRow {
        run,
        time: None,
        status: RunStatus::Failed,
        dim: config.dim,
        nev: config.nev,
        block_size: config.block_size,
        iterations: None,
        error: Some(err.to_string()),
    }
}

fn err_message(row: &BenchmarkRow) -> &str {
    row.error.as_deref().unwrap_or("unknown error")
}
