//! Benchmark for search backend throughput.

use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::alphabet::Alphabet;
use crate::generator::{GeneratorKind, PasswordGenerator};
use crate::search::{BackendConfig, BackendKind, SearchBackend, SearchRange};
use crate::target::Target;

/// Measured throughput of one backend/generator pair.
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub backend: &'static str,
    pub generator: &'static str,
    pub seeds: u64,
    pub duration: Duration,
}

impl BenchmarkResult {
    pub fn seeds_per_sec(&self) -> f64 {
        self.seeds as f64 / self.duration.as_secs_f64()
    }
}

/// Search consecutive ranges of `chunk` seeds on `backend` until `window` has elapsed.
pub fn measure(
    backend: &dyn SearchBackend,
    generator_kind: GeneratorKind,
    chunk: u64,
    window: Duration,
) -> Result<BenchmarkResult> {
    let generator = PasswordGenerator::new(generator_kind, Arc::new(Alphabet::printable()));
    // Twelve characters: a match inside the measured seeds is not a realistic concern.
    let target = Target::new("!Ccngz@ueh4E", &Alphabet::printable())?;

    let mut start_seed = u64::MAX / 2;
    let mut seeds = 0u64;
    let start = Instant::now();

    while start.elapsed() < window {
        let range = SearchRange::new(start_seed, chunk)?;
        backend.search(&generator, &target, range, None)?;
        seeds += chunk;
        start_seed -= chunk;
    }

    Ok(BenchmarkResult {
        backend: backend.name(),
        generator: generator_kind.name(),
        seeds,
        duration: start.elapsed(),
    })
}

/// Run standardized benchmark for a backend.
pub fn run_benchmark(
    backend_kind: BackendKind,
    generator_kind: GeneratorKind,
    config: &BackendConfig,
    json: bool,
) -> Result<()> {
    if !json {
        println!(
            "Running Benchmark for {} / {}...",
            backend_kind.name(),
            generator_kind.name()
        );
        println!("Time: 2s warmup + 5s measure (approx)");
    }

    let chunk = match backend_kind {
        BackendKind::Gpu => u64::from(config.batch_size) * 4,
        BackendKind::Cpu => 1_000_000,
        BackendKind::CpuSequential => 100_000,
    };

    let backend = backend_kind.create(config)?;
    measure(backend.as_ref(), generator_kind, chunk, Duration::from_secs(2))?;
    let result = measure(backend.as_ref(), generator_kind, chunk, Duration::from_secs(5))?;
    let speed = result.seeds_per_sec();

    if json {
        println!(
            "{{ \"backend\": \"{}\", \"generator\": \"{}\", \"seeds_per_sec\": {}, \"total_seeds\": {}, \"duration_secs\": {} }}",
            result.backend,
            result.generator,
            speed as u64,
            result.seeds,
            result.duration.as_secs_f64()
        );
    } else {
        println!("------------------------------------------------");
        println!("Result: {:.2} Million Seeds/sec", speed / 1_000_000.0);
        println!("Total:  {} seeds in {:.2}s", result.seeds, result.duration.as_secs_f64());
        println!("------------------------------------------------");
    }

    Ok(())
}
