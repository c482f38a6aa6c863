//! devil-breaker - recover the seed behind a generated password.
//!
//! Enumerates seeds downward from a start seed (by default the current clock
//! reading in nanoseconds) until the generated password equals the target.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::ProgressBar;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use devil_breaker::generator::{CandidateGenerator, GeneratorKind, PasswordGenerator};
use devil_breaker::search::{BackendConfig, BackendKind, SearchBackend, SearchOutcome, SearchRange};
use devil_breaker::{Alphabet, Target};

fn parse_backend(s: &str) -> Result<BackendKind, String> {
    BackendKind::from_str(s)
}

fn parse_generator(s: &str) -> Result<GeneratorKind, String> {
    GeneratorKind::from_str(s)
}

fn parse_alphabet(s: &str) -> Result<Alphabet, String> {
    Alphabet::from_spec(s).map_err(|e| e.to_string())
}

#[derive(Parser)]
#[command(name = "devil-breaker")]
#[command(about = "Recover the seed behind a password produced by a seeded PRNG")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase log verbosity (-v debug, -vv trace every seed)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Search for the seed that generated a password
    Crack {
        /// The password to find
        target: String,

        /// Highest seed to try (default: current time in nanoseconds)
        #[arg(long, conflicts_with = "at")]
        start_seed: Option<u64>,

        /// Start from the nanosecond timestamp of an RFC 3339 date (e.g. 2024-05-01T12:00:00Z)
        #[arg(long, value_name = "TIME")]
        at: Option<String>,

        /// Number of seeds to try, counting down from the start seed
        #[arg(long, default_value_t = 10_000_000)]
        attempts: u64,

        /// Backend (cpu, cpu-serial, gpu)
        #[arg(long, value_parser = parse_backend, default_value = "cpu")]
        backend: BackendKind,

        /// Generator (mt64, lcg)
        #[arg(long, value_parser = parse_generator, default_value = "mt64")]
        generator: GeneratorKind,

        /// Alphabet: printable, classic, or a literal character set
        #[arg(long, value_parser = parse_alphabet, default_value = "printable")]
        alphabet: Alphabet,

        /// Worker threads for the cpu backend
        #[arg(long)]
        threads: Option<usize>,

        /// Seeds per GPU launch
        #[arg(long, default_value_t = 1 << 20)]
        batch_size: u32,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Print the password a seed generates
    Generate {
        /// Seed value
        #[arg(long)]
        seed: u64,

        /// Password length
        #[arg(long, default_value_t = 12)]
        length: usize,

        /// Generator (mt64, lcg)
        #[arg(long, value_parser = parse_generator, default_value = "mt64")]
        generator: GeneratorKind,

        /// Alphabet: printable, classic, or a literal character set
        #[arg(long, value_parser = parse_alphabet, default_value = "printable")]
        alphabet: Alphabet,
    },

    /// Run benchmark
    Bench {
        /// Backend to benchmark (cpu, cpu-serial, gpu)
        #[arg(long, value_parser = parse_backend, default_value = "cpu")]
        backend: BackendKind,

        /// Generator to benchmark (mt64, lcg)
        #[arg(long, value_parser = parse_generator, default_value = "mt64")]
        generator: GeneratorKind,

        /// Worker threads for the cpu backend
        #[arg(long)]
        threads: Option<usize>,

        /// Seeds per GPU launch
        #[arg(long, default_value_t = 1 << 20)]
        batch_size: u32,

        /// Output JSON for benchmark runner
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Crack {
            target,
            start_seed,
            at,
            attempts,
            backend,
            generator,
            alphabet,
            threads,
            batch_size,
            no_progress,
        } => {
            let start_seed = match (start_seed, at) {
                (Some(seed), _) => seed,
                (None, Some(time)) => timestamp_seed(&time)?,
                (None, None) => clock_seed()?,
            };
            let config = BackendConfig { threads, batch_size };

            run_crack(
                &target,
                start_seed,
                attempts,
                backend,
                generator,
                alphabet,
                &config,
                !no_progress,
            )
        }

        Command::Generate {
            seed,
            length,
            generator,
            alphabet,
        } => {
            let generator = PasswordGenerator::new(generator, Arc::new(alphabet));
            println!("{}", generator.generate(seed, length));
            Ok(ExitCode::SUCCESS)
        }

        Command::Bench {
            backend,
            generator,
            threads,
            batch_size,
            json,
        } => {
            let config = BackendConfig { threads, batch_size };
            devil_breaker::benchmark::run_benchmark(backend, generator, &config, json)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "devil_breaker=debug",
        _ => "devil_breaker=trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Current wall-clock time in nanoseconds since the Unix epoch.
fn clock_seed() -> Result<u64> {
    let nanos = chrono::Utc::now()
        .timestamp_nanos_opt()
        .context("current time does not fit in 64-bit nanoseconds")?;
    u64::try_from(nanos).context("current time is before the Unix epoch")
}

fn timestamp_seed(time: &str) -> Result<u64> {
    let parsed = chrono::DateTime::parse_from_rfc3339(time)
        .with_context(|| format!("invalid RFC 3339 timestamp: {}", time))?;
    let nanos = parsed
        .timestamp_nanos_opt()
        .context("timestamp does not fit in 64-bit nanoseconds")?;
    u64::try_from(nanos).context("timestamp is before the Unix epoch")
}

#[allow(clippy::too_many_arguments)]
fn run_crack(
    target_text: &str,
    start_seed: u64,
    attempts: u64,
    backend_kind: BackendKind,
    generator_kind: GeneratorKind,
    alphabet: Alphabet,
    config: &BackendConfig,
    show_progress: bool,
) -> Result<ExitCode> {
    let generator = PasswordGenerator::new(generator_kind, Arc::new(alphabet));
    let target = Target::new(target_text, generator.alphabet())?;
    let range = SearchRange::new(start_seed, attempts)?;
    let backend = backend_kind.create(config)?;

    eprintln!(
        "Searching {} seeds down from {} (backend: {}, generator: {}, alphabet: {} chars)...",
        range.attempts(),
        range.start_seed(),
        backend.name(),
        generator.name(),
        generator.alphabet().len()
    );

    let progress = show_progress.then(|| {
        let pb = ProgressBar::new(range.attempts());
        pb.set_style(devil_breaker::default_progress_style());
        pb
    });

    match backend.search(&generator, &target, range, progress.as_ref())? {
        SearchOutcome::Found(seed) => {
            println!("Password cracked! Seed: {}", seed);
            Ok(ExitCode::SUCCESS)
        }
        SearchOutcome::NotFound => {
            println!("Failed to crack the password within the seed range.");
            Ok(ExitCode::FAILURE)
        }
    }
}
