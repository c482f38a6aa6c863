//! Devil Breaker - seed search for passwords from seeded pseudo-random generators.
//!
//! A password generated by seeding a Mersenne Twister (or an LCG) with a
//! clock reading can be recovered by enumerating the seeds around that
//! reading. This crate maps seeds to candidate passwords and scans seed
//! ranges on the CPU or a GPU until the candidate equals a known target.

pub mod alphabet;
pub mod benchmark;
pub mod generator;
pub mod lcg;
pub mod mt64;
pub mod search;
pub mod target;

#[cfg(feature = "gpu")]
pub mod gpu;

pub use alphabet::Alphabet;
pub use generator::{CandidateGenerator, GeneratorKind, PasswordGenerator};
pub use search::{SearchBackend, SearchError, SearchOutcome, SearchRange};
pub use target::Target;

/// Default progress bar style for CLI operations.
pub fn default_progress_style() -> indicatif::ProgressStyle {
    indicatif::ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}) {msg}")
        .unwrap()
        .progress_chars("#>-")
}
