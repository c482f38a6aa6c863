//! Seed search over a descending range.
//!
//! A search walks `start_seed, start_seed - 1, ...` for `attempts` seeds and
//! reports the first seed whose candidate equals the target. Backends differ
//! only in how they enumerate; all of them report the highest matching seed
//! (lowest offset from `start_seed`), so verdicts agree across backends.

mod cpu;
#[cfg(feature = "gpu")]
mod gpu;

pub use cpu::{CpuBackend, CpuMode};
#[cfg(feature = "gpu")]
pub use gpu::GpuBackend;

use indicatif::ProgressBar;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::generator::PasswordGenerator;
use crate::target::Target;

/// Outcome of a search over a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Seed whose candidate equals the target
    Found(u64),
    /// The whole range was evaluated without a match
    NotFound,
}

impl SearchOutcome {
    pub fn seed(&self) -> Option<u64> {
        match self {
            SearchOutcome::Found(seed) => Some(*seed),
            SearchOutcome::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, SearchOutcome::Found(_))
    }
}

/// Errors that abort a search before it produces an outcome.
#[derive(Debug)]
pub enum SearchError {
    /// The descending range would go below seed zero
    InvalidRange { start_seed: u64, attempts: u64 },
    /// Backend not known or not compiled in
    InvalidBackendChoice(String),
    /// Target longer than the backend can hold
    TargetTooLong { length: usize, max: usize },
    /// Worker thread pool could not be built
    Pool(String),
    /// GPU failure (allocation, launch, transfer)
    #[cfg(feature = "gpu")]
    Device(crate::gpu::GpuError),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::InvalidRange { start_seed, attempts } => write!(
                f,
                "Invalid seed range: {} attempts below start seed {} would underflow",
                attempts, start_seed
            ),
            SearchError::InvalidBackendChoice(name) => write!(f, "Backend unavailable: {}", name),
            SearchError::TargetTooLong { length, max } => write!(
                f,
                "Target has {} characters, backend supports at most {}",
                length, max
            ),
            SearchError::Pool(msg) => write!(f, "Thread pool error: {}", msg),
            #[cfg(feature = "gpu")]
            SearchError::Device(e) => write!(f, "Device error: {}", e),
        }
    }
}

impl std::error::Error for SearchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            #[cfg(feature = "gpu")]
            SearchError::Device(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(feature = "gpu")]
impl From<crate::gpu::GpuError> for SearchError {
    fn from(err: crate::gpu::GpuError) -> Self {
        SearchError::Device(err)
    }
}

/// Seeds `(start_seed - attempts, start_seed]`, enumerated from the top.
///
/// Offset `i` is the seed `start_seed - i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchRange {
    start_seed: u64,
    attempts: u64,
}

impl SearchRange {
    /// Rejects ranges that would underflow (`attempts > start_seed`).
    pub fn new(start_seed: u64, attempts: u64) -> Result<Self, SearchError> {
        if attempts > start_seed {
            return Err(SearchError::InvalidRange { start_seed, attempts });
        }
        Ok(Self { start_seed, attempts })
    }

    pub fn start_seed(&self) -> u64 {
        self.start_seed
    }

    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn is_empty(&self) -> bool {
        self.attempts == 0
    }

    /// Seed at `offset` from the top. `offset` must be below `attempts`.
    #[inline]
    pub fn seed_at(&self, offset: u64) -> u64 {
        debug_assert!(offset < self.attempts);
        self.start_seed - offset
    }

    /// Lowest seed in the range, if any.
    pub fn lowest_seed(&self) -> Option<u64> {
        (!self.is_empty()).then(|| self.start_seed - (self.attempts - 1))
    }

    pub fn contains(&self, seed: u64) -> bool {
        seed <= self.start_seed && self.start_seed - seed < self.attempts
    }

    /// Sub-range of `count` seeds starting `offset` below the top.
    pub fn split_at(&self, offset: u64, count: u64) -> SearchRange {
        let count = count.min(self.attempts.saturating_sub(offset));
        SearchRange {
            start_seed: self.start_seed - offset.min(self.attempts),
            attempts: count,
        }
    }
}

/// Shared winning-offset slot.
///
/// Workers that find a match claim their offset with an atomic minimum; the
/// slot ends up holding the lowest matching offset no matter which worker
/// finishes first.
#[derive(Debug)]
pub struct ResultSlot {
    best: AtomicU64,
}

impl ResultSlot {
    const EMPTY: u64 = u64::MAX;

    pub fn new() -> Self {
        Self {
            best: AtomicU64::new(Self::EMPTY),
        }
    }

    /// Record a match at `offset`. Returns true when `offset` is now the best.
    pub fn claim(&self, offset: u64) -> bool {
        self.best.fetch_min(offset, Ordering::AcqRel) > offset
    }

    /// Lowest claimed offset.
    pub fn best(&self) -> Option<u64> {
        match self.best.load(Ordering::Acquire) {
            Self::EMPTY => None,
            offset => Some(offset),
        }
    }

    /// Whether a match below `offset` is already known, making work at
    /// `offset` and above irrelevant.
    #[inline]
    pub fn settled_before(&self, offset: u64) -> bool {
        self.best.load(Ordering::Acquire) < offset
    }

    /// Convert the claimed offset into an outcome over `range`.
    pub fn outcome(&self, range: &SearchRange) -> SearchOutcome {
        match self.best() {
            Some(offset) => SearchOutcome::Found(range.seed_at(offset)),
            None => SearchOutcome::NotFound,
        }
    }
}

impl Default for ResultSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Execution strategy implementing the search contract.
pub trait SearchBackend: Send + Sync {
    /// Human-readable name of this backend
    fn name(&self) -> &'static str;

    /// Search `range` for a seed whose candidate equals `target`.
    ///
    /// Progress bar is optional; backends advance it by seeds evaluated.
    fn search(
        &self,
        generator: &PasswordGenerator,
        target: &Target,
        range: SearchRange,
        progress: Option<&ProgressBar>,
    ) -> Result<SearchOutcome, SearchError>;
}

/// Backend tuning shared by all kinds.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Worker threads for the parallel CPU scan (None = rayon default)
    pub threads: Option<usize>,
    /// Seeds per GPU launch
    pub batch_size: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            threads: None,
            batch_size: 1 << 20,
        }
    }
}

/// Available backends for CLI selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Parallel CPU scan
    #[default]
    Cpu,
    /// Single-threaded reference scan
    CpuSequential,
    /// wgpu compute kernel
    Gpu,
}

impl BackendKind {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "cpu" => Ok(BackendKind::Cpu),
            "cpu-serial" | "cpu-sequential" => Ok(BackendKind::CpuSequential),
            "gpu" => Ok(BackendKind::Gpu),
            _ => Err(format!("Unknown backend: {}. Valid: cpu, cpu-serial, gpu", s)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Cpu => "cpu",
            BackendKind::CpuSequential => "cpu-serial",
            BackendKind::Gpu => "gpu",
        }
    }

    /// Create a backend instance.
    pub fn create(&self, config: &BackendConfig) -> Result<Box<dyn SearchBackend>, SearchError> {
        match self {
            BackendKind::Cpu => {
                let mut backend = CpuBackend::new();
                if let Some(threads) = config.threads {
                    backend = backend.with_threads(threads);
                }
                Ok(Box::new(backend))
            }
            BackendKind::CpuSequential => Ok(Box::new(CpuBackend::sequential())),
            #[cfg(feature = "gpu")]
            BackendKind::Gpu => {
                let backend = GpuBackend::new()?.with_batch_size(config.batch_size);
                Ok(Box::new(backend))
            }
            #[cfg(not(feature = "gpu"))]
            BackendKind::Gpu => Err(SearchError::InvalidBackendChoice(
                "gpu (built without the `gpu` feature)".to_string(),
            )),
        }
    }
}
