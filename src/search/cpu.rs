//! CPU seed search: sequential reference scan and rayon-parallel block scan.

use indicatif::ProgressBar;
use rayon::prelude::*;
use tracing::{debug, trace};

use super::{ResultSlot, SearchBackend, SearchError, SearchOutcome, SearchRange};
use crate::generator::{CandidateGenerator, PasswordGenerator};
use crate::target::Target;

/// Seeds per parallel work unit; workers re-check the result slot between blocks.
const DEFAULT_BLOCK_SIZE: u64 = 4096;

/// Seeds between progress bar updates in the sequential scan.
const PROGRESS_INTERVAL: u64 = 100_000;

/// How the CPU backend enumerates a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuMode {
    /// One thread, highest seed first, stop at the first match
    Sequential,
    /// Blocks of seeds spread over a rayon pool
    Parallel,
}

/// CPU search backend.
#[derive(Debug, Clone)]
pub struct CpuBackend {
    mode: CpuMode,
    threads: Option<usize>,
    block_size: u64,
}

impl CpuBackend {
    /// Parallel backend on the global rayon pool.
    pub fn new() -> Self {
        Self {
            mode: CpuMode::Parallel,
            threads: None,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    /// Single-threaded reference backend.
    pub fn sequential() -> Self {
        Self {
            mode: CpuMode::Sequential,
            ..Self::new()
        }
    }

    /// Run the parallel scan on a dedicated pool with `threads` workers.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn with_block_size(mut self, block_size: u64) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    pub fn mode(&self) -> CpuMode {
        self.mode
    }

    /// Search with any candidate generator.
    pub fn search_with(
        &self,
        generator: &dyn CandidateGenerator,
        target: &Target,
        range: SearchRange,
        progress: Option<&ProgressBar>,
    ) -> Result<SearchOutcome, SearchError> {
        if let Some(pb) = progress {
            pb.set_length(range.attempts());
            pb.set_message(format!("{} {}", self.name(), generator.name()));
        }

        debug!(
            backend = self.name(),
            generator = generator.name(),
            start_seed = range.start_seed(),
            attempts = range.attempts(),
            "starting cpu search"
        );

        let outcome = match self.mode {
            CpuMode::Sequential => scan_sequential(generator, target, range, progress),
            CpuMode::Parallel => match self.threads {
                Some(threads) => {
                    let pool = rayon::ThreadPoolBuilder::new()
                        .num_threads(threads)
                        .build()
                        .map_err(|e| SearchError::Pool(e.to_string()))?;
                    pool.install(|| {
                        scan_parallel(generator, target, range, self.block_size, progress)
                    })
                }
                None => scan_parallel(generator, target, range, self.block_size, progress),
            },
        };

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        Ok(outcome)
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchBackend for CpuBackend {
    fn name(&self) -> &'static str {
        match self.mode {
            CpuMode::Sequential => "cpu-serial",
            CpuMode::Parallel => "cpu",
        }
    }

    fn search(
        &self,
        generator: &PasswordGenerator,
        target: &Target,
        range: SearchRange,
        progress: Option<&ProgressBar>,
    ) -> Result<SearchOutcome, SearchError> {
        self.search_with(generator, target, range, progress)
    }
}

fn scan_sequential(
    generator: &dyn CandidateGenerator,
    target: &Target,
    range: SearchRange,
    progress: Option<&ProgressBar>,
) -> SearchOutcome {
    let mut candidate = vec![0u32; target.len()];
    let mut last_progress = 0u64;

    for offset in 0..range.attempts() {
        let seed = range.seed_at(offset);
        generator.fill_indices(seed, &mut candidate);
        trace!(seed, candidate = %generator.alphabet().render(&candidate), "trying seed");

        if target.matches(&candidate) {
            if let Some(pb) = progress {
                pb.inc(offset + 1 - last_progress);
            }
            return SearchOutcome::Found(seed);
        }

        if let Some(pb) = progress {
            if offset + 1 - last_progress >= PROGRESS_INTERVAL {
                pb.inc(offset + 1 - last_progress);
                last_progress = offset + 1;
            }
        }
    }

    if let Some(pb) = progress {
        pb.inc(range.attempts() - last_progress);
    }

    SearchOutcome::NotFound
}

fn scan_parallel(
    generator: &dyn CandidateGenerator,
    target: &Target,
    range: SearchRange,
    block_size: u64,
    progress: Option<&ProgressBar>,
) -> SearchOutcome {
    let slot = ResultSlot::new();
    let blocks = range.attempts().div_ceil(block_size);

    (0..blocks).into_par_iter().for_each_init(
        || vec![0u32; target.len()],
        |candidate, block| {
            let first = block * block_size;
            let end = first.saturating_add(block_size).min(range.attempts());

            // A match at a lower offset already beats anything in this block.
            if slot.settled_before(first) {
                if let Some(pb) = progress {
                    pb.inc(end - first);
                }
                return;
            }

            for offset in first..end {
                let seed = range.seed_at(offset);
                generator.fill_indices(seed, candidate);
                trace!(seed, candidate = %generator.alphabet().render(candidate), "trying seed");

                if target.matches(candidate) {
                    if slot.claim(offset) {
                        debug!(seed, offset, "match claimed");
                    }
                    if let Some(pb) = progress {
                        pb.inc(end - first);
                    }
                    return;
                }
            }

            if let Some(pb) = progress {
                pb.inc(end - first);
            }
        },
    );

    slot.outcome(&range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;
    use crate::generator::GeneratorKind;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};

    /// Produces the target only for `hits`, records every seed it is asked for.
    struct CountingGenerator {
        alphabet: Alphabet,
        hits: Vec<u64>,
        calls: AtomicU64,
        seen: Mutex<Vec<u64>>,
    }

    impl CountingGenerator {
        fn new(hits: &[u64]) -> Self {
            Self {
                alphabet: Alphabet::new("AB").unwrap(),
                hits: hits.to_vec(),
                calls: AtomicU64::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn target(&self) -> Target {
            Target::new("AAA", &self.alphabet).unwrap()
        }

        fn calls(&self) -> u64 {
            self.calls.load(Ordering::Relaxed)
        }

        fn seen(&self) -> Vec<u64> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl CandidateGenerator for CountingGenerator {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn alphabet(&self) -> &Alphabet {
            &self.alphabet
        }

        fn fill_indices(&self, seed: u64, out: &mut [u32]) {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.seen.lock().unwrap().push(seed);
            let fill = if self.hits.contains(&seed) { 0 } else { 1 };
            out.iter_mut().for_each(|slot| *slot = fill);
        }
    }

    fn backends() -> Vec<CpuBackend> {
        vec![
            CpuBackend::sequential(),
            CpuBackend::new(),
            CpuBackend::new().with_threads(4).with_block_size(7),
        ]
    }

    fn printable(kind: GeneratorKind) -> PasswordGenerator {
        PasswordGenerator::new(kind, Arc::new(Alphabet::printable()))
    }

    #[test]
    fn test_finds_known_seed() {
        let generator = printable(GeneratorKind::Mt64);
        let known_seed = 1_000_123u64;
        let target = Target::new(&generator.generate(known_seed, 8), generator.alphabet()).unwrap();
        let range = SearchRange::new(1_000_200, 500).unwrap();

        for backend in backends() {
            let outcome = backend.search(&generator, &target, range, None).unwrap();
            assert_eq!(outcome, SearchOutcome::Found(known_seed), "{}", backend.name());
        }
    }

    #[test]
    fn test_finds_known_lcg_seed() {
        let generator = printable(GeneratorKind::Lcg);
        let known_seed = 77_777u64;
        let password = generator.generate(known_seed, 10);
        let target = Target::new(&password, generator.alphabet()).unwrap();
        let range = SearchRange::new(80_000, 5_000).unwrap();

        for backend in backends() {
            let outcome = backend.search(&generator, &target, range, None).unwrap();
            assert_eq!(outcome, SearchOutcome::Found(known_seed));
        }
    }

    #[test]
    fn test_seed_outside_range_not_found() {
        let generator = printable(GeneratorKind::Mt64);
        let target = Target::new(&generator.generate(5_000, 8), generator.alphabet()).unwrap();
        let range = SearchRange::new(4_999, 1_000).unwrap();

        for backend in backends() {
            let outcome = backend.search(&generator, &target, range, None).unwrap();
            assert_eq!(outcome, SearchOutcome::NotFound);
        }
    }

    #[test]
    fn test_every_seed_evaluated_once_without_match() {
        for backend in backends() {
            let generator = CountingGenerator::new(&[]);
            let range = SearchRange::new(10_000, 2_500).unwrap();

            let outcome = backend
                .search_with(&generator, &generator.target(), range, None)
                .unwrap();
            assert_eq!(outcome, SearchOutcome::NotFound);
            assert_eq!(generator.calls(), 2_500);

            let seen: HashSet<u64> = generator.seen().into_iter().collect();
            assert_eq!(seen.len(), 2_500);
            assert!(seen.iter().all(|&seed| range.contains(seed)));
        }
    }

    #[test]
    fn test_zero_attempts() {
        for backend in backends() {
            let generator = CountingGenerator::new(&[100]);
            let range = SearchRange::new(100, 0).unwrap();

            let outcome = backend
                .search_with(&generator, &generator.target(), range, None)
                .unwrap();
            assert_eq!(outcome, SearchOutcome::NotFound);
            assert_eq!(generator.calls(), 0);
        }
    }

    #[test]
    fn test_single_attempt_evaluates_start_seed() {
        for backend in backends() {
            let generator = CountingGenerator::new(&[]);
            let range = SearchRange::new(123, 1).unwrap();

            backend
                .search_with(&generator, &generator.target(), range, None)
                .unwrap();
            assert_eq!(generator.seen(), vec![123]);
        }
    }

    #[test]
    fn test_sequential_stops_at_first_match() {
        let generator = CountingGenerator::new(&[1_000]);
        let range = SearchRange::new(1_000, 100).unwrap();

        let outcome = CpuBackend::sequential()
            .search_with(&generator, &generator.target(), range, None)
            .unwrap();
        assert_eq!(outcome, SearchOutcome::Found(1_000));
        assert_eq!(generator.calls(), 1);
    }

    #[test]
    fn test_multiple_matches_report_highest_seed() {
        for backend in backends() {
            let generator = CountingGenerator::new(&[910, 990, 950, 905]);
            let range = SearchRange::new(1_000, 100).unwrap();

            let outcome = backend
                .search_with(&generator, &generator.target(), range, None)
                .unwrap();
            assert_eq!(outcome, SearchOutcome::Found(990), "{}", backend.name());
        }
    }

    #[test]
    fn test_match_at_lowest_seed() {
        for backend in backends() {
            let generator = CountingGenerator::new(&[901]);
            let range = SearchRange::new(1_000, 100).unwrap();

            let outcome = backend
                .search_with(&generator, &generator.target(), range, None)
                .unwrap();
            assert_eq!(outcome, SearchOutcome::Found(901));
        }
    }

    #[test]
    fn test_progress_reaches_range_length() {
        let generator = CountingGenerator::new(&[]);
        let range = SearchRange::new(50_000, 20_000).unwrap();
        let pb = ProgressBar::hidden();

        CpuBackend::new()
            .search_with(&generator, &generator.target(), range, Some(&pb))
            .unwrap();
        assert_eq!(pb.position(), 20_000);
    }

    #[test]
    fn test_names() {
        assert_eq!(CpuBackend::new().name(), "cpu");
        assert_eq!(CpuBackend::sequential().name(), "cpu-serial");
        assert_eq!(CpuBackend::sequential().mode(), CpuMode::Sequential);
    }
}
