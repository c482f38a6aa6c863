//! GPU seed search backend.

use indicatif::ProgressBar;
use std::sync::Mutex;
use tracing::debug;

use super::{SearchBackend, SearchError, SearchOutcome, SearchRange};
use crate::generator::{CandidateGenerator, PasswordGenerator};
use crate::gpu::{GpuContext, GpuSeedSearchPipeline, SeedSearchJob, MAX_TARGET_LEN};
use crate::target::Target;

/// Data-parallel search on a wgpu device.
pub struct GpuBackend {
    ctx: GpuContext,
    // Buffers are shared between launches, so searches run one at a time.
    pipeline: Mutex<GpuSeedSearchPipeline>,
    batch_size: u32,
}

impl GpuBackend {
    /// Initialize the device and compile the kernel.
    pub fn new() -> Result<Self, SearchError> {
        let ctx = GpuContext::new_sync()?;
        Self::with_context(ctx)
    }

    pub fn with_context(ctx: GpuContext) -> Result<Self, SearchError> {
        let pipeline = GpuSeedSearchPipeline::new(&ctx)?;
        debug!(device = %ctx.description(), max_batch = pipeline.max_batch(), "gpu backend ready");

        Ok(Self {
            ctx,
            pipeline: Mutex::new(pipeline),
            batch_size: 1 << 20,
        })
    }

    /// Seeds per kernel launch. Clamped to the device dispatch limit.
    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Adapter name and API.
    pub fn description(&self) -> String {
        self.ctx.description()
    }
}

impl SearchBackend for GpuBackend {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn search(
        &self,
        generator: &PasswordGenerator,
        target: &Target,
        range: SearchRange,
        progress: Option<&ProgressBar>,
    ) -> Result<SearchOutcome, SearchError> {
        if target.len() > MAX_TARGET_LEN {
            return Err(SearchError::TargetTooLong {
                length: target.len(),
                max: MAX_TARGET_LEN,
            });
        }

        if let Some(pb) = progress {
            pb.set_length(range.attempts());
            pb.set_message(format!("gpu {}", generator.name()));
        }

        let job = SeedSearchJob {
            target: target.indices(),
            alphabet_size: generator.alphabet().size(),
            generator: generator.kind(),
        };

        let pipeline = self.pipeline.lock().unwrap_or_else(|e| e.into_inner());
        let result = pipeline.search(&job, range, self.batch_size, |tested| {
            if let Some(pb) = progress {
                pb.set_position(tested);
            }
        });

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        let result = result?;
        debug!(
            seeds_tested = result.seeds_tested,
            found = ?result.found_offset,
            "gpu search finished"
        );

        Ok(match result.found_offset {
            Some(offset) => SearchOutcome::Found(range.seed_at(offset)),
            None => SearchOutcome::NotFound,
        })
    }
}
