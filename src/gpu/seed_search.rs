//! GPU-accelerated seed search pipeline.

use super::buffer::{read_buffer_sync, GpuBufferFactory};
use super::{context::GpuContext, error::GpuError, shaders};
use crate::generator::GeneratorKind;
use crate::search::SearchRange;
use bytemuck::{Pod, Zeroable};
use std::sync::Arc;
use tracing::debug;

/// Workgroup size for the seed search shader.
///
/// IMPORTANT: This value MUST match `WORKGROUP_SIZE` in seed_search.wgsl.
/// Kept small because every invocation holds a 2496-byte MT19937-64 state.
const WORKGROUP_SIZE: u32 = 64;

/// Longest target the kernel can compare (size of the target buffer).
pub const MAX_TARGET_LEN: usize = 32;

/// Bytes of the output buffer: found flag + winning offset.
const OUTPUT_SIZE: u64 = 8;

/// Parameters passed to the seed search shader.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct SeedSearchParams {
    base_lo: u32,
    base_hi: u32,
    count: u32,
    length: u32,
    alphabet_size: u32,
    threshold: u32,
    generator: u32,
    _pad: u32,
}

/// Double buffer set for pipelining
struct BufferSet {
    params: wgpu::Buffer,
    output: wgpu::Buffer,
    staging: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Kernel input that stays fixed for a whole search.
#[derive(Debug, Clone, Copy)]
pub struct SeedSearchJob<'a> {
    /// Target password as alphabet indices
    pub target: &'a [u32],
    pub alphabet_size: u32,
    pub generator: GeneratorKind,
}

/// Result of a GPU seed search.
#[derive(Debug, Clone)]
pub struct SeedSearchResult {
    /// Offset below the start seed of the highest matching seed, if any.
    pub found_offset: Option<u64>,
    /// Number of seeds tested.
    pub seeds_tested: u64,
}

/// GPU pipeline for seed search.
///
/// Uses persistent buffers and double-buffering: while the device runs batch
/// N+1 the host reads the result of batch N.
pub struct GpuSeedSearchPipeline {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    pipeline: wgpu::ComputePipeline,
    target_buffer: wgpu::Buffer,
    buffer_sets: [BufferSet; 2],
    max_batch: u32,
}

impl GpuSeedSearchPipeline {
    /// Create a new seed search pipeline with pre-allocated buffers.
    pub fn new(ctx: &GpuContext) -> Result<Self, GpuError> {
        let shader = ctx.scoped(wgpu::ErrorFilter::Validation, GpuError::ShaderCompilation, || {
            ctx.device
                .create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some("seed-search-shader"),
                    source: wgpu::ShaderSource::Wgsl(shaders::SEED_SEARCH_SHADER.into()),
                })
        })?;

        let bind_group_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("seed-search-bind-group-layout"),
                    entries: &[
                        // Params (uniform)
                        wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                        // Target indices (storage, read-only)
                        wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Storage { read_only: true },
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                        // Found flag + offset (storage, read-write)
                        wgpu::BindGroupLayoutEntry {
                            binding: 2,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Storage { read_only: false },
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                    ],
                });

        let pipeline_layout =
            ctx.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("seed-search-pipeline-layout"),
                    bind_group_layouts: &[&bind_group_layout],
                    push_constant_ranges: &[],
                });

        let pipeline = ctx.scoped(wgpu::ErrorFilter::Validation, GpuError::ShaderCompilation, || {
            ctx.device
                .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                    label: Some("seed-search-pipeline"),
                    layout: Some(&pipeline_layout),
                    module: &shader,
                    entry_point: Some("main"),
                    compilation_options: Default::default(),
                    cache: None,
                })
        })?;

        let factory = GpuBufferFactory::new(ctx);

        let (target_buffer, buffer_sets) =
            ctx.scoped(wgpu::ErrorFilter::OutOfMemory, GpuError::Allocation, || {
                let target_buffer = factory.create_storage_buffer(
                    "seed-search-target",
                    (MAX_TARGET_LEN * std::mem::size_of::<u32>()) as u64,
                );

                let buffer_sets = std::array::from_fn(|i| {
                    let label_suffix = if i == 0 { "a" } else { "b" };

                    let params = factory.create_uniform_buffer(
                        &format!("seed-search-params-{}", label_suffix),
                        std::mem::size_of::<SeedSearchParams>() as u64,
                    );
                    let output = factory.create_output_buffer(
                        &format!("seed-search-output-{}", label_suffix),
                        OUTPUT_SIZE,
                    );
                    let staging = factory.create_staging_buffer(
                        &format!("seed-search-staging-{}", label_suffix),
                        OUTPUT_SIZE,
                    );

                    let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                        label: Some(&format!("seed-search-bind-group-{}", label_suffix)),
                        layout: &bind_group_layout,
                        entries: &[
                            wgpu::BindGroupEntry {
                                binding: 0,
                                resource: params.as_entire_binding(),
                            },
                            wgpu::BindGroupEntry {
                                binding: 1,
                                resource: target_buffer.as_entire_binding(),
                            },
                            wgpu::BindGroupEntry {
                                binding: 2,
                                resource: output.as_entire_binding(),
                            },
                        ],
                    });

                    BufferSet {
                        params,
                        output,
                        staging,
                        bind_group,
                    }
                });

                (target_buffer, buffer_sets)
            })?;

        Ok(Self {
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
            pipeline,
            target_buffer,
            buffer_sets,
            max_batch: ctx.max_invocations_per_dispatch(WORKGROUP_SIZE),
        })
    }

    /// Largest batch a single launch can cover.
    pub fn max_batch(&self) -> u32 {
        self.max_batch
    }

    /// Upload the target indices, zero-padded to the buffer size.
    fn set_target(&self, target: &[u32]) {
        let mut padded = [0u32; MAX_TARGET_LEN];
        padded[..target.len()].copy_from_slice(target);
        self.queue
            .write_buffer(&self.target_buffer, 0, bytemuck::cast_slice(&padded));
    }

    /// Submit a batch for execution using the specified buffer set.
    fn submit_batch(
        &self,
        buffer_idx: usize,
        job: &SeedSearchJob<'_>,
        base_seed: u64,
        count: u32,
    ) -> Result<(), GpuError> {
        let set = &self.buffer_sets[buffer_idx];
        let size = u64::from(job.alphabet_size);

        let params = SeedSearchParams {
            base_lo: base_seed as u32,
            base_hi: (base_seed >> 32) as u32,
            count,
            length: job.target.len() as u32,
            alphabet_size: job.alphabet_size,
            threshold: (size.wrapping_neg() % size) as u32,
            generator: match job.generator {
                GeneratorKind::Mt64 => 0,
                GeneratorKind::Lcg => 1,
            },
            _pad: 0,
        };

        let workgroups = count.div_ceil(WORKGROUP_SIZE);

        let device = &self.device;
        let queue = &self.queue;
        let pipeline = &self.pipeline;

        // Errors from this scope are raised on the next pop, so launch
        // failures surface here rather than as a silent "not found".
        let scope = wgpu::ErrorFilter::Validation;
        device.push_error_scope(scope);

        queue.write_buffer(&set.params, 0, bytemuck::bytes_of(&params));
        queue.write_buffer(&set.output, 0, bytemuck::cast_slice(&[0u32, u32::MAX]));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("seed-search-encoder"),
        });

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("seed-search-pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &set.bind_group, &[]);
            pass.dispatch_workgroups(workgroups, 1, 1);
        }

        queue.submit(Some(encoder.finish()));

        match pollster::block_on(device.pop_error_scope()) {
            Some(err) => Err(GpuError::Launch(err.to_string())),
            None => Ok(()),
        }
    }

    /// Read the winning offset within a batch, if any invocation matched.
    fn read_results(&self, buffer_idx: usize) -> Result<Option<u32>, GpuError> {
        let set = &self.buffer_sets[buffer_idx];

        let data = read_buffer_sync(
            &self.device,
            &self.queue,
            &set.output,
            &set.staging,
            OUTPUT_SIZE,
        )?;
        let [found, offset]: [u32; 2] =
            bytemuck::pod_read_unaligned(&data[..OUTPUT_SIZE as usize]);

        Ok((found != 0).then_some(offset))
    }

    /// Search `range` from its top seed down, in launches of `batch_size` seeds.
    ///
    /// Calls the progress callback with the number of seeds tested after every
    /// batch. Stops launching after the first batch with a match.
    pub fn search<F>(
        &self,
        job: &SeedSearchJob<'_>,
        range: SearchRange,
        batch_size: u32,
        mut progress: F,
    ) -> Result<SeedSearchResult, GpuError>
    where
        F: FnMut(u64),
    {
        if job.target.len() > MAX_TARGET_LEN {
            return Err(GpuError::Launch(format!(
                "target of {} characters exceeds kernel limit {}",
                job.target.len(),
                MAX_TARGET_LEN
            )));
        }

        let total = range.attempts();
        let batch = u64::from(batch_size.clamp(1, self.max_batch.max(1)));

        if total == 0 {
            return Ok(SeedSearchResult {
                found_offset: None,
                seeds_tested: 0,
            });
        }

        self.set_target(job.target);

        let mut next_offset = 0u64;
        let mut submit = |buffer_idx: usize| -> Result<Option<(u64, u32)>, GpuError> {
            if next_offset >= total {
                return Ok(None);
            }
            let first = next_offset;
            let launch = range.split_at(first, batch);
            let base_seed = launch.start_seed();
            let count = launch.attempts() as u32;

            debug!(buffer_idx, base_seed, count, "launching seed search batch");
            self.submit_batch(buffer_idx, job, base_seed, count)?;

            next_offset += u64::from(count);
            Ok(Some((first, count)))
        };

        let mut active_buffer = 0usize;
        let mut pending = submit(active_buffer)?;
        let mut seeds_tested = 0u64;

        while let Some((first, count)) = pending {
            let next_buffer = 1 - active_buffer;
            let next = submit(next_buffer)?;

            if let Some(offset) = self.read_results(active_buffer)? {
                seeds_tested += u64::from(count);
                progress(seeds_tested);
                return Ok(SeedSearchResult {
                    found_offset: Some(first + u64::from(offset)),
                    seeds_tested,
                });
            }

            seeds_tested += u64::from(count);
            progress(seeds_tested);

            active_buffer = next_buffer;
            pending = next;
        }

        Ok(SeedSearchResult {
            found_offset: None,
            seeds_tested,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;
    use crate::generator::generate;
    use crate::target::Target;

    fn pipeline() -> Option<GpuSeedSearchPipeline> {
        let ctx = pollster::block_on(GpuContext::new()).ok()?;
        Some(GpuSeedSearchPipeline::new(&ctx).expect("Failed to create pipeline"))
    }

    fn target_for(kind: GeneratorKind, seed: u64, length: usize, alphabet: &Alphabet) -> Target {
        Target::new(&generate(kind, seed, length, alphabet), alphabet).unwrap()
    }

    #[test]
    fn test_params_layout() {
        assert_eq!(std::mem::size_of::<SeedSearchParams>(), 32);
    }

    #[test]
    #[ignore] // Requires GPU
    fn test_gpu_finds_seed() {
        let Some(pipeline) = pipeline() else { return };

        let alphabet = Alphabet::printable();
        let seed = 1_000_123u64;
        let target = target_for(GeneratorKind::Mt64, seed, 8, &alphabet);
        let job = SeedSearchJob {
            target: target.indices(),
            alphabet_size: alphabet.size(),
            generator: GeneratorKind::Mt64,
        };

        let range = SearchRange::new(1_000_200, 500).unwrap();
        let result = pipeline.search(&job, range, 1 << 16, |_| {}).expect("Search failed");
        assert_eq!(result.found_offset, Some(77));
    }

    #[test]
    #[ignore] // Requires GPU
    fn test_gpu_seed_above_32_bits() {
        let Some(pipeline) = pipeline() else { return };

        let alphabet = Alphabet::printable();
        let seed = 1_700_000_000_123_456_789u64;
        let target = target_for(GeneratorKind::Mt64, seed, 10, &alphabet);
        let job = SeedSearchJob {
            target: target.indices(),
            alphabet_size: alphabet.size(),
            generator: GeneratorKind::Mt64,
        };

        let range = SearchRange::new(seed + 1_000, 10_000).unwrap();
        let result = pipeline.search(&job, range, 4096, |_| {}).expect("Search failed");
        assert_eq!(result.found_offset, Some(1_000));
    }

    #[test]
    #[ignore] // Requires GPU
    fn test_gpu_not_found() {
        let Some(pipeline) = pipeline() else { return };

        let alphabet = Alphabet::printable();
        let target = target_for(GeneratorKind::Mt64, 5_000, 8, &alphabet);
        let job = SeedSearchJob {
            target: target.indices(),
            alphabet_size: alphabet.size(),
            generator: GeneratorKind::Mt64,
        };

        let range = SearchRange::new(4_999, 1_000).unwrap();
        let result = pipeline.search(&job, range, 256, |_| {}).expect("Search failed");
        assert_eq!(result.found_offset, None);
        assert_eq!(result.seeds_tested, 1_000);
    }

    #[test]
    #[ignore] // Requires GPU
    fn test_gpu_double_buffer_reports_batch_progress() {
        let Some(pipeline) = pipeline() else { return };

        let alphabet = Alphabet::printable();
        let seed = 500_000u64;
        let target = target_for(GeneratorKind::Lcg, seed, 8, &alphabet);
        let job = SeedSearchJob {
            target: target.indices(),
            alphabet_size: alphabet.size(),
            generator: GeneratorKind::Lcg,
        };

        let mut calls = Vec::new();
        let range = SearchRange::new(700_000, 300_000).unwrap();
        let result = pipeline
            .search(&job, range, 50_000, |tested| calls.push(tested))
            .expect("Search failed");

        assert_eq!(result.found_offset, Some(200_000));
        assert_eq!(calls, vec![50_000, 100_000, 150_000, 200_000, 250_000]);
    }

    #[test]
    #[ignore] // Requires GPU
    fn test_gpu_many_matches_in_one_launch_keep_lowest_offset() {
        let Some(pipeline) = pipeline() else { return };

        let alphabet = Alphabet::new("AB").unwrap();
        let range = SearchRange::new(u64::MAX, 50_000).unwrap();

        for kind in [GeneratorKind::Mt64, GeneratorKind::Lcg] {
            for text in ["A", "B", "BA", "ABB"] {
                let target = Target::new(text, &alphabet).unwrap();
                let job = SeedSearchJob {
                    target: target.indices(),
                    alphabet_size: alphabet.size(),
                    generator: kind,
                };

                // Thousands of invocations match in this single launch.
                let expected = (0..range.attempts()).find(|&offset| {
                    generate(kind, range.seed_at(offset), text.len(), &alphabet) == text
                });

                let result = pipeline.search(&job, range, 50_000, |_| {}).expect("Search failed");
                assert_eq!(result.found_offset, expected, "{} {:?}", kind.name(), text);
                assert_eq!(result.seeds_tested, 50_000);
            }
        }
    }

    #[test]
    #[ignore] // Requires GPU
    fn test_gpu_empty_target_matches_start_seed() {
        let Some(pipeline) = pipeline() else { return };

        let job = SeedSearchJob {
            target: &[],
            alphabet_size: 2,
            generator: GeneratorKind::Mt64,
        };
        let range = SearchRange::new(u64::MAX, 10_000).unwrap();
        let result = pipeline.search(&job, range, 1_000, |_| {}).expect("Search failed");

        assert_eq!(result.found_offset, Some(0));
        assert_eq!(result.seeds_tested, 1_000);
    }
}
