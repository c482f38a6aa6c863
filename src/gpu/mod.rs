//! GPU acceleration module using wgpu.
//!
//! Provides the data-parallel seed search: one kernel invocation per seed,
//! launched in batches from the host.

mod buffer;
mod context;
mod error;
mod seed_search;
mod shaders;

pub use buffer::GpuBufferFactory;
pub use context::GpuContext;
pub use error::GpuError;
pub use seed_search::{GpuSeedSearchPipeline, SeedSearchJob, SeedSearchResult, MAX_TARGET_LEN};
