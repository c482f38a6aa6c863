//! WGSL shader sources.

/// Seed search shader source (MT19937-64 and LCG candidate generation).
pub const SEED_SEARCH_SHADER: &str = include_str!("seed_search.wgsl");
