//! Embedded WGSL sources.

/// The per-boid update kernel (see `flock.wgsl`).
pub const COMPUTE_SOURCE: &str = include_str!("flock.wgsl");

/// The instanced skinned render shaders (see `render.wgsl`).
pub const RENDER_SOURCE: &str = include_str!("render.wgsl");

/// Compute workgroup width; the dispatch covers `ceil(count / this)` groups.
pub const WORKGROUP_SIZE: u32 = 256;
