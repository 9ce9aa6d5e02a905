//! Indirect draw argument blocks, one per submesh.
//!
//! Field order is the fixed five-word indexed-indirect format the device
//! consumes: `{index_count, instance_count, index_start, base_vertex,
//! start_instance}`. A single indirect draw covers every instance, so
//! `start_instance` is always 0.

use bytemuck::{Pod, Zeroable};

use crate::animation::SkinnedMesh;

/// One indexed-indirect argument block (20 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct DrawArgs {
    pub index_count: u32,
    pub instance_count: u32,
    pub index_start: u32,
    pub base_vertex: u32,
    pub start_instance: u32,
}

const _: () = assert!(std::mem::size_of::<DrawArgs>() == 5 * 4);

/// Byte stride between consecutive argument blocks in the indirect buffer.
pub const DRAW_ARGS_STRIDE: u64 = std::mem::size_of::<DrawArgs>() as u64;

/// Build one argument block per submesh, each drawing `instance_count`
/// instances. A mesh with no submeshes yields no draw calls; that renders
/// nothing and is not an error.
pub fn build_draw_args(mesh: &SkinnedMesh, instance_count: u32) -> Vec<DrawArgs> {
    mesh.submeshes
        .iter()
        .map(|sub| DrawArgs {
            index_count: sub.index_count,
            instance_count,
            index_start: sub.index_start,
            base_vertex: sub.base_vertex,
            start_instance: 0,
        })
        .collect()
}
