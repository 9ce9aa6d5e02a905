//! Per-frame behavior parameters and their GPU uniform mirror.
//!
//! [`FlockParams`] holds the host-tunable knobs; [`SimParams`] is the exact
//! uniform block layout both shaders read. The two are kept in sync by
//! [`FlockParams::to_gpu`], which the orchestrator calls every frame.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Behavior parameters pushed to the update kernel every frame.
#[derive(Clone, Debug)]
pub struct FlockParams {
    /// Maximum angular change of a heading, radians per second.
    pub rotation_speed: f32,
    /// Base movement speed, units per second.
    pub boid_speed: f32,
    /// Predator speed as a multiple of `boid_speed` (typical: 1-3).
    pub predator_speed_multiplier: f32,
    /// Outer gate on every neighbor scan.
    pub neighbourhood_radius: f32,
    /// Neighbors inside this distance feed the alignment accumulator.
    pub alignment_radius: f32,
    /// Neighbors inside this distance feed the cohesion centroid.
    pub cohesion_radius: f32,
    /// Neighbors inside this distance push back through separation.
    pub separation_radius: f32,
    /// A predator inside this distance makes prey flee.
    pub flee_radius: f32,
    /// Prey inside this distance makes a predator chase.
    pub hunt_radius: f32,
    /// Integer weight 1-5 on the alignment term.
    pub align_scale: u32,
    /// Integer weight 1-5 on the cohesion term.
    pub cohesion_scale: u32,
    /// Integer weight 1-5 on the separation term.
    pub separation_scale: u32,
    /// Shared point the flock drifts toward when nothing else applies.
    pub target: Vec3,
    /// Animation frames advanced per second.
    pub animation_frame_speed: f32,
}

impl Default for FlockParams {
    fn default() -> Self {
        Self {
            rotation_speed: 2.0,
            boid_speed: 3.0,
            predator_speed_multiplier: 2.0,
            neighbourhood_radius: 4.0,
            alignment_radius: 3.0,
            cohesion_radius: 4.0,
            separation_radius: 1.0,
            flee_radius: 6.0,
            hunt_radius: 10.0,
            align_scale: 2,
            cohesion_scale: 3,
            separation_scale: 4,
            target: Vec3::ZERO,
            animation_frame_speed: 12.0,
        }
    }
}

impl FlockParams {
    /// Pack into the uniform block, filling in the per-frame and setup-time
    /// values the host owns. Scales are clamped to their documented 1-5
    /// range.
    pub fn to_gpu(
        &self,
        delta_time: f32,
        boid_count: u32,
        frame_count: u32,
        frame_interpolation: bool,
    ) -> SimParams {
        SimParams {
            target: self.target.to_array(),
            delta_time,
            rotation_speed: self.rotation_speed,
            boid_speed: self.boid_speed,
            predator_speed_multiplier: self.predator_speed_multiplier,
            neighbourhood_radius: self.neighbourhood_radius,
            alignment_radius: self.alignment_radius,
            cohesion_radius: self.cohesion_radius,
            separation_radius: self.separation_radius,
            flee_radius: self.flee_radius,
            hunt_radius: self.hunt_radius,
            animation_frame_speed: self.animation_frame_speed,
            align_scale: self.align_scale.clamp(1, 5),
            cohesion_scale: self.cohesion_scale.clamp(1, 5),
            separation_scale: self.separation_scale.clamp(1, 5),
            boid_count,
            frame_count,
            frame_interpolation: frame_interpolation as u32,
        }
    }
}

/// Uniform block read by the compute and render shaders.
///
/// Must match the WGSL `SimParams` struct field for field.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SimParams {
    pub target: [f32; 3],
    pub delta_time: f32,
    pub rotation_speed: f32,
    pub boid_speed: f32,
    pub predator_speed_multiplier: f32,
    pub neighbourhood_radius: f32,
    pub alignment_radius: f32,
    pub cohesion_radius: f32,
    pub separation_radius: f32,
    pub flee_radius: f32,
    pub hunt_radius: f32,
    pub animation_frame_speed: f32,
    pub align_scale: u32,
    pub cohesion_scale: u32,
    pub separation_scale: u32,
    pub boid_count: u32,
    pub frame_count: u32,
    pub frame_interpolation: u32,
}

const _: () = assert!(
    std::mem::size_of::<SimParams>() == 80,
    "size of SimParams does not match WGSL"
);
const _: () = assert!(
    std::mem::offset_of!(SimParams, delta_time) == 12,
    "offset of SimParams.delta_time does not match WGSL"
);
const _: () = assert!(
    std::mem::offset_of!(SimParams, align_scale) == 56,
    "offset of SimParams.align_scale does not match WGSL"
);
const _: () = assert!(
    std::mem::offset_of!(SimParams, frame_interpolation) == 76,
    "offset of SimParams.frame_interpolation does not match WGSL"
);
