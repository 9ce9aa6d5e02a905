//! # Flock
//!
//! A classic boids flock of eight thousand animated fish chasing a moving
//! target.
//!
//! - Alignment, cohesion, and separation steer each fish relative to its
//!   flockmates
//! - The shared target orbits the origin, so the flock streams in a loop
//! - Frame interpolation blends between baked swim poses
//!
//! Drag with the left mouse button to orbit the camera; scroll to zoom.
//!
//! Run with: `cargo run --example flock`

use flockgpu::prelude::*;

#[path = "common/mod.rs"]
mod common;

fn main() -> Result<(), SimulationError> {
    let (mesh, skeleton, clip) = common::rigged_fish();

    Simulation::new(mesh, skeleton, clip)
        .with_boid_count(8192)
        .with_spawn(Vec3::ZERO, 25.0)
        .with_params(FlockParams {
            boid_speed: 4.0,
            neighbourhood_radius: 4.0,
            align_scale: 3,
            cohesion_scale: 3,
            separation_scale: 4,
            ..FlockParams::default()
        })
        .with_update(|ctx| {
            let t = ctx.time() * 0.25;
            ctx.params.target = Vec3::new(t.sin() * 35.0, (t * 1.7).sin() * 10.0, t.cos() * 35.0);
        })
        .run()
}
