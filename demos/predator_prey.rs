//! # Predator & Prey
//!
//! A shoal of prey (blue) hunted by a handful of faster predators (red).
//! Prey within a predator's flee radius break formation and turn yellow
//! until they open up enough distance; predators lock onto the nearest
//! prey inside their hunt radius.
//!
//! ## Try This
//!
//! - Raise `predator_speed_multiplier` to make escapes rarer
//! - Shrink `flee_radius` so predators get closer before the shoal scatters
//! - Toggle frame interpolation off to see the raw 16-frame bake
//!
//! Run with: `cargo run --example predator_prey`

use flockgpu::prelude::*;

#[path = "common/mod.rs"]
mod common;

fn main() -> Result<(), SimulationError> {
    let (mesh, skeleton, clip) = common::rigged_fish();

    Simulation::new(mesh, skeleton, clip)
        .with_boid_count(4096)
        .with_predator_count(12)
        .with_spawn(Vec3::ZERO, 30.0)
        .with_params(FlockParams {
            boid_speed: 3.5,
            predator_speed_multiplier: 2.2,
            flee_radius: 8.0,
            hunt_radius: 14.0,
            separation_scale: 5,
            ..FlockParams::default()
        })
        .with_update(|ctx| {
            // A slow figure-eight keeps the shoal moving through open water.
            let t = ctx.time() * 0.15;
            ctx.params.target =
                Vec3::new((2.0 * t).sin() * 40.0, t.sin() * 8.0, t.cos() * 40.0);
        })
        .run()
}
