//! # flockgpu
//!
//! GPU-accelerated flocking with predator/prey behavior and baked skeletal
//! animation, rendered through indirect instanced draws.
//!
//! Every agent lives in a fixed 48-byte GPU record; a compute kernel steers
//! the whole flock in parallel each frame, and the vertex shader skins each
//! instance from a pre-baked animation table, so no per-frame CPU work
//! scales with the flock size.
//!
//! ## Quick Start
//!
//! ```ignore
//! use flockgpu::prelude::*;
//!
//! fn main() -> Result<(), SimulationError> {
//!     let (mesh, skeleton, clip) = my_rigged_mesh();
//!     Simulation::new(mesh, skeleton, clip)
//!         .with_boid_count(8192)
//!         .with_predator_count(8)
//!         .with_spawn(Vec3::ZERO, 25.0)
//!         .with_update(|ctx| {
//!             let t = ctx.time();
//!             ctx.params.target = Vec3::new(t.sin() * 30.0, 0.0, t.cos() * 30.0);
//!         })
//!         .run()
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Boids
//!
//! Each agent carries a position, a unit heading, a role (prey or
//! predator), a behavior state, and an animation phase. Roles are fixed at
//! spawn; states flip on the GPU as threats and targets come and go.
//!
//! ### Baked animation
//!
//! [`animation::bake`] samples a skeletal clip at a power-of-two number of
//! frames and flattens the skinned positions and normals into one table.
//! The vertex shader indexes it as `vertex * frame_count + frame`, with
//! optional blending toward the next frame.
//!
//! ### Indirect draws
//!
//! Draw arguments for every submesh are written to a single GPU buffer at
//! setup, one five-word block per submesh. Rendering issues one
//! `draw_indexed_indirect` per submesh and never rebuilds the arguments.

pub mod animation;
pub mod draw_args;
pub mod error;
pub mod flock;
mod gpu;
pub mod params;
mod shaders;
mod simulation;
mod step;
pub mod time;

pub use bytemuck;
pub use draw_args::{build_draw_args, DrawArgs, DRAW_ARGS_STRIDE};
pub use error::{GpuError, SetupError, SimulationError};
pub use flock::{spawn_flock, BehaviorState, Boid, BoidGpu, BoidRole, RECORD_STRIDE};
pub use glam::{Quat, Vec2, Vec3, Vec4};
pub use params::{FlockParams, SimParams};
pub use simulation::{FrameContext, Simulation};
pub use step::{step_boid, step_flock};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use flockgpu::prelude::*;
/// ```
pub mod prelude {
    pub use crate::animation::{
        bake, AnimationClip, BakedAnimation, Joint, JointChannel, Skeleton, SkinnedMesh, SubMesh,
    };
    pub use crate::error::{GpuError, SetupError, SimulationError};
    pub use crate::flock::{spawn_flock, BehaviorState, Boid, BoidRole};
    pub use crate::params::FlockParams;
    pub use crate::simulation::{FrameContext, Simulation};
    pub use crate::time::Time;
    pub use crate::{Quat, Vec2, Vec3, Vec4};
}
