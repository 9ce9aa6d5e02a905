//! The boid record store: per-agent state, its GPU layout, and spawning.
//!
//! The GPU-side record layout is a hard contract between host and kernel.
//! [`BoidGpu`] must stay exactly [`RECORD_STRIDE`] bytes with the field
//! offsets the compute and render shaders assume; the `const` assertions
//! below and [`assert_record_stride`] enforce that at compile time and at
//! setup respectively.

use bytemuck::{Pod, Zeroable};
use glam::{Quat, Vec3};
use rand::Rng;

use crate::error::SetupError;

/// Byte stride of one boid record in device memory.
///
/// The WGSL `Boid` struct in `flock.wgsl` and `render.wgsl` is sized to
/// match. Changing either side alone corrupts every frame.
pub const RECORD_STRIDE: usize = 48;

/// Whether a boid hunts or flocks. Fixed at spawn, never mutated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoidRole {
    Prey,
    Predator,
}

impl From<BoidRole> for u32 {
    fn from(role: BoidRole) -> u32 {
        match role {
            BoidRole::Prey => 0,
            BoidRole::Predator => 1,
        }
    }
}

impl From<u32> for BoidRole {
    fn from(v: u32) -> BoidRole {
        match v {
            1 => BoidRole::Predator,
            _ => BoidRole::Prey,
        }
    }
}

/// Behavior state, re-evaluated by the update kernel every frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BehaviorState {
    /// Flocking (prey) or wandering (predator).
    #[default]
    Normal,
    /// Prey only: overriding steering to escape the nearest predator.
    FleeingPredator,
    /// Predator only: steering toward the nearest prey.
    Chasing,
}

impl From<BehaviorState> for u32 {
    fn from(state: BehaviorState) -> u32 {
        match state {
            BehaviorState::Normal => 0,
            BehaviorState::FleeingPredator => 1,
            BehaviorState::Chasing => 2,
        }
    }
}

impl From<u32> for BehaviorState {
    fn from(v: u32) -> BehaviorState {
        match v {
            1 => BehaviorState::FleeingPredator,
            2 => BehaviorState::Chasing,
            _ => BehaviorState::Normal,
        }
    }
}

/// Host-side boid record.
#[derive(Clone, Debug)]
pub struct Boid {
    /// World-space position.
    pub position: Vec3,
    /// Unit forward vector.
    pub heading: Vec3,
    pub role: BoidRole,
    pub state: BehaviorState,
    /// Current animation frame, `0..frame_count`.
    pub anim_frame: u32,
    /// Frame blended toward when interpolation is enabled.
    pub anim_next_frame: u32,
    /// Blend weight in `[0, 1)` between the two frames.
    pub anim_interpolation: f32,
}

impl Boid {
    pub fn to_gpu(&self) -> BoidGpu {
        BoidGpu {
            position: self.position.to_array(),
            role: self.role.into(),
            heading: self.heading.to_array(),
            state: self.state.into(),
            anim_frame: self.anim_frame,
            anim_next_frame: self.anim_next_frame,
            anim_interpolation: self.anim_interpolation,
            _pad: 0,
        }
    }

    pub fn from_gpu(gpu: &BoidGpu) -> Self {
        Self {
            position: Vec3::from_array(gpu.position),
            heading: Vec3::from_array(gpu.heading),
            role: gpu.role.into(),
            state: gpu.state.into(),
            anim_frame: gpu.anim_frame,
            anim_next_frame: gpu.anim_next_frame,
            anim_interpolation: gpu.anim_interpolation,
        }
    }
}

/// GPU representation of one boid, matching the WGSL `Boid` struct.
///
/// Scalars are packed into the 4 bytes trailing each vec3 so the record
/// stays at 48 bytes under WGSL alignment rules.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct BoidGpu {
    pub position: [f32; 3],
    pub role: u32,
    pub heading: [f32; 3],
    pub state: u32,
    pub anim_frame: u32,
    pub anim_next_frame: u32,
    pub anim_interpolation: f32,
    pub _pad: u32,
}

const _: () = assert!(
    std::mem::size_of::<BoidGpu>() == RECORD_STRIDE,
    "size of BoidGpu does not match WGSL"
);
const _: () = assert!(
    std::mem::offset_of!(BoidGpu, heading) == 16,
    "offset of BoidGpu.heading does not match WGSL"
);
const _: () = assert!(
    std::mem::offset_of!(BoidGpu, state) == 28,
    "offset of BoidGpu.state does not match WGSL"
);
const _: () = assert!(
    std::mem::offset_of!(BoidGpu, anim_interpolation) == 40,
    "offset of BoidGpu.anim_interpolation does not match WGSL"
);

/// Runtime guard for the host/kernel stride contract.
///
/// The `const` assertions above catch layout drift at compile time; this
/// check runs at setup so a mismatch surfaces as a fatal [`SetupError`]
/// rather than corrupted rendering.
pub fn assert_record_stride() -> Result<(), SetupError> {
    let actual = std::mem::size_of::<BoidGpu>();
    if actual != RECORD_STRIDE {
        return Err(SetupError::SchemaMismatch {
            expected: RECORD_STRIDE,
            actual,
        });
    }
    Ok(())
}

/// Spawn the full flock.
///
/// The first `predator_count` slots are predators, the rest prey. Each boid
/// starts at `center + random point in a sphere of spawn_radius`, heading
/// slerped between the reference forward (+Z) and a uniformly random
/// orientation — biased toward the reference but still scattered.
///
/// Count 0 is a valid (empty) flock. `predator_count > count` is a fatal
/// configuration error.
pub fn spawn_flock<R: Rng>(
    count: u32,
    predator_count: u32,
    center: Vec3,
    spawn_radius: f32,
    rng: &mut R,
) -> Result<Vec<Boid>, SetupError> {
    if predator_count > count {
        return Err(SetupError::Configuration(format!(
            "predator count {} exceeds total boid count {}",
            predator_count, count
        )));
    }

    let boids = (0..count)
        .map(|i| {
            let role = if i < predator_count {
                BoidRole::Predator
            } else {
                BoidRole::Prey
            };
            let rotation = Quat::IDENTITY.slerp(random_rotation(rng), rng.gen::<f32>());
            Boid {
                position: center + random_in_sphere(spawn_radius, rng),
                heading: rotation * Vec3::Z,
                role,
                state: BehaviorState::Normal,
                anim_frame: 0,
                anim_next_frame: 0,
                anim_interpolation: 0.0,
            }
        })
        .collect();

    Ok(boids)
}

/// Random point inside a sphere of given radius, centered at origin.
fn random_in_sphere<R: Rng>(radius: f32, rng: &mut R) -> Vec3 {
    use std::f32::consts::{PI, TAU};

    let theta = rng.gen_range(0.0..TAU);
    let phi = rng.gen_range(0.0..PI);
    // Cube root for uniform volume distribution
    let r = radius * rng.gen::<f32>().cbrt();

    Vec3::new(
        r * phi.sin() * theta.cos(),
        r * phi.sin() * theta.sin(),
        r * phi.cos(),
    )
}

/// Uniformly random orientation (Shoemake's subgroup method).
fn random_rotation<R: Rng>(rng: &mut R) -> Quat {
    use std::f32::consts::TAU;

    let u1 = rng.gen::<f32>();
    let u2 = rng.gen_range(0.0..TAU);
    let u3 = rng.gen_range(0.0..TAU);
    let a = (1.0 - u1).sqrt();
    let b = u1.sqrt();
    Quat::from_xyzw(a * u2.sin(), a * u2.cos(), b * u3.sin(), b * u3.cos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(7)
    }

    #[test]
    fn spawn_partitions_roles() {
        let boids = spawn_flock(100, 12, Vec3::ZERO, 5.0, &mut rng()).unwrap();
        assert_eq!(boids.len(), 100);
        let predators = boids.iter().filter(|b| b.role == BoidRole::Predator).count();
        let prey = boids.iter().filter(|b| b.role == BoidRole::Prey).count();
        assert_eq!(predators, 12);
        assert_eq!(prey, 88);
        // Predators occupy the leading slots
        assert!(boids[..12].iter().all(|b| b.role == BoidRole::Predator));
    }

    #[test]
    fn spawn_rejects_excess_predators() {
        let err = spawn_flock(10, 11, Vec3::ZERO, 1.0, &mut rng()).unwrap_err();
        assert!(matches!(err, SetupError::Configuration(_)));
    }

    #[test]
    fn spawn_allows_empty_flock() {
        let boids = spawn_flock(0, 0, Vec3::ZERO, 1.0, &mut rng()).unwrap();
        assert!(boids.is_empty());
    }

    #[test]
    fn spawn_all_predators_is_valid() {
        let boids = spawn_flock(5, 5, Vec3::ZERO, 1.0, &mut rng()).unwrap();
        assert!(boids.iter().all(|b| b.role == BoidRole::Predator));
    }

    #[test]
    fn zero_radius_spawns_at_center() {
        let center = Vec3::new(3.0, -1.0, 2.0);
        let boids = spawn_flock(50, 5, center, 0.0, &mut rng()).unwrap();
        for b in &boids {
            assert_eq!(b.position, center);
        }
    }

    #[test]
    fn spawn_stays_inside_radius() {
        let boids = spawn_flock(200, 0, Vec3::ZERO, 2.5, &mut rng()).unwrap();
        for b in &boids {
            assert!(b.position.length() <= 2.5 + 1e-4);
        }
    }

    #[test]
    fn spawn_headings_are_unit_length() {
        let boids = spawn_flock(100, 10, Vec3::ZERO, 1.0, &mut rng()).unwrap();
        for b in &boids {
            assert!((b.heading.length() - 1.0).abs() < 1e-4);
            assert_eq!(b.state, BehaviorState::Normal);
        }
    }

    #[test]
    fn record_stride_matches_contract() {
        assert_record_stride().unwrap();
        assert_eq!(std::mem::size_of::<BoidGpu>(), RECORD_STRIDE);
    }

    #[test]
    fn gpu_round_trip_preserves_fields() {
        let boid = Boid {
            position: Vec3::new(1.0, 2.0, 3.0),
            heading: Vec3::Z,
            role: BoidRole::Predator,
            state: BehaviorState::Chasing,
            anim_frame: 3,
            anim_next_frame: 4,
            anim_interpolation: 0.25,
        };
        let back = Boid::from_gpu(&boid.to_gpu());
        assert_eq!(back.position, boid.position);
        assert_eq!(back.role, BoidRole::Predator);
        assert_eq!(back.state, BehaviorState::Chasing);
        assert_eq!(back.anim_frame, 3);
        assert_eq!(back.anim_next_frame, 4);
    }

    #[test]
    fn random_rotation_is_normalized() {
        let mut r = rng();
        for _ in 0..100 {
            let q = random_rotation(&mut r);
            assert!((q.length() - 1.0).abs() < 1e-4);
        }
    }
}
