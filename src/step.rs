//! The per-agent transition function, host reference implementation.
//!
//! This is the same math the compute kernel in `flock.wgsl` runs, expressed
//! over host types: a pure function of (own record, full previous-frame
//! array, parameters). Each agent reads only the previous frame and writes
//! only its own next record, so agents can be evaluated in any order — the
//! property that makes the GPU dispatch race-free. Keeping a host mirror
//! lets the kernel's semantics be tested without a device.
//!
//! The kernel and this function must be changed together.

use glam::{Quat, Vec3};

use crate::flock::{BehaviorState, Boid, BoidRole};
use crate::params::SimParams;

/// Hysteresis margin on `flee_radius` and `hunt_radius`: a boid leaves
/// FleeingPredator/Chasing only once the trigger is farther than the enter
/// radius times this factor. Suppresses single-frame flapping right at the
/// radius boundary.
pub const STATE_EXIT_MARGIN: f32 = 1.1;

/// Weight of the pull toward the shared target when nothing overrides it.
const TARGET_PULL_WEIGHT: f32 = 1.0;

/// Compute the next record for the boid at `index`.
///
/// `prev` is the complete previous-frame flock, including `prev[index]`.
pub fn step_boid(index: usize, prev: &[Boid], params: &SimParams) -> Boid {
    let me = &prev[index];
    let dt = params.delta_time;
    let target = Vec3::from_array(params.target);

    // Flockmates for prey are other prey; a wandering predator flocks with
    // other predators.
    let flockmate = me.role;

    let mut alignment_sum = Vec3::ZERO;
    let mut alignment_count = 0u32;
    let mut cohesion_sum = Vec3::ZERO;
    let mut cohesion_count = 0u32;
    let mut separation_sum = Vec3::ZERO;
    let mut nearest_threat_dist = f32::MAX;
    let mut nearest_threat_pos = Vec3::ZERO;

    // The scan radii for state triggers widen while the state is active.
    let flee_radius = match me.state {
        BehaviorState::FleeingPredator => params.flee_radius * STATE_EXIT_MARGIN,
        _ => params.flee_radius,
    };
    let hunt_radius = match me.state {
        BehaviorState::Chasing => params.hunt_radius * STATE_EXIT_MARGIN,
        _ => params.hunt_radius,
    };

    for (j, other) in prev.iter().enumerate() {
        if j == index {
            continue;
        }
        let offset = other.position - me.position;
        let dist = offset.length();

        // Threat/quarry tracking
        match (me.role, other.role) {
            (BoidRole::Prey, BoidRole::Predator) => {
                if dist < flee_radius && dist < nearest_threat_dist {
                    nearest_threat_dist = dist;
                    nearest_threat_pos = other.position;
                }
            }
            (BoidRole::Predator, BoidRole::Prey) => {
                if dist < hunt_radius && dist < nearest_threat_dist {
                    nearest_threat_dist = dist;
                    nearest_threat_pos = other.position;
                }
            }
            _ => {}
        }

        // Flocking accumulation
        if other.role == flockmate && dist < params.neighbourhood_radius {
            if dist < params.alignment_radius {
                alignment_sum += other.heading;
                alignment_count += 1;
            }
            if dist < params.cohesion_radius {
                cohesion_sum += other.position;
                cohesion_count += 1;
            }
            if dist < params.separation_radius && dist > 1e-4 {
                let force = (params.separation_radius - dist) / params.separation_radius;
                separation_sum -= offset / dist * force;
            }
        }
    }

    let (desired, state) = if nearest_threat_dist < f32::MAX {
        match me.role {
            BoidRole::Prey => (
                (me.position - nearest_threat_pos).normalize_or_zero(),
                BehaviorState::FleeingPredator,
            ),
            BoidRole::Predator => (
                (nearest_threat_pos - me.position).normalize_or_zero(),
                BehaviorState::Chasing,
            ),
        }
    } else {
        let mut steer = Vec3::ZERO;
        if alignment_count > 0 {
            steer += (alignment_sum / alignment_count as f32).normalize_or_zero()
                * params.align_scale as f32;
        }
        if cohesion_count > 0 {
            let center = cohesion_sum / cohesion_count as f32;
            steer += (center - me.position).normalize_or_zero() * params.cohesion_scale as f32;
        }
        steer += separation_sum * params.separation_scale as f32;
        steer += (target - me.position).normalize_or_zero() * TARGET_PULL_WEIGHT;
        (steer.normalize_or_zero(), BehaviorState::Normal)
    };

    // Bounded-angle turn, then integrate along the new heading.
    let heading = if desired.length_squared() > 1e-8 {
        rotate_towards(me.heading, desired, params.rotation_speed * dt)
    } else {
        me.heading
    };
    let speed = match me.role {
        BoidRole::Prey => params.boid_speed,
        BoidRole::Predator => params.boid_speed * params.predator_speed_multiplier,
    };
    let position = me.position + heading * speed * dt;

    // Animation phase: a continuous counter split across frame + blend
    // weight, wrapped modulo frame_count. The interpolation toggle is a
    // render-side concern; the phase always carries its fraction.
    let frame_count = params.frame_count.max(1);
    let counter = (me.anim_frame as f32 + me.anim_interpolation
        + params.animation_frame_speed * dt)
        .rem_euclid(frame_count as f32);
    let anim_frame = (counter as u32).min(frame_count - 1);
    let anim_next_frame = (anim_frame + 1) % frame_count;
    let anim_interpolation = counter - anim_frame as f32;

    Boid {
        position,
        heading,
        role: me.role,
        state,
        anim_frame,
        anim_next_frame,
        anim_interpolation,
    }
}

/// Step the whole flock one frame: next[i] = step_boid(i, prev).
pub fn step_flock(prev: &[Boid], params: &SimParams) -> Vec<Boid> {
    (0..prev.len()).map(|i| step_boid(i, prev, params)).collect()
}

/// Rotate unit vector `from` toward unit vector `to` by at most `max_angle`
/// radians. Never snaps past the goal; an opposed pair turns through an
/// arbitrary perpendicular axis.
fn rotate_towards(from: Vec3, to: Vec3, max_angle: f32) -> Vec3 {
    let cos_angle = from.dot(to).clamp(-1.0, 1.0);
    let angle = cos_angle.acos();
    if angle <= max_angle || angle < 1e-4 {
        return to;
    }
    let cross = from.cross(to);
    let axis = if cross.length_squared() < 1e-8 {
        from.any_orthonormal_vector()
    } else {
        cross.normalize()
    };
    (Quat::from_axis_angle(axis, max_angle) * from).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::FlockParams;
    use std::f32::consts::PI;

    fn boid(position: Vec3, heading: Vec3, role: BoidRole) -> Boid {
        Boid {
            position,
            heading,
            role,
            state: BehaviorState::Normal,
            anim_frame: 0,
            anim_next_frame: 1,
            anim_interpolation: 0.0,
        }
    }

    fn params_with(f: impl FnOnce(&mut FlockParams)) -> SimParams {
        let mut p = FlockParams::default();
        f(&mut p);
        p.to_gpu(0.1, 0, 16, true)
    }

    #[test]
    fn transition_is_deterministic() {
        let flock = vec![
            boid(Vec3::ZERO, Vec3::Z, BoidRole::Predator),
            boid(Vec3::new(2.0, 0.0, 0.0), Vec3::X, BoidRole::Prey),
            boid(Vec3::new(0.0, 3.0, 1.0), Vec3::Y, BoidRole::Prey),
        ];
        let params = params_with(|_| {});
        let a = step_flock(&flock, &params);
        let b = step_flock(&flock, &params);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.position, y.position);
            assert_eq!(x.heading, y.heading);
            assert_eq!(x.state, y.state);
            assert_eq!(x.anim_interpolation, y.anim_interpolation);
        }
    }

    #[test]
    fn lone_prey_settles_normal_and_seeks_target() {
        let target = Vec3::new(10.0, 0.0, 0.0);
        let flock = vec![boid(Vec3::ZERO, Vec3::Z, BoidRole::Prey)];
        // Turn rate high enough to reach the desired heading in one step.
        let params = params_with(|p| {
            p.target = target;
            p.rotation_speed = 100.0;
        });
        let next = step_boid(0, &flock, &params);
        assert_eq!(next.state, BehaviorState::Normal);
        assert!((next.heading - Vec3::X).length() < 1e-4);
        assert!(next.position.x > 0.0);
    }

    #[test]
    fn prey_near_predator_flees_and_gains_distance() {
        let predator_pos = Vec3::ZERO;
        let flock = vec![
            boid(predator_pos, Vec3::Z, BoidRole::Predator),
            boid(Vec3::new(2.0, 0.0, 0.0), Vec3::Z, BoidRole::Prey),
        ];
        let params = params_with(|p| {
            p.flee_radius = 6.0;
            p.rotation_speed = 100.0;
        });
        let before = flock[1].position.distance(predator_pos);
        let next = step_boid(1, &flock, &params);
        assert_eq!(next.state, BehaviorState::FleeingPredator);
        assert!(next.position.distance(predator_pos) > before);
    }

    #[test]
    fn prey_outside_flee_radius_stays_normal() {
        let flock = vec![
            boid(Vec3::ZERO, Vec3::Z, BoidRole::Predator),
            boid(Vec3::new(50.0, 0.0, 0.0), Vec3::Z, BoidRole::Prey),
        ];
        let params = params_with(|p| p.flee_radius = 6.0);
        let next = step_boid(1, &flock, &params);
        assert_eq!(next.state, BehaviorState::Normal);
    }

    #[test]
    fn flee_state_has_exit_hysteresis() {
        let params = params_with(|p| p.flee_radius = 6.0);
        // Distance in the hysteresis band (6.0, 6.6).
        let mut flock = vec![
            boid(Vec3::ZERO, Vec3::Z, BoidRole::Predator),
            boid(Vec3::new(6.3, 0.0, 0.0), Vec3::Z, BoidRole::Prey),
        ];

        // A Normal prey at that distance is not triggered...
        let next = step_boid(1, &flock, &params);
        assert_eq!(next.state, BehaviorState::Normal);

        // ...but a fleeing one keeps fleeing until past the margin.
        flock[1].state = BehaviorState::FleeingPredator;
        let next = step_boid(1, &flock, &params);
        assert_eq!(next.state, BehaviorState::FleeingPredator);

        flock[1].position = Vec3::new(6.7, 0.0, 0.0);
        let next = step_boid(1, &flock, &params);
        assert_eq!(next.state, BehaviorState::Normal);
    }

    #[test]
    fn predator_chases_nearest_prey() {
        let flock = vec![
            boid(Vec3::ZERO, Vec3::Z, BoidRole::Predator),
            boid(Vec3::new(4.0, 0.0, 0.0), Vec3::Z, BoidRole::Prey),
            boid(Vec3::new(8.0, 0.0, 0.0), Vec3::Z, BoidRole::Prey),
        ];
        let params = params_with(|p| {
            p.hunt_radius = 10.0;
            p.rotation_speed = 100.0;
        });
        let next = step_boid(0, &flock, &params);
        assert_eq!(next.state, BehaviorState::Chasing);
        // Heads for the nearer prey.
        assert!((next.heading - Vec3::X).length() < 1e-4);
        assert!(next.position.x > 0.0);
    }

    #[test]
    fn predator_without_prey_wanders_normal() {
        let flock = vec![
            boid(Vec3::ZERO, Vec3::Z, BoidRole::Predator),
            boid(Vec3::new(2.0, 0.0, 0.0), Vec3::Z, BoidRole::Predator),
        ];
        let params = params_with(|p| p.hunt_radius = 10.0);
        let next = step_boid(0, &flock, &params);
        assert_eq!(next.state, BehaviorState::Normal);
    }

    #[test]
    fn predator_moves_faster_than_prey() {
        let params = params_with(|p| {
            p.boid_speed = 2.0;
            p.predator_speed_multiplier = 3.0;
        });
        let prey = vec![boid(Vec3::ZERO, Vec3::Z, BoidRole::Prey)];
        let pred = vec![boid(Vec3::ZERO, Vec3::Z, BoidRole::Predator)];
        let prey_dist = step_boid(0, &prey, &params).position.length();
        let pred_dist = step_boid(0, &pred, &params).position.length();
        assert!((pred_dist / prey_dist - 3.0).abs() < 1e-3);
    }

    #[test]
    fn heading_turn_is_angle_bounded() {
        let target = Vec3::new(0.0, 0.0, -10.0); // directly behind
        let flock = vec![boid(Vec3::ZERO, Vec3::Z, BoidRole::Prey)];
        let params = params_with(|p| {
            p.target = target;
            p.rotation_speed = 1.0; // 0.1 rad per step at dt = 0.1
        });
        let next = step_boid(0, &flock, &params);
        let turned = next.heading.dot(Vec3::Z).clamp(-1.0, 1.0).acos();
        assert!(turned <= 0.1 + 1e-3, "turned {} rad", turned);
        assert!((next.heading.length() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn animation_counter_wraps_modulo_frame_count() {
        let mut b = boid(Vec3::ZERO, Vec3::Z, BoidRole::Prey);
        b.anim_frame = 15;
        b.anim_interpolation = 0.9;
        let flock = vec![b];
        // 12 frames/s * 0.1 s = 1.2 frames: 15.9 + 1.2 wraps past 16.
        let params = params_with(|_| {});
        let next = step_boid(0, &flock, &params);
        assert_eq!(next.anim_frame, 1);
        assert_eq!(next.anim_next_frame, 2);
        assert!((next.anim_interpolation - 0.1).abs() < 1e-3);
    }

    #[test]
    fn animation_next_frame_wraps_to_zero() {
        let mut b = boid(Vec3::ZERO, Vec3::Z, BoidRole::Prey);
        b.anim_frame = 14;
        b.anim_interpolation = 0.95;
        let flock = vec![b];
        let params = params_with(|p| p.animation_frame_speed = 5.0); // +0.5 frames
        let next = step_boid(0, &flock, &params);
        assert_eq!(next.anim_frame, 15);
        assert_eq!(next.anim_next_frame, 0);
    }

    #[test]
    fn single_frame_clip_pins_phase_to_zero() {
        let flock = vec![boid(Vec3::ZERO, Vec3::Z, BoidRole::Prey)];
        let params = FlockParams::default().to_gpu(0.1, 1, 1, true);
        let next = step_boid(0, &flock, &params);
        assert_eq!(next.anim_frame, 0);
        assert_eq!(next.anim_next_frame, 0);
    }

    #[test]
    fn separation_pushes_crowded_prey_apart() {
        let flock = vec![
            boid(Vec3::ZERO, Vec3::Z, BoidRole::Prey),
            boid(Vec3::new(0.5, 0.0, 0.0), Vec3::Z, BoidRole::Prey),
        ];
        let params = params_with(|p| {
            p.separation_radius = 1.0;
            p.separation_scale = 5;
            p.align_scale = 1;
            p.cohesion_scale = 1;
            p.target = Vec3::ZERO;
            p.rotation_speed = 100.0;
        });
        let next = step_boid(0, &flock, &params);
        // Net steer points away from the crowding neighbor on +X.
        assert!(next.heading.x < 0.0);
    }

    #[test]
    fn rotate_towards_handles_opposed_vectors() {
        let turned = rotate_towards(Vec3::Z, -Vec3::Z, PI / 4.0);
        assert!((turned.length() - 1.0).abs() < 1e-4);
        let angle = turned.dot(Vec3::Z).clamp(-1.0, 1.0).acos();
        assert!((angle - PI / 4.0).abs() < 1e-3);
    }

    #[test]
    fn roles_never_change() {
        let flock = vec![
            boid(Vec3::ZERO, Vec3::Z, BoidRole::Predator),
            boid(Vec3::new(1.0, 0.0, 0.0), Vec3::Z, BoidRole::Prey),
        ];
        let params = params_with(|_| {});
        let next = step_flock(&flock, &params);
        assert_eq!(next[0].role, BoidRole::Predator);
        assert_eq!(next[1].role, BoidRole::Prey);
    }
}
