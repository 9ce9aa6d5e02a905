//! Shared procedural fish asset for the demos.
//!
//! A low-poly fish rigged over a three-joint spine, with the body and tail
//! fin as separate submeshes so each run exercises one indirect draw per
//! material slot. The swim clip wiggles the spine about Y with the tail
//! lagging the mid joint.

use flockgpu::prelude::*;
use flockgpu::Vec3;
use glam::{Mat4, Quat};

/// Global bind positions of the three spine joints, nose toward +Z.
const JOINT_Z: [f32; 3] = [0.0, -0.35, -0.7];

pub fn rigged_fish() -> (SkinnedMesh, Skeleton, AnimationClip) {
    (fish_mesh(), fish_skeleton(), swim_clip())
}

fn fish_skeleton() -> Skeleton {
    let joints = (0..3)
        .map(|i| {
            let global = Vec3::new(0.0, 0.0, JOINT_Z[i]);
            let local_z = if i == 0 {
                JOINT_Z[0]
            } else {
                JOINT_Z[i] - JOINT_Z[i - 1]
            };
            Joint {
                parent: if i == 0 { None } else { Some(i - 1) },
                inverse_bind: Mat4::from_translation(-global),
                rest_translation: Vec3::new(0.0, 0.0, local_z),
                rest_rotation: Quat::IDENTITY,
            }
        })
        .collect();
    Skeleton { joints }
}

fn fish_mesh() -> SkinnedMesh {
    let positions = vec![
        Vec3::new(0.0, 0.0, 0.45),    // 0: nose
        Vec3::new(0.0, 0.18, 0.05),   // 1: ring top
        Vec3::new(0.12, 0.0, 0.0),    // 2: ring right
        Vec3::new(0.0, -0.14, 0.05),  // 3: ring bottom
        Vec3::new(-0.12, 0.0, 0.0),   // 4: ring left
        Vec3::new(0.0, 0.0, -0.4),    // 5: tail base
        Vec3::new(0.0, 0.2, -0.75),   // 6: fin tip top
        Vec3::new(0.0, -0.2, -0.75),  // 7: fin tip bottom
    ];
    let normals = vec![
        Vec3::Z,
        Vec3::Y,
        Vec3::X,
        Vec3::NEG_Y,
        Vec3::NEG_X,
        Vec3::NEG_Z,
        Vec3::new(0.7, 0.7, 0.0).normalize(),
        Vec3::new(0.7, -0.7, 0.0).normalize(),
    ];
    // Nose and ring follow the root; the tail base blends into the mid
    // joint; the fin rides the tail joint.
    let joints = vec![
        [0, 0, 0, 0],
        [0, 0, 0, 0],
        [0, 0, 0, 0],
        [0, 0, 0, 0],
        [0, 0, 0, 0],
        [0, 1, 0, 0],
        [2, 0, 0, 0],
        [2, 0, 0, 0],
    ];
    let weights = vec![
        [1.0, 0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0, 0.0],
        [0.5, 0.5, 0.0, 0.0],
        [1.0, 0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0, 0.0],
    ];
    // Front pyramid around the nose, rear pyramid closing at the tail base.
    let indices = vec![
        0, 1, 2, 0, 2, 3, 0, 3, 4, 0, 4, 1, // front
        1, 5, 2, 2, 5, 3, 3, 5, 4, 4, 5, 1, // rear
        5, 6, 7, // tail fin
    ];
    let submeshes = vec![
        SubMesh {
            index_start: 0,
            index_count: 24,
            base_vertex: 0,
        },
        SubMesh {
            index_start: 24,
            index_count: 3,
            base_vertex: 0,
        },
    ];
    SkinnedMesh {
        positions,
        normals,
        joints,
        weights,
        indices,
        submeshes,
    }
}

/// One-second swim cycle, 16 baked frames. The tail joint swings wider and
/// a quarter period behind the mid joint.
fn swim_clip() -> AnimationClip {
    let wiggle = |amplitude: f32, phase: f32| -> Vec<(f32, Quat)> {
        (0..=8)
            .map(|k| {
                let t = k as f32 / 8.0;
                let angle = amplitude * (std::f32::consts::TAU * (t + phase)).sin();
                (t, Quat::from_rotation_y(angle))
            })
            .collect()
    };
    AnimationClip {
        length: 1.0,
        frame_rate: 16.0,
        channels: vec![
            JointChannel {
                joint: 1,
                rotations: wiggle(0.35, 0.0),
                translations: vec![],
            },
            JointChannel {
                joint: 2,
                rotations: wiggle(0.6, 0.25),
                translations: vec![],
            },
        ],
    }
}
